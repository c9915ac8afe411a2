//! An in-memory MIFARE Classic card sitting behind the [`Transceiver`]
//! port.
//!
//! The simulator validates every frame byte-exactly (CRC_A included) and
//! keeps a 64-block memory image, the transient arithmetic register and
//! the halted state, so the scenario tests exercise the driver against
//! honest wire behavior. Malformed driver frames panic the test; absence
//! of a card surfaces as the transport failure a real front-end would
//! report.

use std::cell::RefCell;
use std::rc::Rc;

use mifare_classic::{crc, sector, Error, Transceiver};

pub const UID: [u8; 4] = [0xAB, 0xCD, 0x12, 0x34];

const ACK: u8 = 0x0A;
const NAK_INVALID_OPERATION: u8 = 0x04;

enum Pending {
    Write(u8),
    Increment(u8),
    Decrement(u8),
    Restore(u8),
}

pub struct CardState {
    pub memory: [[u8; 16]; 64],
    pub key_a: [u8; 6],
    pub key_b: [u8; 6],
    pub uid: [u8; 4],
    pub atqa: [u8; 2],
    pub sak: u8,
    pub present: bool,
    pub halted: bool,
    register: Option<(i32, u8)>,
    pending: Option<Pending>,
    /// Every frame the driver handed to the port, for call accounting.
    pub frames: Vec<Vec<u8>>,
    pub delays: Vec<u32>,
}

impl CardState {
    fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<usize, Error> {
        self.frames.push(tx.to_vec());
        if !self.present {
            return Err(Error::ContactlessFailed);
        }
        if let Some(pending) = self.pending.take() {
            return self.finish(pending, tx, rx);
        }

        match (tx[0], tx.len()) {
            (0x26, 1) => {
                // REQA only reaches idle cards
                if self.halted {
                    return Err(Error::ContactlessFailed);
                }
                reply(rx, &self.atqa)
            }
            (0x52, 1) => {
                self.halted = false;
                reply(rx, &self.atqa)
            }
            (0x93, 2) | (0x95, 2) if tx[1] == 0x20 => {
                let mut resp = [0u8; 5];
                resp[..4].copy_from_slice(&self.uid);
                resp[4] = self.uid.iter().fold(0, |acc, byte| acc ^ byte);
                reply(rx, &resp)
            }
            (0x93, 9) | (0x95, 9) if tx[1] == 0x70 => {
                assert!(crc::check_crc(tx), "select frame crc: {tx:02x?}");
                assert_eq!(&tx[2..6], &self.uid, "select uid");
                assert_eq!(
                    tx[6],
                    self.uid.iter().fold(0, |acc, byte| acc ^ byte),
                    "select bcc"
                );
                reply(rx, &[self.sak])
            }
            (0x50, 4) => {
                assert!(crc::check_crc(tx), "halt frame crc: {tx:02x?}");
                self.halted = true;
                Ok(0)
            }
            (0x60, 12) | (0x61, 12) => {
                let expected = if tx[0] == 0x60 { self.key_a } else { self.key_b };
                if tx[2..8] != expected || tx[8..12] != self.uid {
                    // the front-end reports a failed Crypto1 pass as a
                    // transport failure
                    return Err(Error::ContactlessFailed);
                }
                Ok(0)
            }
            (0x30, 4) => {
                assert!(crc::check_crc(tx), "read frame crc: {tx:02x?}");
                let mut resp = [0u8; 18];
                resp[..16].copy_from_slice(&self.memory[tx[1] as usize]);
                crc::append_crc(&mut resp, 16);
                reply(rx, &resp)
            }
            (0xA0, 4) => {
                assert!(crc::check_crc(tx), "write frame crc: {tx:02x?}");
                self.pending = Some(Pending::Write(tx[1]));
                reply(rx, &[ACK])
            }
            (0xC0, 4) | (0xC1, 4) | (0xC2, 4) => {
                assert!(crc::check_crc(tx), "arithmetic frame crc: {tx:02x?}");
                let block = tx[1];
                if sector::parse_value_block(&self.memory[block as usize]).is_err() {
                    return reply(rx, &[NAK_INVALID_OPERATION]);
                }
                self.pending = Some(match tx[0] {
                    0xC0 => Pending::Decrement(block),
                    0xC1 => Pending::Increment(block),
                    _ => Pending::Restore(block),
                });
                reply(rx, &[ACK])
            }
            (0xB0, 4) => {
                assert!(crc::check_crc(tx), "transfer frame crc: {tx:02x?}");
                match self.register.take() {
                    Some((value, addr)) => {
                        self.memory[tx[1] as usize] = sector::value_block(value, addr);
                        reply(rx, &[ACK])
                    }
                    None => reply(rx, &[NAK_INVALID_OPERATION]),
                }
            }
            (0x40, 4) | (0x43, 4) => {
                assert!(crc::check_crc(tx), "parameter frame crc: {tx:02x?}");
                reply(rx, &[ACK])
            }
            _ => panic!("unexpected frame: {tx:02x?}"),
        }
    }

    fn finish(&mut self, pending: Pending, tx: &[u8], rx: &mut [u8]) -> Result<usize, Error> {
        if let Pending::Write(block) = pending {
            assert_eq!(tx.len(), 18, "write data frame: {tx:02x?}");
            assert!(crc::check_crc(tx), "write data crc: {tx:02x?}");
            self.memory[block as usize].copy_from_slice(&tx[..16]);
            if sector::sector_last_block(sector::block_to_sector(block)) == block {
                self.key_a.copy_from_slice(&tx[..6]);
                self.key_b.copy_from_slice(&tx[10..16]);
            }
            return reply(rx, &[ACK]);
        }

        // arithmetic operand phase; no response until TRANSFER
        assert_eq!(tx.len(), 6, "operand frame: {tx:02x?}");
        assert!(crc::check_crc(tx), "operand crc: {tx:02x?}");
        let operand = u32::from_le_bytes([tx[0], tx[1], tx[2], tx[3]]);
        self.register = Some(match pending {
            Pending::Increment(block) => {
                let (value, addr) =
                    sector::parse_value_block(&self.memory[block as usize]).unwrap();
                (value.wrapping_add(operand as i32), addr)
            }
            Pending::Decrement(block) => {
                let (value, addr) =
                    sector::parse_value_block(&self.memory[block as usize]).unwrap();
                (value.wrapping_sub(operand as i32), addr)
            }
            Pending::Restore(block) => {
                sector::parse_value_block(&self.memory[block as usize]).unwrap()
            }
            Pending::Write(_) => unreachable!(),
        });
        Ok(0)
    }
}

fn reply(rx: &mut [u8], bytes: &[u8]) -> Result<usize, Error> {
    rx[..bytes.len()].copy_from_slice(bytes);
    Ok(bytes.len())
}

#[derive(Clone)]
pub struct CardSim {
    state: Rc<RefCell<CardState>>,
}

impl CardSim {
    pub fn s50() -> (Self, Rc<RefCell<CardState>>) {
        Self::with(UID, [0x04, 0x00], 0x08)
    }

    pub fn s70() -> (Self, Rc<RefCell<CardState>>) {
        Self::with(UID, [0x02, 0x00], 0x18)
    }

    pub fn with(uid: [u8; 4], atqa: [u8; 2], sak: u8) -> (Self, Rc<RefCell<CardState>>) {
        let state = Rc::new(RefCell::new(CardState {
            memory: [[0; 16]; 64],
            key_a: [0xFF; 6],
            key_b: [0xFF; 6],
            uid,
            atqa,
            sak,
            present: true,
            halted: false,
            register: None,
            pending: None,
            frames: Vec::new(),
            delays: Vec::new(),
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl Transceiver for CardSim {
    fn init(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn transceive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<usize, Error> {
        self.state.borrow_mut().exchange(tx, rx)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.state.borrow_mut().delays.push(ms);
    }
}
