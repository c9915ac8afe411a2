//! Authenticated command layer: AUTH, block read/write, the value
//! arithmetic (increment/decrement/restore/transfer) and the card
//! configuration commands.

use crate::consts::{self, Key, LoadModulation, PersonalizedUid};
use crate::error::Error;
use crate::frame;
use crate::sector;
use crate::{MifareClassic, Transceiver};

impl<T: Transceiver> MifareClassic<T> {
    /// Authenticate `block`'s sector with `key`. The front-end performs
    /// the Crypto1 three-pass exchange; a zero-length success from the
    /// transceiver is the only confirmation. Authenticating replaces any
    /// previously authenticated sector.
    pub fn authenticate(&mut self, uid: [u8; 4], block: u8, key: &Key) -> Result<(), Error> {
        self.authenticated_sector = None;
        let tx = frame::auth(key, block, uid);
        self.transceive(&tx, &mut [])?;
        self.authenticated_sector = Some(sector::block_to_sector(block));
        Ok(())
    }

    /// Read one 16-byte block of the authenticated sector.
    pub fn mifare_read(&mut self, block: u8) -> Result<[u8; 16], Error> {
        let tx = frame::command(consts::READ, block);
        let mut resp = [0u8; 18];
        self.transceive_expect(&tx, &mut resp, 18)?;
        match frame::parse_block(&resp) {
            Ok(data) => Ok(data),
            Err(e) => {
                self.note("crc error");
                Err(e)
            }
        }
    }

    /// Write one 16-byte block. Two-phase: the command frame and the data
    /// frame are each acknowledged with the 4-bit ACK.
    pub fn mifare_write(&mut self, block: u8, data: &[u8; 16]) -> Result<(), Error> {
        self.command_phase(consts::WRITE, block)?;

        let tx = frame::data_phase(data);
        let mut resp = [0u8; 1];
        self.transceive(&tx, &mut resp)?;
        self.check_ack(resp[0])
    }

    /// INCREMENT: add `delta` to the block's value inside the card's
    /// transient register. Nothing reaches the block until
    /// [`mifare_transfer`](MifareClassic::mifare_transfer).
    pub fn mifare_increment(&mut self, block: u8, delta: u32) -> Result<(), Error> {
        self.two_step(consts::INCREMENT, block, delta)
    }

    /// DECREMENT: subtract `delta` into the card register.
    pub fn mifare_decrement(&mut self, block: u8, delta: u32) -> Result<(), Error> {
        self.two_step(consts::DECREMENT, block, delta)
    }

    /// RESTORE: load the block's value into the card register. The
    /// operand bytes are don't-care; zeros go on the wire.
    pub fn mifare_restore(&mut self, block: u8) -> Result<(), Error> {
        self.two_step(consts::RESTORE, block, 0)
    }

    /// TRANSFER: commit the card register to `block`.
    pub fn mifare_transfer(&mut self, block: u8) -> Result<(), Error> {
        self.arithmetic_phase(consts::TRANSFER, block)
    }

    /// Select normal or strong load modulation.
    pub fn set_modulation(&mut self, modulation: LoadModulation) -> Result<(), Error> {
        self.command_phase(consts::SET_MOD_TYPE, modulation as u8)
    }

    /// Install a UID personalization. This is a one-time, irreversible
    /// card setting.
    pub fn set_personalized_uid(&mut self, kind: PersonalizedUid) -> Result<(), Error> {
        self.command_phase(consts::PERSONALIZE_UID, kind as u8)
    }

    /// `op arg CRC`, expect ACK.
    fn command_phase(&mut self, op: u8, arg: u8) -> Result<(), Error> {
        let tx = frame::command(op, arg);
        let mut resp = [0u8; 1];
        self.transceive_expect(&tx, &mut resp, 1)?;
        self.check_ack(resp[0])
    }

    /// Like `command_phase`, but NAK 0x4 means the access conditions
    /// refused the operation.
    fn arithmetic_phase(&mut self, op: u8, block: u8) -> Result<(), Error> {
        let tx = frame::command(op, block);
        let mut resp = [0u8; 1];
        self.transceive_expect(&tx, &mut resp, 1)?;
        match frame::parse_value_ack(resp[0]) {
            Ok(()) => Ok(()),
            Err(Error::InvalidOperation) => {
                self.note("invalid operation");
                Err(Error::InvalidOperation)
            }
            Err(e) => {
                self.note("ack error");
                Err(e)
            }
        }
    }

    /// The two-phase arithmetic commands: acknowledged command frame,
    /// then the operand frame, which has no confirmed response.
    fn two_step(&mut self, op: u8, block: u8, operand: u32) -> Result<(), Error> {
        self.arithmetic_phase(op, block)?;
        let tx = frame::operand_phase(operand);
        self.transceive_ignore(&tx);
        Ok(())
    }

    fn check_ack(&self, nibble: u8) -> Result<(), Error> {
        match frame::parse_ack(nibble) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.note("ack error");
                Err(e)
            }
        }
    }
}
