//! Command frame construction and response validation.
//!
//! REQA and WUPA go on the wire as their bare opcode byte; every other
//! command frame built here ends with a CRC_A, except AUTH, which the RF
//! front-end wraps under Crypto1 itself.

use crate::consts::{self, Key};
use crate::crc;
use crate::error::Error;

/// SELECT frame: cascade command pair, the 4 UID bytes, their BCC, CRC_A.
pub fn select(cascade: [u8; 2], uid: [u8; 4]) -> [u8; 9] {
    let mut buf = [0u8; 9];
    buf[..2].copy_from_slice(&cascade);
    buf[2..6].copy_from_slice(&uid);
    buf[6] = uid[0] ^ uid[1] ^ uid[2] ^ uid[3];
    crc::append_crc(&mut buf, 7);
    buf
}

/// HALT frame.
pub fn halt() -> [u8; 4] {
    let mut buf = [consts::HALT[0], consts::HALT[1], 0, 0];
    crc::append_crc(&mut buf, 2);
    buf
}

/// AUTH request: key command, block, the 6 key bytes, the 4 UID bytes.
/// No CRC; the front-end frames this exchange.
pub fn auth(key: &Key, block: u8, uid: [u8; 4]) -> [u8; 12] {
    let mut buf = [0u8; 12];
    buf[0] = key.command();
    buf[1] = block;
    buf[2..8].copy_from_slice(key.bytes());
    buf[8..12].copy_from_slice(&uid);
    buf
}

/// Single-argument command frame: READ, the write/arithmetic phase 1,
/// SET_MOD and PERSONALIZE_UID.
pub fn command(op: u8, arg: u8) -> [u8; 4] {
    let mut buf = [op, arg, 0, 0];
    crc::append_crc(&mut buf, 2);
    buf
}

/// WRITE phase 2: the 16 data bytes plus CRC_A.
pub fn data_phase(data: &[u8; 16]) -> [u8; 18] {
    let mut buf = [0u8; 18];
    buf[..16].copy_from_slice(data);
    crc::append_crc(&mut buf, 16);
    buf
}

/// INCREMENT/DECREMENT/RESTORE phase 2: little-endian operand plus CRC_A.
/// RESTORE sends zeros; the card ignores the operand there.
pub fn operand_phase(operand: u32) -> [u8; 6] {
    let mut buf = [0u8; 6];
    buf[..4].copy_from_slice(&operand.to_le_bytes());
    crc::append_crc(&mut buf, 4);
    buf
}

/// Anticollision response: 4 UID bytes followed by their XOR.
pub fn parse_uid(resp: &[u8; 5]) -> Result<[u8; 4], Error> {
    let uid = [resp[0], resp[1], resp[2], resp[3]];
    if uid[0] ^ uid[1] ^ uid[2] ^ uid[3] != resp[4] {
        return Err(Error::BccCheck);
    }
    Ok(uid)
}

/// A SAK is accepted only when it reports a complete S50 or S70 UID.
pub fn check_sak(sak: u8) -> Result<(), Error> {
    if sak == consts::SAK_S50 || sak == consts::SAK_S70 {
        Ok(())
    } else {
        Err(Error::Sak(sak))
    }
}

/// Validate a 4-bit acknowledgement nibble.
pub fn parse_ack(nibble: u8) -> Result<(), Error> {
    if nibble == consts::ACK {
        Ok(())
    } else {
        Err(Error::Ack(nibble))
    }
}

/// Like [`parse_ack`], but the arithmetic commands answer NAK 0x4 when
/// the access conditions forbid them.
pub fn parse_value_ack(nibble: u8) -> Result<(), Error> {
    if nibble == consts::NAK_INVALID_OPERATION {
        return Err(Error::InvalidOperation);
    }
    parse_ack(nibble)
}

/// READ response: 16 data bytes guarded by CRC_A.
pub fn parse_block(resp: &[u8; 18]) -> Result<[u8; 16], Error> {
    if !crc::check_crc(resp) {
        return Err(Error::Crc);
    }
    let mut data = [0u8; 16];
    data.copy_from_slice(&resp[..16]);
    Ok(data)
}
