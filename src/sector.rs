//! Pure sector arithmetic and the two redundant on-card encodings: value
//! blocks and the sector trailer's access bits. Nothing here touches the
//! transceiver.
//!
//! Blocks 0..=127 belong to sectors 0..=31, four blocks each; blocks
//! 128..=255 (S70 only) belong to sectors 32..=39, sixteen blocks each.
//! The sector functions are defined for that range; sector numbers above
//! 39 address nothing on either card.

use crate::error::Error;

/// Sector that owns `block`.
pub fn block_to_sector(block: u8) -> u8 {
    if block < 128 {
        block / 4
    } else {
        32 + (block - 128) / 16
    }
}

/// Number of blocks in `sector`.
pub fn sector_block_count(sector: u8) -> u8 {
    if sector < 32 {
        4
    } else {
        16
    }
}

/// First absolute block of `sector`.
pub fn sector_first_block(sector: u8) -> u8 {
    if sector < 32 {
        sector * 4
    } else {
        128 + (sector - 32) * 16
    }
}

/// Last absolute block of `sector`; this is the sector trailer.
pub fn sector_last_block(sector: u8) -> u8 {
    sector_first_block(sector) + (sector_block_count(sector) - 1)
}

pub(crate) fn is_trailer(block: u8) -> bool {
    block == sector_last_block(block_to_sector(block))
}

/// Build the 16-byte value-block image: the value, its complement, the
/// value again, then the address quartet `addr ~addr addr ~addr`.
pub fn value_block(value: i32, addr: u8) -> [u8; 16] {
    let v = value.to_le_bytes();
    let n = (!value).to_le_bytes();
    let mut data = [0u8; 16];
    data[0..4].copy_from_slice(&v);
    data[4..8].copy_from_slice(&n);
    data[8..12].copy_from_slice(&v);
    data[12] = addr;
    data[13] = !addr;
    data[14] = addr;
    data[15] = !addr;
    data
}

/// Decode a value block as `(value, addr)` after verifying both
/// redundancy invariants.
pub fn parse_value_block(data: &[u8; 16]) -> Result<(i32, u8), Error> {
    let value_0 = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let value_1 = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    let value_2 = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
    if value_0 != value_2 || value_0 != !value_1 {
        return Err(Error::ValueInvalid);
    }
    if data[12] != data[14] || data[13] != data[15] || data[12] != !data[13] {
        return Err(Error::BlockInvalid);
    }
    Ok((value_0 as i32, data[12]))
}

/// Access conditions of one sector: a 3-bit `c1 c2 c3` triple per block
/// group (`c1` in bit 2), plus the free user byte stored next to them.
/// Fields are named for the blocks each group governs on S50 / S70
/// sectors.
///
/// Data group triples select:
///
/// ```text
/// c1 c2 c3   read    write   increment   decrement/transfer/restore
/// 0  0  0    key a|b key a|b key a|b     key a|b
/// 0  1  0    key a|b -       -           -
/// 1  0  0    key a|b key b   -           -
/// 1  1  0    key a|b key b   key b       key a|b
/// 0  0  1    key a|b -       -           key a|b
/// 0  1  1    key b   key b   -           -
/// 1  0  1    key b   -       -           -
/// 1  1  1    -       -       -           -
/// ```
///
/// The trailer triple selects, per trailer field:
///
/// ```text
/// c1 c2 c3   keya_r keya_w access_r access_w keyb_r keyb_w
/// 0  0  0    -      a      a        -        a      a
/// 0  1  0    -      -      a        -        a      -
/// 1  0  0    -      b      a|b      -        -      b
/// 1  1  0    -      -      a|b      -        -      -
/// 0  0  1    -      a      a        a        a      a
/// 0  1  1    -      b      a|b      b        -      b
/// 1  0  1    -      -      a|b      b        -      -
/// 1  1  1    -      -      a|b      -        -      -
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorPermission {
    /// Data group 0: block 0, or blocks 0-4 of a 16-block sector.
    pub block_0_0_4: u8,
    /// Data group 1: block 1, or blocks 5-9.
    pub block_1_5_9: u8,
    /// Data group 2: block 2, or blocks 10-14.
    pub block_2_10_14: u8,
    /// The sector trailer itself: block 3, or block 15.
    pub block_3_15: u8,
    /// Free byte stored alongside the access bits.
    pub user_data: u8,
}

fn gather(permission: &SectorPermission, bit: u8) -> u8 {
    (((permission.block_3_15 >> bit) & 0x1) << 3)
        | (((permission.block_2_10_14 >> bit) & 0x1) << 2)
        | (((permission.block_1_5_9 >> bit) & 0x1) << 1)
        | ((permission.block_0_0_4 >> bit) & 0x1)
}

/// Pack the four permission groups into the trailer's access bytes
/// (trailer bytes 6..10). Each 4-bit part is stored together with its
/// complement so corruption is detectable.
pub fn pack_access_bits(permission: &SectorPermission) -> [u8; 4] {
    let part_1 = gather(permission, 2);
    let part_2 = gather(permission, 1);
    let part_3 = gather(permission, 0);
    [
        ((0xF ^ part_2) << 4) | (0xF ^ part_1),
        (part_1 << 4) | (0xF ^ part_3),
        (part_3 << 4) | part_2,
        permission.user_data,
    ]
}

/// Unpack the trailer's access bytes, verifying every `part + ~part`
/// complement pair.
pub fn unpack_access_bits(bits: &[u8; 4]) -> Result<SectorPermission, Error> {
    let part_2_r = bits[0] >> 4;
    let part_1_r = bits[0] & 0xF;
    let part_1 = bits[1] >> 4;
    let part_3_r = bits[1] & 0xF;
    let part_3 = bits[2] >> 4;
    let part_2 = bits[2] & 0xF;
    if part_1 + part_1_r != 0xF || part_2 + part_2_r != 0xF || part_3 + part_3_r != 0xF {
        return Err(Error::DataInvalid);
    }

    let group = |index: u8| {
        (((part_1 >> index) & 0x1) << 2)
            | (((part_2 >> index) & 0x1) << 1)
            | ((part_3 >> index) & 0x1)
    };
    Ok(SectorPermission {
        block_0_0_4: group(0),
        block_1_5_9: group(1),
        block_2_10_14: group(2),
        block_3_15: group(3),
        user_data: bits[3],
    })
}

/// Assemble a full sector trailer: key A, packed access bytes, key B.
pub fn trailer_block(key_a: [u8; 6], permission: &SectorPermission, key_b: [u8; 6]) -> [u8; 16] {
    let mut data = [0u8; 16];
    data[..6].copy_from_slice(&key_a);
    data[6..10].copy_from_slice(&pack_access_bits(permission));
    data[10..].copy_from_slice(&key_b);
    data
}

/// Split a trailer block read back from the card into its permission
/// groups and the key B bytes. Key A never reads back.
pub fn parse_trailer_block(data: &[u8; 16]) -> Result<(SectorPermission, [u8; 6]), Error> {
    let mut bits = [0u8; 4];
    bits.copy_from_slice(&data[6..10]);
    let permission = unpack_access_bits(&bits)?;
    let mut key_b = [0u8; 6];
    key_b.copy_from_slice(&data[10..]);
    Ok((permission, key_b))
}
