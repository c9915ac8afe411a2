//! Command bytes and wire-level types for ISO/IEC 14443-3 Type A and the
//! MIFARE Classic command set (MF1S503x/MF1S703x section 9).

/// REQuest command, Type A. Short frame, no CRC; answered with the ATQA.
pub const REQA: u8 = 0x26;
/// Wake-UP command, Type A. Like REQA but also answered by halted cards.
pub const WUPA: u8 = 0x52;
/// Anticollision, cascade level 1.
pub const ANTICOLLISION_CL1: [u8; 2] = [0x93, 0x20];
/// Select, cascade level 1.
pub const SELECT_CL1: [u8; 2] = [0x93, 0x70];
/// Anticollision, cascade level 2.
pub const ANTICOLLISION_CL2: [u8; 2] = [0x95, 0x20];
/// Select, cascade level 2.
pub const SELECT_CL2: [u8; 2] = [0x95, 0x70];
/// HaLT command, Type A. The card does not answer.
pub const HALT: [u8; 2] = [0x50, 0x00];
/// Authenticate with key A. Framed by the front-end under Crypto1.
pub const AUTH_KEY_A: u8 = 0x60;
/// Authenticate with key B.
pub const AUTH_KEY_B: u8 = 0x61;
/// Personalize the UID usage. One-time card configuration.
pub const PERSONALIZE_UID: u8 = 0x40;
/// Select the load modulation strength.
pub const SET_MOD_TYPE: u8 = 0x43;
/// Read one 16-byte block.
pub const READ: u8 = 0x30;
/// Write one 16-byte block, two-phase.
pub const WRITE: u8 = 0xA0;
/// Subtract an operand from a value block into the card register.
pub const DECREMENT: u8 = 0xC0;
/// Add an operand to a value block into the card register.
pub const INCREMENT: u8 = 0xC1;
/// Load a value block into the card register.
pub const RESTORE: u8 = 0xC2;
/// Commit the card register to a block.
pub const TRANSFER: u8 = 0xB0;

/// The 4-bit positive acknowledge.
pub const ACK: u8 = 0xA;
/// NAK meaning the operation is not permitted by the access conditions.
pub const NAK_INVALID_OPERATION: u8 = 0x4;

/// SAK of an S50 (1K) card with its 4-byte UID complete.
pub const SAK_S50: u8 = 0x08;
/// SAK of an S70 (4K) card.
pub const SAK_S70: u8 = 0x18;

/// Card family, learned from the ATQA returned to REQA/WUPA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardType {
    /// The ATQA matched neither family.
    #[default]
    Invalid,
    /// MIFARE Classic 1K: 16 sectors of 4 blocks.
    S50,
    /// MIFARE Classic 4K: the S50 layout plus 8 sectors of 16 blocks.
    S70,
}

impl CardType {
    pub fn from_atqa(atqa: [u8; 2]) -> Self {
        match atqa {
            [0x04, 0x00] => CardType::S50,
            [0x02, 0x00] => CardType::S70,
            _ => CardType::Invalid,
        }
    }
}

/// A six-byte sector key together with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    A([u8; 6]),
    B([u8; 6]),
}

impl Key {
    /// The authentication command byte for this key kind.
    pub fn command(&self) -> u8 {
        match self {
            Key::A(_) => AUTH_KEY_A,
            Key::B(_) => AUTH_KEY_B,
        }
    }

    pub fn bytes(&self) -> &[u8; 6] {
        match self {
            Key::A(bytes) | Key::B(bytes) => bytes,
        }
    }
}

/// Retry budget for [`search`](crate::MifareClassic::search).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Poll until a card answers.
    Unbounded,
    /// Give up after this many activation rounds. `Ticks(0)` fails
    /// without touching the field.
    Ticks(u32),
}

/// Load modulation strength selected by SET_MOD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadModulation {
    Normal = 0x00,
    Strong = 0x01,
}

/// UID usage installed by PERSONALIZE_UID (MF1S503x section 10.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonalizedUid {
    /// Anticollision and selection with the double-size UID.
    Uid0 = 0x00,
    /// Double-size UID with the optional selection shortcut.
    Uid1 = 0x40,
    /// Single-size random ID.
    Uid2 = 0x20,
    /// Single-size NUID calculated out of the 7-byte UID.
    Uid3 = 0x60,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_type_from_atqa() {
        assert_eq!(CardType::from_atqa([0x04, 0x00]), CardType::S50);
        assert_eq!(CardType::from_atqa([0x02, 0x00]), CardType::S70);
        assert_eq!(CardType::from_atqa([0x44, 0x00]), CardType::Invalid);
        assert_eq!(CardType::from_atqa([0x00, 0x04]), CardType::Invalid);
    }

    #[test]
    fn key_kinds() {
        let key = Key::A([1, 2, 3, 4, 5, 6]);
        assert_eq!(key.command(), AUTH_KEY_A);
        assert_eq!(key.bytes(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(Key::B([0; 6]).command(), AUTH_KEY_B);
    }
}
