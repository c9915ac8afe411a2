use thiserror::Error;

/// Everything that can go wrong between the driver and a card.
///
/// Transport faults come from the [`Transceiver`](crate::Transceiver)
/// port; the remaining variants are protocol-level validation failures
/// detected by the driver itself. The driver never retries on its own
/// (the `search` polling loop excepted), so every variant surfaces to
/// the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The contactless front-end reported a transport failure.
    #[error("contactless transceiver failed")]
    ContactlessFailed,

    /// A response had a length other than the one the command defines.
    #[error("response length {got}, expected {expected}")]
    OutputLenInvalid { expected: u8, got: u8 },

    /// The CRC_A trailing a response did not match its payload.
    #[error("response crc mismatch")]
    Crc,

    /// The anticollision block check character is not the XOR of the UID.
    #[error("anticollision bcc mismatch")]
    BccCheck,

    /// SELECT acknowledged with something other than the S50/S70 SAK.
    #[error("unexpected sak {0:#04x}")]
    Sak(u8),

    /// The ATQA does not identify an S50 or S70 card.
    #[error("card type is invalid")]
    TypeInvalid,

    /// An acknowledgement nibble other than ACK (0xA) came back.
    #[error("ack nibble {0:#03x}")]
    Ack(u8),

    /// The card refused an increment/decrement/transfer/restore with
    /// NAK 0x4; the sector's access bits most likely forbid it.
    #[error("operation refused by the card")]
    InvalidOperation,

    /// The numeric redundancy of a value block did not hold.
    #[error("value block value mismatch")]
    ValueInvalid,

    /// The address quartet of a value block did not hold.
    #[error("value block address mismatch")]
    BlockInvalid,

    /// A sector trailer's access bits failed their nibble-complement
    /// check.
    #[error("access bits redundancy mismatch")]
    DataInvalid,

    /// `search` exhausted its retry budget without activating a card.
    #[error("no card answered within the retry budget")]
    Timeout,

    /// The addressed block is a sector trailer, which the data
    /// operations refuse to touch.
    #[error("block {0} is a sector trailer")]
    TrailerBlock(u8),
}
