//! MIFARE Classic (S50/S70) card driver over an abstract ISO/IEC 14443-3
//! Type A transceiver.
//!
//! The RF front-end (an MFRC522-class reader, typically) owns bit timing,
//! anticollision framing and the Crypto1 authentication pass; this crate
//! owns everything above it: the bit-exact command frames and their CRC_A,
//! the request/anticollision/select activation cascade, the authenticated
//! session, and the sector-level encodings (value blocks, trailer access
//! bits) of both card layouts.
//!
//! The driver talks to the front-end through the [`Transceiver`]
//! capability trait and is strictly synchronous: a handle drives exactly
//! one card, every exchange blocks the caller, and responses bind to the
//! immediately preceding request. Share a handle across threads only
//! behind external mutual exclusion.
//!
//! ```ignore
//! let mut card = MifareClassic::init(reader, Config::default())?;
//! let (card_type, uid) = card.search(Timeout::Ticks(25))?;
//! log::info!("found {card_type:?}, uid {}", hex::encode(uid));
//!
//! let key = Key::A([0xFF; 6]);
//! let data = card.read(1, &key)?;
//! card.value_init(5, 100, 5, &key)?;
//! card.value_decrement(5, 30, &key)?;
//! assert_eq!(card.value_read(5, &key)?, (70, 5));
//! card.halt()?;
//! ```

pub mod consts;
pub mod crc;
pub mod frame;
pub mod sector;

mod card;
mod error;
mod mifare;
mod picc;

pub use consts::{CardType, Key, LoadModulation, PersonalizedUid, Timeout};
pub use error::Error;
pub use sector::SectorPermission;

/// Capability bundle for the RF front-end.
///
/// Implementations map their transport failures to
/// [`Error::ContactlessFailed`]; the driver treats any error from
/// [`transceive`](Transceiver::transceive) as the card going away.
pub trait Transceiver {
    /// Bring the front-end up.
    fn init(&mut self) -> Result<(), Error>;

    /// Release the front-end.
    fn deinit(&mut self) -> Result<(), Error>;

    /// Exchange one frame. `rx.len()` is the receive capacity; the
    /// implementation returns how many bytes the card answered with.
    /// Partial 4-bit ACK/NAK responses are delivered as a single byte
    /// holding the nibble in its low half.
    fn transceive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<usize, Error>;

    /// Block the caller for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Driver configuration, taken at handle construction.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gap between activation rounds inside
    /// [`search`](MifareClassic::search). The 200 ms default polls at
    /// 5 Hz.
    pub search_retry_delay_ms: u32,
    /// Emit `log::debug!` frame traces and failure notes.
    pub debug_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_retry_delay_ms: 200,
            debug_enabled: true,
        }
    }
}

/// One contactless card handle: the transceiver port plus the session
/// state of the currently activated card.
///
/// The session state is the card type learned by the last REQA/WUPA, the
/// UID cached by the last successful [`search`](MifareClassic::search)
/// (the authenticated operations feed it into AUTH), and the sector the
/// card currently holds an authentication for. Authentication is
/// sector-scoped on the card: authenticating anywhere replaces whatever
/// sector was authenticated before.
pub struct MifareClassic<T: Transceiver> {
    transceiver: T,
    config: Config,
    card_type: CardType,
    uid: [u8; 4],
    authenticated_sector: Option<u8>,
}

impl<T: Transceiver> MifareClassic<T> {
    /// Bind the transceiver and bring the front-end up.
    pub fn init(mut transceiver: T, config: Config) -> Result<Self, Error> {
        transceiver.init()?;
        Ok(Self {
            transceiver,
            config,
            card_type: CardType::Invalid,
            uid: [0; 4],
            authenticated_sector: None,
        })
    }

    /// Shut the front-end down and hand the transceiver back.
    pub fn deinit(mut self) -> Result<T, Error> {
        self.transceiver.deinit()?;
        Ok(self.transceiver)
    }

    /// Card family learned by the last [`request`](MifareClassic::request)
    /// or [`wake_up`](MifareClassic::wake_up).
    pub fn card_type(&self) -> CardType {
        self.card_type
    }

    /// UID cached by the last successful [`search`](MifareClassic::search).
    pub fn uid(&self) -> [u8; 4] {
        self.uid
    }

    /// Sector the card holds an authentication for, if any.
    pub fn authenticated_sector(&self) -> Option<u8> {
        self.authenticated_sector
    }

    /// Exchange one frame, tracing it when enabled. A transport fault
    /// tears the session down: the card is gone or out of sync.
    pub(crate) fn transceive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<usize, Error> {
        if self.config.debug_enabled {
            log::debug!("tx {}", hex::encode(tx));
        }
        let n = match self.transceiver.transceive(tx, rx) {
            Ok(n) => n,
            Err(e) => {
                self.authenticated_sector = None;
                self.note("contactless transceiver failed");
                return Err(e);
            }
        };
        if self.config.debug_enabled {
            log::debug!("rx {}", hex::encode(&rx[..n]));
        }
        Ok(n)
    }

    /// Exchange `tx` and require exactly `expected` response bytes.
    pub(crate) fn transceive_expect(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        expected: usize,
    ) -> Result<(), Error> {
        let n = self.transceive(tx, rx)?;
        if n != expected {
            self.note("output_len is invalid");
            return Err(Error::OutputLenInvalid {
                expected: expected as u8,
                got: n as u8,
            });
        }
        Ok(())
    }

    /// Exchange `tx` and discard whatever comes back. HALT and the
    /// arithmetic phase 2 have no confirmed response.
    pub(crate) fn transceive_ignore(&mut self, tx: &[u8]) {
        let mut sink = [0u8; 1];
        let _ = self.transceive(tx, &mut sink);
    }

    pub(crate) fn delay_ms(&mut self, ms: u32) {
        self.transceiver.delay_ms(ms);
    }

    pub(crate) fn note(&self, message: &str) {
        if self.config.debug_enabled {
            log::debug!("{message}");
        }
    }
}
