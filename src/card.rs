//! Card-centric operations: polling for a card, then data and value
//! access that authenticates on every call with the UID cached by
//! [`search`](MifareClassic::search).
//!
//! Every data operation runs the trailer guard first: sector trailers
//! hold keys and access bits, not data, and are reachable only through
//! [`set_sector_permission`](MifareClassic::set_sector_permission) /
//! [`get_sector_permission`](MifareClassic::get_sector_permission).

use crate::consts::{CardType, Key, Timeout};
use crate::error::Error;
use crate::sector::{self, SectorPermission};
use crate::{MifareClassic, Transceiver};

impl<T: Transceiver> MifareClassic<T> {
    /// Poll for a card: request, anticollision, select, then cache the
    /// UID for the authenticated operations.
    ///
    /// `Timeout::Ticks(n)` makes up to n activation rounds with
    /// `search_retry_delay_ms` between them; `Ticks(0)` reports
    /// [`Error::Timeout`] without touching the field.
    pub fn search(&mut self, timeout: Timeout) -> Result<(CardType, [u8; 4]), Error> {
        let mut remaining = timeout;
        loop {
            if remaining == Timeout::Ticks(0) {
                return Err(Error::Timeout);
            }
            if let Ok(found) = self.activate() {
                return Ok(found);
            }

            let gap = self.config.search_retry_delay_ms;
            self.delay_ms(gap);
            if let Timeout::Ticks(ticks) = remaining {
                remaining = Timeout::Ticks(ticks - 1);
            }
        }
    }

    fn activate(&mut self) -> Result<(CardType, [u8; 4]), Error> {
        let card_type = self.request()?;
        let uid = self.anticollision_cl1()?;
        self.select_cl1(uid)?;
        self.uid = uid;
        Ok((card_type, uid))
    }

    /// Authenticated single-block read.
    pub fn read(&mut self, block: u8, key: &Key) -> Result<[u8; 16], Error> {
        self.data_block_auth(block, key)?;
        self.mifare_read(block)
    }

    /// Authenticated single-block write.
    pub fn write(&mut self, block: u8, data: &[u8; 16], key: &Key) -> Result<(), Error> {
        self.data_block_auth(block, key)?;
        self.mifare_write(block, data)
    }

    /// Format `block` as a value block holding `value`, tagged with
    /// `addr`.
    pub fn value_init(&mut self, block: u8, value: i32, addr: u8, key: &Key) -> Result<(), Error> {
        self.data_block_auth(block, key)?;
        self.mifare_write(block, &sector::value_block(value, addr))
    }

    /// Overwrite a value block. Same wire traffic as
    /// [`value_init`](MifareClassic::value_init); kept separate so intent
    /// reads at the call site.
    pub fn value_write(&mut self, block: u8, value: i32, addr: u8, key: &Key) -> Result<(), Error> {
        self.data_block_auth(block, key)?;
        self.mifare_write(block, &sector::value_block(value, addr))
    }

    /// Read a value block back as `(value, addr)`.
    pub fn value_read(&mut self, block: u8, key: &Key) -> Result<(i32, u8), Error> {
        self.data_block_auth(block, key)?;
        let data = self.mifare_read(block)?;
        match sector::parse_value_block(&data) {
            Ok(decoded) => Ok(decoded),
            Err(e) => {
                self.note("value block check failed");
                Err(e)
            }
        }
    }

    /// Add `delta` to a value block and commit: the TRANSFER back to the
    /// block is chained automatically.
    pub fn value_increment(&mut self, block: u8, delta: u32, key: &Key) -> Result<(), Error> {
        self.data_block_auth(block, key)?;
        self.mifare_increment(block, delta)?;
        self.mifare_transfer(block)
    }

    /// Subtract `delta` from a value block and commit.
    pub fn value_decrement(&mut self, block: u8, delta: u32, key: &Key) -> Result<(), Error> {
        self.data_block_auth(block, key)?;
        self.mifare_decrement(block, delta)?;
        self.mifare_transfer(block)
    }

    /// Rewrite a sector trailer: key A, the packed access bits and user
    /// byte, key B. `auth_key` must be allowed to write the trailer under
    /// its current access conditions.
    pub fn set_sector_permission(
        &mut self,
        sector_index: u8,
        auth_key: &Key,
        key_a: [u8; 6],
        permission: &SectorPermission,
        key_b: [u8; 6],
    ) -> Result<(), Error> {
        let trailer = sector::sector_last_block(sector_index);
        let uid = self.uid;
        self.authenticate(uid, trailer, auth_key)?;
        self.mifare_write(trailer, &sector::trailer_block(key_a, permission, key_b))
    }

    /// Read a sector trailer back as its permission groups and the key B
    /// bytes. Key A never reads back; key B reads as zeros when its
    /// access conditions hide it.
    pub fn get_sector_permission(
        &mut self,
        sector_index: u8,
        auth_key: &Key,
    ) -> Result<(SectorPermission, [u8; 6]), Error> {
        let trailer = sector::sector_last_block(sector_index);
        let uid = self.uid;
        self.authenticate(uid, trailer, auth_key)?;
        let data = self.mifare_read(trailer)?;
        match sector::parse_trailer_block(&data) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                self.note("data is invalid");
                Err(e)
            }
        }
    }

    /// Trailer guard plus authentication for the data-block operations.
    /// Runs before any frame goes out, so a guarded call leaves no wire
    /// traffic behind.
    fn data_block_auth(&mut self, block: u8, key: &Key) -> Result<(), Error> {
        if sector::is_trailer(block) {
            self.note("block is a sector trailer");
            return Err(Error::TrailerBlock(block));
        }
        let uid = self.uid;
        self.authenticate(uid, block, key)
    }
}
