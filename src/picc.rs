//! Activation layer: REQA/WUPA, the anticollision/select cascade and
//! HALT.

use crate::consts::{self, CardType};
use crate::error::Error;
use crate::frame;
use crate::{MifareClassic, Transceiver};

impl<T: Transceiver> MifareClassic<T> {
    /// REQA: probe for a card in the field and learn its family from the
    /// ATQA. Halted cards do not answer; use
    /// [`wake_up`](MifareClassic::wake_up) for those.
    pub fn request(&mut self) -> Result<CardType, Error> {
        self.request_or_wake(consts::REQA)
    }

    /// WUPA: like [`request`](MifareClassic::request), but also returns
    /// halted cards to the READY state.
    pub fn wake_up(&mut self) -> Result<CardType, Error> {
        self.request_or_wake(consts::WUPA)
    }

    fn request_or_wake(&mut self, command: u8) -> Result<CardType, Error> {
        // re-activation invalidates whatever was authenticated
        self.authenticated_sector = None;

        let mut atqa = [0u8; 2];
        self.transceive_expect(&[command], &mut atqa, 2)?;

        let card_type = CardType::from_atqa(atqa);
        self.card_type = card_type;
        if card_type == CardType::Invalid {
            self.note("type is invalid");
            return Err(Error::TypeInvalid);
        }
        Ok(card_type)
    }

    /// Cascade level 1 anticollision: returns the 4-byte UID after the
    /// BCC check.
    pub fn anticollision_cl1(&mut self) -> Result<[u8; 4], Error> {
        self.anticollision(consts::ANTICOLLISION_CL1)
    }

    /// Cascade level 2 anticollision. The S50/S70 flows complete at
    /// cascade level 1; this is the second stage of the standard cascade
    /// for fronts that need it.
    pub fn anticollision_cl2(&mut self) -> Result<[u8; 4], Error> {
        self.anticollision(consts::ANTICOLLISION_CL2)
    }

    fn anticollision(&mut self, command: [u8; 2]) -> Result<[u8; 4], Error> {
        let mut resp = [0u8; 5];
        self.transceive_expect(&command, &mut resp, 5)?;
        match frame::parse_uid(&resp) {
            Ok(uid) => Ok(uid),
            Err(e) => {
                self.note("bcc check error");
                Err(e)
            }
        }
    }

    /// Complete cascade level 1 with the UID returned by anticollision.
    pub fn select_cl1(&mut self, uid: [u8; 4]) -> Result<(), Error> {
        self.select(consts::SELECT_CL1, uid)
    }

    /// Complete cascade level 2.
    pub fn select_cl2(&mut self, uid: [u8; 4]) -> Result<(), Error> {
        self.select(consts::SELECT_CL2, uid)
    }

    fn select(&mut self, command: [u8; 2], uid: [u8; 4]) -> Result<(), Error> {
        let tx = frame::select(command, uid);
        let mut sak = [0u8; 1];
        self.transceive_expect(&tx, &mut sak, 1)?;
        match frame::check_sak(sak[0]) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.note("sak error");
                Err(e)
            }
        }
    }

    /// Send HALT. The card does not answer a well-received HALT, so the
    /// transceiver result is deliberately ignored; the session state is
    /// cleared either way.
    pub fn halt(&mut self) -> Result<(), Error> {
        let tx = frame::halt();
        self.transceive_ignore(&tx);
        self.authenticated_sector = None;
        Ok(())
    }
}
