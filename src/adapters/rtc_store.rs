//! RTC-memory state store adapter.
//!
//! Implements [`StatePort`] on top of a small fixed-size record in RTC fast
//! memory — the only RAM that survives a deep-sleep reset.  It does *not*
//! survive a power failure, and that is fine: the reset cause tells the
//! engine when to distrust it.
//!
//! ## Record layout & torn-write handling
//!
//! ```text
//! [ magic: u32 LE ][ postcard(WakeState) ][ zero padding ]
//! ```
//!
//! `save` invalidates the magic, writes the payload, then writes the magic
//! **last** — so a power cut mid-write leaves a record that fails the magic
//! check and is reported as [`ResetCause::PowerLoss`].  A reader therefore
//! observes either the fully-prior record or an invalid one, never a
//! half-written record presented as valid.
//!
//! # Dual-target design
//!
//! On ESP-IDF the record lives in a `.rtc.data` static (initialised only at
//! power-on, preserved across deep sleep).  On host the buffer lives inside
//! the adapter so tests can thread one instance through simulated wakes.

use log::info;

use crate::app::ports::StatePort;
use crate::app::state::{ResetCause, WakeState};
use crate::error::StateStoreError;

const RECORD_MAGIC: u32 = 0x5665_7231; // "Ver1"
const MAGIC_LEN: usize = 4;
/// Magic word plus the postcard encoding of three u32 counters (≤ 5 bytes
/// each as varints), rounded up.
const RECORD_LEN: usize = 24;

#[cfg(target_os = "espidf")]
#[unsafe(link_section = ".rtc.data")]
static mut RTC_RECORD: [u8; RECORD_LEN] = [0; RECORD_LEN];

pub struct RtcStateStore {
    /// Hardware-derived cause for this boot, captured once at construction.
    cause: ResetCause,
    #[cfg(not(target_os = "espidf"))]
    buf: [u8; RECORD_LEN],
}

impl RtcStateStore {
    pub fn new(cause: ResetCause) -> Self {
        Self {
            cause,
            #[cfg(not(target_os = "espidf"))]
            buf: [0; RECORD_LEN],
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_record(&self) -> [u8; RECORD_LEN] {
        // SAFETY: the record is only touched from the single wake-cycle
        // task; load() and save() never run concurrently.
        unsafe { *(&raw const RTC_RECORD) }
    }

    #[cfg(target_os = "espidf")]
    fn write_record(&mut self, buf: [u8; RECORD_LEN]) {
        // SAFETY: see read_record — single-task access only.
        unsafe {
            *(&raw mut RTC_RECORD) = buf;
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_record(&self) -> [u8; RECORD_LEN] {
        self.buf
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_record(&mut self, buf: [u8; RECORD_LEN]) {
        self.buf = buf;
    }

    fn decode(buf: &[u8; RECORD_LEN]) -> Option<WakeState> {
        let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if magic != RECORD_MAGIC {
            return None;
        }
        postcard::from_bytes(&buf[MAGIC_LEN..]).ok()
    }

    /// Flip payload bytes so the next load sees a torn record.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_corrupt_record(&mut self) {
        for b in &mut self.buf[MAGIC_LEN..] {
            *b = !*b;
        }
        // A real torn write would most likely also leave the magic invalid,
        // but keep it intact here: decode failure alone must be enough.
    }

    /// Replace the boot cause (next load reports this one).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_reset_cause(&mut self, cause: ResetCause) {
        self.cause = cause;
    }
}

impl StatePort for RtcStateStore {
    fn load(&mut self) -> (WakeState, ResetCause) {
        let buf = self.read_record();
        match Self::decode(&buf) {
            Some(state) => (state, self.cause),
            None => {
                // First boot, torn write, or garbage after a power cut —
                // indistinguishable, and all handled the same way.
                info!("no valid RTC record, reporting power loss");
                (WakeState::zeroed(), ResetCause::PowerLoss)
            }
        }
    }

    fn save(&mut self, state: &WakeState) -> Result<(), StateStoreError> {
        let mut buf = self.read_record();

        // Invalidate first: if power is cut between here and the final
        // magic write, the next boot sees an invalid record, not a torn one.
        buf[..MAGIC_LEN].copy_from_slice(&0u32.to_le_bytes());
        buf[MAGIC_LEN..].fill(0);

        let used = postcard::to_slice(state, &mut buf[MAGIC_LEN..])
            .map_err(|_| StateStoreError::EncodeFailed)?
            .len();
        if MAGIC_LEN + used > RECORD_LEN {
            return Err(StateStoreError::RecordTooLarge);
        }

        buf[..MAGIC_LEN].copy_from_slice(&RECORD_MAGIC.to_le_bytes());
        self.write_record(buf);
        Ok(())
    }
}
