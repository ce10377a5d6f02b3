//! Relay actuator driver.
//!
//! Timed, repeated trigger sequences on a single relay-driven device (pump
//! or nebulizer bank).  The relay modules are low-level triggered: the line
//! idles HIGH and energising means driving it LOW.
//!
//! ## Safety contract
//!
//! The line must never be left at the active level when a sequence exits,
//! whatever the exit path.  Every energisation is scoped through an
//! [`IdleGuard`] whose `Drop` restores the idle level, so an error (or a
//! panic unwind) part-way through a sequence still de-energises the relay.
//!
//! There is no feedback sensing of actual water delivery; sequences are
//! fire-and-forget.

use embedded_hal::delay::DelayNs;
use log::{debug, error};

use crate::drivers::hw_init;
use crate::error::ActuatorError;

pub struct RelayDriver {
    gpio: i32,
    active_low: bool,
}

/// Scoped energisation.  Dropping the guard drives the line back to idle,
/// retrying once; a restore that still fails is logged — there is nothing
/// further a driver with no feedback path can do.
struct IdleGuard<'a> {
    relay: &'a RelayDriver,
}

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        if self.relay.write(false).is_err() && self.relay.write(false).is_err() {
            error!(
                "relay gpio{}: failed to restore idle level",
                self.relay.gpio
            );
        }
    }
}

impl RelayDriver {
    /// Construct the driver and drive the line to idle.  A failed initial
    /// write is ignored — the board pull-up holds the idle level until the
    /// first successful write.
    pub fn new(gpio: i32, active_low: bool) -> Self {
        let relay = Self { gpio, active_low };
        let _ = relay.write(false);
        relay
    }

    /// Drive the relay active for `duration_secs`, idle for
    /// `inter_pause_secs`, `repeats` times, ending idle.
    ///
    /// Blocks the (single) thread for the whole sequence; nothing else runs
    /// during a wake cycle.  A GPIO failure aborts the remainder of the
    /// sequence after the idle level has been restored.
    pub fn run_sequence(
        &mut self,
        duration_secs: u16,
        repeats: u8,
        inter_pause_secs: u16,
        delay: &mut impl DelayNs,
    ) -> Result<(), ActuatorError> {
        let repeats = repeats.max(1);
        debug!(
            "relay gpio{}: sequence {}x {}s (pause {}s)",
            self.gpio, repeats, duration_secs, inter_pause_secs
        );
        for n in 0..repeats {
            {
                let _on = self.energise()?;
                delay.delay_ms(u32::from(duration_secs) * 1000);
                // _on drops here and restores idle
            }
            if n + 1 < repeats {
                delay.delay_ms(u32::from(inter_pause_secs) * 1000);
            }
        }
        Ok(())
    }

    fn energise(&self) -> Result<IdleGuard<'_>, ActuatorError> {
        // Guard is armed before the write: if the write fails after
        // partially applying, the drop path still forces idle.
        let guard = IdleGuard { relay: self };
        self.write(true)?;
        Ok(guard)
    }

    fn write(&self, energised: bool) -> Result<(), ActuatorError> {
        let high = if self.active_low {
            !energised
        } else {
            energised
        };
        hw_init::gpio_write(self.gpio, high)
    }
}
