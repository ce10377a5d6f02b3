//! Power management — reset-cause derivation and deep sleep.
//!
//! The wake/sleep primitive is the scheduling backbone of the whole system:
//! the device reboots into a fresh execution context on every wake, so
//! "which kind of reset was this" is the one platform signal the decision
//! engine needs before it can trust the persisted counters.
//!
//! The cause is derived from the hardware-reported boot reason on every
//! boot, never from a persisted flag — a flag is exactly the kind of state
//! a power-loss event would corrupt.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use log::info;

use crate::app::state::ResetCause;

/// Longest single deep sleep the RTC timer can deliver (~3 h 45 m).  The
/// desired wake interval is capped to this; the schedule does not chain
/// sleeps, it simply continues on the next wake.  RTC clock drift of
/// several minutes per hour is expected and tolerated by the cycle-counting
/// design.
pub const MAX_SLEEP_SECS: u32 = 13_500;

pub struct PowerManager;

impl Default for PowerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerManager {
    pub fn new() -> Self {
        Self
    }

    /// Derive why the device booted.
    ///
    /// A deep-sleep timer wake is the only cause under which RTC memory is
    /// trusted.  Power-on, brown-out, watchdog, panic, and external resets
    /// all report [`ResetCause::PowerLoss`]; anything unrecognised reports
    /// [`ResetCause::Unknown`].
    #[cfg(target_os = "espidf")]
    pub fn determine_reset_cause(&self) -> ResetCause {
        // SAFETY: esp_reset_reason reads a boot-time register snapshot;
        // no preconditions.
        let reason = unsafe { esp_reset_reason() };
        match reason {
            esp_reset_reason_t_ESP_RST_DEEPSLEEP => ResetCause::NormalWake,
            esp_reset_reason_t_ESP_RST_POWERON
            | esp_reset_reason_t_ESP_RST_BROWNOUT
            | esp_reset_reason_t_ESP_RST_EXT
            | esp_reset_reason_t_ESP_RST_SW
            | esp_reset_reason_t_ESP_RST_PANIC
            | esp_reset_reason_t_ESP_RST_INT_WDT
            | esp_reset_reason_t_ESP_RST_TASK_WDT
            | esp_reset_reason_t_ESP_RST_WDT => ResetCause::PowerLoss,
            _ => ResetCause::Unknown,
        }
    }

    /// Derive why the device booted (host simulation: injected value).
    #[cfg(not(target_os = "espidf"))]
    pub fn determine_reset_cause(&self) -> ResetCause {
        sim::reset_cause()
    }

    /// Cap a desired sleep interval to what the platform can deliver in a
    /// single sleep.
    pub fn capped_sleep_secs(&self, desired_secs: u32) -> u32 {
        desired_secs.min(MAX_SLEEP_SECS)
    }

    /// Request a deep sleep of (at most) the capped duration.  Never
    /// returns on hardware; the process exits on host targets.
    #[cfg(target_os = "espidf")]
    pub fn deep_sleep(&self, desired_secs: u32) -> ! {
        let secs = self.capped_sleep_secs(desired_secs);
        info!("deep sleep: {} s", secs);
        // SAFETY: esp_deep_sleep powers down the core; it does not return.
        unsafe {
            esp_deep_sleep(u64::from(secs) * 1_000_000);
        }
        unreachable!("esp_deep_sleep returned");
    }

    /// Host simulation: log and exit in place of sleeping.
    #[cfg(not(target_os = "espidf"))]
    pub fn deep_sleep(&self, desired_secs: u32) -> ! {
        let secs = self.capped_sleep_secs(desired_secs);
        info!("deep sleep(sim): {} s — exiting", secs);
        std::process::exit(0);
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicU8, Ordering};

    use crate::app::state::ResetCause;

    // First boot on the host looks like a power-on, same as hardware.
    static SIM_RESET_CAUSE: AtomicU8 = AtomicU8::new(1);

    pub(super) fn reset_cause() -> ResetCause {
        match SIM_RESET_CAUSE.load(Ordering::Relaxed) {
            0 => ResetCause::NormalWake,
            1 => ResetCause::PowerLoss,
            _ => ResetCause::Unknown,
        }
    }

    pub(super) fn set_reset_cause(cause: ResetCause) {
        let v = match cause {
            ResetCause::NormalWake => 0,
            ResetCause::PowerLoss => 1,
            ResetCause::Unknown => 2,
        };
        SIM_RESET_CAUSE.store(v, Ordering::Relaxed);
    }
}

/// Inject the cause reported by [`PowerManager::determine_reset_cause`].
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_reset_cause(cause: ResetCause) {
    sim::set_reset_cause(cause);
}
