//! Persisted wake-cycle state.
//!
//! [`WakeState`] is the only data that must outlive a reboot: the device
//! re-enters a fresh execution context on every wake, and these counters are
//! all that carries the watering schedule across the gap.  The record lives
//! in RTC memory (see [`adapters::rtc_store`](crate::adapters::rtc_store)),
//! which survives deep-sleep resets but not a power failure — which is
//! exactly why the reset cause is derived from the hardware each boot rather
//! than trusted from a persisted flag.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Reset cause
// ───────────────────────────────────────────────────────────────

/// Why the device booted, derived fresh from the platform every wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetCause {
    /// Scheduled deep-sleep timer wake; persisted state is fully trusted.
    NormalWake,
    /// Any other reset — power-on, brown-out, manual reset, first boot.
    /// RTC memory cannot be trusted after these.
    PowerLoss,
    /// The platform reported a reason this firmware does not recognise.
    /// Treated identically to [`PowerLoss`](Self::PowerLoss) by the engine.
    Unknown,
}

impl ResetCause {
    /// Whether persisted counters may be trusted after this reset.
    pub fn is_trusted(self) -> bool {
        matches!(self, Self::NormalWake)
    }
}

impl core::fmt::Display for ResetCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NormalWake => write!(f, "normal wake"),
            Self::PowerLoss => write!(f, "power loss"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Wake-cycle state
// ───────────────────────────────────────────────────────────────

/// The persisted counters.  All values are in wake cycles.
///
/// Invariants (checked by [`in_bounds`](Self::in_bounds), re-established by
/// the decision engine at the end of every cycle):
/// - `pump_counter ≤ pump_period` and `nebulizer_counter ≤ nebulizer_period`
///   when the respective period is nonzero;
/// - a disabled schedule (period 0) keeps its counter pinned at 0;
/// - `postponement_remaining ≤ postponement_window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeState {
    /// Cycles elapsed since the pump last fired (or was last evaluated).
    pub pump_counter: u32,
    /// Cycles elapsed since the nebulizer last fired.
    pub nebulizer_counter: u32,
    /// Cycles consumed of the current pump deferral window; 0 when no
    /// deferral is active.
    pub postponement_remaining: u32,
}

impl WakeState {
    /// First-ever-boot state: all counters at zero.
    pub const fn zeroed() -> Self {
        Self {
            pump_counter: 0,
            nebulizer_counter: 0,
            postponement_remaining: 0,
        }
    }

    /// Safety defaults applied after a detected power loss.
    ///
    /// The pump is deferred by half its period (erring toward caution rather
    /// than watering immediately after an unexpected reset), while the
    /// nebulizer counter is set to its full period so it fires promptly on
    /// the first cycle after recovery.  Any in-progress deferral is
    /// abandoned.
    pub fn power_loss_defaults(config: &SystemConfig) -> Self {
        Self {
            pump_counter: config.pump_period_cycles / 2,
            nebulizer_counter: config.nebulizer_period_cycles,
            postponement_remaining: 0,
        }
    }

    /// Check the counter-bound invariants against the configured periods.
    /// A loaded record that fails this is treated as corrupt and replaced
    /// with [`power_loss_defaults`](Self::power_loss_defaults).
    pub fn in_bounds(&self, config: &SystemConfig) -> bool {
        let pump_ok = if config.pump_period_cycles == 0 {
            self.pump_counter == 0
        } else {
            self.pump_counter <= config.pump_period_cycles
        };
        let neb_ok = if config.nebulizer_period_cycles == 0 {
            self.nebulizer_counter == 0
        } else {
            self.nebulizer_counter <= config.nebulizer_period_cycles
        };
        pump_ok && neb_ok && self.postponement_remaining <= config.postponement_window_cycles
    }
}
