//! System configuration parameters
//!
//! All tunable parameters for the Verdant garden system.  The configuration
//! is constructed once at boot, range-checked, and never mutated for the
//! operational life of the device — the decision engine receives it by
//! value and treats it as immutable.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Core system configuration
///
/// Schedule periods are counted in wake cycles (one cycle ≈ one hour of
/// deep sleep).  A period of 0 disables that actuator's schedule entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Schedules (wake cycles) ---
    /// Cycles between pump eligibility checks (144 ≈ 6 days of hourly wakes)
    pub pump_period_cycles: u32,
    /// Cycles between nebulizer firings
    pub nebulizer_period_cycles: u32,
    /// Maximum cycles a pump trigger may be deferred while the soil stays
    /// acceptably moist (120 ≈ 5 days)
    pub postponement_window_cycles: u32,

    // --- Humidity ---
    /// Moisture percentage below which the pump is eligible to fire
    pub humidity_threshold_pct: f32,

    // --- Actuation ---
    /// Pump relay ON time per activation (seconds)
    pub pump_duration_secs: u16,
    /// Number of pump activations per firing session
    pub pump_repeats: u8,
    /// Pause between pump activations in a session (seconds)
    pub pump_inter_pause_secs: u16,
    /// Nebulizer relay ON time, single activation (seconds)
    pub nebulizer_duration_secs: u16,

    // --- Moisture sensing ---
    /// ADC samples averaged per moisture reading
    pub moisture_samples: u16,
    /// Raw ADC value at 100 % moisture (sensor fully saturated)
    pub moisture_raw_at_full: u16,
    /// Raw ADC value at the threshold percentage (minimum acceptable)
    pub moisture_raw_at_threshold: u16,

    // --- Sleep ---
    /// Desired interval between wakes (seconds); capped to the platform's
    /// maximum single-sleep duration at request time
    pub wake_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Schedules
            pump_period_cycles: 6 * 24,      // every ~6 days
            nebulizer_period_cycles: 12,     // every ~12 hours
            postponement_window_cycles: 5 * 24,

            // Humidity
            humidity_threshold_pct: 60.0,

            // Actuation
            pump_duration_secs: 7,
            pump_repeats: 2,
            pump_inter_pause_secs: 5 * 60,
            nebulizer_duration_secs: 135, // 2 min 15 s

            // Moisture sensing
            moisture_samples: 100,
            moisture_raw_at_full: 297,
            moisture_raw_at_threshold: 378,

            // Sleep
            wake_interval_secs: 3600,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Called once at boot; a device must never
    /// start actuating with out-of-range parameters.
    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=100.0).contains(&self.humidity_threshold_pct) {
            return Err(Error::Config("humidity_threshold_pct must be 0–100"));
        }
        if self.pump_duration_secs > 900 {
            return Err(Error::Config("pump_duration_secs must be ≤ 900"));
        }
        if self.nebulizer_duration_secs > 900 {
            return Err(Error::Config("nebulizer_duration_secs must be ≤ 900"));
        }
        if self.pump_repeats == 0 {
            return Err(Error::Config("pump_repeats must be ≥ 1"));
        }
        if self.moisture_samples == 0 {
            return Err(Error::Config("moisture_samples must be ≥ 1"));
        }
        if self.moisture_raw_at_full == self.moisture_raw_at_threshold {
            return Err(Error::Config(
                "moisture calibration points must be distinct",
            ));
        }
        if self.wake_interval_secs < 60 {
            return Err(Error::Config("wake_interval_secs must be ≥ 60"));
        }
        Ok(())
    }
}
