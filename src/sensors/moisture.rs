//! Capacitive soil-moisture sensor driver.
//!
//! Reads the analog voltage output through an ADC1 channel, averages a
//! configurable number of samples, and applies a two-point linear
//! calibration to produce a moisture percentage.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the moisture ADC channel via the oneshot API
//! (initialised by hw_init).  On host/test: reads from a static `AtomicU16`
//! for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use log::warn;
use serde::{Deserialize, Serialize};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::SensorError;

#[cfg(not(target_os = "espidf"))]
static SIM_MOISTURE_ADC: AtomicU16 = AtomicU16::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_MOISTURE_FAIL: AtomicBool = AtomicBool::new(false);

/// Inject the raw ADC value returned by every simulated sample.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_moisture_adc(raw: u16) {
    SIM_MOISTURE_ADC.store(raw, Ordering::Relaxed);
}

/// Make every simulated sample fail until cleared.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_moisture_fail(fail: bool) {
    SIM_MOISTURE_FAIL.store(fail, Ordering::Relaxed);
}

// ───────────────────────────────────────────────────────────────
// Calibration (two-point linear map)
// ───────────────────────────────────────────────────────────────

/// Two-point calibration: the raw reading when the sensor is fully
/// saturated (100 %) and the raw reading at the minimum-acceptable
/// moisture percentage.
///
/// The raw value *decreases* as moisture increases with this sensor, so the
/// derived slope is negative — but the sign is computed from the points, not
/// assumed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Calibration {
    pub raw_at_full: u16,
    pub raw_at_threshold: u16,
    pub threshold_pct: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            raw_at_full: 297,
            raw_at_threshold: 378,
            threshold_pct: 60.0,
        }
    }
}

impl Calibration {
    /// Map a raw ADC value to a moisture percentage, clamped to `[0, 100]`.
    ///
    /// Total over the full ADC input range: out-of-range readings (sensor
    /// disconnected, probe out of soil) clamp rather than fault.
    pub fn moisture_percent(&self, raw: u16) -> f32 {
        let run = f32::from(self.raw_at_full) - f32::from(self.raw_at_threshold);
        if run == 0.0 {
            // Degenerate calibration; validated out at boot, but stay total.
            return self.threshold_pct.clamp(0.0, 100.0);
        }
        let slope = (100.0 - self.threshold_pct) / run;
        let intercept = self.threshold_pct - f32::from(self.raw_at_threshold) * slope;
        (slope * f32::from(raw) + intercept).clamp(0.0, 100.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor driver
// ───────────────────────────────────────────────────────────────

/// One averaged moisture reading: the mean raw sample and its calibrated
/// percentage.  Transient — produced fresh each wake cycle, never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoistureReading {
    pub raw: u16,
    pub percent: f32,
}

pub struct MoistureSensor {
    cal: Calibration,
    samples: u16,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    adc_channel: u32,
}

impl MoistureSensor {
    pub fn new(adc_channel: u32, cal: Calibration, samples: u16) -> Self {
        Self {
            cal,
            samples: samples.max(1),
            adc_channel,
        }
    }

    /// Average `samples` raw reads and calibrate.
    ///
    /// Individual ADC failures skip that sample.  If every sample fails, the
    /// reading falls back to the dry calibration point — biasing the system
    /// toward watering, the safe failure direction for a plant.
    pub fn read(&mut self) -> MoistureReading {
        let mut sum: u32 = 0;
        let mut good: u32 = 0;
        for _ in 0..self.samples {
            if let Ok(raw) = self.read_adc() {
                sum += u32::from(raw);
                good += 1;
            }
        }

        let raw = if good == 0 {
            warn!(
                "moisture: all {} samples failed, falling back to dry point",
                self.samples
            );
            self.cal.raw_at_threshold
        } else {
            (sum / good) as u16
        };

        MoistureReading {
            raw,
            percent: self.cal.moisture_percent(raw),
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<u16, SensorError> {
        hw_init::adc1_read(self.adc_channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<u16, SensorError> {
        if SIM_MOISTURE_FAIL.load(Ordering::Relaxed) {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(SIM_MOISTURE_ADC.load(Ordering::Relaxed))
    }
}
