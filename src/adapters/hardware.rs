//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the moisture sensor and both relay drivers, exposing them through
//! [`SensorPort`] and [`ActuatorPort`].  This is the only module in the
//! system that routes domain commands to actual pins.  On non-espidf
//! targets, the underlying drivers use cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{ActuatorCommand, ActuatorPort, Device, SensorPort};
use crate::drivers::relay::RelayDriver;
use crate::error::ActuatorError;
use crate::sensors::moisture::{MoistureReading, MoistureSensor};

/// Concrete adapter that combines all hardware behind port traits.
///
/// Generic over the delay provider so the blocking trigger sequences use
/// the FreeRTOS delay on hardware and a recording mock under test.
pub struct HardwareAdapter<D: DelayNs> {
    moisture: MoistureSensor,
    pump: RelayDriver,
    nebulizer: RelayDriver,
    delay: D,
}

impl<D: DelayNs> HardwareAdapter<D> {
    pub fn new(
        moisture: MoistureSensor,
        pump: RelayDriver,
        nebulizer: RelayDriver,
        delay: D,
    ) -> Self {
        Self {
            moisture,
            pump,
            nebulizer,
            delay,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<D: DelayNs> SensorPort for HardwareAdapter<D> {
    fn read_moisture(&mut self) -> MoistureReading {
        self.moisture.read()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<D: DelayNs> ActuatorPort for HardwareAdapter<D> {
    fn trigger(&mut self, cmd: &ActuatorCommand) -> Result<(), ActuatorError> {
        let relay = match cmd.device {
            Device::Pump => &mut self.pump,
            Device::Nebulizer => &mut self.nebulizer,
        };
        relay.run_sequence(
            cmd.duration_secs,
            cmd.repeats,
            cmd.inter_pause_secs,
            &mut self.delay,
        )
    }
}

// ── Host delay provider ───────────────────────────────────────

/// Real blocking delays on the host (sim binary).  Hardware builds use
/// `esp_idf_hal::delay::FreeRtos` instead.
#[cfg(not(target_os = "espidf"))]
pub struct HostDelay;

#[cfg(not(target_os = "espidf"))]
impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
