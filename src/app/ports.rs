//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ WakeCycleService (domain)
//! ```
//!
//! Driven adapters (the moisture sensor, the relay pair, the RTC state
//! store, report sinks) implement these traits.  The
//! [`WakeCycleService`](super::service::WakeCycleService) consumes them via
//! generics, so the domain core never touches hardware directly — and the
//! whole engine runs under test with mock adapters.

use crate::app::events::CycleReport;
use crate::app::state::{ResetCause, WakeState};
use crate::error::{ActuatorError, StateStoreError};
use crate::sensors::moisture::MoistureReading;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain one fresh moisture
/// reading.  Called at most once per wake cycle, and only when the pump is
/// due for evaluation.
pub trait SensorPort {
    fn read_moisture(&mut self) -> MoistureReading;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Which relay-driven device a command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Pump,
    Nebulizer,
}

/// A single-use trigger command, constructed by the decision engine and
/// consumed once by the actuator adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCommand {
    pub device: Device,
    pub duration_secs: u16,
    pub repeats: u8,
    pub inter_pause_secs: u16,
}

/// Write-side port: the domain calls this to run a timed trigger sequence.
///
/// Implementations must guarantee the relay line ends at its idle level on
/// every exit path, including an `Err` return — the domain relies on this
/// and never issues a compensating "off" command.
pub trait ActuatorPort {
    fn trigger(&mut self, cmd: &ActuatorCommand) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// State port (driven adapter: domain ↔ persisted RTC record)
// ───────────────────────────────────────────────────────────────

/// Persistence boundary for the wake-cycle counters.
///
/// `load` must be atomic with respect to the power-loss failure model: a
/// read after an abrupt power cut observes either the fully-prior state or
/// a cold-boot default, never a partially written record.  A structurally
/// invalid record is reported as [`ResetCause::PowerLoss`] regardless of
/// what the hardware says, since the data cannot be trusted either way.
pub trait StatePort {
    /// Load the persisted state alongside the freshly derived reset cause.
    fn load(&mut self) -> (WakeState, ResetCause);

    /// Persist the state.  Must complete before the device sleeps.
    fn save(&mut self, state: &WakeState) -> Result<(), StateStoreError>;
}

// ───────────────────────────────────────────────────────────────
// Report sink port (driven adapter: domain → logging / network)
// ───────────────────────────────────────────────────────────────

/// The domain emits one [`CycleReport`] through this port at the end of
/// every wake cycle.  Adapters decide where it goes (serial log, HTTP
/// endpoint).  Emission is fire-and-forget: implementations swallow their
/// own failures — transmission can never block or fail the sleep request.
pub trait ReportSink {
    fn emit(&mut self, report: &CycleReport);
}
