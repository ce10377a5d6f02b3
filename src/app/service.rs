//! Wake-cycle service — the hexagonal core.
//!
//! [`WakeCycleService`] is the decision engine: re-entered fresh on every
//! wake, it combines the persisted counters, a fresh moisture reading, and
//! the immutable configuration to decide which actuators fire and how the
//! counters evolve.  There is no in-memory continuation between cycles —
//! only the persisted [`WakeState`] crosses the reboot gap.
//!
//! ```text
//!  StatePort ───▶ ┌────────────────────────┐ ──▶ ReportSink
//!  SensorPort ──▶ │    WakeCycleService     │
//!  ActuatorPort ◀─│  counters · postponement │
//!                 └────────────────────────┘
//! ```
//!
//! One rule dominates the error handling: nothing in a cycle may prevent
//! the state from being persisted or the device from going back to sleep.
//! A device that fails to re-enter low-power sleep is the worst failure
//! mode there is.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::power;

use super::events::CycleReport;
use super::ports::{ActuatorCommand, ActuatorPort, Device, ReportSink, SensorPort, StatePort};
use super::state::{ResetCause, WakeState};

// ───────────────────────────────────────────────────────────────
// Cycle outcome
// ───────────────────────────────────────────────────────────────

/// What a cycle decided, returned to the boot glue.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub report: CycleReport,
    /// Sleep to request from the platform, already capped to what a single
    /// deep sleep can deliver.
    pub next_sleep_secs: u32,
}

// ───────────────────────────────────────────────────────────────
// WakeCycleService
// ───────────────────────────────────────────────────────────────

/// The decision engine.  Owns nothing but the immutable configuration; all
/// I/O flows through port traits injected at the single `run_cycle` call.
pub struct WakeCycleService {
    config: SystemConfig,
}

impl WakeCycleService {
    pub fn new(config: SystemConfig) -> Self {
        Self { config }
    }

    /// Execute one full wake cycle:
    /// load → recover → advance counters → nebulizer → pump → persist →
    /// report.
    ///
    /// The nebulizer is always evaluated before the pump, so a cycle where
    /// both are due fires the nebulizer first.  A counter at exactly its
    /// period and one that overshot it (missed wakes) are treated the same:
    /// `>= period` means due.
    pub fn run_cycle(
        &self,
        store: &mut impl StatePort,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl ReportSink,
    ) -> CycleOutcome {
        let (loaded, cause) = store.load();
        let mut state = self.recover(loaded, cause);

        self.advance_counters(&mut state);

        let nebulizer_fired = self.evaluate_nebulizer(&mut state, hw);
        let (pump_fired, moisture) = self.evaluate_pump(&mut state, hw);

        // Persist no matter which branches ran — and no matter whether they
        // failed.  A save error is logged; the next wake recovers via the
        // invalid-record path.
        if let Err(e) = store.save(&state) {
            warn!("state not persisted, next wake will recover: {e}");
        }

        let report = CycleReport {
            reset_cause: cause,
            pump_fired,
            nebulizer_fired,
            moisture,
            pump_counter: state.pump_counter,
            nebulizer_counter: state.nebulizer_counter,
            postponement_remaining: state.postponement_remaining,
        };
        sink.emit(&report);

        CycleOutcome {
            report,
            next_sleep_secs: self.config.wake_interval_secs.min(power::MAX_SLEEP_SECS),
        }
    }

    // ── Cycle steps ───────────────────────────────────────────

    /// Apply the power-loss recovery policy when the persisted counters
    /// cannot be trusted: untrusted reset cause, or a record whose values
    /// violate their bounds.  Applied exactly once per detected event;
    /// normal accumulation resumes afterwards.
    fn recover(&self, loaded: WakeState, cause: ResetCause) -> WakeState {
        if !cause.is_trusted() {
            info!("{cause}: applying safe-default counters");
            return WakeState::power_loss_defaults(&self.config);
        }
        if !loaded.in_bounds(&self.config) {
            warn!("persisted counters out of bounds, applying safe defaults");
            return WakeState::power_loss_defaults(&self.config);
        }
        loaded
    }

    /// One wake cycle has elapsed.  A disabled schedule (period 0) keeps
    /// its counter pinned at 0 and is never evaluated.
    fn advance_counters(&self, state: &mut WakeState) {
        if self.config.nebulizer_period_cycles > 0 {
            state.nebulizer_counter = state.nebulizer_counter.saturating_add(1);
        }
        if self.config.pump_period_cycles > 0 {
            state.pump_counter = state.pump_counter.saturating_add(1);
        }
    }

    fn evaluate_nebulizer(&self, state: &mut WakeState, hw: &mut impl ActuatorPort) -> bool {
        let period = self.config.nebulizer_period_cycles;
        if period == 0 || state.nebulizer_counter < period {
            return false;
        }

        info!("nebulizer due ({} cycles)", state.nebulizer_counter);
        let cmd = ActuatorCommand {
            device: Device::Nebulizer,
            duration_secs: self.config.nebulizer_duration_secs,
            repeats: 1,
            inter_pause_secs: 0,
        };
        if let Err(e) = hw.trigger(&cmd) {
            // No feedback sensing, so an immediate retry has no value; the
            // relay is already back at idle per the ActuatorPort contract.
            warn!("nebulizer trigger failed: {e}");
        }
        state.nebulizer_counter = 0;
        true
    }

    fn evaluate_pump(
        &self,
        state: &mut WakeState,
        hw: &mut (impl SensorPort + ActuatorPort),
    ) -> (bool, Option<crate::sensors::moisture::MoistureReading>) {
        let period = self.config.pump_period_cycles;
        if period == 0 || state.pump_counter < period {
            return (false, None);
        }

        let reading = hw.read_moisture();
        info!(
            "pump due ({} cycles), moisture {:.1} % (raw {})",
            state.pump_counter, reading.percent, reading.raw
        );

        let moist_enough = reading.percent >= self.config.humidity_threshold_pct;
        let window_open = state.postponement_remaining < self.config.postponement_window_cycles;

        if moist_enough && window_open {
            // Defer: keep the pump due for the next cycle, but clamp the
            // counter to the period so the bound invariant holds at cycle
            // end.
            state.postponement_remaining += 1;
            state.pump_counter = state.pump_counter.min(period);
            info!(
                "pump postponed ({}/{} cycles used)",
                state.postponement_remaining, self.config.postponement_window_cycles
            );
            return (false, Some(reading));
        }

        if moist_enough {
            info!("postponement window exhausted, watering regardless");
        }
        let cmd = ActuatorCommand {
            device: Device::Pump,
            duration_secs: self.config.pump_duration_secs,
            repeats: self.config.pump_repeats,
            inter_pause_secs: self.config.pump_inter_pause_secs,
        };
        if let Err(e) = hw.trigger(&cmd) {
            warn!("pump trigger failed: {e}");
        }
        state.pump_counter = 0;
        state.postponement_remaining = 0;
        (true, Some(reading))
    }
}
