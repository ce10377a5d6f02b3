//! End-to-end wake-cycle scenarios against mock adapters.
//!
//! Each test drives the decision engine through a sequence of simulated
//! wakes.  The mock store plays the role of RTC memory surviving a deep
//! sleep; setting its cause back to `NormalWake` between cycles mimics the
//! timer-driven reboot.

use verdant::app::service::{CycleOutcome, WakeCycleService};
use verdant::app::ports::Device;
use verdant::app::state::{ResetCause, WakeState};
use verdant::config::SystemConfig;
use verdant::power::MAX_SLEEP_SECS;

use crate::mock_hw::{reading, MockHardware, MockStore, VecSink};

/// A small-period config so scenarios stay readable.
fn small_config() -> SystemConfig {
    SystemConfig {
        pump_period_cycles: 5,
        nebulizer_period_cycles: 12,
        postponement_window_cycles: 3,
        humidity_threshold_pct: 60.0,
        ..Default::default()
    }
}

/// Run one wake, then mark the next boot as a normal timer wake.
fn run_one(
    service: &WakeCycleService,
    store: &mut MockStore,
    hw: &mut MockHardware,
    sink: &mut VecSink,
) -> CycleOutcome {
    let outcome = service.run_cycle(store, hw, sink);
    store.cause = ResetCause::NormalWake;
    outcome
}

// ── Nebulizer schedule ────────────────────────────────────────

#[test]
fn nebulizer_fires_exactly_on_its_period() {
    let config = SystemConfig {
        pump_period_cycles: 0,
        nebulizer_period_cycles: 12,
        ..Default::default()
    };
    let service = WakeCycleService::new(config);
    let mut store = MockStore::new(WakeState::zeroed(), ResetCause::NormalWake);
    let mut hw = MockHardware::new();
    let mut sink = VecSink::new();

    for cycle in 1..=24u32 {
        run_one(&service, &mut store, &mut hw, &mut sink);
        let expected_fires = cycle / 12;
        assert_eq!(
            hw.fired(Device::Nebulizer) as u32,
            expected_fires,
            "wrong fire count at cycle {cycle}"
        );
        assert_eq!(store.state.nebulizer_counter, cycle % 12);
    }
}

#[test]
fn nebulizer_command_is_a_single_activation() {
    let config = small_config();
    let service = WakeCycleService::new(config.clone());
    let mut store = MockStore::new(
        WakeState {
            pump_counter: 0,
            nebulizer_counter: 11,
            postponement_remaining: 0,
        },
        ResetCause::NormalWake,
    );
    let mut hw = MockHardware::new();
    let mut sink = VecSink::new();

    run_one(&service, &mut store, &mut hw, &mut sink);

    let cmd = hw.last_call().expect("nebulizer should have fired");
    assert_eq!(cmd.device, Device::Nebulizer);
    assert_eq!(cmd.duration_secs, config.nebulizer_duration_secs);
    assert_eq!(cmd.repeats, 1);
    assert_eq!(cmd.inter_pause_secs, 0);
}

// ── Pump schedule ─────────────────────────────────────────────

#[test]
fn pump_fires_when_dry_and_due() {
    let service = WakeCycleService::new(small_config());
    let mut store = MockStore::new(WakeState::zeroed(), ResetCause::NormalWake);
    let mut hw = MockHardware::with_constant_moisture(40.0);
    let mut sink = VecSink::new();

    for _ in 1..=4 {
        run_one(&service, &mut store, &mut hw, &mut sink);
    }
    assert_eq!(hw.fired(Device::Pump), 0);
    assert_eq!(hw.sensor_reads, 0, "no reading before the pump is due");

    run_one(&service, &mut store, &mut hw, &mut sink);
    assert_eq!(hw.fired(Device::Pump), 1);
    assert_eq!(hw.sensor_reads, 1);
    assert_eq!(store.state.pump_counter, 0);
    assert_eq!(store.state.postponement_remaining, 0);
}

#[test]
fn pump_command_carries_the_repeat_policy() {
    let config = small_config();
    let service = WakeCycleService::new(config.clone());
    let mut store = MockStore::new(
        WakeState {
            pump_counter: 4,
            nebulizer_counter: 0,
            postponement_remaining: 0,
        },
        ResetCause::NormalWake,
    );
    let mut hw = MockHardware::with_constant_moisture(10.0);
    let mut sink = VecSink::new();

    run_one(&service, &mut store, &mut hw, &mut sink);

    let cmd = hw.last_call().expect("pump should have fired");
    assert_eq!(cmd.device, Device::Pump);
    assert_eq!(cmd.duration_secs, config.pump_duration_secs);
    assert_eq!(cmd.repeats, config.pump_repeats);
    assert_eq!(cmd.inter_pause_secs, config.pump_inter_pause_secs);
}

#[test]
fn pump_postponed_while_moist_then_forced() {
    let service = WakeCycleService::new(small_config());
    let mut store = MockStore::new(WakeState::zeroed(), ResetCause::NormalWake);
    let mut hw = MockHardware::with_constant_moisture(75.0);
    let mut sink = VecSink::new();

    // Cycles 1–4: not yet due.  Cycles 5–7: due but deferred.
    for cycle in 1..=7u32 {
        run_one(&service, &mut store, &mut hw, &mut sink);
        assert_eq!(hw.fired(Device::Pump), 0, "fired too early at cycle {cycle}");
    }
    assert_eq!(store.state.postponement_remaining, 3);

    // Cycle 8: window exhausted — waters regardless of moisture.
    run_one(&service, &mut store, &mut hw, &mut sink);
    assert_eq!(hw.fired(Device::Pump), 1);
    assert_eq!(store.state.pump_counter, 0);
    assert_eq!(store.state.postponement_remaining, 0);
}

#[test]
fn postponement_window_resets_after_firing() {
    let service = WakeCycleService::new(small_config());
    let mut store = MockStore::new(WakeState::zeroed(), ResetCause::NormalWake);
    let mut hw = MockHardware::with_constant_moisture(75.0);
    let mut sink = VecSink::new();

    // First forced watering at cycle 8 (5 due + 3 deferrals).
    for _ in 1..=8 {
        run_one(&service, &mut store, &mut hw, &mut sink);
    }
    assert_eq!(hw.fired(Device::Pump), 1);

    // The window must be fully available again: 5 more cycles to due,
    // 3 deferrals, forced fire on the 8th.
    for _ in 1..=7 {
        run_one(&service, &mut store, &mut hw, &mut sink);
    }
    assert_eq!(hw.fired(Device::Pump), 1);
    run_one(&service, &mut store, &mut hw, &mut sink);
    assert_eq!(hw.fired(Device::Pump), 2);
}

#[test]
fn pump_fires_mid_window_once_soil_dries() {
    let service = WakeCycleService::new(small_config());
    let mut store = MockStore::new(WakeState::zeroed(), ResetCause::NormalWake);
    let mut hw = MockHardware::new();
    // Due at cycle 5 (moist, deferred), dry at cycle 6.
    hw.readings.push_back(reading(80.0));
    hw.readings.push_back(reading(30.0));
    let mut sink = VecSink::new();

    for _ in 1..=5 {
        run_one(&service, &mut store, &mut hw, &mut sink);
    }
    assert_eq!(hw.fired(Device::Pump), 0);
    assert_eq!(store.state.postponement_remaining, 1);

    run_one(&service, &mut store, &mut hw, &mut sink);
    assert_eq!(hw.fired(Device::Pump), 1);
    assert_eq!(store.state.postponement_remaining, 0);
}

#[test]
fn threshold_boundary_reading_counts_as_moist() {
    // Exactly at the threshold postpones; strictly below fires.
    let service = WakeCycleService::new(small_config());
    let mut store = MockStore::new(
        WakeState {
            pump_counter: 4,
            nebulizer_counter: 0,
            postponement_remaining: 0,
        },
        ResetCause::NormalWake,
    );
    let mut hw = MockHardware::with_constant_moisture(60.0);
    let mut sink = VecSink::new();

    run_one(&service, &mut store, &mut hw, &mut sink);
    assert_eq!(hw.fired(Device::Pump), 0);
    assert_eq!(store.state.postponement_remaining, 1);
}

// ── Disabled schedules ────────────────────────────────────────

#[test]
fn disabled_pump_never_fires_and_counter_stays_zero() {
    let config = SystemConfig {
        pump_period_cycles: 0,
        nebulizer_period_cycles: 12,
        ..Default::default()
    };
    let service = WakeCycleService::new(config);
    let mut store = MockStore::new(WakeState::zeroed(), ResetCause::NormalWake);
    let mut hw = MockHardware::with_constant_moisture(0.0);
    let mut sink = VecSink::new();

    for _ in 0..50 {
        run_one(&service, &mut store, &mut hw, &mut sink);
        assert_eq!(store.state.pump_counter, 0);
    }
    assert_eq!(hw.fired(Device::Pump), 0);
    assert_eq!(hw.sensor_reads, 0, "a disabled pump is never evaluated");
}

#[test]
fn disabled_nebulizer_never_fires() {
    let config = SystemConfig {
        pump_period_cycles: 5,
        nebulizer_period_cycles: 0,
        ..Default::default()
    };
    let service = WakeCycleService::new(config);
    let mut store = MockStore::new(WakeState::zeroed(), ResetCause::NormalWake);
    let mut hw = MockHardware::with_constant_moisture(0.0);
    let mut sink = VecSink::new();

    for _ in 0..50 {
        run_one(&service, &mut store, &mut hw, &mut sink);
        assert_eq!(store.state.nebulizer_counter, 0);
    }
    assert_eq!(hw.fired(Device::Nebulizer), 0);
}

// ── Power-loss recovery ───────────────────────────────────────

#[test]
fn power_loss_applies_safe_defaults() {
    let config = SystemConfig {
        pump_period_cycles: 144,
        nebulizer_period_cycles: 12,
        ..Default::default()
    };
    let service = WakeCycleService::new(config);
    // Whatever was loaded is garbage after a power cut.
    let mut store = MockStore::new(
        WakeState {
            pump_counter: 999,
            nebulizer_counter: 999,
            postponement_remaining: 99,
        },
        ResetCause::PowerLoss,
    );
    let mut hw = MockHardware::with_constant_moisture(50.0);
    let mut sink = VecSink::new();

    run_one(&service, &mut store, &mut hw, &mut sink);

    // Recovery set 72/12/0, then the cycle advanced and evaluated: the
    // nebulizer was immediately due and fired; the pump is held back for
    // half its period.
    assert_eq!(store.state.pump_counter, 73);
    assert_eq!(hw.fired(Device::Nebulizer), 1);
    assert_eq!(store.state.nebulizer_counter, 0);
    assert_eq!(store.state.postponement_remaining, 0);
    assert_eq!(sink.last().reset_cause, ResetCause::PowerLoss);
}

#[test]
fn unknown_reset_cause_is_treated_as_power_loss() {
    let config = small_config();
    let service = WakeCycleService::new(config);
    let mut store = MockStore::new(
        WakeState {
            pump_counter: 4,
            nebulizer_counter: 4,
            postponement_remaining: 2,
        },
        ResetCause::Unknown,
    );
    let mut hw = MockHardware::with_constant_moisture(50.0);
    let mut sink = VecSink::new();

    run_one(&service, &mut store, &mut hw, &mut sink);

    // 5/2 = 2, advanced to 3 — the loaded counters were discarded.
    assert_eq!(store.state.pump_counter, 3);
    assert_eq!(store.state.postponement_remaining, 0);
}

#[test]
fn out_of_bounds_record_recovers_even_on_normal_wake() {
    let config = small_config();
    let service = WakeCycleService::new(config);
    let mut store = MockStore::new(
        WakeState {
            pump_counter: 6, // above pump_period_cycles = 5
            nebulizer_counter: 0,
            postponement_remaining: 0,
        },
        ResetCause::NormalWake,
    );
    let mut hw = MockHardware::with_constant_moisture(50.0);
    let mut sink = VecSink::new();

    run_one(&service, &mut store, &mut hw, &mut sink);
    assert_eq!(store.state.pump_counter, 3); // 5/2 = 2, advanced
}

// ── Tie-break and overshoot ───────────────────────────────────

#[test]
fn nebulizer_is_evaluated_before_pump_when_both_due() {
    let config = SystemConfig {
        pump_period_cycles: 5,
        nebulizer_period_cycles: 5,
        ..Default::default()
    };
    let service = WakeCycleService::new(config);
    let mut store = MockStore::new(WakeState::zeroed(), ResetCause::NormalWake);
    let mut hw = MockHardware::with_constant_moisture(10.0);
    let mut sink = VecSink::new();

    for _ in 1..=5 {
        run_one(&service, &mut store, &mut hw, &mut sink);
    }

    let devices: Vec<Device> = hw.calls.iter().map(|c| c.device).collect();
    assert_eq!(devices, vec![Device::Nebulizer, Device::Pump]);
}

#[test]
fn counter_exactly_at_period_is_due() {
    let service = WakeCycleService::new(small_config());
    let mut store = MockStore::new(
        WakeState {
            pump_counter: 4,
            nebulizer_counter: 0,
            postponement_remaining: 0,
        },
        ResetCause::NormalWake,
    );
    let mut hw = MockHardware::with_constant_moisture(10.0);
    let mut sink = VecSink::new();

    run_one(&service, &mut store, &mut hw, &mut sink);
    assert_eq!(hw.fired(Device::Pump), 1);
}

#[test]
fn counter_at_bound_after_missed_wakes_is_due() {
    // A counter persisted exactly at the period (a deferral clamp) is
    // treated the same as one that just reached it.
    let service = WakeCycleService::new(small_config());
    let mut store = MockStore::new(
        WakeState {
            pump_counter: 5,
            nebulizer_counter: 0,
            postponement_remaining: 3,
        },
        ResetCause::NormalWake,
    );
    let mut hw = MockHardware::with_constant_moisture(90.0);
    let mut sink = VecSink::new();

    run_one(&service, &mut store, &mut hw, &mut sink);
    // Window already exhausted: fires despite the moisture.
    assert_eq!(hw.fired(Device::Pump), 1);
}

// ── Error handling ────────────────────────────────────────────

#[test]
fn actuator_failure_still_persists_reports_and_resets_counters() {
    let config = SystemConfig {
        pump_period_cycles: 5,
        nebulizer_period_cycles: 5,
        ..Default::default()
    };
    let service = WakeCycleService::new(config);
    let mut store = MockStore::new(
        WakeState {
            pump_counter: 4,
            nebulizer_counter: 4,
            postponement_remaining: 0,
        },
        ResetCause::NormalWake,
    );
    let mut hw = MockHardware::with_constant_moisture(10.0);
    hw.fail_triggers = true;
    let mut sink = VecSink::new();

    let outcome = run_one(&service, &mut store, &mut hw, &mut sink);

    // No retry value with no feedback signal: counters reset as if fired.
    assert_eq!(store.state.pump_counter, 0);
    assert_eq!(store.state.nebulizer_counter, 0);
    assert_eq!(store.saves.len(), 1);
    assert_eq!(sink.reports.len(), 1);
    assert!(outcome.report.pump_fired);
    assert!(outcome.report.nebulizer_fired);
}

#[test]
fn save_failure_still_emits_the_report() {
    let service = WakeCycleService::new(small_config());
    let mut store = MockStore::new(WakeState::zeroed(), ResetCause::NormalWake);
    store.fail_saves = true;
    let mut hw = MockHardware::new();
    let mut sink = VecSink::new();

    let outcome = service.run_cycle(&mut store, &mut hw, &mut sink);
    assert_eq!(sink.reports.len(), 1);
    assert_eq!(outcome.next_sleep_secs, 3600);
}

#[test]
fn state_is_saved_every_cycle_even_when_nothing_fires() {
    let service = WakeCycleService::new(small_config());
    let mut store = MockStore::new(WakeState::zeroed(), ResetCause::NormalWake);
    let mut hw = MockHardware::new();
    let mut sink = VecSink::new();

    for _ in 0..3 {
        run_one(&service, &mut store, &mut hw, &mut sink);
    }
    assert_eq!(hw.calls.len(), 0);
    assert_eq!(store.saves.len(), 3);
    assert_eq!(sink.reports.len(), 3);
}

// ── Invariants and reporting ──────────────────────────────────

#[test]
fn counters_stay_in_bounds_across_mixed_cycles() {
    let config = small_config();
    let service = WakeCycleService::new(config.clone());
    let mut store = MockStore::cold_boot();
    let mut hw = MockHardware::new();
    let mut sink = VecSink::new();

    for cycle in 0..200u32 {
        // Alternate wet and dry stretches.
        hw.default_reading = reading(if (cycle / 7) % 2 == 0 { 80.0 } else { 20.0 });
        run_one(&service, &mut store, &mut hw, &mut sink);
        assert!(
            store.state.in_bounds(&config),
            "bounds violated at cycle {cycle}: {:?}",
            store.state
        );
    }
}

#[test]
fn report_mirrors_post_cycle_state() {
    let service = WakeCycleService::new(small_config());
    let mut store = MockStore::new(
        WakeState {
            pump_counter: 2,
            nebulizer_counter: 7,
            postponement_remaining: 0,
        },
        ResetCause::NormalWake,
    );
    let mut hw = MockHardware::new();
    let mut sink = VecSink::new();

    run_one(&service, &mut store, &mut hw, &mut sink);

    let report = sink.last();
    assert_eq!(report.pump_counter, store.state.pump_counter);
    assert_eq!(report.nebulizer_counter, store.state.nebulizer_counter);
    assert_eq!(report.postponement_remaining, store.state.postponement_remaining);
    assert!(!report.pump_fired);
    assert!(!report.nebulizer_fired);
    assert!(report.moisture.is_none(), "no reading when the pump is not due");
}

#[test]
fn report_includes_moisture_when_evaluated() {
    let service = WakeCycleService::new(small_config());
    let mut store = MockStore::new(
        WakeState {
            pump_counter: 4,
            nebulizer_counter: 0,
            postponement_remaining: 0,
        },
        ResetCause::NormalWake,
    );
    let mut hw = MockHardware::with_constant_moisture(75.0);
    let mut sink = VecSink::new();

    run_one(&service, &mut store, &mut hw, &mut sink);

    let report = sink.last();
    let m = report.moisture.expect("reading must be reported");
    assert!((m.percent - 75.0).abs() < f32::EPSILON);
    assert!(!report.pump_fired, "deferred, not fired");
}

#[test]
fn next_sleep_is_capped_to_platform_maximum() {
    let config = SystemConfig {
        wake_interval_secs: 86_400,
        ..small_config()
    };
    let service = WakeCycleService::new(config);
    let mut store = MockStore::cold_boot();
    let mut hw = MockHardware::new();
    let mut sink = VecSink::new();

    let outcome = run_one(&service, &mut store, &mut hw, &mut sink);
    assert_eq!(outcome.next_sleep_secs, MAX_SLEEP_SECS);
}
