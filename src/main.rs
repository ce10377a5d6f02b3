//! Verdant Firmware — Main Entry Point
//!
//! One boot = one wake cycle.  There is no resident event loop: the deep
//! sleep *is* the scheduler, and the device reboots into this entry point
//! every time the RTC timer fires.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  HardwareAdapter      RtcStateStore      HttpReportSink       │
//! │  (Sensor+Actuator)    (StatePort)        (ReportSink + WiFi)  │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ──────────────────      │
//! │                                                               │
//! │  ┌───────────────────────────────────────────────────────┐    │
//! │  │          WakeCycleService (pure logic)                │    │
//! │  │  counters · postponement · calibration                │    │
//! │  └───────────────────────────────────────────────────────┘    │
//! │                                                               │
//! │  PowerManager (reset cause · deep sleep)                      │
//! └───────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info};

use verdant::adapters::hardware::HardwareAdapter;
use verdant::adapters::rtc_store::RtcStateStore;
use verdant::app::service::WakeCycleService;
use verdant::config::SystemConfig;
use verdant::drivers::hw_init;
use verdant::drivers::relay::RelayDriver;
use verdant::pins;
use verdant::power::PowerManager;
use verdant::sensors::moisture::{Calibration, MoistureSensor};

// ── Site configuration — fill in for your deployment ──────────

#[cfg(target_os = "espidf")]
const WIFI_SSID: &str = "";
#[cfg(target_os = "espidf")]
const WIFI_PASSWORD: &str = "";
#[cfg(target_os = "espidf")]
const REPORT_URL: &str = "http://192.168.1.3/garden";

// ── Shared construction ───────────────────────────────────────

fn build_hardware<D: embedded_hal::delay::DelayNs>(
    config: &SystemConfig,
    delay: D,
) -> HardwareAdapter<D> {
    let moisture = MoistureSensor::new(
        pins::MOISTURE_ADC_CHANNEL,
        Calibration {
            raw_at_full: config.moisture_raw_at_full,
            raw_at_threshold: config.moisture_raw_at_threshold,
            threshold_pct: config.humidity_threshold_pct,
        },
        config.moisture_samples,
    );
    HardwareAdapter::new(
        moisture,
        RelayDriver::new(pins::PUMP_RELAY_GPIO, pins::RELAY_ACTIVE_LOW),
        RelayDriver::new(pins::NEBULIZER_RELAY_GPIO, pins::RELAY_ACTIVE_LOW),
        delay,
    )
}

// ── Main (hardware) ───────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn main() -> Result<()> {
    use log::warn;
    use verdant::adapters::report::HttpReportSink;
    use verdant::adapters::wifi::WifiAdapter;

    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Verdant v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // Keep the serial window usable right after boot so a bricked schedule
    // can still be re-flashed without racing the deep sleep.
    std::thread::sleep(std::time::Duration::from_secs(3));

    let power = PowerManager::new();
    let config = SystemConfig::default();

    if let Err(e) = config.validate() {
        // Never actuate with out-of-range parameters; sleeping is the only
        // safe thing left to do.
        error!("invalid configuration: {e} — refusing to actuate");
        power.deep_sleep(config.wake_interval_secs);
    }

    if let Err(e) = hw_init::init_peripherals() {
        error!("peripheral init failed: {e} — retrying next wake");
        power.deep_sleep(config.wake_interval_secs);
    }

    let cause = power.determine_reset_cause();
    info!("boot: {cause}");

    let mut store = RtcStateStore::new(cause);
    let mut hw = build_hardware(&config, esp_idf_hal::delay::FreeRtos);

    let mut wifi = WifiAdapter::new();
    if let Err(e) = wifi.set_credentials(WIFI_SSID, WIFI_PASSWORD) {
        warn!("WiFi credentials not usable ({e}); reports will be skipped");
    }
    let mut sink = HttpReportSink::new(wifi, REPORT_URL);

    let service = WakeCycleService::new(config);
    let outcome = service.run_cycle(&mut store, &mut hw, &mut sink);

    info!(
        "cycle complete: pump_fired={} nebulizer_fired={}",
        outcome.report.pump_fired, outcome.report.nebulizer_fired
    );
    power.deep_sleep(outcome.next_sleep_secs);
}

// ── Main (host simulation) ────────────────────────────────────

/// Run a single simulated wake cycle and "sleep" by exiting.  Useful for
/// exercising the full decision path without hardware:
///
/// ```text
/// cargo run            # power-on boot, recovery path
/// ```
#[cfg(not(target_os = "espidf"))]
fn main() -> Result<()> {
    use verdant::adapters::hardware::HostDelay;
    use verdant::adapters::log_sink::LogReportSink;
    use verdant::sensors::moisture;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Verdant v{} — host simulation, one wake cycle", env!("CARGO_PKG_VERSION"));

    // Short actuation times so a simulated firing finishes in seconds.
    let config = SystemConfig {
        pump_duration_secs: 1,
        pump_inter_pause_secs: 1,
        nebulizer_duration_secs: 1,
        ..Default::default()
    };
    if let Err(e) = config.validate() {
        error!("invalid configuration: {e}");
        std::process::exit(1);
    }

    if let Err(e) = hw_init::init_peripherals() {
        error!("peripheral init failed: {e}");
        std::process::exit(1);
    }

    // A mid-range probe reading: between the wet (297) and dry (378) points.
    moisture::sim_set_moisture_adc(340);

    let power = PowerManager::new();
    let cause = power.determine_reset_cause();
    info!("boot: {cause}");

    let mut store = RtcStateStore::new(cause);
    let mut hw = build_hardware(&config, HostDelay);
    let mut sink = LogReportSink::new();

    let service = WakeCycleService::new(config);
    let outcome = service.run_cycle(&mut store, &mut hw, &mut sink);

    info!(
        "cycle complete: pump_fired={} nebulizer_fired={}",
        outcome.report.pump_fired, outcome.report.nebulizer_fired
    );
    power.deep_sleep(outcome.next_sleep_secs);
}
