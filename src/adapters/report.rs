//! HTTP report sink adapter.
//!
//! Sends each cycle report to the garden gateway as a GET query string —
//! the gateway records counters and the moisture reading.  The network is
//! brought up lazily at emit time, *after* actuation and state persistence,
//! so a slow or absent access point never delays the watering work; it only
//! costs the report.
//!
//! Every failure here is logged and swallowed.  Reporting is strictly
//! best-effort and must never keep the device from its sleep request.

use core::fmt::Write as _;

use log::{info, warn};

use crate::app::events::CycleReport;
use crate::app::ports::ReportSink;
use crate::app::state::ResetCause;
use crate::adapters::wifi::WifiAdapter;

/// Upper bound for the full request line; a report that somehow exceeds it
/// is dropped, not truncated.
const MAX_URL_LEN: usize = 256;

pub struct HttpReportSink {
    wifi: WifiAdapter,
    base_url: &'static str,
}

impl HttpReportSink {
    pub fn new(wifi: WifiAdapter, base_url: &'static str) -> Self {
        Self { wifi, base_url }
    }
}

impl ReportSink for HttpReportSink {
    fn emit(&mut self, report: &CycleReport) {
        let Some(url) = build_query(self.base_url, report) else {
            warn!("report: request line too long, dropped");
            return;
        };

        match self.wifi.connect() {
            Ok(()) => {
                send(&url);
                self.wifi.disconnect();
            }
            Err(e) => warn!("report: skipped ({e})"),
        }
    }
}

/// Render the report as `base?key=value&…`.  Returns `None` when the result
/// would not fit [`MAX_URL_LEN`].
fn build_query(base: &str, report: &CycleReport) -> Option<heapless::String<MAX_URL_LEN>> {
    let cause = match report.reset_cause {
        ResetCause::NormalWake => "normal",
        ResetCause::PowerLoss => "powerloss",
        ResetCause::Unknown => "unknown",
    };

    let mut url: heapless::String<MAX_URL_LEN> = heapless::String::new();
    write!(
        url,
        "{base}?cause={cause}&pump_fired={}&neb_fired={}&pump={}&nebulizers={}&postponed={}",
        u8::from(report.pump_fired),
        u8::from(report.nebulizer_fired),
        report.pump_counter,
        report.nebulizer_counter,
        report.postponement_remaining,
    )
    .ok()?;

    if let Some(m) = report.moisture {
        write!(url, "&hr={:.1}&raw={}", m.percent, m.raw).ok()?;
    }

    Some(url)
}

#[cfg(target_os = "espidf")]
fn send(url: &str) {
    use esp_idf_svc::sys::*;

    // esp_http_client wants a NUL-terminated URL.
    let mut url_c: heapless::Vec<u8, { MAX_URL_LEN + 1 }> = heapless::Vec::new();
    if url_c.extend_from_slice(url.as_bytes()).is_err() || url_c.push(0).is_err() {
        warn!("report: URL does not fit C buffer");
        return;
    }

    let cfg = esp_http_client_config_t {
        url: url_c.as_ptr() as *const _,
        method: esp_http_client_method_t_HTTP_METHOD_GET,
        timeout_ms: 5_000,
        ..Default::default()
    };

    // SAFETY: cfg and url_c outlive the client; init/perform/cleanup is the
    // documented single-threaded usage sequence for esp_http_client.
    unsafe {
        let client = esp_http_client_init(&cfg);
        if client.is_null() {
            warn!("report: http client init failed");
            return;
        }
        let err = esp_http_client_perform(client);
        esp_http_client_cleanup(client);
        if err != ESP_OK {
            warn!("report: GET failed (rc={err})");
            return;
        }
    }
    info!("report: sent");
}

#[cfg(not(target_os = "espidf"))]
fn send(url: &str) {
    info!("report(sim): GET {url}");
}
