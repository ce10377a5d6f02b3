//! Log-based report sink adapter.
//!
//! Implements [`ReportSink`] by writing each cycle report as a single
//! structured JSON line to the logger (UART / USB-CDC in production).  The
//! HTTP adapter implements the same trait for network delivery.

use log::{info, warn};

use crate::app::events::CycleReport;
use crate::app::ports::ReportSink;

/// Adapter that logs every [`CycleReport`] to the serial console.
pub struct LogReportSink;

impl Default for LogReportSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogReportSink {
    pub fn new() -> Self {
        Self
    }
}

impl ReportSink for LogReportSink {
    fn emit(&mut self, report: &CycleReport) {
        match serde_json::to_string(report) {
            Ok(json) => info!("REPORT | {json}"),
            Err(e) => warn!("REPORT | serialization failed: {e}"),
        }
    }
}
