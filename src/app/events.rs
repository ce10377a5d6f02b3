//! Outbound cycle report.
//!
//! The [`WakeCycleService`](super::service::WakeCycleService) emits exactly
//! one of these per wake through the
//! [`ReportSink`](super::ports::ReportSink) port.  Adapters on the other
//! side decide what to do with it — log to serial, send to the garden
//! gateway over HTTP.

use serde::Serialize;

use crate::app::state::ResetCause;
use crate::sensors::moisture::MoistureReading;

/// Everything a cycle produced: post-cycle counters, which actuators fired,
/// the moisture reading (when one was taken), and the reset cause this boot
/// was attributed to.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub reset_cause: ResetCause,
    pub pump_fired: bool,
    pub nebulizer_fired: bool,
    /// Present only when the pump was due and a reading was taken.
    pub moisture: Option<MoistureReading>,
    pub pump_counter: u32,
    pub nebulizer_counter: u32,
    pub postponement_remaining: u32,
}
