//! Sensor subsystem.
//!
//! A single sensor feeds the decision engine: the capacitive soil-moisture
//! probe.  Its driver performs multi-sample averaging and two-point linear
//! calibration; the result crosses the port boundary as a
//! [`MoistureReading`](moisture::MoistureReading).

pub mod moisture;
