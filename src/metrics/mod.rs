//! Metrics collection for the desk, in Prometheus text format.
//!
//! Navigation, role materialization and session events are counted here; the
//! shell prints them on request.

mod recorder;

pub use recorder::{Metrics, MetricsRecorder};
