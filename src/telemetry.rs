//! Capture metrics recorded through the `metrics` facade
//!
//! Without an installed recorder every call here is a no-op, which keeps the
//! library usable from tests and the one-off CLI. The server installs a
//! Prometheus recorder and exposes it at `/metrics`.

use crate::{CaptureError, EngineKind};
use metrics::{decrement_gauge, histogram, increment_counter, increment_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub const CAPTURES_TOTAL: &str = "screenshot_captures_total";
pub const CAPTURE_ERRORS_TOTAL: &str = "screenshot_capture_errors_total";
pub const CAPTURE_DURATION_SECONDS: &str = "screenshot_capture_duration_seconds";
pub const CAPTURES_IN_FLIGHT: &str = "screenshot_captures_in_flight";
pub const ARTIFACTS_DELETED_TOTAL: &str = "screenshot_artifacts_deleted_total";

pub fn install_prometheus_recorder() -> Result<PrometheusHandle, CaptureError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| CaptureError::Configuration(format!("metrics recorder: {e}")))
}

pub fn record_capture(engine: EngineKind, duration: Duration, result: Result<(), &CaptureError>) {
    match result {
        Ok(()) => {
            increment_counter!(CAPTURES_TOTAL, "outcome" => "success", "engine" => engine.as_str());
        }
        Err(err) => {
            increment_counter!(CAPTURES_TOTAL, "outcome" => "failure", "engine" => engine.as_str());
            increment_counter!(CAPTURE_ERRORS_TOTAL, "kind" => err.kind());
        }
    }
    histogram!(CAPTURE_DURATION_SECONDS, duration.as_secs_f64(), "engine" => engine.as_str());
}

pub fn record_deletion() {
    increment_counter!(ARTIFACTS_DELETED_TOTAL);
}

/// Tracks one running capture in the in-flight gauge for as long as it lives.
pub struct InFlightGuard;

impl InFlightGuard {
    pub fn enter() -> Self {
        increment_gauge!(CAPTURES_IN_FLIGHT, 1.0);
        InFlightGuard
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        decrement_gauge!(CAPTURES_IN_FLIGHT, 1.0);
    }
}
