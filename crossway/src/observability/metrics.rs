//! Metrics collection for `Crossway`.
//!
//! Prometheus-compatible series for phase transitions, control operations
//! and the HTTP API. Route labels are checked against a fixed list so
//! arbitrary request paths cannot blow up label cardinality.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossway_core::{Color, Direction};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::CrosswayError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Routes served by the control API.
const KNOWN_ROUTES: [&str; 5] = [
    "/api/v1/status",
    "/api/v1/sequence",
    "/api/v1/pause",
    "/api/v1/resume",
    "/api/v1/history",
];

/// Returns `route` when it is a known API route, `"__unknown__"` otherwise.
#[must_use]
pub fn sanitize_route_label(route: &str) -> &str {
    if KNOWN_ROUTES.contains(&route) {
        route
    } else {
        "__unknown__"
    }
}

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint.
///
/// # Errors
///
/// Returns `CrosswayError::Io` if the recorder or HTTP listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), CrosswayError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| CrosswayError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "crossway_phase_transitions_total",
        "Total number of committed phases"
    );
    describe_gauge!(
        "crossway_active_phase",
        "Currently showing phase (1 = active)"
    );
    describe_counter!(
        "crossway_sequence_updates_total",
        "Phase table replacements"
    );
    describe_counter!("crossway_pauses_total", "Transitions into PAUSED");
    describe_counter!("crossway_resumes_total", "Transitions out of PAUSED");
    describe_counter!(
        "crossway_conflicts_total",
        "Conflict guard failures (each one force-pauses the cycle)"
    );
    describe_counter!(
        "crossway_stale_timer_fires_total",
        "Timer fires discarded because they were superseded"
    );
    describe_counter!(
        "crossway_http_requests_total",
        "Control API requests by route"
    );
    describe_gauge!("crossway_history_records", "Records held in the history log");
    describe_gauge!("crossway_uptime_seconds", "Controller uptime in seconds");
}

/// Records a committed phase.
pub fn record_phase_transition(direction: Direction, color: Color) {
    counter!(
        "crossway_phase_transitions_total",
        "direction" => direction.as_str(),
        "color" => color.as_str()
    )
    .increment(1);
}

/// Sets the active phase gauge, zeroing the previous phase's series.
pub fn set_active_phase(current: (Direction, Color), previous: Option<(Direction, Color)>) {
    if let Some((direction, color)) = previous {
        gauge!(
            "crossway_active_phase",
            "direction" => direction.as_str(),
            "color" => color.as_str()
        )
        .set(0.0);
    }
    gauge!(
        "crossway_active_phase",
        "direction" => current.0.as_str(),
        "color" => current.1.as_str()
    )
    .set(1.0);
}

/// Records a phase table replacement.
pub fn record_sequence_update() {
    counter!("crossway_sequence_updates_total").increment(1);
}

/// Records a transition into PAUSED.
pub fn record_pause() {
    counter!("crossway_pauses_total").increment(1);
}

/// Records a transition out of PAUSED.
pub fn record_resume() {
    counter!("crossway_resumes_total").increment(1);
}

/// Records a conflict guard failure.
pub fn record_conflict() {
    counter!("crossway_conflicts_total").increment(1);
}

/// Records a superseded timer fire.
pub fn record_stale_fire() {
    counter!("crossway_stale_timer_fires_total").increment(1);
}

/// Records a control API request.
pub fn record_http_request(route: &str) {
    let label = sanitize_route_label(route);
    counter!("crossway_http_requests_total", "route" => label.to_owned()).increment(1);
}

/// Sets the history size gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_history_records(count: usize) {
    gauge!("crossway_history_records").set(count as f64);
}

/// Sets the uptime gauge.
pub fn set_uptime(duration: Duration) {
    gauge!("crossway_uptime_seconds").set(duration.as_secs_f64());
}
