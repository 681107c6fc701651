//! Metrics definitions for the Room Controller.
//!
//! All metrics follow Prometheus naming conventions:
//! - `rc_` prefix for Room Controller
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `actor_type`: 3 values (registry, room, connection)
//! - `outcome`: move outcomes (accepted, won, draw, rejected)
//! - `event`: client request events (~5 values)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("rc_request".to_string()),
            &[
                0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500,
            ],
        )
        .map_err(|e| format!("Failed to set request latency buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Gauges
// ============================================================================

/// Set the number of live rooms.
///
/// Metric: `rc_rooms_active`
pub fn set_rooms_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("rc_rooms_active").set(count as f64);
}

/// Set the number of open WebSocket sessions.
///
/// Metric: `rc_connections_active`
pub fn set_connections_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("rc_connections_active").set(count as f64);
}

/// Set the mailbox depth for an actor type.
///
/// Metric: `rc_actor_mailbox_depth`
/// Labels: `actor_type`
pub fn set_actor_mailbox_depth(actor_type: &str, depth: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("rc_actor_mailbox_depth", "actor_type" => actor_type.to_string()).set(depth as f64);
}

// ============================================================================
// Counters
// ============================================================================

/// Record a processed move.
///
/// Metric: `rc_moves_total`
/// Labels: `outcome` (accepted, won, draw, rejected)
pub fn record_move(outcome: &'static str) {
    counter!("rc_moves_total", "outcome" => outcome).increment(1);
}

/// Record a forced pass after the countdown expired.
///
/// Metric: `rc_turn_timeouts_total`
pub fn record_turn_timeout() {
    counter!("rc_turn_timeouts_total").increment(1);
}

/// Record a room id that collided with a live room.
///
/// Metric: `rc_room_id_collisions_total`
pub fn record_room_id_collision() {
    counter!("rc_room_id_collisions_total").increment(1);
}

/// Record a broadcast event dropped because a member's queue was full.
///
/// Metric: `rc_events_dropped_total`
pub fn record_event_dropped() {
    counter!("rc_events_dropped_total").increment(1);
}

/// Record an actor panic event.
///
/// Metric: `rc_actor_panics_total`
/// Labels: `actor_type`
///
/// Any non-zero value indicates a bug.
pub fn record_actor_panic(actor_type: &str) {
    counter!("rc_actor_panics_total", "actor_type" => actor_type.to_string()).increment(1);
}

// ============================================================================
// Histograms
// ============================================================================

/// Record how long a client request took from frame receipt to ack.
///
/// Metric: `rc_request_duration_seconds`
/// Labels: `event`
pub fn record_request_duration(event: &'static str, duration: Duration) {
    histogram!("rc_request_duration_seconds", "event" => event).record(duration.as_secs_f64());
}
