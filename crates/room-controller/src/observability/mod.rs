//! Observability for the Room Controller.
//!
//! All instrumentation uses `#[instrument(skip_all)]` with explicit fields;
//! room ids and connection ids are logged, board contents are not.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `rc_rooms_active` | Gauge | none | Live rooms |
//! | `rc_connections_active` | Gauge | none | Open WebSocket sessions |
//! | `rc_actor_mailbox_depth` | Gauge | `actor_type` | Backpressure indicator |
//! | `rc_moves_total` | Counter | `outcome` | Processed moves |
//! | `rc_turn_timeouts_total` | Counter | none | Forced passes |
//! | `rc_room_id_collisions_total` | Counter | none | Id allocation retries |
//! | `rc_events_dropped_total` | Counter | none | Broadcasts dropped on full queues |
//! | `rc_actor_panics_total` | Counter | `actor_type` | Panicked actor tasks |
//! | `rc_request_duration_seconds` | Histogram | `event` | Client request handling time |

pub mod health;
pub mod metrics;

pub use health::{health_router, HealthState};
pub use metrics::init_metrics_recorder;
