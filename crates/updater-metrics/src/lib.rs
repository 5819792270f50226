//! updater-metrics — observability for trigger outcomes.
//!
//! Counts how many trigger requests started a rollout and how many were
//! no-ops, and renders both series in the Prometheus text format.
//!
//! # Architecture
//!
//! ```text
//! OutcomeCounters
//!   ├── increment(Outcome) ← called once per successful trigger
//!   └── get(Outcome)
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod counters;
pub mod prometheus;

pub use counters::{Outcome, OutcomeCounters};
pub use prometheus::{CONTENT_TYPE, render_prometheus};
