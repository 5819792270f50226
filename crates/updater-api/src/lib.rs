//! updater-api — HTTP surface of the deployment updater.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | ANY | `/` and any unmatched path | Validate `Token` header and trigger a rollout |
//! | GET | `/metrics` | Prometheus exposition of trigger outcomes |
//! | GET | `/healthz` | Liveness probe |
//!
//! Like a catch-all `/` pattern, every path other than `/metrics` and
//! `/healthz` reaches the trigger. Every route runs behind the access log
//! middleware.

pub mod access_log;
pub mod handlers;
pub mod recorder;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{any, get};

pub use access_log::{ACCESS_LOG_TARGET, AccessRecord, access_log, resolve_remote};
pub use handlers::{TOKEN_HEADER, Updater};
pub use recorder::{RecordedOutcome, ResponseRecorder, ResponseWriter};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub updater: Arc<Updater>,
}

/// Build the complete router (trigger + metrics + health).
pub fn build_router(updater: Arc<Updater>) -> Router {
    let state = ApiState { updater };

    Router::new()
        .route("/", any(handlers::trigger))
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/healthz", get(handlers::healthz))
        .fallback(handlers::trigger)
        .with_state(state)
        .layer(middleware::from_fn(access_log))
}
