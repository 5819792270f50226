//! HTTP handlers.
//!
//! `Updater::handle` carries the trigger logic and talks to the response only
//! through `ResponseWriter`; the axum functions below adapt it to routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use chrono::{SecondsFormat, Utc};

use updater_core::{RolloutTrigger, check_token};
use updater_metrics::{Outcome, OutcomeCounters};

use crate::ApiState;
use crate::recorder::{ResponseRecorder, ResponseWriter};

/// Request header carrying the shared token.
pub const TOKEN_HEADER: &str = "token";

/// Trigger service: the configured token, the rollout trigger and the
/// outcome counters. Built once at startup.
pub struct Updater {
    token: Vec<u8>,
    trigger: RolloutTrigger,
    counters: Arc<OutcomeCounters>,
}

impl Updater {
    pub fn new(
        token: impl Into<Vec<u8>>,
        trigger: RolloutTrigger,
        counters: Arc<OutcomeCounters>,
    ) -> Self {
        Self {
            token: token.into(),
            trigger,
            counters,
        }
    }

    pub fn counters(&self) -> &OutcomeCounters {
        &self.counters
    }

    /// Validate the request token, patch the deployment and record the outcome.
    pub async fn handle(&self, headers: &HeaderMap, w: &mut dyn ResponseWriter) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.handle_at(headers, &timestamp, w).await;
    }

    /// `handle` with the annotation timestamp supplied by the caller.
    pub async fn handle_at(
        &self,
        headers: &HeaderMap,
        timestamp: &str,
        w: &mut dyn ResponseWriter,
    ) {
        let supplied = headers
            .get_all(TOKEN_HEADER)
            .iter()
            .next()
            .map(|value| value.as_bytes());
        if let Some(reason) = check_token(supplied, &self.token).rejection() {
            w.abort(StatusCode::FORBIDDEN, reason.to_string());
            return;
        }

        let triggered = match self.trigger.trigger(timestamp).await {
            Ok(triggered) => triggered,
            Err(e) => {
                w.abort(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("unable to update deployment: {e}"),
                );
                return;
            }
        };

        let outcome = Outcome::from_triggered(triggered);
        match outcome {
            Outcome::Triggered => {
                w.ok(format!("updated deployment: rolling out new version {timestamp}"));
            }
            Outcome::NoOp => w.ok("updated deployment: no change detected".to_string()),
        }
        self.counters.increment(outcome);
    }
}

/// ANY /
pub async fn trigger(State(state): State<ApiState>, headers: HeaderMap) -> ResponseRecorder {
    let mut recorder = ResponseRecorder::new();
    state.updater.handle(&headers, &mut recorder).await;
    recorder
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok\n"
}

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = updater_metrics::render_prometheus(state.updater.counters());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, updater_metrics::CONTENT_TYPE)],
        body,
    )
}
