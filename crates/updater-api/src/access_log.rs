//! Access log middleware — one line per request.
//!
//! The line carries the final status, the caller address (first
//! `X-Forwarded-For` value, else the socket peer), the elapsed time, the
//! method and URI, and the outcome message the handler recorded, if any.

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

use crate::recorder::RecordedOutcome;

/// Target of access log events.
pub const ACCESS_LOG_TARGET: &str = "updater::access";

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolve the apparent caller address.
pub fn resolve_remote(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get_all(FORWARDED_FOR).iter().next() {
        return String::from_utf8_lossy(forwarded.as_bytes()).into_owned();
    }
    peer.map_or_else(|| "-".to_string(), |addr| addr.to_string())
}

/// Everything the access log line reports about one request.
#[derive(Debug)]
pub struct AccessRecord<'a> {
    pub status: StatusCode,
    pub remote: &'a str,
    pub elapsed: Duration,
    pub method: &'a Method,
    pub uri: &'a Uri,
    pub outcome: Option<&'a str>,
}

impl fmt::Display for AccessRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:.6}s {} {}",
            self.status.as_u16(),
            self.remote,
            self.elapsed.as_secs_f64(),
            self.method,
            self.uri
        )?;
        if let Some(outcome) = self.outcome.filter(|o| !o.is_empty()) {
            write!(f, " - {outcome:?}")?;
        }
        Ok(())
    }
}

/// Middleware that logs every request after the inner service responds.
pub async fn access_log(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let uri = request.uri().clone();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let remote = resolve_remote(request.headers(), peer);

    let response = next.run(request).await;

    let outcome = response
        .extensions()
        .get::<RecordedOutcome>()
        .map(|RecordedOutcome(message)| message.as_str());
    let record = AccessRecord {
        status: response.status(),
        remote: &remote,
        elapsed: start.elapsed(),
        method: &method,
        uri: &uri,
        outcome,
    };

    info!(
        target: ACCESS_LOG_TARGET,
        status = record.status.as_u16(),
        remote = %record.remote,
        elapsed_secs = record.elapsed.as_secs_f64(),
        method = %record.method,
        path = %record.uri.path(),
        outcome = record.outcome.unwrap_or_default(),
        "{record}"
    );

    response
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::Router;
    use axum::body::Body;
    use axum::http::HeaderValue;
    use axum::routing::get;
    use serde_json::Value;
    use tower::ServiceExt;
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use updater_core::{
        DeploymentPatcher, GenerationStatus, RolloutTrigger, TriggerError, TriggerResult,
    };
    use updater_metrics::OutcomeCounters;

    use super::*;
    use crate::handlers::Updater;
    use crate::recorder::{ResponseRecorder, ResponseWriter};

    /// Collects target and rendered message of every event above TRACE.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<(String, String)>>>);

    impl Capture {
        fn events(&self) -> Vec<(String, String)> {
            self.0.lock().unwrap().clone()
        }
    }

    struct MessageVisitor(String);

    impl tracing::field::Visit for MessageVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::TRACE {
                return;
            }
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.0
                .lock()
                .unwrap()
                .push((event.metadata().target().to_string(), visitor.0));
        }
    }

    /// Answers each patch with the next scripted result.
    struct ScriptedPatcher(Mutex<Vec<TriggerResult<GenerationStatus>>>);

    #[async_trait]
    impl DeploymentPatcher for ScriptedPatcher {
        async fn patch_deployment(
            &self,
            _: &str,
            _: &str,
            _: &Value,
        ) -> TriggerResult<GenerationStatus> {
            self.0.lock().unwrap().remove(0)
        }
    }

    fn updater_router(answers: Vec<TriggerResult<GenerationStatus>>) -> Router {
        let patcher = Arc::new(ScriptedPatcher(Mutex::new(answers)));
        let trigger = RolloutTrigger::new(patcher, "prod", "web");
        let updater = Updater::new("secret", trigger, Arc::new(OutcomeCounters::new()));
        crate::build_router(Arc::new(updater))
    }

    fn post(uri: &str, token: Option<&str>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().method("POST").uri(uri);
        if let Some(token) = token {
            builder = builder.header("token", token);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn record<'a>(
        remote: &'a str,
        method: &'a Method,
        uri: &'a Uri,
        outcome: Option<&'a str>,
    ) -> AccessRecord<'a> {
        AccessRecord {
            status: StatusCode::FORBIDDEN,
            remote,
            elapsed: Duration::from_millis(1500),
            method,
            uri,
            outcome,
        }
    }

    #[test]
    fn forwarded_header_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.append(FORWARDED_FOR, HeaderValue::from_static("203.0.113.7"));
        headers.append(FORWARDED_FOR, HeaderValue::from_static("198.51.100.1"));
        let peer: SocketAddr = "10.0.0.5:41000".parse().unwrap();

        assert_eq!(resolve_remote(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn falls_back_to_peer_then_dash() {
        let peer: SocketAddr = "10.0.0.5:41000".parse().unwrap();
        assert_eq!(resolve_remote(&HeaderMap::new(), Some(peer)), "10.0.0.5:41000");
        assert_eq!(resolve_remote(&HeaderMap::new(), None), "-");
    }

    #[test]
    fn line_quotes_outcome() {
        let method = Method::POST;
        let uri: Uri = "/".parse().unwrap();
        let line = record("10.0.0.5:41000", &method, &uri, Some("invalid token")).to_string();
        assert_eq!(line, "403 10.0.0.5:41000 1.500000s POST / - \"invalid token\"");
    }

    #[test]
    fn line_omits_empty_outcome() {
        let method = Method::GET;
        let uri: Uri = "/healthz".parse().unwrap();
        assert_eq!(
            record("-", &method, &uri, Some("")).to_string(),
            "403 - 1.500000s GET /healthz"
        );
        assert_eq!(
            record("-", &method, &uri, None).to_string(),
            "403 - 1.500000s GET /healthz"
        );
    }

    #[tokio::test]
    async fn logs_once_and_leaves_response_untouched() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = Router::new()
            .route(
                "/",
                get(|| async {
                    let mut recorder = ResponseRecorder::new();
                    recorder.abort(StatusCode::FORBIDDEN, "token header missing".to_string());
                    recorder
                }),
            )
            .layer(axum::middleware::from_fn(access_log));

        let req = axum::http::Request::builder()
            .uri("/")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let events = capture.events();
        assert_eq!(events.len(), 1);
        let (target, line) = &events[0];
        assert_eq!(target, ACCESS_LOG_TARGET);
        assert!(line.starts_with("403 203.0.113.7 "), "{line}");
        assert!(line.ends_with("GET / - \"token header missing\""), "{line}");
    }

    #[tokio::test]
    async fn router_logs_one_line_per_outcome() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = updater_router(vec![
            Ok(GenerationStatus::new(2, 1)),
            Ok(GenerationStatus::new(4, 4)),
            Err(TriggerError::Transport("connection refused".to_string())),
        ]);

        let statuses = [
            app.clone().oneshot(post("/", None)).await.unwrap().status(),
            app.clone().oneshot(post("/", Some("wrong"))).await.unwrap().status(),
            app.clone().oneshot(post("/", Some("secret"))).await.unwrap().status(),
            app.clone().oneshot(post("/deploy", Some("secret"))).await.unwrap().status(),
            app.oneshot(post("/", Some("secret"))).await.unwrap().status(),
        ];
        assert_eq!(
            statuses,
            [
                StatusCode::FORBIDDEN,
                StatusCode::FORBIDDEN,
                StatusCode::OK,
                StatusCode::OK,
                StatusCode::INTERNAL_SERVER_ERROR,
            ]
        );

        let events = capture.events();
        assert_eq!(events.len(), 5, "{events:?}");
        assert!(events.iter().all(|(target, _)| target == ACCESS_LOG_TARGET), "{events:?}");

        let lines: Vec<&str> = events.iter().map(|(_, line)| line.as_str()).collect();
        assert!(lines[0].ends_with("POST / - \"token header missing\""), "{}", lines[0]);
        assert!(lines[1].ends_with("POST / - \"invalid token\""), "{}", lines[1]);
        assert!(lines[2].starts_with("200 - "), "{}", lines[2]);
        assert!(
            lines[2].contains("POST / - \"updated deployment: rolling out new version "),
            "{}",
            lines[2]
        );
        assert!(
            lines[3].ends_with("POST /deploy - \"updated deployment: no change detected\""),
            "{}",
            lines[3]
        );
        assert!(lines[4].starts_with("500 - "), "{}", lines[4]);
        assert!(
            lines[4].ends_with(
                "POST / - \"unable to update deployment: transport error: connection refused\""
            ),
            "{}",
            lines[4]
        );
    }
}
