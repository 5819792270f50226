//! Response recorder — captures the final status and outcome message of a
//! request so the access log can report them after the handler returns.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Outcome message attached to a response for the access log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOutcome(pub String);

/// Capabilities the trigger handler needs from the outbound response.
pub trait ResponseWriter: Send {
    fn set_status(&mut self, status: StatusCode);

    fn set_message(&mut self, message: String);

    fn write_body(&mut self, body: &str);

    /// Fail the request with `status` and record `message`.
    fn abort(&mut self, status: StatusCode, message: String) {
        self.set_status(status);
        self.write_body(&message);
        self.set_message(message);
    }

    /// Record `message` for a successful request. The status stays as is.
    fn ok(&mut self, message: String) {
        self.write_body(&message);
        self.set_message(message);
    }
}

/// Per-request `ResponseWriter` that buffers the response until the handler
/// is done.
#[derive(Debug)]
pub struct ResponseRecorder {
    status: StatusCode,
    message: String,
    body: String,
}

impl Default for ResponseRecorder {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            message: String::new(),
            body: String::new(),
        }
    }
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ResponseWriter for ResponseRecorder {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn set_message(&mut self, message: String) {
        self.message = message;
    }

    fn write_body(&mut self, body: &str) {
        self.body.push_str(body);
        if !body.ends_with('\n') {
            self.body.push('\n');
        }
    }
}

impl IntoResponse for ResponseRecorder {
    fn into_response(self) -> Response {
        let mut response = (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.body,
        )
            .into_response();
        if !self.message.is_empty() {
            response
                .extensions_mut()
                .insert(RecordedOutcome(self.message));
        }
        response
    }
}
