//! HTTP handlers for the gateway operations and shared reply plumbing.
//!
//! Handlers only decode JSON, build the per-call [`CallContext`] and render the
//! resulting [`Outcome`]. Validation and domain dispatch live in
//! [`crate::gateway`].

pub mod health;
pub mod is_admin;
pub mod login;
pub mod register;

use crate::gateway::{CallContext, Outcome, OutcomeCode, Violation};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use utoipa::ToSchema;

/// Caller-supplied deadline for the whole call, in milliseconds.
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

// nginx "client closed request"
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Error reply body shared by every failed call.
#[derive(ToSchema, Serialize, Debug)]
pub struct ErrorBody {
    code: OutcomeCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<Vec<Violation>>,
}

impl ErrorBody {
    fn new(code: OutcomeCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            violations: None,
        }
    }
}

#[must_use]
pub fn status_code(code: OutcomeCode) -> StatusCode {
    match code {
        OutcomeCode::Ok => StatusCode::OK,
        OutcomeCode::InvalidArgument => StatusCode::BAD_REQUEST,
        OutcomeCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        OutcomeCode::Cancelled => {
            StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::REQUEST_TIMEOUT)
        }
        OutcomeCode::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        OutcomeCode::Unimplemented => StatusCode::NOT_IMPLEMENTED,
    }
}

fn error_reply(body: ErrorBody) -> Response {
    (status_code(body.code), Json(body)).into_response()
}

impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        let code = self.code();
        match self {
            Self::Success(payload) => (status_code(code), Json(payload)).into_response(),
            Self::InvalidInput(err) => error_reply(ErrorBody {
                code,
                message: "invalid request".to_string(),
                violations: Some(err.into_violations()),
            }),
            Self::Internal => error_reply(ErrorBody::new(code, "internal error")),
            Self::Cancelled => error_reply(ErrorBody::new(code, "call cancelled")),
            Self::DeadlineExceeded => error_reply(ErrorBody::new(code, "deadline exceeded")),
            Self::Unsupported => error_reply(ErrorBody::new(code, "not supported")),
        }
    }
}

/// Reply for a body that could not be decoded as JSON at all.
pub(crate) fn malformed(rejection: &JsonRejection) -> Response {
    debug!("Rejected request body: {}", rejection.body_text());

    error_reply(ErrorBody::new(
        OutcomeCode::InvalidArgument,
        "invalid request body",
    ))
}

/// Build the context for one call: a child of the server shutdown token plus
/// the caller's deadline, if one was sent.
pub(crate) fn call_context(shutdown: &CancellationToken, headers: &HeaderMap) -> CallContext {
    let ctx = CallContext::new(shutdown.child_token());

    match request_timeout(headers) {
        Some(timeout) => ctx.with_timeout(timeout),
        None => ctx,
    }
}

fn request_timeout(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(REQUEST_TIMEOUT_HEADER)?;
    match value.to_str().ok().and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(millis) => Some(Duration::from_millis(millis)),
        None => {
            debug!("Ignoring malformed {REQUEST_TIMEOUT_HEADER} header: {:?}", value);
            None
        }
    }
}

/// Fallback for operations this gateway does not serve.
pub async fn not_supported() -> Response {
    Outcome::<()>::Unsupported.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_status_codes() {
        assert_eq!(status_code(OutcomeCode::Ok), StatusCode::OK);
        assert_eq!(
            status_code(OutcomeCode::InvalidArgument),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_code(OutcomeCode::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_code(OutcomeCode::Cancelled).as_u16(), 499);
        assert_eq!(
            status_code(OutcomeCode::DeadlineExceeded),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_code(OutcomeCode::Unimplemented),
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[test]
    fn test_request_timeout_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_timeout(&headers), None);

        headers.insert(REQUEST_TIMEOUT_HEADER, HeaderValue::from_static("250"));
        assert_eq!(request_timeout(&headers), Some(Duration::from_millis(250)));

        headers.insert(REQUEST_TIMEOUT_HEADER, HeaderValue::from_static("soon"));
        assert_eq!(request_timeout(&headers), None);
    }

    #[test]
    fn test_call_context_follows_shutdown() {
        let shutdown = CancellationToken::new();
        let ctx = call_context(&shutdown, &HeaderMap::new());
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_cancelled());

        shutdown.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_call_context_with_deadline() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_TIMEOUT_HEADER, HeaderValue::from_static("5000"));
        let ctx = call_context(&CancellationToken::new(), &headers);
        assert!(ctx.deadline().is_some());
    }

    #[test]
    fn test_unsupported_reply() {
        let response = Outcome::<()>::Unsupported.into_response();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }
}
