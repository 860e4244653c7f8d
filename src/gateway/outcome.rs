//! Collapse domain results into the caller-visible outcome vocabulary.
//!
//! Every domain failure other than an interrupted call becomes
//! [`Outcome::Internal`]. The failure detail is logged here and nowhere else.

use super::mapper::ValidationError;
use crate::domain::AuthError;
use serde::Serialize;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    /// Rejected before the domain was invoked.
    InvalidInput(ValidationError),
    /// The domain failed. Carries no detail on purpose.
    Internal,
    Cancelled,
    DeadlineExceeded,
    /// The requested operation is not served by this gateway.
    Unsupported,
}

/// Stable wire codes, one per [`Outcome`] variant.
#[derive(ToSchema, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCode {
    Ok,
    InvalidArgument,
    Internal,
    Cancelled,
    DeadlineExceeded,
    Unimplemented,
}

impl OutcomeCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::InvalidArgument => "invalid_argument",
            Self::Internal => "internal",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Unimplemented => "unimplemented",
        }
    }
}

impl std::fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<T> Outcome<T> {
    #[must_use]
    pub const fn code(&self) -> OutcomeCode {
        match self {
            Self::Success(_) => OutcomeCode::Ok,
            Self::InvalidInput(_) => OutcomeCode::InvalidArgument,
            Self::Internal => OutcomeCode::Internal,
            Self::Cancelled => OutcomeCode::Cancelled,
            Self::DeadlineExceeded => OutcomeCode::DeadlineExceeded,
            Self::Unsupported => OutcomeCode::Unimplemented,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::InvalidInput(err) => Outcome::InvalidInput(err),
            Self::Internal => Outcome::Internal,
            Self::Cancelled => Outcome::Cancelled,
            Self::DeadlineExceeded => Outcome::DeadlineExceeded,
            Self::Unsupported => Outcome::Unsupported,
        }
    }
}

impl<T> From<ValidationError> for Outcome<T> {
    fn from(err: ValidationError) -> Self {
        Self::InvalidInput(err)
    }
}

/// Translate the result of a domain call made on behalf of `operation`.
pub fn translate<T>(operation: &'static str, result: Result<T, AuthError>) -> Outcome<T> {
    match result {
        Ok(value) => Outcome::Success(value),
        Err(AuthError::Cancelled) => {
            warn!(operation, "domain call cancelled");
            Outcome::Cancelled
        }
        Err(AuthError::DeadlineExceeded) => {
            warn!(operation, "domain call exceeded the caller deadline");
            Outcome::DeadlineExceeded
        }
        Err(err @ AuthError::Upstream(_)) => {
            error!(operation, error = %err, "domain call failed");
            Outcome::Internal
        }
        Err(err) => {
            debug!(operation, error = %err, "domain call rejected");
            Outcome::Internal
        }
    }
}
