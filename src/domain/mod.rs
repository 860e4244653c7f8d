//! The authentication capability the gateway delegates to.
//!
//! The gateway consumes an [`Auth`] implementation; it never constructs one
//! itself. Implementations must be safe to share across concurrent calls.

pub mod remote;
pub use self::remote::RemoteAuth;

use crate::gateway::context::{CallContext, Interrupted};
use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unknown application")]
    AppNotFound,
    #[error("user already exists")]
    UserExists,
    #[error("user not found")]
    UserNotFound,
    #[error("upstream failure: {0}")]
    Upstream(String),
    #[error("call cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl From<Interrupted> for AuthError {
    fn from(interrupted: Interrupted) -> Self {
        match interrupted {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

#[async_trait]
pub trait Auth: Send + Sync {
    /// Authenticate `email` for application `app_id` and issue a token.
    async fn login(
        &self,
        ctx: &CallContext,
        email: &str,
        password: &SecretString,
        app_id: i32,
    ) -> Result<String, AuthError>;

    /// Create a user and return its identifier.
    async fn register_new_user(
        &self,
        ctx: &CallContext,
        email: &str,
        password: &SecretString,
    ) -> Result<i64, AuthError>;

    async fn is_admin(&self, ctx: &CallContext, user_id: i64) -> Result<bool, AuthError>;
}
