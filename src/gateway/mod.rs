//! Request validation and dispatch in front of the authentication domain.
//!
//! Each handler is a single pass with no retries:
//! map the wire request into a command (rejecting with `InvalidInput` without
//! touching the domain), invoke the domain exactly once under the caller's
//! context, and translate the result into an [`Outcome`].

pub mod context;
pub mod mapper;
pub mod outcome;
pub mod validation;

pub use self::context::CallContext;
pub use self::mapper::{
    AdminCheckQuery, Field, IsAdminRequest, LoginCommand, LoginRequest, RegisterCommand,
    RegisterRequest, Rule, ValidationError, Violation,
};
pub use self::outcome::{Outcome, OutcomeCode, translate};

use crate::domain::{Auth, AuthError};
use std::{future::Future, sync::Arc, time::Duration};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct Gateway {
    auth: Arc<dyn Auth>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

impl Gateway {
    #[must_use]
    pub fn new(auth: Arc<dyn Auth>) -> Self {
        Self { auth }
    }

    #[instrument(skip(self, ctx, request), fields(app_id = request.app_id))]
    pub async fn login(&self, ctx: &CallContext, request: &LoginRequest) -> Outcome<String> {
        let command = match LoginCommand::try_from(request) {
            Ok(command) => command,
            Err(err) => return rejected("login", err),
        };

        let result = invoke(
            ctx,
            self.auth
                .login(ctx, &command.email, &command.password, command.app_id),
        )
        .await;

        translate("login", result)
    }

    #[instrument(skip(self, ctx, request))]
    pub async fn register(&self, ctx: &CallContext, request: &RegisterRequest) -> Outcome<i64> {
        let command = match RegisterCommand::try_from(request) {
            Ok(command) => command,
            Err(err) => return rejected("register", err),
        };

        let result = invoke(
            ctx,
            self.auth
                .register_new_user(ctx, &command.email, &command.password),
        )
        .await;

        translate("register", result)
    }

    #[instrument(skip(self, ctx, request), fields(user_id = request.user_id))]
    pub async fn is_admin(&self, ctx: &CallContext, request: &IsAdminRequest) -> Outcome<bool> {
        let query = match AdminCheckQuery::try_from(request) {
            Ok(query) => query,
            Err(err) => return rejected("is_admin", err),
        };

        let result = invoke(ctx, self.auth.is_admin(ctx, query.user_id)).await;

        translate("is_admin", result)
    }
}

fn rejected<T>(operation: &'static str, err: ValidationError) -> Outcome<T> {
    debug!(operation, %err, "request rejected");
    Outcome::InvalidInput(err)
}

// The domain sees the same context, but an implementation that ignores it
// must not be able to outlive the caller's cancellation or deadline.
async fn invoke<T, F>(ctx: &CallContext, call: F) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, AuthError>>,
{
    match ctx.run(call).await {
        Ok(Err(err @ (AuthError::Cancelled | AuthError::DeadlineExceeded)))
            if !caller_interrupted(ctx) =>
        {
            // only the caller's own context may surface as an interruption
            Err(AuthError::Upstream(format!("domain reported {err}")))
        }
        Ok(result) => result,
        Err(interrupted) => Err(interrupted.into()),
    }
}

fn caller_interrupted(ctx: &CallContext) -> bool {
    ctx.is_cancelled() || ctx.remaining() == Some(Duration::ZERO)
}
