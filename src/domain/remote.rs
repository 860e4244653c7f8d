//! [`Auth`] over HTTP: forwards each capability to an upstream authentication
//! service speaking JSON.
//!
//! - `POST {base}/v1/login` `{email, password, app_id}` -> `{token}`
//! - `POST {base}/v1/users` `{email, password}` -> `{user_id}`
//! - `GET {base}/v1/users/{user_id}/admin` -> `{is_admin}`

use super::{Auth, AuthError};
use crate::{APP_USER_AGENT, gateway::CallContext};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{Instrument, debug, info_span};
use url::Url;

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
    app_id: i32,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenReply {
    token: String,
}

#[derive(Deserialize)]
struct UserIdReply {
    user_id: i64,
}

#[derive(Deserialize)]
struct IsAdminReply {
    is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct RemoteAuth {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl RemoteAuth {
    /// Build a client for the upstream at `base_url`.
    ///
    /// `connect_timeout` only bounds connection establishment; how long a call
    /// may take is decided by the caller's [`CallContext`].
    ///
    /// # Errors
    /// Returns an error if the URL cannot be a base or the HTTP client cannot be built.
    pub fn new(
        base_url: &Url,
        token: Option<SecretString>,
        connect_timeout: Duration,
    ) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            anyhow::bail!("upstream URL cannot be a base: {base_url}");
        }

        // Url::join drops the last path segment unless it ends with '/'
        let mut base_url = base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .connect_timeout(connect_timeout)
            .build()
            .context("Error creating reqwest client")?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.base_url
            .join(path)
            .map_err(|e| AuthError::Upstream(format!("invalid upstream endpoint {path}: {e}")))
    }

    async fn call<T>(
        &self,
        ctx: &CallContext,
        operation: &'static str,
        request: RequestBuilder,
        rejection: fn(StatusCode) -> Option<AuthError>,
    ) -> Result<T, AuthError>
    where
        T: DeserializeOwned,
    {
        let mut request = request;
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(remaining) = ctx.remaining() {
            request = request.timeout(remaining);
        }

        let span = info_span!("upstream.request", operation);
        let response = ctx
            .run(request.send().instrument(span))
            .await?
            .map_err(|e| transport_error(ctx, &e))?;

        let status = response.status();
        debug!(operation, %status, "upstream responded");

        if !status.is_success() {
            return Err(rejection(status)
                .unwrap_or_else(|| AuthError::Upstream(format!("unexpected status {status}"))));
        }

        ctx.run(response.json::<T>())
            .await?
            .map_err(|e| transport_error(ctx, &e))
    }
}

fn transport_error(ctx: &CallContext, err: &reqwest::Error) -> AuthError {
    if err.is_timeout() && ctx.remaining() == Some(Duration::ZERO) {
        AuthError::DeadlineExceeded
    } else {
        AuthError::Upstream(err.to_string())
    }
}

fn login_rejection(status: StatusCode) -> Option<AuthError> {
    match status {
        StatusCode::UNAUTHORIZED => Some(AuthError::InvalidCredentials),
        StatusCode::NOT_FOUND => Some(AuthError::AppNotFound),
        _ => None,
    }
}

fn register_rejection(status: StatusCode) -> Option<AuthError> {
    match status {
        StatusCode::CONFLICT => Some(AuthError::UserExists),
        _ => None,
    }
}

fn is_admin_rejection(status: StatusCode) -> Option<AuthError> {
    match status {
        StatusCode::NOT_FOUND => Some(AuthError::UserNotFound),
        _ => None,
    }
}

#[async_trait]
impl Auth for RemoteAuth {
    async fn login(
        &self,
        ctx: &CallContext,
        email: &str,
        password: &SecretString,
        app_id: i32,
    ) -> Result<String, AuthError> {
        let body = LoginBody {
            email,
            password: password.expose_secret(),
            app_id,
        };
        let request = self.client.post(self.endpoint("v1/login")?).json(&body);
        let reply: TokenReply = self.call(ctx, "login", request, login_rejection).await?;

        Ok(reply.token)
    }

    async fn register_new_user(
        &self,
        ctx: &CallContext,
        email: &str,
        password: &SecretString,
    ) -> Result<i64, AuthError> {
        let body = RegisterBody {
            email,
            password: password.expose_secret(),
        };
        let request = self.client.post(self.endpoint("v1/users")?).json(&body);
        let reply: UserIdReply = self
            .call(ctx, "register_new_user", request, register_rejection)
            .await?;

        Ok(reply.user_id)
    }

    async fn is_admin(&self, ctx: &CallContext, user_id: i64) -> Result<bool, AuthError> {
        let request = self
            .client
            .get(self.endpoint(&format!("v1/users/{user_id}/admin"))?);
        let reply: IsAdminReply = self
            .call(ctx, "is_admin", request, is_admin_rejection)
            .await?;

        Ok(reply.is_admin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn remote(base: &str) -> RemoteAuth {
        RemoteAuth::new(&Url::parse(base).unwrap(), None, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let auth = remote("http://auth.internal:9000/api");
        assert_eq!(auth.base_url().as_str(), "http://auth.internal:9000/api/");
        assert_eq!(
            auth.endpoint("v1/login").unwrap().as_str(),
            "http://auth.internal:9000/api/v1/login"
        );
    }

    #[test]
    fn test_endpoint_from_root() {
        let auth = remote("http://127.0.0.1:9000");
        assert_eq!(
            auth.endpoint("v1/users/7/admin").unwrap().as_str(),
            "http://127.0.0.1:9000/v1/users/7/admin"
        );
    }

    #[test]
    fn test_cannot_be_a_base() {
        let url = Url::parse("mailto:auth@example.com").unwrap();
        assert!(RemoteAuth::new(&url, None, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            login_rejection(StatusCode::UNAUTHORIZED),
            Some(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            login_rejection(StatusCode::NOT_FOUND),
            Some(AuthError::AppNotFound)
        ));
        assert!(login_rejection(StatusCode::BAD_GATEWAY).is_none());
        assert!(matches!(
            register_rejection(StatusCode::CONFLICT),
            Some(AuthError::UserExists)
        ));
        assert!(matches!(
            is_admin_rejection(StatusCode::NOT_FOUND),
            Some(AuthError::UserNotFound)
        ));
    }

    #[test]
    fn test_debug_hides_token() {
        let auth = RemoteAuth::new(
            &Url::parse("http://127.0.0.1:9000").unwrap(),
            Some(SecretString::from("s3cr3t-upstream".to_string())),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!format!("{auth:?}").contains("s3cr3t-upstream"));
    }
}
