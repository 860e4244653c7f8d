use crate::GIT_COMMIT_HASH;
use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
}

impl Health {
    fn current() -> Self {
        Self {
            commit: GIT_COMMIT_HASH.to_string(),
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// `name:version:short-commit`, sent as `X-App` on every health reply.
    fn x_app(&self) -> String {
        let short_hash = self.commit.get(0..7).unwrap_or_default();
        format!("{}:{}:{short_hash}", self.name, self.version)
    }
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Gateway is up", body = Health),
    ),
    tag= "health"
)]
pub async fn health() -> impl IntoResponse {
    let health = Health::current();

    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(&health.x_app()) {
        Ok(value) => {
            headers.insert("X-App", value);
        }
        Err(err) => error!("Failed to build X-App header: {}", err),
    }

    (StatusCode::OK, headers, Json(health))
}
