use super::{ErrorBody, call_context, malformed};
use crate::gateway::{Gateway, LoginRequest};
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    token: String,
}

#[utoipa::path(
    post,
    path= "/v1/auth/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Login successful", body = LoginResponse, content_type = "application/json"),
        (status = 400, description = "Request rejected before reaching the domain", body = ErrorBody),
        (status = 500, description = "Login failed", body = ErrorBody),
        (status = 504, description = "Caller deadline exceeded", body = ErrorBody),
    ),
    tag= "auth"
)]
#[instrument(skip(gateway, shutdown, headers, payload))]
pub async fn login(
    gateway: Extension<Arc<Gateway>>,
    shutdown: Extension<CancellationToken>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return malformed(&rejection),
    };

    debug!("request: {:?}", request);

    let ctx = call_context(&shutdown, &headers);

    gateway
        .login(&ctx, &request)
        .await
        .map(|token| LoginResponse { token })
        .into_response()
}
