use super::{ErrorBody, call_context, malformed};
use crate::gateway::{Gateway, RegisterRequest};
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
pub struct RegisterResponse {
    user_id: i64,
}

#[utoipa::path(
    post,
    path= "/v1/auth/register",
    request_body = RegisterRequest,
    responses (
        (status = 200, description = "Registration successful", body = RegisterResponse, content_type = "application/json"),
        (status = 400, description = "Request rejected before reaching the domain", body = ErrorBody),
        (status = 500, description = "Registration failed", body = ErrorBody),
    ),
    tag= "auth"
)]
#[instrument(skip(gateway, shutdown, headers, payload))]
pub async fn register(
    gateway: Extension<Arc<Gateway>>,
    shutdown: Extension<CancellationToken>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return malformed(&rejection),
    };

    debug!("request: {:?}", request);

    let ctx = call_context(&shutdown, &headers);

    gateway
        .register(&ctx, &request)
        .await
        .map(|user_id| RegisterResponse { user_id })
        .into_response()
}
