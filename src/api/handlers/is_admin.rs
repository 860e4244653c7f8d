use super::{ErrorBody, call_context, malformed};
use crate::gateway::{Gateway, IsAdminRequest};
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct IsAdminResponse {
    is_admin: bool,
}

#[utoipa::path(
    post,
    path= "/v1/auth/is-admin",
    request_body = IsAdminRequest,
    responses (
        (status = 200, description = "Admin flag for the user", body = IsAdminResponse, content_type = "application/json"),
        (status = 400, description = "Request rejected before reaching the domain", body = ErrorBody),
        (status = 500, description = "Lookup failed", body = ErrorBody),
    ),
    tag= "auth"
)]
#[instrument(skip(gateway, shutdown, headers, payload))]
pub async fn is_admin(
    gateway: Extension<Arc<Gateway>>,
    shutdown: Extension<CancellationToken>,
    headers: HeaderMap,
    payload: Result<Json<IsAdminRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return malformed(&rejection),
    };

    let ctx = call_context(&shutdown, &headers);

    gateway
        .is_admin(&ctx, &request)
        .await
        .map(|is_admin| IsAdminResponse { is_admin })
        .into_response()
}
