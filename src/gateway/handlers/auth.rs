use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use super::super::state::AppState;
use super::super::types::{ApiResult, ok};
use crate::service::{LoginRequest, LoginResponse};

/// Exchange account number and password for a bearer token
///
/// POST /api/v1/login
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse,
            content_type = "application/json"),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(req) = payload?;
    let resp = state.bank.authenticate(req.number, &req.password).await?;
    tracing::info!(number = resp.number, "Login successful");
    ok(resp)
}
