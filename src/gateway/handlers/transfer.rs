//! Transfer handler

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};

use super::super::state::AppState;
use super::super::types::{ApiResult, TransferRequest, TransferResponse, ok};
use crate::session::Claims;

/// Move funds from the authenticated account to `toAccount`
///
/// POST /api/v1/transfer
#[utoipa::path(
    post,
    path = "/api/v1/transfer",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer committed", body = TransferResponse,
            content_type = "application/json"),
        (status = 400, description = "Non-positive amount or self-transfer"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Unknown account number"),
        (status = 409, description = "Insufficient funds"),
        (status = 503, description = "Transfer timed out")
    ),
    security(("bearer_auth" = [])),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<TransferResponse> {
    let Json(req) = payload?;
    let from = claims.account_number;

    state.bank.transfer(from, req.to_account, req.amount).await?;

    ok(TransferResponse {
        from_account: from,
        to_account: req.to_account,
        amount: req.amount,
    })
}
