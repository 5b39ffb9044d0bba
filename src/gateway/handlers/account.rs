//! Account handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
};

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, DeleteResponse, created, error_codes, ok};
use crate::account::AccountView;
use crate::service::{CreateAccountRequest, UpdateAccountRequest};
use crate::session::Claims;

/// List all accounts
#[utoipa::path(
    get,
    path = "/api/v1/account",
    responses(
        (status = 200, description = "All accounts", body = Vec<AccountView>,
            content_type = "application/json"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Account"
)]
pub async fn list_accounts(State(state): State<Arc<AppState>>) -> ApiResult<Vec<AccountView>> {
    ok(state.bank.list_accounts().await?)
}

/// Open a new account (balance starts at zero)
#[utoipa::path(
    post,
    path = "/api/v1/account",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = AccountView,
            content_type = "application/json"),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Could not allocate a unique account number")
    ),
    tag = "Account"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<AccountView> {
    let Json(req) = payload?;
    let view = state.bank.create_account(req).await?;
    tracing::info!(id = view.id, number = view.number, "Account created");
    created(view)
}

/// Get one account by id
#[utoipa::path(
    get,
    path = "/api/v1/account/{id}",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account", body = AccountView,
            content_type = "application/json"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<AccountView> {
    let Path(id) = id?;
    ok(state.bank.get_account(id).await?)
}

/// Update names and/or password of the caller's own account
#[utoipa::path(
    put,
    path = "/api/v1/account/{id}",
    params(("id" = i64, Path, description = "Account id")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountView,
            content_type = "application/json"),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Token does not own this account"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> ApiResult<AccountView> {
    let Path(id) = id?;
    let Json(req) = payload?;

    let current = state.bank.get_account(id).await?;
    if current.number != claims.account_number {
        tracing::warn!(
            id,
            caller = claims.account_number,
            "Update rejected for foreign account"
        );
        return ApiError::unauthorized(
            error_codes::FORBIDDEN_ACCOUNT,
            "Token does not own this account",
        )
        .into_err();
    }

    ok(state.bank.update_account(id, req).await?)
}

/// Delete an account by id
#[utoipa::path(
    delete,
    path = "/api/v1/account/{id}",
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account deleted", body = DeleteResponse,
            content_type = "application/json"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such account")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<DeleteResponse> {
    let Path(id) = id?;
    state.bank.delete_account(id).await?;
    ok(DeleteResponse { deleted: id })
}
