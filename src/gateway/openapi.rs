//! OpenAPI Documentation
//!
//! Auto-generated OpenAPI 3.0 document for the bank API, served as JSON at
//! `/api-docs/openapi.json`.

use axum::Json;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::account::AccountView;
use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{DeleteResponse, TransferRequest, TransferResponse};
use crate::service::{CreateAccountRequest, LoginRequest, LoginResponse, UpdateAccountRequest};

/// HS256 bearer token issued by `/api/v1/login`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Simple Bank API",
        version = "1.0.0",
        description = "Accounts, bearer-token login and atomic account-to-account transfers.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::auth::login,
        crate::gateway::handlers::account::list_accounts,
        crate::gateway::handlers::account::create_account,
        crate::gateway::handlers::account::get_account,
        crate::gateway::handlers::account::update_account,
        crate::gateway::handlers::account::delete_account,
        crate::gateway::handlers::transfer::create_transfer,
    ),
    components(
        schemas(
            HealthResponse,
            AccountView,
            CreateAccountRequest,
            UpdateAccountRequest,
            LoginRequest,
            LoginResponse,
            TransferRequest,
            TransferResponse,
            DeleteResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "System", description = "Health"),
        (name = "Auth", description = "Login"),
        (name = "Account", description = "Account lifecycle"),
        (name = "Transfer", description = "Account-to-account transfers"),
    )
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
