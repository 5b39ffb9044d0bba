pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::session::jwt_auth_middleware;
use state::AppState;

/// Build the full router
///
/// ```text
/// /api/v1/health           public
/// /api/v1/login            public
/// /api/v1/account          public   (GET list, POST create)
/// /api/v1/account/{id}     JWT      (GET, PUT own account, DELETE)
/// /api/v1/transfer         JWT
/// /api-docs/openapi.json   public
/// ```
pub fn build_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/login", post(handlers::login))
        .route(
            "/account",
            get(handlers::list_accounts).post(handlers::create_account),
        );

    let protected_routes = Router::new()
        .route(
            "/account/{id}",
            get(handlers::get_account)
                .put(handlers::update_account)
                .delete(handlers::delete_account),
        )
        .route("/transfer", post(handlers::create_transfer))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .nest("/api/v1", public_routes.merge(protected_routes))
        .with_state(state)
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
}

/// Start HTTP Gateway server; returns once a shutdown signal arrives
pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> std::io::Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!(%addr, error = %e, "Failed to bind; port may already be in use");
        e
    })?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
