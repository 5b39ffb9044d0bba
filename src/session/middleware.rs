use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::gateway::{
    state::AppState,
    types::{ApiError, error_codes},
};

/// Alternate header carrying the raw token (no `Bearer ` prefix)
pub const TOKEN_HEADER: &str = "x-jwt-token";

enum TokenSource<'a> {
    Found(&'a str),
    Malformed,
    Missing,
}

/// A `Bearer` Authorization header wins. Any other Authorization scheme
/// falls through to [`TOKEN_HEADER`].
fn extract_token(headers: &HeaderMap) -> TokenSource<'_> {
    let authorization = headers.get(header::AUTHORIZATION);
    if let Some(value) = authorization {
        if let Some(token) = value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
            return match token.trim() {
                "" => TokenSource::Malformed,
                token => TokenSource::Found(token),
            };
        }
    }
    match headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        Some(token) if !token.trim().is_empty() => TokenSource::Found(token.trim()),
        Some(_) => TokenSource::Malformed,
        None if authorization.is_some() => TokenSource::Malformed,
        None => TokenSource::Missing,
    }
}

/// Verify the bearer token and inject its [`Claims`](super::Claims) into the
/// request extensions
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match extract_token(request.headers()) {
        TokenSource::Found(token) => token,
        TokenSource::Malformed => {
            return Err(ApiError::unauthorized(
                error_codes::AUTH_FAILED,
                "Invalid token format",
            ));
        }
        TokenSource::Missing => {
            return Err(ApiError::unauthorized(
                error_codes::MISSING_AUTH,
                "Missing bearer token",
            ));
        }
    };

    match state.tokens.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %request.uri().path(), "Rejected token");
            Err(ApiError::unauthorized(
                error_codes::AUTH_FAILED,
                "Invalid or expired token",
            ))
        }
    }
}
