//! Bearer-token sessions
//!
//! - [`token`]: HS256 issue/verify bound to one account number
//! - [`middleware`]: axum layer that authenticates protected routes

pub mod middleware;
pub mod token;

pub use middleware::{TOKEN_HEADER, jwt_auth_middleware};
pub use token::{Claims, MAX_TOKEN_TTL_SECS, SessionConfig, SessionError, TokenService};
