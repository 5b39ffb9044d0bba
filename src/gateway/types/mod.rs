//! Gateway types module
//!
//! ## Input Types
//! - [`TransferRequest`]: transfer body (source account comes from the token)
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`] / [`ApiResult`]: handler error path
//!
//! ## Submodules
//! - [`error`]: ApiError and result helpers
//! - [`request`]: request bodies owned by the HTTP layer
//! - [`response`]: Response types and error codes

pub mod error;
pub mod request;
pub mod response;

pub use error::{ApiError, ApiResult, created, ok};
pub use request::{TransferRequest, TransferResponse};
pub use response::{ApiResponse, DeleteResponse, error_codes};
