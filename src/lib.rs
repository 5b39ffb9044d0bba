//! simplebank - Minimal banking backend
//!
//! Accounts with hashed credentials, bearer-token sessions and atomic,
//! deadlock-free transfers between accounts.
//!
//! # Modules
//!
//! - [`account`] - Account entity and repositories (Postgres, in-memory)
//! - [`credentials`] - Argon2 password hashing
//! - [`transfer`] - Ordered dual-lock transfer engine
//! - [`session`] - JWT issue/verify and the auth middleware
//! - [`service`] - Bank service boundary used by the gateway
//! - [`gateway`] - axum HTTP routes
//! - [`error`] - Domain error taxonomy
//! - [`config`] / [`logging`] / [`db`] - Runtime plumbing

pub mod account;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod service;
pub mod session;
pub mod transfer;

// Convenient re-exports at crate root
pub use account::{Account, AccountRepository, AccountView};
pub use error::BankError;
pub use service::BankService;
pub use transfer::{TransferEngine, TransferError};
