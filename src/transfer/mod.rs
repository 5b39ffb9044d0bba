//! Account-to-account transfers
//!
//! - [`engine`]: ordered dual-lock debit/credit in one transaction
//! - [`lock_order`]: the global lock ordering rule
//! - [`error`]: transfer error taxonomy

pub mod engine;
pub mod error;
pub mod lock_order;

pub use engine::TransferEngine;
pub use error::TransferError;
pub use lock_order::LockOrder;
