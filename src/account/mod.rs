//! Account management module
//!
//! Entity, repository seam and its two stores (PostgreSQL, in-memory).

pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

// Re-export commonly used types
pub use memory::MemoryAccountRepository;
pub use models::{Account, AccountView, generate_account_number};
pub use postgres::PgAccountRepository;
pub use repository::{AccountRepository, AccountTx, LockedAccount, StoreError};
