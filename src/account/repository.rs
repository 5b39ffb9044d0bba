//! Account repository seam
//!
//! `AccountRepository` covers plain CRUD. Balance mutation only happens
//! through an [`AccountTx`], whose `get_for_update` holds an exclusive
//! row lock until the transaction is committed, rolled back or dropped.

use async_trait::async_trait;
use thiserror::Error;

use super::models::Account;

/// Attempts at drawing a fresh account number when the store reports a collision.
pub const MAX_NUMBER_ATTEMPTS: usize = 3;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Internal(String),
}

/// Row locked inside a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedAccount {
    pub id: i64,
    pub balance: i64,
}

/// Exclusive, transaction-scoped access to account rows
#[async_trait]
pub trait AccountTx: Send {
    /// Lock the row with this account number. `None` if no such account.
    async fn get_for_update(&mut self, number: i64) -> Result<Option<LockedAccount>, StoreError>;

    async fn debit(&mut self, id: i64, amount: i64) -> Result<(), StoreError>;

    async fn credit(&mut self, id: i64, amount: i64) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Durable account storage
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persist a new account and return it with its store-assigned id.
    ///
    /// Draws a new number and retries when the number is already taken.
    async fn create(&self, account: Account) -> Result<Account, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Write names and credential hash. The balance column is left alone.
    async fn update(&self, account: &Account) -> Result<(), StoreError>;

    async fn list_all(&self) -> Result<Vec<Account>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Account, StoreError>;

    async fn get_by_number(&self, number: i64) -> Result<Account, StoreError>;

    async fn begin(&self) -> Result<Box<dyn AccountTx>, StoreError>;
}
