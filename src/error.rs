//! Domain error taxonomy surfaced by the bank service

use thiserror::Error;

use crate::account::StoreError;
use crate::credentials::HashingError;
use crate::session::SessionError;
use crate::transfer::TransferError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for BankError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => BankError::NotFound(format!("account {}", what)),
            StoreError::Conflict(msg) => BankError::Conflict(msg),
            other => BankError::Storage(other.to_string()),
        }
    }
}

impl From<TransferError> for BankError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::InvalidAmount | TransferError::SameAccount => {
                BankError::InvalidInput(e.to_string())
            }
            TransferError::AccountNotFound(number) => {
                BankError::NotFound(format!("account number {}", number))
            }
            TransferError::InsufficientFunds => BankError::InsufficientFunds,
            TransferError::Timeout => BankError::Timeout(e.to_string()),
            TransferError::Storage(msg) => BankError::Storage(msg),
        }
    }
}

impl From<HashingError> for BankError {
    fn from(e: HashingError) -> Self {
        match e {
            HashingError::PasswordTooLong { .. } => BankError::InvalidInput(e.to_string()),
            other => BankError::Storage(other.to_string()),
        }
    }
}

impl From<SessionError> for BankError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Expired | SessionError::Invalid(_) => {
                BankError::Unauthorized(e.to_string())
            }
            other => BankError::Storage(other.to_string()),
        }
    }
}
