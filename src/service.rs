//! Bank service: the boundary surface consumed by the HTTP layer
//!
//! Everything returned from here is an [`AccountView`]; raw accounts (and
//! their credential hashes) never leave this module.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::account::{Account, AccountRepository, AccountView, StoreError};
use crate::credentials::{CredentialHasher, HashingError};
use crate::error::BankError;
use crate::session::TokenService;
use crate::transfer::TransferEngine;

/// Longest first or last name accepted (matches the column width)
pub const MAX_NAME_CHARS: usize = 100;

/// Hashed once at startup and verified against on logins for unknown numbers
const DUMMY_PASSWORD: &str = "simplebank-unknown-account";

/// Account creation request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[schema(example = "abhi")]
    pub first_name: String,
    #[schema(example = "anand")]
    pub last_name: String,
    #[schema(example = "password123")]
    pub password: String,
}

/// Partial account update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = 4_820_193_746_551_i64)]
    pub number: i64,
    #[schema(example = "password123")]
    pub password: String,
}

/// Login response (JWT)
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub number: i64,
    pub token: String,
}

fn validate_name(field: &str, value: &str) -> Result<String, BankError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BankError::InvalidInput(format!("{} must not be empty", field)));
    }
    if value.chars().count() > MAX_NAME_CHARS {
        return Err(BankError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_CHARS
        )));
    }
    Ok(value.to_string())
}

fn validate_password(password: &str) -> Result<(), BankError> {
    if password.is_empty() {
        return Err(BankError::InvalidInput(
            "password must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub struct BankService {
    repo: Arc<dyn AccountRepository>,
    hasher: CredentialHasher,
    tokens: Arc<TokenService>,
    transfers: TransferEngine,
    /// Same cost as real hashes, so unknown numbers take as long to reject
    dummy_hash: String,
}

impl BankService {
    pub fn new(
        repo: Arc<dyn AccountRepository>,
        hasher: CredentialHasher,
        tokens: Arc<TokenService>,
        transfers: TransferEngine,
    ) -> Result<Self, HashingError> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            repo,
            hasher,
            tokens,
            transfers,
            dummy_hash,
        })
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Build (hash) and persist a new account
    pub async fn create_account(
        &self,
        req: CreateAccountRequest,
    ) -> Result<AccountView, BankError> {
        self.open_account(req, 0).await
    }

    /// Create an account with a starting balance (seeding)
    pub async fn open_account(
        &self,
        req: CreateAccountRequest,
        opening_balance: i64,
    ) -> Result<AccountView, BankError> {
        let first_name = validate_name("firstName", &req.first_name)?;
        let last_name = validate_name("lastName", &req.last_name)?;
        validate_password(&req.password)?;

        // Argon2 is CPU bound; keep it off the async workers.
        let hasher = self.hasher.clone();
        let password = req.password;
        let account = tokio::task::spawn_blocking(move || {
            Account::create(first_name, last_name, &password, &hasher)
        })
        .await
        .map_err(|e| BankError::Storage(format!("hashing task failed: {}", e)))??
        .with_opening_balance(opening_balance);

        let account = self.repo.create(account).await?;
        Ok(account.view())
    }

    pub async fn get_account(&self, id: i64) -> Result<AccountView, BankError> {
        Ok(self.repo.get_by_id(id).await?.view())
    }

    pub async fn get_account_by_number(&self, number: i64) -> Result<AccountView, BankError> {
        Ok(self.repo.get_by_number(number).await?.view())
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountView>, BankError> {
        let accounts = self.repo.list_all().await?;
        Ok(accounts.iter().map(Account::view).collect())
    }

    /// Change names and/or password. The balance is never touched here.
    pub async fn update_account(
        &self,
        id: i64,
        req: UpdateAccountRequest,
    ) -> Result<AccountView, BankError> {
        let mut account = self.repo.get_by_id(id).await?;

        if let Some(first_name) = req.first_name {
            account.first_name = validate_name("firstName", &first_name)?;
        }
        if let Some(last_name) = req.last_name {
            account.last_name = validate_name("lastName", &last_name)?;
        }
        if let Some(password) = req.password {
            validate_password(&password)?;
            let hasher = self.hasher.clone();
            account.encrypted_password =
                tokio::task::spawn_blocking(move || hasher.hash(&password))
                    .await
                    .map_err(|e| BankError::Storage(format!("hashing task failed: {}", e)))??;
        }

        self.repo.update(&account).await?;
        // Re-read so the returned balance is the committed one.
        Ok(self.repo.get_by_id(id).await?.view())
    }

    pub async fn delete_account(&self, id: i64) -> Result<(), BankError> {
        self.repo.delete(id).await?;
        tracing::info!(id, "Account deleted");
        Ok(())
    }

    /// Check credentials and issue a bearer token bound to the account number.
    ///
    /// Unknown numbers and wrong passwords are indistinguishable to the caller,
    /// in both the error returned and the hashing work done.
    pub async fn authenticate(
        &self,
        number: i64,
        password: &str,
    ) -> Result<LoginResponse, BankError> {
        let stored_hash = match self.repo.get_by_number(number).await {
            Ok(account) => Some(account.encrypted_password),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        let known = stored_hash.is_some();

        let hasher = self.hasher.clone();
        let stored_hash = stored_hash.unwrap_or_else(|| self.dummy_hash.clone());
        let candidate = password.to_string();
        let valid = tokio::task::spawn_blocking(move || hasher.verify(&stored_hash, &candidate))
            .await
            .map_err(|e| BankError::Storage(format!("verify task failed: {}", e)))?;

        if !known {
            tracing::warn!(number, "Login for unknown account number");
            return Err(BankError::Unauthorized("invalid credentials".to_string()));
        }
        if !valid {
            tracing::warn!(number, "Login with wrong password");
            return Err(BankError::Unauthorized("invalid credentials".to_string()));
        }

        let token = self.tokens.issue(number)?;
        Ok(LoginResponse { number, token })
    }

    pub async fn transfer(&self, from: i64, to: i64, amount: i64) -> Result<(), BankError> {
        self.transfers.transfer(from, to, amount).await?;
        Ok(())
    }
}
