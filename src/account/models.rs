//! Account record and its public projection

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

use crate::credentials::{CredentialHasher, HashingError};

/// Account numbers are drawn uniformly from the 13-digit range.
pub const ACCOUNT_NUMBER_MIN: i64 = 1_000_000_000_000;
pub const ACCOUNT_NUMBER_MAX: i64 = 10_000_000_000_000;

/// Draw a random account number
pub fn generate_account_number() -> i64 {
    rand::thread_rng().gen_range(ACCOUNT_NUMBER_MIN..ACCOUNT_NUMBER_MAX)
}

/// Bank account
///
/// Not `Serialize`: the credential hash must only leave through [`AccountView`].
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    /// Store-assigned identity, 0 until persisted
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub number: i64,
    pub encrypted_password: String,
    /// Smallest currency unit, never negative
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Build a new unpersisted account with a fresh number and hashed password
    pub fn create(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password: &str,
        hasher: &CredentialHasher,
    ) -> Result<Self, HashingError> {
        let encrypted_password = hasher.hash(password)?;

        Ok(Self {
            id: 0,
            first_name: first_name.into(),
            last_name: last_name.into(),
            number: generate_account_number(),
            encrypted_password,
            balance: 0,
            created_at: Utc::now(),
        })
    }

    /// Set the balance the account is inserted with (seeding only).
    /// Negative amounts are clamped to zero.
    pub fn with_opening_balance(mut self, amount: i64) -> Self {
        self.balance = amount.max(0);
        self
    }

    pub fn verify(&self, candidate: &str, hasher: &CredentialHasher) -> bool {
        hasher.verify(&self.encrypted_password, candidate)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            number: self.number,
            balance: self.balance,
            created_at: self.created_at,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("number", &self.number)
            .field("encrypted_password", &"<redacted>")
            .field("balance", &self.balance)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Externally visible account projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "abhi")]
    pub first_name: String,
    #[schema(example = "anand")]
    pub last_name: String,
    #[schema(example = 4_820_193_746_551_i64)]
    pub number: i64,
    #[schema(example = 0)]
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::test_hasher;

    #[test]
    fn test_create_account() {
        let hasher = test_hasher();
        let acc = Account::create("abhi", "anand", "siuu", &hasher).unwrap();

        assert_eq!(acc.id, 0);
        assert_eq!(acc.balance, 0);
        assert!((ACCOUNT_NUMBER_MIN..ACCOUNT_NUMBER_MAX).contains(&acc.number));
        assert!(!acc.encrypted_password.is_empty());
        assert_ne!(acc.encrypted_password, "siuu");
        assert!(acc.created_at <= Utc::now());
    }

    #[test]
    fn test_verify_password() {
        let hasher = test_hasher();
        let acc = Account::create("abhi", "anand", "siuu", &hasher).unwrap();

        assert!(acc.verify("siuu", &hasher));
        assert!(!acc.verify("wrong-password", &hasher));
        assert!(!acc.verify("SIUU", &hasher));
    }

    #[test]
    fn test_create_rejects_oversized_password() {
        let hasher = test_hasher();
        let pw = "p".repeat(crate::credentials::MAX_PASSWORD_BYTES + 10);
        let err = Account::create("a", "b", &pw, &hasher).unwrap_err();
        assert!(matches!(err, HashingError::PasswordTooLong { .. }));
    }

    #[test]
    fn test_view_omits_password() {
        let hasher = test_hasher();
        let acc = Account::create("abhi", "anand", "siuu", &hasher)
            .unwrap()
            .with_opening_balance(500);
        let view = acc.view();

        assert_eq!(view.number, acc.number);
        assert_eq!(view.balance, 500);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["firstName"], "abhi");
        assert_eq!(json["lastName"], "anand");
        assert!(json.get("encryptedPassword").is_none());
        assert!(!json.to_string().contains(&acc.encrypted_password));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let hasher = test_hasher();
        let acc = Account::create("abhi", "anand", "siuu", &hasher).unwrap();
        let dbg = format!("{:?}", acc);
        assert!(dbg.contains("<redacted>"));
        assert!(!dbg.contains(&acc.encrypted_password));
    }

    #[test]
    fn test_opening_balance_never_negative() {
        let hasher = test_hasher();
        let acc = Account::create("a", "b", "pw", &hasher)
            .unwrap()
            .with_opening_balance(-5);
        assert_eq!(acc.balance, 0);
    }

    #[test]
    fn test_full_name() {
        let hasher = test_hasher();
        let acc = Account::create("abhi", "anand", "pw", &hasher).unwrap();
        assert_eq!(acc.full_name(), "abhi anand");
    }
}
