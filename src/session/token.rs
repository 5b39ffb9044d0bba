use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Clock skew tolerated when checking `exp`, in seconds
const EXP_LEEWAY_SECS: u64 = 5;

/// Longest token lifetime accepted (one year), in seconds
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // Subject (account number as string)
    pub account_number: i64,
    pub exp: usize, // Expiration time (as UTC timestamp)
    pub iat: usize, // Issued at
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("JWT secret must not be empty")]
    EmptySecret,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to generate token: {0}")]
    Encode(String),

    #[error("Token lifetime of {0}s is out of range")]
    TtlOutOfRange(i64),
}

/// Session settings, injected at construction
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
}

fn default_token_ttl_secs() -> i64 {
    24 * 60 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

/// Issues and verifies HS256 bearer tokens bound to one account number
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        if config.jwt_secret.is_empty() {
            return Err(SessionError::EmptySecret);
        }
        if config.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(SessionError::TtlOutOfRange(config.token_ttl_secs));
        }
        let ttl = Duration::try_seconds(config.token_ttl_secs)
            .ok_or(SessionError::TtlOutOfRange(config.token_ttl_secs))?;

        let secret = config.jwt_secret.as_bytes();
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    pub fn issue(&self, account_number: i64) -> Result<String, SessionError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| SessionError::Encode("token expiry out of range".to_string()))?;

        let claims = Claims {
            sub: account_number.to_string(),
            account_number,
            exp: exp.timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Encode(e.to_string()))
    }

    /// Verify signature, algorithm and expiry
    pub fn verify(&self, token: &str) -> Result<Claims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = EXP_LEEWAY_SECS;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => SessionError::Expired,
                    _ => SessionError::Invalid(e.to_string()),
                }
            })?;

        let claims = token_data.claims;
        if claims.sub != claims.account_number.to_string() {
            return Err(SessionError::Invalid(
                "subject does not match account number".to_string(),
            ));
        }
        Ok(claims)
    }
}
