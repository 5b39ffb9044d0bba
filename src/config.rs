use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;

use crate::credentials::HashingConfig;
use crate::session::{MAX_TOKEN_TTL_SECS, SessionConfig};

/// Env var overriding `auth.jwt_secret`
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
/// Env var overriding `postgres_url`
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// Env var overriding `gateway.host`/`gateway.port` (`host:port` or `:port`)
pub const ENV_SERVER_ADDR: &str = "SERVER_ADDR";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL; the in-memory store is used when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub auth: SessionConfig,
    #[serde(default)]
    pub password: HashingConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl GatewayConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid gateway address {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransferConfig {
    /// Upper bound on one transfer transaction; 0 disables the bound
    pub timeout_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

impl AppConfig {
    /// Read `config/{env}.yaml`, then apply environment overrides
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config yaml: {}", config_path))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides from `lookup` (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_JWT_SECRET).filter(|s| !s.is_empty()) {
            self.auth.jwt_secret = secret;
        }
        if let Some(url) = lookup(ENV_DATABASE_URL).filter(|s| !s.is_empty()) {
            self.postgres_url = Some(url);
        }
        if let Some(addr) = lookup(ENV_SERVER_ADDR).filter(|s| !s.is_empty()) {
            let (host, port) = addr
                .rsplit_once(':')
                .with_context(|| format!("{} must be host:port, got {}", ENV_SERVER_ADDR, addr))?;
            self.gateway.port = port
                .parse()
                .with_context(|| format!("invalid port in {}: {}", ENV_SERVER_ADDR, addr))?;
            if !host.is_empty() {
                self.gateway.host = host.to_string();
            }
        }
        Ok(())
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.jwt_secret.is_empty() {
            bail!(
                "JWT secret is empty: set auth.jwt_secret or the {} environment variable",
                ENV_JWT_SECRET
            );
        }
        if self.auth.token_ttl_secs <= 0 {
            bail!("auth.token_ttl_secs must be positive");
        }
        if self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!(
                "auth.token_ttl_secs must be at most {} (one year)",
                MAX_TOKEN_TTL_SECS
            );
        }
        Ok(())
    }
}
