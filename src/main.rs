//! simplebank - HTTP banking backend
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────┐    ┌────────────────┐
//! │  Config  │───▶│ Gateway  │───▶│ BankService  │───▶│ AccountStore   │
//! │  (YAML)  │    │ (axum)   │    │ (+ Transfer) │    │ (Postgres/mem) │
//! └──────────┘    └──────────┘    └──────────────┘    └────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use simplebank::account::{AccountRepository, MemoryAccountRepository, PgAccountRepository};
use simplebank::config::AppConfig;
use simplebank::credentials::CredentialHasher;
use simplebank::db::Database;
use simplebank::gateway::{self, state::AppState};
use simplebank::service::{BankService, CreateAccountRequest};
use simplebank::session::TokenService;
use simplebank::transfer::TransferEngine;

#[derive(Parser, Debug)]
#[command(name = "simplebank", version, about = "Minimal banking backend")]
struct Cli {
    /// Config profile, read from config/{env}.yaml
    #[arg(short, long, default_value = "dev", env = "APP_ENV")]
    env: String,

    /// Override gateway.port
    #[arg(long)]
    port: Option<u16>,

    /// Create demo accounts before serving
    #[arg(long)]
    seed: bool,

    /// Opening balance for seeded accounts
    #[arg(long, default_value_t = 100_000)]
    seed_balance: i64,
}

async fn seed_accounts(bank: &BankService, opening_balance: i64) -> anyhow::Result<()> {
    let demo_accounts = [("abhi", "anand", "siuu"), ("anthony", "gg", "hunter88888")];
    for (first_name, last_name, password) in demo_accounts {
        let view = bank
            .open_account(
                CreateAccountRequest {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    password: password.to_string(),
                },
                opening_balance,
            )
            .await
            .with_context(|| format!("failed to seed account {}", first_name))?;
        tracing::info!(
            number = view.number,
            balance = view.balance,
            "Seeded account for {}",
            first_name
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.env)?;
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    config.validate()?;

    let _log_guard = simplebank::logging::init_logging(&config);
    tracing::info!("Starting simplebank in {} mode", cli.env);

    let hasher =
        CredentialHasher::new(config.password).context("invalid password hashing config")?;
    let tokens = Arc::new(TokenService::new(&config.auth)?);

    let (repo, db): (Arc<dyn AccountRepository>, Option<Arc<Database>>) =
        match config.postgres_url.as_deref() {
            Some(url) => {
                let db = Database::connect(url)
                    .await
                    .context("failed to connect to PostgreSQL")?;
                db.init_schema().await.context("failed to create schema")?;
                tracing::info!("Connected to PostgreSQL");
                let repo = PgAccountRepository::new(db.pool().clone());
                (Arc::new(repo), Some(Arc::new(db)))
            }
            None => {
                tracing::warn!("No postgres_url configured; accounts are kept in memory only");
                (Arc::new(MemoryAccountRepository::new()), None)
            }
        };

    let mut engine = TransferEngine::new(repo.clone());
    if config.transfer.timeout_ms > 0 {
        engine = engine.with_timeout(Duration::from_millis(config.transfer.timeout_ms));
    }

    let bank = BankService::new(repo, hasher, tokens, engine)
        .context("failed to prepare credential verification")?;
    let bank = Arc::new(bank);

    if cli.seed {
        tracing::info!("Seeding accounts");
        seed_accounts(&bank, cli.seed_balance).await?;
    }

    let addr = config.gateway.socket_addr()?;
    let state = Arc::new(AppState::new(bank, db));
    gateway::run_server(addr, state).await?;

    tracing::info!("Gateway stopped");
    Ok(())
}
