//! Transfer Engine
//!
//! Moves `amount` from one account to another inside a single store
//! transaction:
//!
//! ```text
//! validate ─▶ BEGIN ─▶ lock(min) ─▶ lock(max) ─▶ check balance ─▶ debit ─▶ credit ─▶ COMMIT
//!                          │            │              │            │         │
//!                          └────────────┴──────────────┴────────────┴─────────┴──▶ ROLLBACK
//! ```
//!
//! Concurrency is delegated to the store's row locks; the engine itself holds
//! no in-process locks. Nothing is retried here.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::error::TransferError;
use super::lock_order::LockOrder;
use crate::account::{AccountRepository, AccountTx};

pub struct TransferEngine {
    repo: Arc<dyn AccountRepository>,
    timeout: Option<Duration>,
}

impl TransferEngine {
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self {
            repo,
            timeout: None,
        }
    }

    /// Bound the whole transaction. On expiry the transaction is dropped,
    /// which rolls it back.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn transfer(&self, from: i64, to: i64, amount: i64) -> Result<(), TransferError> {
        if amount <= 0 {
            return Err(TransferError::InvalidAmount);
        }
        if from == to {
            return Err(TransferError::SameAccount);
        }

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(from, to, amount))
                .await
                .map_err(|_| {
                    warn!(
                        from,
                        to,
                        amount,
                        timeout_ms = limit.as_millis() as u64,
                        "Transfer timed out"
                    );
                    TransferError::Timeout
                })?,
            None => self.run(from, to, amount).await,
        }
    }

    async fn run(&self, from: i64, to: i64, amount: i64) -> Result<(), TransferError> {
        let mut tx = self.repo.begin().await?;

        match Self::apply(tx.as_mut(), from, to, amount).await {
            Ok(()) => {
                tx.commit().await?;
                info!(from, to, amount, "Transfer committed");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(from, to, error = %rollback_err, "Rollback failed");
                }
                debug!(from, to, amount, code = e.code(), "Transfer aborted");
                Err(e)
            }
        }
    }

    async fn apply(
        tx: &mut dyn AccountTx,
        from: i64,
        to: i64,
        amount: i64,
    ) -> Result<(), TransferError> {
        let order = LockOrder::new(from, to);

        let first = tx
            .get_for_update(order.first)
            .await?
            .ok_or(TransferError::AccountNotFound(order.first))?;
        let second = tx
            .get_for_update(order.second)
            .await?
            .ok_or(TransferError::AccountNotFound(order.second))?;

        let (from_row, to_row) = order.resolve(first, second);

        if from_row.balance < amount {
            return Err(TransferError::InsufficientFunds);
        }

        tx.debit(from_row.id, amount).await?;
        tx.credit(to_row.id, amount).await?;
        Ok(())
    }
}
