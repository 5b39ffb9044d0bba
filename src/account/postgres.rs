//! PostgreSQL account repository
//!
//! Uses runtime queries to avoid sqlx compile-time database connection.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::models::{Account, generate_account_number};
use super::repository::{
    AccountRepository, AccountTx, LockedAccount, MAX_NUMBER_ATTEMPTS, StoreError,
};

const ACCOUNT_COLUMNS: &str =
    "id, first_name, last_name, number, encrypted_password, balance, created_at";

pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_account(r: &PgRow) -> Result<Account, sqlx::Error> {
        Ok(Account {
            id: r.try_get("id")?,
            first_name: r.try_get("first_name")?,
            last_name: r.try_get("last_name")?,
            number: r.try_get("number")?,
            encrypted_password: r.try_get("encrypted_password")?,
            balance: r.try_get("balance")?,
            created_at: r.try_get("created_at")?,
        })
    }
}

/// Map constraint violations on writes to `Conflict`
fn write_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
            StoreError::Conflict(format!("constraint violated: {}", db_err.message()))
        }
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(format!("duplicate value: {}", db_err.message()))
        }
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        let mut account = account;

        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let inserted = sqlx::query(
                r#"
                INSERT INTO account
                    (first_name, last_name, number, encrypted_password, balance, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(account.number)
            .bind(&account.encrypted_password)
            .bind(account.balance)
            .bind(account.created_at)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok(row) => {
                    account.id = row.try_get("id")?;
                    tracing::info!(id = account.id, number = account.number, "Account created");
                    return Ok(account);
                }
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    tracing::warn!(
                        attempt,
                        number = account.number,
                        "Account number collision, drawing a new number"
                    );
                    account.number = generate_account_number();
                }
                Err(e) => return Err(write_error(e)),
            }
        }

        Err(StoreError::Conflict(format!(
            "no free account number after {} attempts",
            MAX_NUMBER_ATTEMPTS
        )))
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM account WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("id {}", id)));
        }
        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE account
            SET first_name = $1, last_name = $2, encrypted_password = $3
            WHERE id = $4
            "#,
        )
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.encrypted_password)
        .bind(account.id)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("id {}", account.id)));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM account ORDER BY id",
            ACCOUNT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let accounts = rows
            .iter()
            .map(Self::row_to_account)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    async fn get_by_id(&self, id: i64) -> Result<Account, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM account WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("id {}", id)))?;

        Ok(Self::row_to_account(&row)?)
    }

    async fn get_by_number(&self, number: i64) -> Result<Account, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM account WHERE number = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("number {}", number)))?;

        Ok(Self::row_to_account(&row)?)
    }

    async fn begin(&self) -> Result<Box<dyn AccountTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgAccountTx { tx }))
    }
}

/// Postgres transaction. Dropping it without commit rolls back.
pub struct PgAccountTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AccountTx for PgAccountTx {
    async fn get_for_update(&mut self, number: i64) -> Result<Option<LockedAccount>, StoreError> {
        let row = sqlx::query("SELECT id, balance FROM account WHERE number = $1 FOR UPDATE")
            .bind(number)
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(r) => Ok(Some(LockedAccount {
                id: r.try_get("id")?,
                balance: r.try_get("balance")?,
            })),
            None => Ok(None),
        }
    }

    async fn debit(&mut self, id: i64, amount: i64) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE account SET balance = balance - $1 WHERE id = $2")
            .bind(amount)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(write_error)?;

        if res.rows_affected() != 1 {
            return Err(StoreError::NotFound(format!("id {}", id)));
        }
        Ok(())
    }

    async fn credit(&mut self, id: i64, amount: i64) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE account SET balance = balance + $1 WHERE id = $2")
            .bind(amount)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(write_error)?;

        if res.rows_affected() != 1 {
            return Err(StoreError::NotFound(format!("id {}", id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
