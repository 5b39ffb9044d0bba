//! In-process account repository
//!
//! Emulates the row-lock semantics of `SELECT ... FOR UPDATE`: every row has
//! an async mutex, a transaction keeps the guards of the rows it locked, and
//! its writes are journaled and applied only on commit. Dropping the
//! transaction releases the locks and discards the journal.
//!
//! Stores built with [`MemoryAccountRepository::with_lock_recording`] also
//! log lock requests in order so tests can assert on them.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use super::models::{Account, generate_account_number};
use super::repository::{
    AccountRepository, AccountTx, LockedAccount, MAX_NUMBER_ATTEMPTS, StoreError,
};

struct Row {
    account: Account,
    lock: Arc<RowLock<()>>,
}

#[derive(Default)]
struct Tables {
    rows: BTreeMap<i64, Row>,
    by_number: HashMap<i64, i64>,
    next_id: i64,
}

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    record_locks: bool,
    lock_requests: Mutex<Vec<i64>>,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
    fail_credit: AtomicBool,
}

impl Shared {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Internal("account table mutex poisoned".to_string()))
    }

    fn row_lock_by_id(&self, id: i64) -> Result<Arc<RowLock<()>>, StoreError> {
        self.tables()?
            .rows
            .get(&id)
            .map(|row| row.lock.clone())
            .ok_or_else(|| StoreError::NotFound(format!("id {}", id)))
    }
}

#[derive(Clone, Default)]
pub struct MemoryAccountRepository {
    shared: Arc<Shared>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that also logs every `get_for_update` request. The log is
    /// unbounded, so this is for tests only.
    pub fn with_lock_recording() -> Self {
        Self {
            shared: Arc::new(Shared {
                record_locks: true,
                ..Shared::default()
            }),
        }
    }

    /// Account numbers passed to `get_for_update`, in request order.
    /// Always empty unless built with [`Self::with_lock_recording`].
    pub fn lock_requests(&self) -> Vec<i64> {
        self.shared
            .lock_requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn clear_lock_requests(&self) {
        if let Ok(mut log) = self.shared.lock_requests.lock() {
            log.clear();
        }
    }

    pub fn commit_count(&self) -> usize {
        self.shared.commits.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> usize {
        self.shared.rollbacks.load(Ordering::SeqCst)
    }

    /// Make every `credit` fail, simulating a fault mid-transaction
    pub fn set_fail_credit(&self, fail: bool) {
        self.shared.fail_credit.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        let mut account = account;
        let mut tables = self.shared.tables()?;

        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            if !tables.by_number.contains_key(&account.number) {
                tables.next_id += 1;
                account.id = tables.next_id;
                tables.by_number.insert(account.number, account.id);
                tables.rows.insert(
                    account.id,
                    Row {
                        account: account.clone(),
                        lock: Arc::new(RowLock::new(())),
                    },
                );
                tracing::debug!(id = account.id, number = account.number, "Account created");
                return Ok(account);
            }
            tracing::warn!(
                attempt,
                number = account.number,
                "Account number collision, drawing a new number"
            );
            account.number = generate_account_number();
        }

        Err(StoreError::Conflict(format!(
            "no free account number after {} attempts",
            MAX_NUMBER_ATTEMPTS
        )))
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let lock = self.shared.row_lock_by_id(id)?;
        let _held = lock.lock().await;

        let mut tables = self.shared.tables()?;
        let row = tables
            .rows
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("id {}", id)))?;
        tables.by_number.remove(&row.account.number);
        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let lock = self.shared.row_lock_by_id(account.id)?;
        let _held = lock.lock().await;

        let mut tables = self.shared.tables()?;
        let row = tables
            .rows
            .get_mut(&account.id)
            .ok_or_else(|| StoreError::NotFound(format!("id {}", account.id)))?;
        row.account.first_name = account.first_name.clone();
        row.account.last_name = account.last_name.clone();
        row.account.encrypted_password = account.encrypted_password.clone();
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Account>, StoreError> {
        let tables = self.shared.tables()?;
        Ok(tables.rows.values().map(|r| r.account.clone()).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Account, StoreError> {
        self.shared
            .tables()?
            .rows
            .get(&id)
            .map(|r| r.account.clone())
            .ok_or_else(|| StoreError::NotFound(format!("id {}", id)))
    }

    async fn get_by_number(&self, number: i64) -> Result<Account, StoreError> {
        let tables = self.shared.tables()?;
        tables
            .by_number
            .get(&number)
            .and_then(|id| tables.rows.get(id))
            .map(|r| r.account.clone())
            .ok_or_else(|| StoreError::NotFound(format!("number {}", number)))
    }

    async fn begin(&self) -> Result<Box<dyn AccountTx>, StoreError> {
        Ok(Box::new(MemoryAccountTx {
            shared: self.shared.clone(),
            held: HashMap::new(),
            deltas: HashMap::new(),
        }))
    }
}

struct HeldRow {
    id: i64,
    _guard: OwnedMutexGuard<()>,
}

pub struct MemoryAccountTx {
    shared: Arc<Shared>,
    /// number -> locked row
    held: HashMap<i64, HeldRow>,
    /// id -> pending balance change
    deltas: HashMap<i64, i64>,
}

impl MemoryAccountTx {
    fn holds_id(&self, id: i64) -> bool {
        self.held.values().any(|h| h.id == id)
    }

    fn committed_balance(&self, id: i64) -> Result<i64, StoreError> {
        self.shared
            .tables()?
            .rows
            .get(&id)
            .map(|r| r.account.balance)
            .ok_or_else(|| StoreError::NotFound(format!("id {}", id)))
    }

    fn pending_balance(&self, id: i64) -> Result<i64, StoreError> {
        let delta = self.deltas.get(&id).copied().unwrap_or(0);
        Ok(self.committed_balance(id)? + delta)
    }

    fn apply_delta(&mut self, id: i64, delta: i64) -> Result<(), StoreError> {
        if !self.holds_id(id) {
            return Err(StoreError::Internal(format!(
                "row {} written without holding its lock",
                id
            )));
        }
        let next = self
            .pending_balance(id)?
            .checked_add(delta)
            .ok_or_else(|| StoreError::Conflict("balance overflow".to_string()))?;
        if next < 0 {
            return Err(StoreError::Conflict(
                "constraint violated: balance must be non-negative".to_string(),
            ));
        }
        *self.deltas.entry(id).or_insert(0) += delta;
        Ok(())
    }
}

#[async_trait]
impl AccountTx for MemoryAccountTx {
    async fn get_for_update(&mut self, number: i64) -> Result<Option<LockedAccount>, StoreError> {
        if self.shared.record_locks {
            if let Ok(mut log) = self.shared.lock_requests.lock() {
                log.push(number);
            }
        }

        if let Some(held) = self.held.get(&number) {
            let id = held.id;
            return Ok(Some(LockedAccount {
                id,
                balance: self.pending_balance(id)?,
            }));
        }

        let target = {
            let tables = self.shared.tables()?;
            tables
                .by_number
                .get(&number)
                .and_then(|id| tables.rows.get(id).map(|r| (*id, r.lock.clone())))
        };
        let Some((id, lock)) = target else {
            return Ok(None);
        };

        let guard = lock.lock_owned().await;

        // The row may have been deleted while we waited.
        let balance = match self.shared.tables()?.rows.get(&id) {
            Some(row) => row.account.balance,
            None => return Ok(None),
        };

        self.held.insert(number, HeldRow { id, _guard: guard });
        Ok(Some(LockedAccount { id, balance }))
    }

    async fn debit(&mut self, id: i64, amount: i64) -> Result<(), StoreError> {
        self.apply_delta(id, -amount)
    }

    async fn credit(&mut self, id: i64, amount: i64) -> Result<(), StoreError> {
        if self.shared.fail_credit.load(Ordering::SeqCst) {
            return Err(StoreError::Internal("injected credit failure".to_string()));
        }
        self.apply_delta(id, amount)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        {
            let mut tables = self.shared.tables()?;
            for (id, delta) in &self.deltas {
                let row = tables
                    .rows
                    .get_mut(id)
                    .ok_or_else(|| StoreError::NotFound(format!("id {}", id)))?;
                row.account.balance += delta;
            }
        }
        self.shared.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.shared.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::test_hasher;
    use std::time::Duration;

    fn account(balance: i64) -> Account {
        Account::create("mem", "user", "pw", &test_hasher())
            .unwrap()
            .with_opening_balance(balance)
    }

    #[tokio::test]
    async fn test_create_assigns_ids() {
        let repo = MemoryAccountRepository::new();
        let a = repo.create(account(0)).await.unwrap();
        let b = repo.create(account(0)).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(repo.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_number_collision_draws_new_number() {
        let repo = MemoryAccountRepository::new();
        let first = repo.create(account(0)).await.unwrap();

        let mut dup = account(0);
        dup.number = first.number;
        let second = repo.create(dup).await.unwrap();

        assert_ne!(second.number, first.number);
        assert_eq!(
            repo.get_by_number(second.number).await.unwrap().id,
            second.id
        );
    }

    #[tokio::test]
    async fn test_get_missing() {
        let repo = MemoryAccountRepository::new();
        assert!(matches!(
            repo.get_by_id(42).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            repo.get_by_number(42).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = MemoryAccountRepository::new();
        let a = repo.create(account(0)).await.unwrap();

        repo.delete(a.id).await.unwrap();
        assert!(repo.list_all().await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(a.id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
        assert!(repo.get_by_number(a.number).await.is_err());
    }

    #[tokio::test]
    async fn test_update_does_not_touch_balance() {
        let repo = MemoryAccountRepository::new();
        let mut a = repo.create(account(300)).await.unwrap();

        a.first_name = "renamed".to_string();
        a.balance = 0;
        repo.update(&a).await.unwrap();

        let reloaded = repo.get_by_id(a.id).await.unwrap();
        assert_eq!(reloaded.first_name, "renamed");
        assert_eq!(reloaded.balance, 300);
    }

    #[tokio::test]
    async fn test_uncommitted_writes_invisible() {
        let repo = MemoryAccountRepository::new();
        let a = repo.create(account(100)).await.unwrap();

        let mut tx = repo.begin().await.unwrap();
        let locked = tx.get_for_update(a.number).await.unwrap().unwrap();
        tx.debit(locked.id, 30).await.unwrap();
        assert_eq!(repo.get_by_id(a.id).await.unwrap().balance, 100);

        tx.commit().await.unwrap();
        assert_eq!(repo.get_by_id(a.id).await.unwrap().balance, 70);
        assert_eq!(repo.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_drop_discards_writes() {
        let repo = MemoryAccountRepository::new();
        let a = repo.create(account(100)).await.unwrap();

        {
            let mut tx = repo.begin().await.unwrap();
            let locked = tx.get_for_update(a.number).await.unwrap().unwrap();
            tx.debit(locked.id, 30).await.unwrap();
        }
        assert_eq!(repo.get_by_id(a.id).await.unwrap().balance, 100);
    }

    #[tokio::test]
    async fn test_write_requires_lock() {
        let repo = MemoryAccountRepository::new();
        let a = repo.create(account(100)).await.unwrap();

        let mut tx = repo.begin().await.unwrap();
        let err = tx.credit(a.id, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));
    }

    #[tokio::test]
    async fn test_negative_balance_rejected() {
        let repo = MemoryAccountRepository::new();
        let a = repo.create(account(10)).await.unwrap();

        let mut tx = repo.begin().await.unwrap();
        let locked = tx.get_for_update(a.number).await.unwrap().unwrap();
        let err = tx.debit(locked.id, 11).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_relock_in_same_tx_does_not_block() {
        let repo = MemoryAccountRepository::new();
        let a = repo.create(account(10)).await.unwrap();

        let mut tx = repo.begin().await.unwrap();
        tx.get_for_update(a.number).await.unwrap().unwrap();
        let again = tokio::time::timeout(Duration::from_secs(1), tx.get_for_update(a.number))
            .await
            .expect("second lock on held row must not block")
            .unwrap()
            .unwrap();
        assert_eq!(again.balance, 10);
    }

    #[tokio::test]
    async fn test_row_lock_blocks_second_tx() {
        let repo = MemoryAccountRepository::new();
        let a = repo.create(account(10)).await.unwrap();

        let mut tx1 = repo.begin().await.unwrap();
        tx1.get_for_update(a.number).await.unwrap().unwrap();

        let mut tx2 = repo.begin().await.unwrap();
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), tx2.get_for_update(a.number)).await;
        assert!(blocked.is_err(), "second transaction must wait for the lock");

        tx1.rollback().await.unwrap();
        let locked = tokio::time::timeout(Duration::from_secs(1), tx2.get_for_update(a.number))
            .await
            .expect("lock must be released after rollback")
            .unwrap();
        assert!(locked.is_some());
    }

    #[tokio::test]
    async fn test_lock_requests_recorded() {
        let repo = MemoryAccountRepository::with_lock_recording();
        let a = repo.create(account(0)).await.unwrap();

        let mut tx = repo.begin().await.unwrap();
        tx.get_for_update(a.number).await.unwrap();
        tx.get_for_update(7).await.unwrap();
        assert_eq!(repo.lock_requests(), vec![a.number, 7]);

        repo.clear_lock_requests();
        assert!(repo.lock_requests().is_empty());
    }

    #[tokio::test]
    async fn test_default_store_keeps_no_lock_log() {
        let repo = MemoryAccountRepository::new();
        let a = repo.create(account(0)).await.unwrap();

        for _ in 0..1_000 {
            let mut tx = repo.begin().await.unwrap();
            tx.get_for_update(a.number).await.unwrap();
            tx.rollback().await.unwrap();
        }
        assert!(repo.lock_requests().is_empty());
        assert_eq!(repo.rollback_count(), 1_000);
    }
}
