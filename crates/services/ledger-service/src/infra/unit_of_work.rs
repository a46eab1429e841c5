//! Unit of Work pattern implementation.
//!
//! The Unit of Work:
//! - Centralizes access to the account and user repositories
//! - Owns transaction lifecycle (begin, commit, rollback)
//! - Bounds every transaction with a timeout
//! - Hands out transaction-bound repositories so a multi-entity change
//!   commits or rolls back as one

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};
use uuid::Uuid;

use common::{AppError, AppResult, TransactionConfig};
use domain::{Account, NewUser, UpdateUser, User, WalletDelta};

use crate::repository::{
    self, AccountRepository, AccountStore, UserRepository, UserStore,
};

/// Boxed unit of work borrowing the transaction context.
pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// Unit of Work trait for dependency injection.
///
/// Not object safe because of the generic `transaction` method. Services are
/// generic over it instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Get user repository (pooled connection)
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get account repository (pooled connection)
    fn accounts(&self) -> Arc<dyn AccountRepository>;

    /// Execute a closure within a transaction.
    ///
    /// Commits when the closure returns `Ok`, rolls back on `Err` or when the
    /// configured timeout elapses. The transaction is released on every path.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send;
}

/// Transaction context providing repository access within a transaction.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Get account repository for this transaction
    pub fn accounts(&self) -> TxAccountRepository<'_> {
        TxAccountRepository { txn: self.txn }
    }

    /// Get user repository for this transaction
    pub fn users(&self) -> TxUserRepository<'_> {
        TxUserRepository { txn: self.txn }
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    account_repo: Arc<AccountStore>,
    timeout: Duration,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection, config: &TransactionConfig) -> Self {
        let user_repo = Arc::new(UserStore::new(db.clone()));
        let account_repo = Arc::new(AccountStore::new(db.clone()));
        Self {
            db,
            user_repo,
            account_repo,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn accounts(&self) -> Arc<dyn AccountRepository> {
        self.account_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::ReadCommitted),
                Some(AccessMode::ReadWrite),
            )
            .await
            .map_err(AppError::from)?;

        let outcome = tokio::time::timeout(self.timeout, f(TransactionContext::new(&txn))).await;

        match outcome {
            Ok(Ok(result)) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Ok(Err(e)) => {
                rollback(txn).await;
                Err(e)
            }
            Err(_) => {
                rollback(txn).await;
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "Transaction timed out");
                Err(AppError::transaction(format!(
                    "transaction timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(rollback_err) = txn.rollback().await {
        // Dropping the handle still returns the connection to the pool
        tracing::error!("Transaction rollback failed: {}", rollback_err);
    }
}

/// Transaction-aware account repository.
pub struct TxAccountRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl TxAccountRepository<'_> {
    /// Create a zero-balance account
    pub async fn create(&self) -> AppResult<Account> {
        repository::insert_account(self.txn).await
    }

    /// Find account by ID
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        repository::find_account(self.txn, id).await
    }

    /// List all accounts
    pub async fn find_all(&self) -> AppResult<Vec<Account>> {
        repository::find_all_accounts(self.txn).await
    }

    /// Atomically add a delta, returning the row as seen by this transaction
    pub async fn increment(&self, id: Uuid, delta: WalletDelta) -> AppResult<Account> {
        repository::increment_account(self.txn, id, delta).await
    }

    /// Delete account by ID
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        repository::delete_account(self.txn, id).await
    }
}

/// Transaction-aware user repository.
pub struct TxUserRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl TxUserRepository<'_> {
    /// Create a user owning `account_id`
    pub async fn create(&self, new_user: NewUser, account_id: Uuid) -> AppResult<User> {
        repository::insert_user(self.txn, new_user, account_id).await
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        repository::find_user(self.txn, id).await
    }

    /// List all users
    pub async fn find_all(&self) -> AppResult<Vec<User>> {
        repository::find_all_users(self.txn).await
    }

    /// Update user fields
    pub async fn update(&self, id: Uuid, changes: UpdateUser) -> AppResult<User> {
        repository::update_user(self.txn, id, changes).await
    }

    /// Delete user by ID
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        repository::delete_user(self.txn, id).await
    }
}
