//! Account ledger - applies wallet deltas and keeps the account cache.
//!
//! Lifecycle of a ledger entry:
//! `nonexistent -> active -> active (delta applied)* -> removed`.
//! Every operation on a removed account fails with `NotFound`.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::{Account, AccountSummary, WalletDelta};

use super::cache::{AccountCache, CachedBalance};
use crate::infra::{TransactionContext, UnitOfWork};

/// Persist a zero-balance account inside the caller's transaction.
///
/// The cache is seeded by [`AccountLedger::track_created`] once the owning
/// transaction has committed.
pub async fn create_account(ctx: &TransactionContext<'_>) -> AppResult<Account> {
    ctx.accounts().create().await
}

/// Delete an account inside the caller's transaction.
///
/// Fails with `NotFound` if the account does not exist. The cache entry is
/// evicted by [`AccountLedger::forget`] after commit.
pub async fn remove_account(ctx: &TransactionContext<'_>, id: Uuid) -> AppResult<()> {
    ctx.accounts().delete(id).await
}

/// Applies deltas under their own transaction and owns the account cache.
pub struct AccountLedger<U: UnitOfWork> {
    uow: Arc<U>,
    cache: AccountCache,
}

impl<U: UnitOfWork> AccountLedger<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self {
            uow,
            cache: AccountCache::new(),
        }
    }

    /// Add `delta` to an account.
    ///
    /// Both columns are moved by atomic increments inside one transaction, so
    /// concurrent deltas on the same account add up regardless of order. The
    /// cache is touched only after commit. Failures are rolled back and
    /// returned to the caller.
    pub async fn apply_delta(&self, account_id: Uuid, delta: WalletDelta) -> AppResult<AccountSummary> {
        let result = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let account = ctx.accounts().increment(account_id, delta).await?;
                    Ok::<_, AppError>(account)
                })
            })
            .await;

        match result {
            Ok(account) => {
                self.cache.apply(&account.id, delta);
                tracing::debug!(
                    account_id = %account_id,
                    money = delta.money,
                    point = delta.point,
                    balance = account.balance,
                    "Delta applied"
                );
                Ok(account.summary())
            }
            Err(e) => {
                tracing::warn!(account_id = %account_id, error = %e, "Delta rolled back");
                Err(e)
            }
        }
    }

    /// Find account by ID
    pub async fn find(&self, id: Uuid) -> AppResult<Account> {
        self.uow.accounts().find_by_id(id).await?.ok_or_not_found()
    }

    /// List all accounts
    pub async fn find_all(&self) -> AppResult<Vec<Account>> {
        self.uow.accounts().find_all().await
    }

    /// Seed the cache for an account whose creation has committed.
    pub fn track_created(&self, account: &Account) {
        self.cache.insert(account);
    }

    /// Evict an account whose removal has committed.
    pub fn forget(&self, id: &Uuid) {
        self.cache.remove(id);
    }

    /// Cached balance, if any
    pub fn cached(&self, id: &Uuid) -> Option<CachedBalance> {
        self.cache.get(id)
    }

    /// Overwrite the account cache from a store snapshot.
    pub fn reload(&self, accounts: &[Account]) -> usize {
        self.cache.reload(accounts)
    }

    pub fn cache_snapshot(&self) -> HashMap<Uuid, CachedBalance> {
        self.cache.snapshot()
    }
}
