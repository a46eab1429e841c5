//! User-account service - the operations exposed to the web and scheduler layers.
//!
//! Creation and removal touch two tables and always run as one unit of work.
//! Caches are written right after the unit of work commits, never inside it.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;
use validator::Validate;

use common::{AppError, AppResult, OptionExt};
use domain::{
    AccountSummary, ChargeRequest, ChargeStrategy, DomainError, NewUser, TokenOwner, UpdateUser,
    User,
};

use super::account_ledger::{self, AccountLedger};
use super::cache::{CacheStats, UserCaches};
use crate::config::TokenLookupPolicy;
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User-account service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserAccountService: Send + Sync {
    /// Create a user together with its account (all or nothing)
    async fn create_user(&self, new_user: NewUser) -> AppResult<User>;

    /// Return the user registered under `email`, creating it if absent
    async fn find_or_create(&self, new_user: NewUser) -> AppResult<User>;

    /// Get user by ID
    async fn find_user(&self, id: Uuid) -> AppResult<User>;

    /// List all users
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Update profile fields
    async fn update_user(&self, id: Uuid, changes: UpdateUser) -> AppResult<User>;

    /// Remove a user together with its account (all or nothing)
    async fn remove_user(&self, id: Uuid) -> AppResult<()>;

    /// Charge a user's account according to its classification
    async fn charge_user(&self, id: Uuid, amount: i64) -> AppResult<AccountSummary>;

    /// Resolve a refresh token to its owner
    async fn find_user_by_refresh_token(&self, token: &str) -> AppResult<Option<TokenOwner>>;

    /// Reload every cache from the store
    async fn refresh_caches(&self) -> AppResult<CacheStats>;
}

/// Concrete implementation of UserAccountService using Unit of Work.
pub struct UserAccountManager<U: UnitOfWork> {
    uow: Arc<U>,
    ledger: AccountLedger<U>,
    strategy: ChargeStrategy,
    token_lookup: TokenLookupPolicy,
    caches: UserCaches,
}

impl<U: UnitOfWork> UserAccountManager<U> {
    /// Create new service instance with Unit of Work
    pub fn new(uow: Arc<U>, strategy: ChargeStrategy, token_lookup: TokenLookupPolicy) -> Self {
        Self {
            ledger: AccountLedger::new(uow.clone()),
            uow,
            strategy,
            token_lookup,
            caches: UserCaches::new(),
        }
    }

    /// The account ledger owned by this service
    pub fn ledger(&self) -> &AccountLedger<U> {
        &self.ledger
    }

    /// The user caches owned by this service
    pub fn caches(&self) -> &UserCaches {
        &self.caches
    }
}

#[async_trait]
impl<U: UnitOfWork> UserAccountService for UserAccountManager<U> {
    async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        new_user.validate().map_err(DomainError::from)?;

        // Email uniqueness is left to the unique constraint, so a concurrent
        // duplicate fails here with Conflict and rolls back its account too.
        let (user, account) = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let account = account_ledger::create_account(&ctx).await?;
                    let user = ctx.users().create(new_user, account.id).await?;
                    Ok::<_, AppError>((user, account))
                })
            })
            .await?;

        self.ledger.track_created(&account);
        self.caches.track(&user);

        tracing::info!(user_id = %user.id, account_id = %account.id, "User created");
        Ok(user)
    }

    async fn find_or_create(&self, new_user: NewUser) -> AppResult<User> {
        if let Some(user) = self.uow.users().find_by_email(&new_user.email).await? {
            return Ok(user);
        }

        let email = new_user.email.clone();
        match self.create_user(new_user).await {
            Err(AppError::Conflict(_)) => {
                tracing::debug!(email = %email, "Concurrent signup won the race, reusing it");
                self.uow.users().find_by_email(&email).await?.ok_or_not_found()
            }
            other => other,
        }
    }

    async fn find_user(&self, id: Uuid) -> AppResult<User> {
        if id.is_nil() {
            return Err(AppError::NotFound);
        }

        self.uow.users().find_by_id(id).await?.ok_or_not_found()
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.uow.users().find_all().await
    }

    async fn update_user(&self, id: Uuid, changes: UpdateUser) -> AppResult<User> {
        changes.validate().map_err(DomainError::from)?;

        if changes.is_empty() {
            return self.find_user(id).await;
        }
        if id.is_nil() {
            return Err(AppError::NotFound);
        }

        // A row removed between the read and the write is NotFound
        let (previous, updated) = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let previous = ctx.users().find_by_id(id).await?.ok_or_not_found()?;
                    let updated = ctx.users().update(id, changes).await?;
                    Ok::<_, AppError>((previous, updated))
                })
            })
            .await?;

        self.caches.track_update(&previous, &updated);

        tracing::debug!(user_id = %id, "User updated");
        Ok(updated)
    }

    async fn remove_user(&self, id: Uuid) -> AppResult<()> {
        let user = self.find_user(id).await?;
        let account_id = user.account_id;

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    ctx.users().delete(id).await?;
                    account_ledger::remove_account(&ctx, account_id).await?;
                    Ok::<_, AppError>(())
                })
            })
            .await?;

        self.ledger.forget(&account_id);
        self.caches.forget(&user);

        tracing::info!(user_id = %id, account_id = %account_id, "User removed");
        Ok(())
    }

    async fn charge_user(&self, id: Uuid, amount: i64) -> AppResult<AccountSummary> {
        if amount <= 0 {
            return Err(AppError::validation("Charge amount must be positive"));
        }

        let profile = self.caches.charge_profile(&id).ok_or_not_found()?;
        let delta = self.strategy.calculate(ChargeRequest {
            amount,
            classification: profile.classification,
        });

        let summary = self.ledger.apply_delta(profile.account_id, delta).await?;

        tracing::info!(
            user_id = %id,
            account_id = %profile.account_id,
            amount,
            point = delta.point,
            "User charged"
        );
        Ok(summary)
    }

    async fn find_user_by_refresh_token(&self, token: &str) -> AppResult<Option<TokenOwner>> {
        if token.is_empty() {
            return Ok(None);
        }

        if let Some(owner) = self.caches.token_owner(token) {
            return Ok(Some(owner));
        }

        match self.token_lookup {
            TokenLookupPolicy::CacheOnly => Ok(None),
            TokenLookupPolicy::CacheThenStore => {
                let owner = self
                    .uow
                    .users()
                    .find_by_refresh_token(token)
                    .await?
                    .map(|user| user.token_owner());

                if let Some(owner) = &owner {
                    self.caches.track_token(token, owner.clone());
                }
                Ok(owner)
            }
        }
    }

    async fn refresh_caches(&self) -> AppResult<CacheStats> {
        let (users, accounts) = self
            .uow
            .transaction(|ctx| {
                Box::pin(async move {
                    let users = ctx.users().find_all().await?;
                    let accounts = ctx.accounts().find_all().await?;
                    Ok::<_, AppError>((users, accounts))
                })
            })
            .await?;

        let accounts = self.ledger.reload(&accounts);
        let (charge_profiles, refresh_tokens) = self.caches.reload(&users);

        let stats = CacheStats {
            accounts,
            charge_profiles,
            refresh_tokens,
        };
        tracing::info!(
            accounts = stats.accounts,
            charge_profiles = stats.charge_profiles,
            refresh_tokens = stats.refresh_tokens,
            "Caches refreshed"
        );
        Ok(stats)
    }
}
