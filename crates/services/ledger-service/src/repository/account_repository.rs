//! Account repository implementation.
//!
//! The query functions are generic over [`ConnectionTrait`] so the same
//! statements run on the pooled connection and inside a unit of work.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::account::{self, ActiveModel, Entity as AccountEntity};
use common::{AppError, AppResult};
use domain::{Account, WalletDelta};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Account repository trait for dependency injection.
///
/// Every method runs on the store's own connection, so each call is its
/// own transaction. Increments need two statements and are only offered
/// inside the unit of work.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create an account with zero balance and zero points
    async fn create(&self) -> AppResult<Account>;

    /// Find account by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>>;

    /// List all accounts
    async fn find_all(&self) -> AppResult<Vec<Account>>;

    /// Delete account by ID
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of AccountRepository
pub struct AccountStore {
    db: DatabaseConnection,
}

impl AccountStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountRepository for AccountStore {
    async fn create(&self) -> AppResult<Account> {
        insert_account(&self.db).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        find_account(&self.db, id).await
    }

    async fn find_all(&self) -> AppResult<Vec<Account>> {
        find_all_accounts(&self.db).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        delete_account(&self.db, id).await
    }
}

// =============================================================================
// Queries
// =============================================================================

pub(crate) async fn insert_account<C: ConnectionTrait>(conn: &C) -> AppResult<Account> {
    let account = Account::new(Uuid::new_v4());
    let active_model = ActiveModel {
        id: Set(account.id),
        balance: Set(account.balance),
        point: Set(account.point),
        created_at: Set(account.created_at),
        updated_at: Set(account.updated_at),
    };

    let model = active_model.insert(conn).await.map_err(AppError::from)?;
    Ok(Account::from(model))
}

pub(crate) async fn find_account<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<Option<Account>> {
    let result = AccountEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(AppError::from)?;

    Ok(result.map(Account::from))
}

pub(crate) async fn find_all_accounts<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<Account>> {
    let models = AccountEntity::find()
        .order_by_asc(account::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(AppError::from)?;

    Ok(models.into_iter().map(Account::from).collect())
}

/// `balance = balance + money` then `point = point + point`, never a
/// read-modify-write. The row lock taken by the first statement is held
/// until the surrounding transaction ends.
pub(crate) async fn increment_account<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    delta: WalletDelta,
) -> AppResult<Account> {
    let now = chrono::Utc::now();

    let result = AccountEntity::update_many()
        .col_expr(
            account::Column::Balance,
            Expr::col(account::Column::Balance).add(delta.money),
        )
        .col_expr(account::Column::UpdatedAt, Expr::value(now))
        .filter(account::Column::Id.eq(id))
        .exec(conn)
        .await
        .map_err(AppError::from)?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    AccountEntity::update_many()
        .col_expr(
            account::Column::Point,
            Expr::col(account::Column::Point).add(delta.point),
        )
        .filter(account::Column::Id.eq(id))
        .exec(conn)
        .await
        .map_err(AppError::from)?;

    find_account(conn, id).await?.ok_or(AppError::NotFound)
}

pub(crate) async fn delete_account<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    let result = AccountEntity::delete_by_id(id)
        .exec(conn)
        .await
        .map_err(AppError::from)?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(())
}
