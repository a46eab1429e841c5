//! User repository implementation.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{Classification, NewUser, UpdateUser, User};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find the user currently holding a refresh token
    async fn find_by_refresh_token(&self, token: &str) -> AppResult<Option<User>>;

    /// List all users
    async fn find_all(&self) -> AppResult<Vec<User>>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        find_user(&self.db, id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_refresh_token(&self, token: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::RefreshToken.eq(token))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        find_all_users(&self.db).await
    }
}

// =============================================================================
// Queries
// =============================================================================

pub(crate) async fn insert_user<C: ConnectionTrait>(
    conn: &C,
    new_user: NewUser,
    account_id: Uuid,
) -> AppResult<User> {
    let now = chrono::Utc::now();
    let active_model = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(new_user.email),
        name: Set(new_user.name),
        refresh_token: Set(None),
        classification: Set(Classification::default().to_string()),
        account_id: Set(account_id),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let model = active_model.insert(conn).await.map_err(AppError::from)?;
    Ok(User::from(model))
}

pub(crate) async fn find_user<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<Option<User>> {
    let result = UserEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(AppError::from)?;

    Ok(result.map(User::from))
}

pub(crate) async fn find_all_users<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<User>> {
    let models = UserEntity::find()
        .order_by_asc(user::Column::CreatedAt)
        .all(conn)
        .await
        .map_err(AppError::from)?;

    Ok(models.into_iter().map(User::from).collect())
}

pub(crate) async fn update_user<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    changes: UpdateUser,
) -> AppResult<User> {
    let user = UserEntity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = user.into();

    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(email) = changes.email {
        active.email = Set(email);
    }
    if let Some(refresh_token) = changes.refresh_token {
        active.refresh_token = Set(refresh_token);
    }
    if let Some(classification) = changes.classification {
        active.classification = Set(classification.to_string());
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(conn).await.map_err(AppError::from)?;
    Ok(User::from(model))
}

pub(crate) async fn delete_user<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    let result = UserEntity::delete_by_id(id)
        .exec(conn)
        .await
        .map_err(AppError::from)?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(())
}
