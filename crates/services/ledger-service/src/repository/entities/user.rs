//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::{Classification, User};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub refresh_token: Option<String>,
    pub classification: String,
    #[sea_orm(unique)]
    pub account_id: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            email: model.email,
            name: model.name,
            refresh_token: model.refresh_token,
            classification: parse_classification(model.id, &model.classification),
            account_id: model.account_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Unknown stored values are charged as standard, loudly.
fn parse_classification(user_id: Uuid, stored: &str) -> Classification {
    stored.parse().unwrap_or_else(|e| {
        tracing::warn!(user_id = %user_id, stored, error = %e, "Falling back to standard classification");
        Classification::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(classification: &str) -> Model {
        Model {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            name: "User".to_string(),
            refresh_token: None,
            classification: classification.to_string(),
            account_id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn stored_classification_is_parsed() {
        assert_eq!(User::from(model("premium")).classification, Classification::Premium);
        assert_eq!(User::from(model("standard")).classification, Classification::Standard);
    }

    #[test]
    fn unknown_stored_classification_falls_back_to_standard() {
        assert_eq!(User::from(model("gold")).classification, Classification::Standard);
    }
}
