//! User domain entity and related types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::constants::{CLASSIFICATION_PREMIUM, CLASSIFICATION_STANDARD};
use crate::error::DomainError;

/// User classification, selects the charge variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    #[default]
    Standard,
    Premium,
}

impl FromStr for Classification {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CLASSIFICATION_STANDARD => Ok(Classification::Standard),
            CLASSIFICATION_PREMIUM => Ok(Classification::Premium),
            other => Err(DomainError::validation(format!(
                "Unknown classification: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Premium => write!(f, "{}", CLASSIFICATION_PREMIUM),
            Classification::Standard => write!(f, "{}", CLASSIFICATION_STANDARD),
        }
    }
}

/// User domain entity. Owns exactly one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub classification: Classification,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Session lookup view of this user
    pub fn token_owner(&self) -> TokenOwner {
        TokenOwner {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

/// User creation data
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    /// User email address
    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email is too long")
    )]
    pub email: String,
    /// User display name
    #[validate(custom(function = "not_blank"))]
    pub name: String,
}

impl NewUser {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// Partial user update.
///
/// `refresh_token: Some(None)` clears the stored token.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email is too long")
    )]
    pub email: Option<String>,
    pub refresh_token: Option<Option<String>>,
    pub classification: Option<Classification>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.refresh_token.is_none()
            && self.classification.is_none()
    }
}

/// Identity resolved from a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenOwner {
    pub id: Uuid,
    pub email: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Name must not be empty".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_round_trips_through_text() {
        assert_eq!("premium".parse::<Classification>(), Ok(Classification::Premium));
        assert_eq!("standard".parse::<Classification>(), Ok(Classification::Standard));
        assert_eq!(Classification::Premium.to_string(), "premium");
    }

    #[test]
    fn unknown_classification_is_rejected() {
        assert!(matches!(
            "gold".parse::<Classification>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn new_user_validation() {
        assert!(NewUser::new("a@example.com", "Alice").validate().is_ok());
        assert!(NewUser::new("not-an-email", "Alice").validate().is_err());
        assert!(NewUser::new("a@example.com", "   ").validate().is_err());
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for email in ["@", "a@", "@b", "a b@c", "x@@y"] {
            assert!(
                NewUser::new(email, "Name").validate().is_err(),
                "{} should be rejected",
                email
            );
        }
    }

    #[test]
    fn overlong_email_is_rejected() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert!(NewUser::new(email, "Name").validate().is_err());
    }

    #[test]
    fn validation_errors_become_domain_errors() {
        let err = NewUser::new("a@", "Name").validate().unwrap_err();
        assert_eq!(
            DomainError::from(err),
            DomainError::Validation("Invalid email address".to_string())
        );
    }

    #[test]
    fn update_validation_checks_only_present_fields() {
        assert!(UpdateUser::default().validate().is_ok());
        let blank_name = UpdateUser {
            name: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(blank_name.validate().is_err());
        let bad_email = UpdateUser {
            email: Some("x@@y".to_string()),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(UpdateUser::default().is_empty());
        let update = UpdateUser {
            refresh_token: Some(None),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
