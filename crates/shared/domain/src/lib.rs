//! Domain layer - Core ledger entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Persistence and caching live in the ledger service.

pub mod account;
pub mod charge;
pub mod constants;
pub mod error;
pub mod user;

pub use account::{Account, AccountSummary, WalletDelta};
pub use charge::{ChargeRequest, ChargeStrategy};
pub use constants::*;
pub use error::DomainError;
pub use user::{Classification, NewUser, TokenOwner, UpdateUser, User};
