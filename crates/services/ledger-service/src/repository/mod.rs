//! Repository layer for data access.

mod account_repository;
pub mod entities;
mod user_repository;

pub use account_repository::{AccountRepository, AccountStore};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use account_repository::MockAccountRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;

pub(crate) use account_repository::{
    delete_account, find_account, find_all_accounts, increment_account, insert_account,
};
pub(crate) use user_repository::{delete_user, find_all_users, find_user, insert_user, update_user};
