//! Service layer - ledger and user-account use cases.

pub mod account_ledger;
pub mod cache;
mod user_account_service;

pub use account_ledger::AccountLedger;
pub use cache::{AccountCache, CacheStats, CachedBalance, ChargeProfile, UserCaches};
pub use user_account_service::{UserAccountManager, UserAccountService};

#[cfg(any(test, feature = "test-utils"))]
pub use user_account_service::MockUserAccountService;
