//! Account domain entity and wallet deltas.

use std::ops::Add;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account domain entity.
///
/// `balance` is kept in minor monetary units. Both `balance` and `point`
/// only ever move by a [`WalletDelta`] applied inside a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub balance: i64,
    pub point: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new empty account
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            balance: 0,
            point: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Summary view returned to callers after a mutation
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            balance: self.balance,
            point: self.point,
        }
    }
}

/// Account id with its current balance and point total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub balance: i64,
    pub point: i64,
}

/// A requested signed change to an account. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletDelta {
    pub money: i64,
    pub point: i64,
}

impl WalletDelta {
    pub fn new(money: i64, point: i64) -> Self {
        Self { money, point }
    }
}

impl Add for WalletDelta {
    type Output = WalletDelta;

    fn add(self, rhs: WalletDelta) -> WalletDelta {
        WalletDelta {
            money: self.money + rhs.money,
            point: self.point + rhs.point,
        }
    }
}

impl std::iter::Sum for WalletDelta {
    fn sum<I: Iterator<Item = WalletDelta>>(iter: I) -> Self {
        iter.fold(WalletDelta::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_starts_empty() {
        let account = Account::new(Uuid::new_v4());
        assert_eq!(account.balance, 0);
        assert_eq!(account.point, 0);
        assert_eq!(account.summary().id, account.id);
    }

    #[test]
    fn deltas_sum_componentwise() {
        let total: WalletDelta = [
            WalletDelta::new(100, 10),
            WalletDelta::new(-30, 0),
            WalletDelta::new(5, -2),
        ]
        .into_iter()
        .sum();

        assert_eq!(total, WalletDelta::new(75, 8));
    }
}
