//! Process-local lookup caches.
//!
//! Each cache is owned by the component that writes it and lives as long as
//! that component. Entries mirror committed store state and are healed by a
//! periodic full reload. Shard guards are never held across an `.await`.

use std::collections::HashMap;
use std::hash::Hash;

use dashmap::DashMap;
use uuid::Uuid;

use domain::{Account, Classification, TokenOwner, User, WalletDelta};

/// Cached balance and point total for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedBalance {
    pub balance: i64,
    pub point: i64,
}

impl From<&Account> for CachedBalance {
    fn from(account: &Account) -> Self {
        Self {
            balance: account.balance,
            point: account.point,
        }
    }
}

/// What a charge needs to know about a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeProfile {
    pub classification: Classification,
    pub account_id: Uuid,
}

impl From<&User> for ChargeProfile {
    fn from(user: &User) -> Self {
        Self {
            classification: user.classification,
            account_id: user.account_id,
        }
    }
}

/// Entry counts after a reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub accounts: usize,
    pub charge_profiles: usize,
    pub refresh_tokens: usize,
}

// =============================================================================
// Account cache
// =============================================================================

/// `account id -> {balance, point}`
#[derive(Debug, Default)]
pub struct AccountCache {
    entries: DashMap<Uuid, CachedBalance>,
}

impl AccountCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Uuid) -> Option<CachedBalance> {
        self.entries.get(id).map(|entry| *entry)
    }

    pub fn insert(&self, account: &Account) {
        self.entries.insert(account.id, CachedBalance::from(account));
    }

    /// Add a committed delta to a cached entry.
    ///
    /// An account that is not cached stays uncached until the next reload.
    pub fn apply(&self, id: &Uuid, delta: WalletDelta) {
        if let Some(mut cached) = self.entries.get_mut(id) {
            cached.balance = cached.balance.saturating_add(delta.money);
            cached.point = cached.point.saturating_add(delta.point);
        }
    }

    pub fn remove(&self, id: &Uuid) -> Option<CachedBalance> {
        self.entries.remove(id).map(|(_, cached)| cached)
    }

    /// Overwrite the whole cache from a store snapshot.
    pub fn reload(&self, accounts: &[Account]) -> usize {
        let fresh = accounts
            .iter()
            .map(|account| (account.id, CachedBalance::from(account)))
            .collect();
        replace_all(&self.entries, fresh)
    }

    pub fn snapshot(&self) -> HashMap<Uuid, CachedBalance> {
        snapshot(&self.entries)
    }
}

// =============================================================================
// User caches
// =============================================================================

/// `user id -> charge profile` and `refresh token -> owner`
#[derive(Debug, Default)]
pub struct UserCaches {
    charge: DashMap<Uuid, ChargeProfile>,
    tokens: DashMap<String, TokenOwner>,
}

impl UserCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charge_profile(&self, user_id: &Uuid) -> Option<ChargeProfile> {
        self.charge.get(user_id).map(|entry| *entry)
    }

    pub fn token_owner(&self, token: &str) -> Option<TokenOwner> {
        self.tokens.get(token).map(|entry| entry.clone())
    }

    /// Record a user that was just committed.
    pub fn track(&self, user: &User) {
        self.charge.insert(user.id, ChargeProfile::from(user));
        if let Some(token) = &user.refresh_token {
            self.tokens.insert(token.clone(), user.token_owner());
        }
    }

    pub fn track_token(&self, token: &str, owner: TokenOwner) {
        self.tokens.insert(token.to_string(), owner);
    }

    /// Swap the entries of `previous` for those of `updated`.
    pub fn track_update(&self, previous: &User, updated: &User) {
        if previous.refresh_token != updated.refresh_token {
            if let Some(old) = &previous.refresh_token {
                self.tokens.remove(old);
            }
        }
        self.track(updated);
    }

    /// Drop every entry that points at `user`.
    pub fn forget(&self, user: &User) {
        self.charge.remove(&user.id);
        self.tokens.retain(|_, owner| owner.id != user.id);
    }

    /// Overwrite both maps from a store snapshot.
    pub fn reload(&self, users: &[User]) -> (usize, usize) {
        let charge = users
            .iter()
            .map(|user| (user.id, ChargeProfile::from(user)))
            .collect();
        let tokens = users
            .iter()
            .filter_map(|user| {
                user.refresh_token
                    .as_ref()
                    .map(|token| (token.clone(), user.token_owner()))
            })
            .collect();

        (
            replace_all(&self.charge, charge),
            replace_all(&self.tokens, tokens),
        )
    }

    pub fn charge_snapshot(&self) -> HashMap<Uuid, ChargeProfile> {
        snapshot(&self.charge)
    }

    pub fn token_snapshot(&self) -> HashMap<String, TokenOwner> {
        snapshot(&self.tokens)
    }
}

/// Drop keys missing from `fresh`, then upsert everything in it. The map is
/// never observed empty halfway through a reload.
fn replace_all<K, V>(map: &DashMap<K, V>, fresh: HashMap<K, V>) -> usize
where
    K: Eq + Hash + Clone,
{
    map.retain(|key, _| fresh.contains_key(key));
    for (key, value) in fresh {
        map.insert(key, value);
    }
    map.len()
}

fn snapshot<K, V>(map: &DashMap<K, V>) -> HashMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    map.iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account(balance: i64, point: i64) -> Account {
        Account {
            id: Uuid::new_v4(),
            balance,
            point,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user(token: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            name: "User".to_string(),
            refresh_token: token.map(str::to_string),
            classification: Classification::Premium,
            account_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn apply_adds_to_cached_entry() {
        let cache = AccountCache::new();
        let acc = account(50, 5);
        cache.insert(&acc);

        cache.apply(&acc.id, WalletDelta::new(100, 10));

        assert_eq!(
            cache.get(&acc.id),
            Some(CachedBalance {
                balance: 150,
                point: 15
            })
        );
    }

    #[test]
    fn apply_leaves_uncached_account_alone() {
        let cache = AccountCache::new();
        let id = Uuid::new_v4();

        // Deltas of +10 and +20 committing concurrently, cache writes reversed
        cache.apply(&id, WalletDelta::new(20, 0));
        cache.apply(&id, WalletDelta::new(10, 0));

        assert!(cache.get(&id).is_none());
    }

    #[test]
    fn apply_after_reload_matches_store() {
        let cache = AccountCache::new();
        let mut acc = account(0, 0);
        acc.balance = 10;
        cache.reload(std::slice::from_ref(&acc));

        cache.apply(&acc.id, WalletDelta::new(20, 0));

        assert_eq!(
            cache.get(&acc.id),
            Some(CachedBalance {
                balance: 30,
                point: 0
            })
        );
    }

    #[test]
    fn apply_saturates_instead_of_overflowing() {
        let cache = AccountCache::new();
        let acc = account(i64::MAX - 1, i64::MIN + 1);
        cache.insert(&acc);

        cache.apply(&acc.id, WalletDelta::new(10, -10));

        assert_eq!(
            cache.get(&acc.id),
            Some(CachedBalance {
                balance: i64::MAX,
                point: i64::MIN
            })
        );
    }

    #[test]
    fn reload_drops_stale_entries() {
        let cache = AccountCache::new();
        let stale = account(1, 1);
        let live = account(2, 2);
        cache.insert(&stale);

        let count = cache.reload(std::slice::from_ref(&live));

        assert_eq!(count, 1);
        assert!(cache.get(&stale.id).is_none());
        assert_eq!(cache.get(&live.id), Some(CachedBalance::from(&live)));
    }

    #[test]
    fn token_rotation_evicts_previous_token() {
        let caches = UserCaches::new();
        let before = user(Some("old"));
        caches.track(&before);

        let mut after = before.clone();
        after.refresh_token = Some("new".to_string());
        caches.track_update(&before, &after);

        assert!(caches.token_owner("old").is_none());
        assert_eq!(caches.token_owner("new"), Some(after.token_owner()));
    }

    #[test]
    fn forget_removes_all_user_entries() {
        let caches = UserCaches::new();
        let u = user(Some("token"));
        caches.track(&u);

        caches.forget(&u);

        assert!(caches.charge_profile(&u.id).is_none());
        assert!(caches.token_owner("token").is_none());
    }

    #[test]
    fn reload_is_idempotent() {
        let caches = UserCaches::new();
        let users = vec![user(Some("a")), user(None)];

        caches.reload(&users);
        let first = (caches.charge_snapshot(), caches.token_snapshot());
        caches.reload(&users);
        let second = (caches.charge_snapshot(), caches.token_snapshot());

        assert_eq!(first, second);
        assert_eq!(first.0.len(), 2);
        assert_eq!(first.1.len(), 1);
    }
}
