//! Ledger service configuration.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use common::{CacheRefreshConfig, DatabaseConfig, TransactionConfig};
use domain::DEFAULT_PREMIUM_POINT_RATE_BPS;

/// What a refresh-token lookup does on a cache miss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenLookupPolicy {
    /// A miss is reported as "no owner"; cold caches give false negatives
    CacheOnly,
    /// A miss falls back to the users table and re-populates the cache
    #[default]
    CacheThenStore,
}

impl FromStr for TokenLookupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cache-only" => Ok(TokenLookupPolicy::CacheOnly),
            "cache-then-store" => Ok(TokenLookupPolicy::CacheThenStore),
            other => Err(format!("unknown refresh token lookup policy: {}", other)),
        }
    }
}

/// Ledger service configuration.
#[derive(Debug, Clone)]
pub struct LedgerServiceConfig {
    pub database: DatabaseConfig,
    pub transaction: TransactionConfig,
    pub cache_refresh: CacheRefreshConfig,
    /// Reward rate for premium users in basis points
    pub premium_point_rate_bps: i64,
    pub token_lookup: TokenLookupPolicy,
}

impl LedgerServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database: DatabaseConfig {
                url: env::var("LEDGER_SERVICE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or(defaults.database.max_connections),
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or(defaults.database.min_connections),
                acquire_timeout_ms: parse_env("DATABASE_ACQUIRE_TIMEOUT_MS")
                    .unwrap_or(defaults.database.acquire_timeout_ms),
            },
            transaction: TransactionConfig {
                timeout_ms: parse_env("TRANSACTION_TIMEOUT_MS")
                    .unwrap_or(defaults.transaction.timeout_ms),
            },
            cache_refresh: CacheRefreshConfig {
                initial_delay_ms: parse_env("CACHE_REFRESH_INITIAL_DELAY_MS")
                    .unwrap_or(defaults.cache_refresh.initial_delay_ms),
                interval_secs: parse_env("CACHE_REFRESH_INTERVAL_SECS")
                    .unwrap_or(defaults.cache_refresh.interval_secs),
            },
            premium_point_rate_bps: parse_env("PREMIUM_POINT_RATE_BPS")
                .unwrap_or(defaults.premium_point_rate_bps),
            token_lookup: match env::var("REFRESH_TOKEN_LOOKUP") {
                Ok(value) => value.parse().unwrap_or_else(|e| {
                    tracing::warn!("{}, using {:?}", e, defaults.token_lookup);
                    defaults.token_lookup
                }),
                Err(_) => defaults.token_lookup,
            },
        }
    }
}

impl Default for LedgerServiceConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            transaction: TransactionConfig::default(),
            cache_refresh: CacheRefreshConfig::default(),
            premium_point_rate_bps: DEFAULT_PREMIUM_POINT_RATE_BPS,
            token_lookup: TokenLookupPolicy::default(),
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
