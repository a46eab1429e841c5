//! Shared fixtures for the integration tests.
//!
//! Every test gets its own in-memory SQLite database. The pool is capped at
//! one connection so the database survives for the whole test and
//! concurrent transactions queue on the pool.

#![allow(dead_code)]

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use common::{DatabaseConfig, TransactionConfig};
use domain::{ChargeStrategy, NewUser};
use ledger_service_lib::config::TokenLookupPolicy;
use ledger_service_lib::infra::{Database, Persistence};
use ledger_service_lib::service::UserAccountManager;

pub type Service = UserAccountManager<Persistence>;

pub async fn connect() -> DatabaseConnection {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        acquire_timeout_ms: 30_000,
    };

    Database::connect(&config)
        .await
        .expect("in-memory database should start")
        .get_connection()
}

pub fn persistence(conn: &DatabaseConnection, timeout_ms: u64) -> Arc<Persistence> {
    Arc::new(Persistence::new(conn.clone(), &TransactionConfig { timeout_ms }))
}

pub fn service_on(conn: &DatabaseConnection, token_lookup: TokenLookupPolicy) -> Service {
    UserAccountManager::new(persistence(conn, 5_000), ChargeStrategy::default(), token_lookup)
}

pub async fn service() -> (Service, DatabaseConnection) {
    let conn = connect().await;
    (service_on(&conn, TokenLookupPolicy::default()), conn)
}

pub fn new_user(n: usize) -> NewUser {
    NewUser::new(format!("user{}@example.com", n), format!("User {}", n))
}
