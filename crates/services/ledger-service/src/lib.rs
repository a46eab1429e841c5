//! Ledger Service Library
//!
//! Each user owns exactly one account holding a balance and a reward-point
//! total. This crate creates, charges and removes (user, account) pairs
//! atomically and keeps process-local lookup caches in step with the store.

pub mod config;
pub mod infra;
pub mod jobs;
pub mod repository;
pub mod service;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::info;

use domain::ChargeStrategy;

use crate::config::LedgerServiceConfig;
use crate::infra::{Database, Persistence};
use crate::jobs::CacheRefreshJob;
use crate::service::{UserAccountManager, UserAccountService};

/// Wire the service on top of an open connection.
pub fn build_service(
    db: DatabaseConnection,
    config: &LedgerServiceConfig,
) -> Arc<UserAccountManager<Persistence>> {
    let uow = Arc::new(Persistence::new(db, &config.transaction));
    let strategy = ChargeStrategy::new(config.premium_point_rate_bps);
    Arc::new(UserAccountManager::new(uow, strategy, config.token_lookup))
}

/// Run the ledger until Ctrl+C.
///
/// Connects, applies migrations, starts the cache refresh job and shuts it
/// down gracefully on the signal.
pub async fn run(config: LedgerServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect(&config.database).await?;
    db.ping().await?;

    let service: Arc<dyn UserAccountService> = build_service(db.get_connection(), &config);
    let refresh_job = CacheRefreshJob::spawn(service, &config.cache_refresh);

    info!("Ledger service running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    info!("Received shutdown signal, stopping...");
    refresh_job.shutdown().await;
    Ok(())
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(
    config: &LedgerServiceConfig,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}
