//! Ledger Service - user accounts, charges and cache refresh.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_service_lib::config::{LedgerServiceConfig, TokenLookupPolicy};
use ledger_service_lib::MigrateAction;

#[derive(Parser)]
#[command(name = "ledger-service")]
#[command(about = "User account ledger service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ledger and its cache refresh job
    Serve {
        /// Seconds between full cache reloads
        #[arg(long, env = "CACHE_REFRESH_INTERVAL_SECS")]
        refresh_interval: Option<u64>,
        /// Disable the store fallback for refresh-token lookups
        #[arg(long)]
        cache_only_tokens: bool,
    },
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = LedgerServiceConfig::from_env();

    match cli.command {
        Commands::Serve {
            refresh_interval,
            cache_only_tokens,
        } => {
            if let Some(secs) = refresh_interval {
                config.cache_refresh.interval_secs = secs;
            }
            if cache_only_tokens {
                config.token_lookup = TokenLookupPolicy::CacheOnly;
            }
            ledger_service_lib::run(config).await?;
        }
        Commands::Migrate { action } => {
            let migrate_action = match action {
                MigrateCommands::Up => MigrateAction::Up,
                MigrateCommands::Down => MigrateAction::Down,
                MigrateCommands::Status => MigrateAction::Status,
                MigrateCommands::Fresh => MigrateAction::Fresh,
            };
            ledger_service_lib::run_migrations(&config, migrate_action).await?;
        }
    }

    Ok(())
}
