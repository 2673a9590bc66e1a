mod demo;

use anyhow::Result;
use clap::Parser;
use sparsedao::config::{Config, DaoConfig, ExecutorConfig};
use sparsedao_core::storage::LockType;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// sparsedao - Typed, concurrency-controlled CRUD over sparse column-family stores
#[derive(Parser, Debug)]
#[command(name = "sparsedao")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Concurrency control for writes (optimistic or pessimistic)
    #[arg(long, env = "SPARSEDAO_LOCK_TYPE")]
    lock_type: Option<LockType>,

    /// Maximum concurrent store operations
    #[arg(long, env = "SPARSEDAO_WORKERS")]
    workers: Option<usize>,

    /// Cap on rows returned by list reads
    #[arg(long, env = "SPARSEDAO_MAX_ROWS")]
    rows: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sparsedao=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    config.dao = DaoConfig::new(
        cli.rows.unwrap_or(config.dao.max_rows),
        cli.lock_type.unwrap_or(config.dao.lock_type),
        config.dao.merge_enabled,
    )?;
    config.executor = ExecutorConfig::new(
        cli.workers.unwrap_or(config.executor.worker_count),
        config.executor.operation_timeout_ms,
    )?;

    tracing::info!(
        lock_type = ?config.dao.lock_type,
        workers = config.executor.worker_count,
        max_rows = config.dao.max_rows,
        "Starting sparsedao demo"
    );

    demo::run(&config).await
}
