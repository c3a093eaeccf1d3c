//! sql-crud - Main entry point.
//!
//! Establishes the connection pool (with retry), then runs one subcommand:
//! a read, a serialized write, or the example CRUD sequence.

use sql_crud::config::{Command, Config};
use sql_crud::db::{ConnectionPool, QueryExecutor, Session, StatementPlan};
use sql_crud::demo::run_demo;
use sql_crud::{DbError, DbResult};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays clean JSON
    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    // Initialize logging
    init_tracing(&config);

    info!("Starting sql-crud v{}", env!("CARGO_PKG_VERSION"));

    let pool_config = config.pool_config()?;
    let pool = match ConnectionPool::create(&pool_config).await {
        Ok(pool) => Arc::new(pool),
        Err(e) => {
            error!(
                error = %e,
                suggestion = ?e.suggestion(),
                "Could not establish connection pool"
            );
            return Err(e.into());
        }
    };

    let executor = Arc::new(QueryExecutor::new(Arc::clone(&pool)));
    let mut session = Session::new(executor);
    if let Some(database) = &config.database {
        session.select_database(database.as_str());
    }

    let result = tokio::select! {
        result = run_command(&config.command, &mut session) => result,
        _ = wait_for_signal() => {
            info!("Shutdown signal received");
            Err(DbError::internal("Interrupted before the command finished"))
        }
    };

    // Close all database connections on shutdown
    pool.close().await;

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, suggestion = ?e.suggestion(), "Command failed");
            Err(e.into())
        }
    }
}

/// Run one subcommand and render its result as JSON.
async fn run_command(command: &Command, session: &mut Session) -> DbResult<String> {
    let database = session.active_database().map(str::to_string);
    match command {
        Command::Query { sql } => {
            let plan = StatementPlan::query(sql.as_str()).with_database(database);
            let outcome = session.executor().execute(&plan).await?;
            to_json(&outcome)
        }
        Command::Execute { sql } => {
            let outcome = session
                .executor()
                .execute_sql_exclusive(sql, database.as_deref())
                .await?;
            to_json(&outcome)
        }
        Command::Demo => {
            let report = run_demo(session).await?;
            to_json(&report)
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> DbResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| DbError::internal(format!("Failed to serialize output: {}", e)))
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}
