use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;

use common_db::{ConnectionManager, ConnectionSettings, PgConnector};
use common_server::tracing_setup::{init_tracing, TracingConfig};
use common_server::{run_server, AppState, Dispatcher, ServeArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let args = ServeArgs::parse();
    init_tracing(&TracingConfig { debug: args.debug })?;

    let settings = ConnectionSettings::from_env().context("invalid database configuration")?;
    tracing::info!(host = %settings.host, port = settings.port, dbname = %settings.dbname, "database configured");

    let manager = Arc::new(
        ConnectionManager::new(PgConnector::new(args.max_connections), settings)
            .context("unsupported database driver")?,
    );

    if args.eager_connect {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            manager.get().await;
        });
    }

    let state = AppState::new(manager, Dispatcher::new(args.dispatch_timeout()));
    tracing::info!("Starting server on {}", args.bind);

    run_server(state, Router::new(), args.server_config())
        .await
        .context("Server error")?;

    Ok(())
}
