use anyhow::{Context, Result};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod access;
pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod message;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;
pub mod utils;

use config::Config;
use context::AppContext;
use directory::PostgresDirectory;
use handlers::accept_connection;
use store::PostgresMessageStore;

/// Serve the REST API until the listener fails
pub async fn run_http_server(app_context: Arc<AppContext>, listener: TcpListener) -> Result<()> {
    let app = routes::create_router(app_context);
    axum::serve(listener, app)
        .await
        .context("HTTP server terminated")?;
    Ok(())
}

/// Accept gateway connections forever, one task per socket
pub async fn run_websocket_server(app_context: AppContext, listener: TcpListener) {
    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to accept socket: {}", e);
                continue;
            }
        };

        let ctx = app_context.clone();
        tokio::spawn(accept_connection(socket, addr, ctx));
    }
}

pub async fn run() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app_config = Arc::new(config);

    // Connect to database
    let db_pool = db::create_pool(&app_config.database_url, &app_config.db).await?;
    tracing::info!("Connected to database");

    tracing::info!("Applying database migrations...");
    db::run_migrations(&db_pool).await?;
    tracing::info!("Database migrations applied successfully.");

    let directory = Arc::new(PostgresDirectory::new(db_pool.clone()));
    let app_context = AppContext::build(
        app_config.clone(),
        Arc::new(PostgresMessageStore::new(db_pool)),
        directory.clone(),
        directory,
    )?;

    let http_address = format!("0.0.0.0:{}", app_config.port);
    let http_listener = TcpListener::bind(&http_address).await?;
    tracing::info!("REST API listening on {}", http_address);

    let ws_address = format!("0.0.0.0:{}", app_config.ws_port);
    let ws_listener = TcpListener::bind(&ws_address).await?;
    tracing::info!("Chat gateway listening on {} (WebSocket)", ws_address);

    let websocket_server = run_websocket_server(app_context.clone(), ws_listener);
    let http_server = run_http_server(Arc::new(app_context), http_listener);

    tokio::select! {
        _ = websocket_server => {
            tracing::info!("WebSocket server shut down.");
        },
        res = http_server => {
            if let Err(e) = res {
                tracing::error!("HTTP server failed: {:#}", e);
            }
        },
        _ = signal::ctrl_c() => {
            tracing::info!("Shutdown signal received. Shutting down...");
        }
    }

    Ok(())
}
