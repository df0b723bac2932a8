//! Fundraising CRM - Main Application Entry Point
//!
//! A REST API backend for founders raising money and the admins who curate
//! the investor database behind it: accounts and subscriptions, investor
//! discovery, a potential-investor review queue fed by spreadsheet imports,
//! Razorpay checkout, and outreach email through Gmail or Outlook.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: Opaque bearer session tokens, stored as SHA-256 hashes
//! - **Format**: JSON requests/responses, CSV downloads
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Create or promote the bootstrap admin, if configured
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    if let Some(admin) = config.bootstrap_admin() {
        services::auth_service::ensure_bootstrap_admin(&pool, &admin).await?;
    }

    for (name, enabled) in [
        ("razorpay", config.razorpay().is_some()),
        ("gmail", config.gmail().is_some()),
        ("outlook", config.outlook().is_some()),
    ] {
        if !enabled {
            tracing::info!(integration = name, "integration disabled, credentials not set");
        }
    }

    let addr = format!("0.0.0.0:{}", config.server_port);
    let app = routes::router(state::AppState::new(pool, config)?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Peer addresses feed the admin activity log
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
