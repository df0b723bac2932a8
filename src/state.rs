//! Shared application state injected into every handler.

use std::{sync::Arc, time::Instant};

use axum::extract::FromRef;

use crate::{config::Config, db::DbPool};

/// State shared by all routes.
///
/// Handlers that only touch the database keep extracting `State<DbPool>`;
/// the `FromRef` impl below hands them the pool out of this struct.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    /// Outbound client for Razorpay and the mail provider APIs
    pub http: reqwest::Client,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            pool,
            config: Arc::new(config),
            http,
            started_at: Instant::now(),
        })
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
