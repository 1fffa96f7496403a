use std::sync::Arc;
use anyhow::Context;
use bb8_postgres::bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use bb8_postgres::tokio_postgres::NoTls;
use clap::Parser;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use crate::config::Config;
use crate::controller::AppState;
use crate::repositories::memory_repo::MemoryStore;
use crate::repositories::postgres_repo::PostgresConnectionRepo;
use crate::repositories::Store;

pub mod config;
pub mod controller;
pub mod errors;
pub mod helpers;
pub mod models;
pub mod repositories;
pub mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(Config::parse());
    config.validate()?;
    info!("Starting in {} environment", config.environment);

    if config.is_production() && !config.cookie_secure {
        warn!("Session cookies are not marked secure in production");
    }

    let store = connect_store(&config).await?;
    let app_state = AppState::new(config, store)?;

    controller::serve(app_state).await
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    let database_url = match &config.database_url {
        Some(database_url) => database_url,
        None => {
            warn!("DATABASE_URL not set, records are kept in memory and lost on exit");
            return Ok(Arc::new(MemoryStore::new()));
        }
    };

    let manager = PostgresConnectionManager::new_from_stringlike(database_url, NoTls)
        .context("Invalid DATABASE_URL")?;
    let pool = Pool::builder()
        .max_size(config.pool_size)
        .build(manager)
        .await
        .context("Failed to connect to postgres")?;

    let postgres_repo = PostgresConnectionRepo::new(pool);
    postgres_repo.ensure_schema().await?;
    info!("Connected to postgres with a pool of {}", config.pool_size);

    Ok(Arc::new(postgres_repo))
}
