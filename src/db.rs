use std::time::Duration;

use anyhow::{Context as _, Result};
use mongodb::{Client, Database};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;
use crate::models::club::Club;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Connects to Postgres and brings its schema up to date
pub async fn connect_to_db(config: &Config) -> Result<PgPool> {
    tracing::debug!("connecting to postgres");

    let pool = PgPoolOptions::new()
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Connects to the club document store and sets up its indexes
pub async fn connect_to_store(config: &Config) -> Result<Database> {
    tracing::debug!("connecting to mongodb");

    let client = tokio::time::timeout(CONNECT_TIMEOUT, Client::with_uri_str(&config.mongodb_uri))
        .await
        .context("mongodb timeout")?
        .context("mongodb")?;
    let database = client.database(&config.mongodb_database);

    tokio::time::timeout(CONNECT_TIMEOUT, Club::setup_collection(&database))
        .await
        .context("club collection timeout")?
        .context("club collection")?;

    Ok(database)
}
