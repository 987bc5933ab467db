//! Command implementations

pub mod auth;
pub mod demo;
pub mod ledger;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use wata_db::{AccountStore, Database, MemoryStore};
use wata_types::WataError;

use crate::config::{AppConfig, StorageBackend};
use crate::display;

/// Open the configured account store
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn AccountStore>> {
    match config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory store; state is discarded on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let db = Database::connect(&config.database)
                .await
                .context("failed to connect to the database")?;
            Ok(Arc::new(db.account_store()))
        }
    }
}

/// Apply pending migrations
pub async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let db = Database::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    db.migrate().await.context("migration failed")?;

    let health = db.health_check().await?;
    display::success("Migrations applied");
    display::kv("postgres", if health.postgres { "ok" } else { "down" });
    if let Some(redis) = health.redis {
        display::kv("redis", if redis { "ok" } else { "down" });
    }
    Ok(())
}

/// Print the outcome of a service call; service errors become a
/// `{code, message}` line on stderr and a failing exit
pub fn report<T: serde::Serialize>(result: Result<T, WataError>) -> anyhow::Result<()> {
    match result {
        Ok(value) => display::json(&value),
        Err(err) => {
            display::failure(&err);
            Err(anyhow::anyhow!("request failed with code {}", err.code()))
        }
    }
}
