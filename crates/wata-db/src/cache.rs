//! Redis read-through cache for account lookups

use deadpool_redis::{redis::AsyncCommands, Pool as RedisPool};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use wata_types::{Account, Address};

use crate::DbResult;

/// Cache key prefixes
pub mod keys {
    pub const ACCOUNT_BY_ADDRESS: &str = "account:address:";
}

/// Default TTLs
pub mod ttl {
    use std::time::Duration;

    pub const ACCOUNT: Duration = Duration::from_secs(300); // 5 minutes
}

#[derive(Clone)]
pub struct CacheManager {
    pool: RedisPool,
}

impl CacheManager {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Basic Operations
    // =========================================================================

    /// Set a value with expiration
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> DbResult<()> {
        let mut conn = self.pool.get().await?;
        let json = serde_json::to_string(value)?;

        conn.set_ex::<_, _, ()>(key, json, ttl.as_secs()).await?;

        Ok(())
    }

    /// Get a value
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        let mut conn = self.pool.get().await?;

        let result: Option<String> = conn.get(key).await?;

        match result {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Delete a key
    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        let mut conn = self.pool.get().await?;

        let deleted: i32 = conn.del(key).await?;

        Ok(deleted > 0)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    pub async fn get_account(&self, address: &Address) -> DbResult<Option<Account>> {
        self.get(&account_key(address)).await
    }

    pub async fn set_account(&self, account: &Account) -> DbResult<()> {
        self.set(&account_key(&account.address), account, ttl::ACCOUNT).await
    }

    /// Drop the cached copy after any write to the account
    pub async fn invalidate_account(&self, address: &Address) -> DbResult<bool> {
        self.delete(&account_key(address)).await
    }

    /// Ping Redis
    pub async fn ping(&self) -> DbResult<()> {
        let mut conn = self.pool.get().await?;
        let _: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await?;
        Ok(())
    }
}

pub fn account_key(address: &Address) -> String {
    format!("{}{}", keys::ACCOUNT_BY_ADDRESS, address.to_checksum())
}
