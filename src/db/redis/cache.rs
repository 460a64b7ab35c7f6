use chrono::{Duration, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;

use crate::db::cache::{CacheEntry, SnapshotCache};
use crate::error::{AppError, AppResult};
use crate::models::{RecommendationSnapshot, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Recommendations(UserId),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendations(user_id) => write!(f, "rec:{}", user_id),
        }
    }
}

/// Opens a Redis client; no connection is made until first use
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    Client::open(redis_url).map_err(|e| anyhow::anyhow!("Invalid Redis URL {}: {}", redis_url, e))
}

/// Snapshot cache shared across processes through Redis
///
/// `set` returns only after the SET EX is acknowledged, so the next request
/// for the same user reads the new entry. Redis expires keys after the TTL and
/// the stored insertion time is re-checked on read.
#[derive(Clone)]
pub struct RedisSnapshotCache {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl RedisSnapshotCache {
    pub async fn connect(redis_client: Client, ttl_secs: u64) -> AppResult<Self> {
        let conn = ConnectionManager::new(redis_client).await?;
        tracing::info!(ttl_secs, "Connected Redis snapshot cache");
        Ok(Self { conn, ttl_secs })
    }

    fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs as i64)
    }
}

#[async_trait::async_trait]
impl SnapshotCache for RedisSnapshotCache {
    async fn get(&self, user_id: &UserId) -> AppResult<Option<RecommendationSnapshot>> {
        let key = CacheKey::Recommendations(user_id.clone());
        let mut conn = self.conn.clone();
        let stored: Option<String> = conn.get(key.to_string()).await?;

        let Some(payload) = stored else {
            return Ok(None);
        };

        let entry: CacheEntry = serde_json::from_str(&payload)
            .map_err(|e| AppError::Internal(format!("Corrupt cached snapshot for {}: {}", key, e)))?;

        Ok(entry
            .is_fresh(Utc::now(), self.ttl())
            .then_some(entry.snapshot))
    }

    async fn set(&self, user_id: &UserId, snapshot: RecommendationSnapshot) -> AppResult<()> {
        let key = CacheKey::Recommendations(user_id.clone());
        let payload = serde_json::to_string(&CacheEntry::new(snapshot, Utc::now()))
            .map_err(|e| AppError::Internal(format!("Snapshot serialization failed: {}", e)))?;

        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key.to_string(), payload, self.ttl_secs).await?;
        Ok(())
    }

    async fn invalidate(&self, user_id: &UserId) -> AppResult<()> {
        let key = CacheKey::Recommendations(user_id.clone());
        let mut conn = self.conn.clone();
        let _: () = conn.del(key.to_string()).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
