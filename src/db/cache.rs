use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{RecommendationSnapshot, UserId},
};

/// Default snapshot time-to-live (30 minutes)
pub const DEFAULT_TTL_SECS: u64 = 1800;

/// Per-user snapshot store with lazy TTL expiry
///
/// Implementations must tolerate concurrent get/set/invalidate from independent
/// requests. Races resolve last-write-wins.
#[async_trait::async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Returns the snapshot if present and younger than the TTL
    async fn get(&self, user_id: &UserId) -> AppResult<Option<RecommendationSnapshot>>;

    /// Stores a snapshot, overwriting any previous entry
    async fn set(&self, user_id: &UserId, snapshot: RecommendationSnapshot) -> AppResult<()>;

    /// Drops the user's entry after their order or parking history changed
    async fn invalidate(&self, user_id: &UserId) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// A cached snapshot with the time it was stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub snapshot: RecommendationSnapshot,
    pub inserted_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(snapshot: RecommendationSnapshot, inserted_at: DateTime<Utc>) -> Self {
        Self {
            snapshot,
            inserted_at,
        }
    }

    /// Valid iff `now - inserted_at < ttl`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.inserted_at < ttl
    }
}

/// Process-local snapshot cache backed by a concurrent map
pub struct MemorySnapshotCache {
    store: DashMap<UserId, CacheEntry>,
    ttl: Duration,
}

impl Default for MemorySnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS)
    }
}

impl MemorySnapshotCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            store: DashMap::new(),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Lookup evaluated at an explicit instant
    pub fn get_at(&self, user_id: &UserId, now: DateTime<Utc>) -> Option<RecommendationSnapshot> {
        // Clone out so the shard lock is released before any removal.
        let entry = self.store.get(user_id).map(|e| e.value().clone())?;

        if entry.is_fresh(now, self.ttl) {
            return Some(entry.snapshot);
        }

        // Only drop the entry if no fresher write landed in the meantime.
        let ttl = self.ttl;
        self.store
            .remove_if(user_id, |_, current| !current.is_fresh(now, ttl));
        None
    }

    /// Store with an explicit insertion time
    pub fn set_at(&self, user_id: &UserId, snapshot: RecommendationSnapshot, inserted_at: DateTime<Utc>) {
        self.store
            .insert(user_id.clone(), CacheEntry::new(snapshot, inserted_at));
    }

    /// Removes every stale entry, returning how many were dropped
    ///
    /// Expiry is already enforced on read; this only bounds memory.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.store.len();
        let ttl = self.ttl;
        self.store.retain(|_, entry| entry.is_fresh(now, ttl));
        before.saturating_sub(self.store.len())
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait::async_trait]
impl SnapshotCache for MemorySnapshotCache {
    async fn get(&self, user_id: &UserId) -> AppResult<Option<RecommendationSnapshot>> {
        Ok(self.get_at(user_id, Utc::now()))
    }

    async fn set(&self, user_id: &UserId, snapshot: RecommendationSnapshot) -> AppResult<()> {
        self.set_at(user_id, snapshot, Utc::now());
        Ok(())
    }

    async fn invalidate(&self, user_id: &UserId) -> AppResult<()> {
        self.store.remove(user_id);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
