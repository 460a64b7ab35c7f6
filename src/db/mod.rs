pub mod cache;
pub mod history;
pub mod redis;

pub use cache::{MemorySnapshotCache, SnapshotCache};
pub use history::{HistoryData, HistorySource, InMemoryHistory};
pub use self::redis::{create_redis_client, RedisSnapshotCache};
