use serde::Deserialize;

/// Which store backs the recommendation snapshot cache
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local concurrent map
    Memory,
    /// Shared Redis instance, for multi-process deployments
    Redis,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the external prediction service
    #[serde(default = "default_predictor_url")]
    pub predictor_url: String,

    /// Single-attempt timeout for the predictor call, in seconds
    #[serde(default = "default_predictor_timeout_secs")]
    pub predictor_timeout_secs: u64,

    /// Snapshot time-to-live, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_cache_backend")]
    pub cache_backend: CacheBackend,

    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// How often expired in-memory snapshots are purged, in seconds
    #[serde(default = "default_cache_sweep_interval_secs")]
    pub cache_sweep_interval_secs: u64,

    /// Optional JSON file used to seed the in-memory history store
    #[serde(default)]
    pub history_seed_path: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_predictor_url() -> String {
    "http://localhost:5002".to_string()
}

fn default_predictor_timeout_secs() -> u64 {
    10
}

fn default_cache_ttl_secs() -> u64 {
    1800
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Memory
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_cache_sweep_interval_secs() -> u64 {
    300
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
