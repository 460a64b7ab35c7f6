use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_recommender::{
    config::{CacheBackend, Config},
    db::{create_redis_client, HistorySource, InMemoryHistory, MemorySnapshotCache, RedisSnapshotCache, SnapshotCache},
    routes::{create_router, AppState},
    services::{HttpPredictor, RecommendationService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_recommender=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let history: Arc<dyn HistorySource> = match &config.history_seed_path {
        Some(path) => {
            tracing::info!(path = %path, "Seeding history from file");
            Arc::new(InMemoryHistory::from_json_file(path)?)
        }
        None => Arc::new(InMemoryHistory::default()),
    };

    let cache: Arc<dyn SnapshotCache> = match config.cache_backend {
        CacheBackend::Memory => {
            let cache = Arc::new(MemorySnapshotCache::new(config.cache_ttl_secs));
            spawn_cache_sweeper(cache.clone(), Duration::from_secs(config.cache_sweep_interval_secs));
            cache
        }
        CacheBackend::Redis => {
            let client = create_redis_client(&config.redis_url)?;
            Arc::new(RedisSnapshotCache::connect(client, config.cache_ttl_secs).await?)
        }
    };

    let predictor = HttpPredictor::new(
        config.predictor_url.clone(),
        Duration::from_secs(config.predictor_timeout_secs),
    )?;

    let service = RecommendationService::new(cache, Arc::new(predictor), history);
    let app = create_router(Arc::new(AppState::new(Arc::new(service))));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        addr = %addr,
        predictor = %config.predictor_url,
        cache = ?config.cache_backend,
        "Campus recommender listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn spawn_cache_sweeper(cache: Arc<MemorySnapshotCache>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, remaining = cache.len(), "Expired snapshots purged");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
