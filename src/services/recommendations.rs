use std::sync::Arc;

use chrono::Utc;

use crate::{
    db::{HistorySource, SnapshotCache},
    models::{RecommendationResponse, RecommendationSnapshot, UserId},
    services::{fallback::FallbackPipeline, predictor::RecommendationPredictor},
};

/// Generates personalized food and parking recommendations
///
/// Cache first, then the external predictor, then the local fallback pipeline.
/// Owns the snapshot cache; callers never see an error from this type.
pub struct RecommendationService {
    cache: Arc<dyn SnapshotCache>,
    predictor: Arc<dyn RecommendationPredictor>,
    fallback: FallbackPipeline,
}

impl RecommendationService {
    pub fn new(
        cache: Arc<dyn SnapshotCache>,
        predictor: Arc<dyn RecommendationPredictor>,
        history: Arc<dyn HistorySource>,
    ) -> Self {
        Self {
            cache,
            predictor,
            fallback: FallbackPipeline::new(history),
        }
    }

    /// Returns the user's recommendations, always as a well-formed snapshot
    pub async fn get_recommendations(&self, user_id: &UserId) -> RecommendationResponse {
        match self.cache.get(user_id).await {
            Ok(Some(snapshot)) => {
                tracing::debug!(user_id = %user_id, cache = self.cache.name(), "Cache hit");
                return RecommendationResponse::from_cache(snapshot, Utc::now());
            }
            Ok(None) => {
                tracing::debug!(user_id = %user_id, cache = self.cache.name(), "Cache miss");
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Cache read failed, treating as miss");
            }
        }

        let snapshot = match self.predictor.fetch(user_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Predictor unavailable, using fallback");

                match self.fallback.run(user_id, Utc::now()).await {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        tracing::error!(user_id = %user_id, error = %e, "Fallback recommendations failed");
                        return RecommendationResponse::fresh(RecommendationSnapshot::empty(
                            user_id.clone(),
                            Utc::now(),
                            format!("Unable to generate recommendations: {}", e),
                        ));
                    }
                }
            }
        };

        if let Err(e) = self.cache.set(user_id, snapshot.clone()).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to cache recommendations");
        }

        RecommendationResponse::fresh(snapshot)
    }

    /// Drops the cached snapshot after the user's history changed
    pub async fn invalidate_cache(&self, user_id: &UserId) {
        match self.cache.invalidate(user_id).await {
            Ok(()) => tracing::debug!(user_id = %user_id, "Recommendation cache invalidated"),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to invalidate recommendation cache")
            }
        }
    }
}
