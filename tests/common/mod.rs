#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};

use campus_recommender::{
    db::{HistoryData, InMemoryHistory, MemorySnapshotCache},
    error::{AppError, AppResult},
    models::{FoodDetails, OrderItem, OrderRecord, RecommendationSnapshot, UserId},
    services::{RecommendationPredictor, RecommendationService},
};

/// Predictor that always fails, forcing the local fallback
pub struct OfflinePredictor;

#[async_trait::async_trait]
impl RecommendationPredictor for OfflinePredictor {
    async fn fetch(&self, _user_id: &UserId) -> AppResult<RecommendationSnapshot> {
        Err(AppError::PredictorUnavailable("connection refused".to_string()))
    }
}

pub fn food(name: &str, price: f64) -> FoodDetails {
    FoodDetails {
        name: name.to_string(),
        price,
        image: None,
    }
}

pub fn order(user: &str, items: &[(&str, u32)], at: DateTime<Utc>) -> OrderRecord {
    OrderRecord {
        user_id: UserId::from(user),
        items: items
            .iter()
            .map(|(food_id, quantity)| OrderItem {
                food_id: food_id.to_string(),
                quantity: *quantity,
            })
            .collect(),
        ordered_at: at,
    }
}

pub fn offline_service(data: HistoryData) -> (RecommendationService, Arc<MemorySnapshotCache>) {
    let cache = Arc::new(MemorySnapshotCache::default());
    let service = RecommendationService::new(
        cache.clone(),
        Arc::new(OfflinePredictor),
        Arc::new(InMemoryHistory::new(data)),
    );
    (service, cache)
}
