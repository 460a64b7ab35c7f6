use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    db::HistorySource,
    error::{AppError, AppResult},
    models::{ItemKind, RecommendationSnapshot, RecommendationSource, UserId},
    services::{
        blender::{self, RESULT_LIMIT},
        collaborative::CollaborativeRecommender,
        frequency::FrequencyAnalyzer,
        similarity::{self, SimilarityEngine},
        trends,
    },
};

/// Status attached to snapshots built without the external predictor
pub const PREDICTOR_UNAVAILABLE_STATUS: &str = "predictor_unavailable";

/// Error note on snapshots for users with no order or parking history
pub const NO_HISTORY_ERROR: &str = "No order or parking history for user";

/// Local recommendation pipeline used when the predictor is unreachable
///
/// frequency + collaborative, merged per list, then re-ranked by trend.
pub struct FallbackPipeline {
    history: Arc<dyn HistorySource>,
    frequency: FrequencyAnalyzer,
    similarity: SimilarityEngine,
    collaborative: CollaborativeRecommender,
}

impl FallbackPipeline {
    pub fn new(history: Arc<dyn HistorySource>) -> Self {
        Self {
            frequency: FrequencyAnalyzer::new(history.clone()),
            similarity: SimilarityEngine::new(history.clone()),
            collaborative: CollaborativeRecommender::new(history.clone()),
            history,
        }
    }

    /// Builds a `fallback_basic` snapshot evaluated at `now`
    ///
    /// Any history collaborator failure is returned as `AppError::Computation`.
    pub async fn run(&self, user_id: &UserId, now: DateTime<Utc>) -> AppResult<RecommendationSnapshot> {
        self.generate(user_id, now)
            .await
            .map_err(|e| match e {
                AppError::Computation(_) => e,
                other => AppError::Computation(other.to_string()),
            })
    }

    async fn generate(&self, user_id: &UserId, now: DateTime<Utc>) -> AppResult<RecommendationSnapshot> {
        let all_orders = self.history.all_orders(user_id).await?;
        let all_reservations = self.history.all_reservations(user_id).await?;

        if all_orders.is_empty() && all_reservations.is_empty() {
            tracing::info!(user_id = %user_id, "No history, returning empty fallback snapshot");
            return Ok(RecommendationSnapshot {
                service_status: Some(PREDICTOR_UNAVAILABLE_STATUS.to_string()),
                ..RecommendationSnapshot::empty(user_id.clone(), now, NO_HISTORY_ERROR)
            });
        }

        let frequent_foods = self.frequency.food_preferences(user_id).await?;
        let frequent_parking = self.frequency.parking_preferences(user_id).await?;

        let own_foods = similarity::food_set(&all_orders);
        let neighbors = self.similarity.find_neighbors(user_id, &own_foods).await?;
        let collaborative = self
            .collaborative
            .recommend(&neighbors, &own_foods, now)
            .await?;

        let report = trends::analyze(&all_orders, &all_reservations, now);

        let foods = blender::apply_trends(
            blender::merge(frequent_foods, collaborative.foods),
            &report.food_trends,
            ItemKind::Food,
            RESULT_LIMIT,
        );
        let parking = blender::apply_trends(
            blender::merge(frequent_parking, collaborative.parking),
            &report.parking_trends,
            ItemKind::Parking,
            RESULT_LIMIT,
        );

        tracing::info!(
            user_id = %user_id,
            neighbors = neighbors.len(),
            foods = foods.len(),
            parking = parking.len(),
            has_recent_activity = report.has_recent_activity,
            "Fallback recommendations generated"
        );

        Ok(RecommendationSnapshot {
            user_id: user_id.clone(),
            foods,
            parking,
            generated_at: now,
            source: RecommendationSource::FallbackBasic,
            has_recent_activity: report.has_recent_activity,
            service_status: Some(PREDICTOR_UNAVAILABLE_STATUS.to_string()),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{HistoryData, InMemoryHistory};
    use crate::models::{FoodDetails, OrderItem, OrderRecord, ParkingRecord, ParkingStatus};
    use chrono::Duration;

    fn food(name: &str) -> FoodDetails {
        FoodDetails {
            name: name.to_string(),
            price: 100.0,
            image: None,
        }
    }

    fn order(user: &str, items: &[(&str, u32)], at: DateTime<Utc>) -> OrderRecord {
        OrderRecord {
            user_id: UserId::from(user),
            items: items
                .iter()
                .map(|(f, q)| OrderItem {
                    food_id: f.to_string(),
                    quantity: *q,
                })
                .collect(),
            ordered_at: at,
        }
    }

    #[tokio::test]
    async fn test_collaborative_food_joins_frequency_results() {
        let now = Utc::now();
        let old = now - Duration::days(40);
        let data = HistoryData {
            foods: [("a", "Shiro"), ("b", "Tibs"), ("c", "Kitfo")]
                .into_iter()
                .map(|(id, name)| (id.to_string(), food(name)))
                .collect(),
            orders: vec![
                order("me", &[("a", 2), ("b", 1)], old),
                order("peer", &[("a", 1), ("b", 1), ("c", 1)], now),
            ],
            reservations: Vec::new(),
        };
        let pipeline = FallbackPipeline::new(Arc::new(InMemoryHistory::new(data)));

        let snapshot = pipeline.run(&UserId::from("me"), now).await.unwrap();
        let ids: Vec<&str> = snapshot.foods.iter().map(|f| f.id.as_str()).collect();

        // peer shares 2 of 3 foods; "c" is new to "me"
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(snapshot.foods[2].reason, "Popular among similar students");
        assert!((snapshot.foods[2].weighted_score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(snapshot.parking[0].id, "A-02");
        assert_eq!(snapshot.source, RecommendationSource::FallbackBasic);
        assert_eq!(snapshot.service_status.as_deref(), Some(PREDICTOR_UNAVAILABLE_STATUS));
    }

    #[tokio::test]
    async fn test_trend_reorders_parking() {
        let now = Utc::now();
        let parked = |slot: &str, days: i64| ParkingRecord {
            user_id: UserId::from("me"),
            slot: slot.to_string(),
            status: ParkingStatus::Reserved,
            at: now - Duration::days(days),
        };
        let data = HistoryData {
            reservations: vec![
                parked("3", 1),
                parked("11", 2),
                parked("11", 10),
                parked("11", 12),
                parked("11", 15),
            ],
            ..HistoryData::default()
        };
        let pipeline = FallbackPipeline::new(Arc::new(InMemoryHistory::new(data)));

        let snapshot = pipeline.run(&UserId::from("me"), now).await.unwrap();

        // "11": trend (1 - 3) / 3, score 4 * 0.7 = 2.8; "3": 1 * 1.3 = 1.3
        assert!((snapshot.parking[0].weighted_score - 2.8).abs() < 1e-9);
        assert_eq!(snapshot.parking[0].id, "11");
        assert_eq!(snapshot.parking[0].reason, "Less frequent in recent reservations");
        assert_eq!(snapshot.parking[1].id, "3");
        assert_eq!(snapshot.parking[1].reason, "Trending up in your recent reservations");
        assert!(snapshot.has_recent_activity);
    }

    #[tokio::test]
    async fn test_slot_absent_from_recent_window_keeps_plain_score() {
        let now = Utc::now();
        let parked = |days: i64| ParkingRecord {
            user_id: UserId::from("me"),
            slot: "11".to_string(),
            status: ParkingStatus::Reserved,
            at: now - Duration::days(days),
        };
        let data = HistoryData {
            reservations: vec![parked(10), parked(12)],
            ..HistoryData::default()
        };
        let pipeline = FallbackPipeline::new(Arc::new(InMemoryHistory::new(data)));

        let snapshot = pipeline.run(&UserId::from("me"), now).await.unwrap();

        assert_eq!(snapshot.parking.len(), 1);
        assert_eq!(snapshot.parking[0].weighted_score, 2.0);
        assert_eq!(snapshot.parking[0].reason, "Your preferred spot");
        assert!(!snapshot.has_recent_activity);
    }

    #[tokio::test]
    async fn test_no_history_yields_empty_lists_with_error() {
        let pipeline = FallbackPipeline::new(Arc::new(InMemoryHistory::default()));

        let snapshot = pipeline.run(&UserId::from("ghost"), Utc::now()).await.unwrap();

        assert!(snapshot.foods.is_empty());
        assert!(snapshot.parking.is_empty());
        assert_eq!(snapshot.error.as_deref(), Some(NO_HISTORY_ERROR));
    }
}
