use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    db::{history::require_food, HistorySource},
    error::{AppError, AppResult},
    models::{FoodId, PreferenceScore, SlotId},
    services::similarity::UserSimilarity,
};

/// Recent orders / reservations read per neighbor
pub const NEIGHBOR_HISTORY_LIMIT: usize = 10;

/// Collaborative suggestions kept per list
pub const MAX_SUGGESTIONS: usize = 2;

const DECAY_SCALE_DAYS: f64 = 30.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;
const REASON: &str = "Popular among similar students";

/// exp(-days/30): 1.0 for an event happening now, ~0.368 after 30 days
///
/// Events timestamped in the future are treated as happening now.
pub fn time_decay(at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - at).num_milliseconds().max(0) as f64 / MILLIS_PER_DAY;
    (-days / DECAY_SCALE_DAYS).exp()
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulated {
    score: f64,
    count: u32,
}

/// Suggestions drawn from the neighbors' recent activity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollaborativePreferences {
    pub foods: Vec<PreferenceScore>,
    pub parking: Vec<PreferenceScore>,
}

/// Aggregates neighbor preferences into time-decayed, similarity-weighted scores
pub struct CollaborativeRecommender {
    history: Arc<dyn HistorySource>,
}

impl CollaborativeRecommender {
    pub fn new(history: Arc<dyn HistorySource>) -> Self {
        Self { history }
    }

    /// Foods the user has never ordered and slots neighbors use, top two each
    pub async fn recommend(
        &self,
        neighbors: &[UserSimilarity],
        own_foods: &HashSet<FoodId>,
        now: DateTime<Utc>,
    ) -> AppResult<CollaborativePreferences> {
        let mut foods: BTreeMap<FoodId, Accumulated> = BTreeMap::new();
        let mut slots: BTreeMap<SlotId, Accumulated> = BTreeMap::new();

        for neighbor in neighbors {
            let orders = self
                .history
                .recent_orders(&neighbor.user_id, NEIGHBOR_HISTORY_LIMIT)
                .await?;

            for order in &orders {
                let weight = neighbor.similarity * time_decay(order.ordered_at, now);

                for item in order.items.iter().filter(|i| !own_foods.contains(&i.food_id)) {
                    let entry = foods.entry(item.food_id.clone()).or_default();
                    entry.score += weight * item.quantity as f64;
                    entry.count = entry.count.saturating_add(item.quantity);
                }
            }

            let reservations = self
                .history
                .recent_reservations(&neighbor.user_id, NEIGHBOR_HISTORY_LIMIT)
                .await?;

            for reservation in &reservations {
                let entry = slots.entry(reservation.slot.clone()).or_default();
                entry.score += neighbor.similarity * time_decay(reservation.at, now);
                entry.count = entry.count.saturating_add(1);
            }
        }

        let mut food_prefs = Vec::new();
        for (food_id, acc) in ranked(foods) {
            if food_prefs.len() == MAX_SUGGESTIONS {
                break;
            }

            match require_food(self.history.as_ref(), &food_id).await {
                Ok(details) => {
                    food_prefs.push(PreferenceScore::food(food_id, &details, acc.count, acc.score, REASON));
                }
                Err(AppError::MissingReference(what)) => {
                    tracing::warn!(missing = %what, "Skipping unknown food from similar user");
                }
                Err(e) => return Err(e),
            }
        }

        let parking = ranked(slots)
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(slot, acc)| PreferenceScore::slot(slot, acc.count, acc.score, REASON))
            .collect();

        Ok(CollaborativePreferences {
            foods: food_prefs,
            parking,
        })
    }
}

fn ranked(scores: BTreeMap<String, Accumulated>) -> Vec<(String, Accumulated)> {
    let mut ranked: Vec<(String, Accumulated)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.score.partial_cmp(&a.1.score).unwrap_or(Ordering::Equal));
    ranked
}
