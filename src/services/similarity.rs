use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::{
    db::HistorySource,
    error::AppResult,
    models::{FoodId, OrderRecord, UserId},
};

/// Candidates at or below this similarity are discarded
pub const MIN_SIMILARITY: f64 = 0.1;

/// Neighbors kept per request
pub const MAX_NEIGHBORS: usize = 5;

/// Another user's overlap with the target user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSimilarity {
    pub user_id: UserId,
    /// Jaccard coefficient in [0, 1]
    pub similarity: f64,
    pub shared_items: usize,
}

/// Distinct food ids across a set of orders
pub fn food_set(orders: &[OrderRecord]) -> HashSet<FoodId> {
    orders
        .iter()
        .flat_map(|o| o.items.iter().map(|i| i.food_id.clone()))
        .collect()
}

/// |A ∩ B| / |A ∪ B|, with two empty sets scoring 0
pub fn jaccard(a: &HashSet<FoodId>, b: &HashSet<FoodId>) -> (f64, usize) {
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;

    if union == 0 {
        return (0.0, 0);
    }

    (shared as f64 / union as f64, shared)
}

/// Keeps candidates strictly above the threshold, best first, at most five
///
/// Equal similarities are ordered by user id so results are reproducible.
pub fn select_neighbors(mut candidates: Vec<UserSimilarity>) -> Vec<UserSimilarity> {
    candidates.retain(|c| c.similarity > MIN_SIMILARITY);
    candidates.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    candidates.truncate(MAX_NEIGHBORS);
    candidates
}

/// User-to-user similarity over full order histories
///
/// Scans every user with orders on each call. There is no persisted index.
pub struct SimilarityEngine {
    history: Arc<dyn HistorySource>,
}

impl SimilarityEngine {
    pub fn new(history: Arc<dyn HistorySource>) -> Self {
        Self { history }
    }

    pub async fn find_neighbors(
        &self,
        user_id: &UserId,
        target_foods: &HashSet<FoodId>,
    ) -> AppResult<Vec<UserSimilarity>> {
        // Nothing can overlap an empty set.
        if target_foods.is_empty() {
            return Ok(Vec::new());
        }

        let others = self.history.users_with_orders(user_id).await?;
        let mut candidates = Vec::with_capacity(others.len());

        for other in others {
            if &other == user_id {
                continue;
            }

            let orders = self.history.all_orders(&other).await?;
            let (similarity, shared_items) = jaccard(target_foods, &food_set(&orders));

            candidates.push(UserSimilarity {
                user_id: other,
                similarity,
                shared_items,
            });
        }

        let scanned = candidates.len();
        let neighbors = select_neighbors(candidates);

        tracing::debug!(
            user_id = %user_id,
            scanned,
            neighbors = neighbors.len(),
            "Similar users computed"
        );

        Ok(neighbors)
    }
}
