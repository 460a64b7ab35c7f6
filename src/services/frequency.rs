use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    db::{history::require_food, HistorySource},
    error::{AppError, AppResult},
    models::{FoodId, OrderRecord, ParkingRecord, PreferenceScore, SlotId, UserId},
};

/// How many recent orders / reservations feed the frequency counts
pub const RECENT_HISTORY_LIMIT: usize = 10;

/// Slot suggested when the user has never parked
pub const PLACEHOLDER_SLOT: &str = "A-02";

const TOP_N: usize = 3;

/// Content-based preferences from the user's own recent history
pub struct FrequencyAnalyzer {
    history: Arc<dyn HistorySource>,
}

impl FrequencyAnalyzer {
    pub fn new(history: Arc<dyn HistorySource>) -> Self {
        Self { history }
    }

    /// Top foods by total quantity over the last 10 orders
    ///
    /// Foods missing from the catalogue are skipped and the next candidate
    /// takes their place.
    pub async fn food_preferences(&self, user_id: &UserId) -> AppResult<Vec<PreferenceScore>> {
        let orders = self
            .history
            .recent_orders(user_id, RECENT_HISTORY_LIMIT)
            .await?;

        let mut foods = Vec::new();
        for (food_id, count) in count_foods(&orders) {
            if foods.len() == TOP_N {
                break;
            }

            match require_food(self.history.as_ref(), &food_id).await {
                Ok(details) => {
                    let reason = food_reason(count);
                    foods.push(PreferenceScore::food(
                        food_id,
                        &details,
                        count,
                        count as f64,
                        reason,
                    ));
                }
                Err(AppError::MissingReference(what)) => {
                    tracing::warn!(user_id = %user_id, missing = %what, "Skipping unknown food");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(foods)
    }

    /// Top slots over the last 10 reservations, falling back to the full
    /// reservation history, then to a single placeholder slot
    pub async fn parking_preferences(&self, user_id: &UserId) -> AppResult<Vec<PreferenceScore>> {
        let mut reservations = self
            .history
            .recent_reservations(user_id, RECENT_HISTORY_LIMIT)
            .await?;

        if reservations.is_empty() {
            reservations = self.history.all_reservations(user_id).await?;
        }

        Ok(slot_preferences(&reservations))
    }
}

/// Ranks slots by occurrence, or yields the placeholder when there are none
pub fn slot_preferences(reservations: &[ParkingRecord]) -> Vec<PreferenceScore> {
    if reservations.is_empty() {
        return vec![PreferenceScore::slot(
            PLACEHOLDER_SLOT.to_string(),
            1,
            1.0,
            "Popular campus spot",
        )];
    }

    count_slots(reservations)
        .into_iter()
        .take(TOP_N)
        .map(|(slot, count)| PreferenceScore::slot(slot, count, count as f64, "Your preferred spot"))
        .collect()
}

pub fn food_reason(count: u32) -> String {
    if count > 1 {
        format!("Ordered {} times", count)
    } else {
        "Your recent order".to_string()
    }
}

/// Per-food quantity totals, highest first; ties keep first-seen order
pub fn count_foods(orders: &[OrderRecord]) -> Vec<(FoodId, u32)> {
    tally(
        orders
            .iter()
            .flat_map(|o| o.items.iter().map(|i| (i.food_id.clone(), i.quantity))),
    )
}

/// Per-slot occurrence counts, highest first; ties keep first-seen order
pub fn count_slots(reservations: &[ParkingRecord]) -> Vec<(SlotId, u32)> {
    tally(reservations.iter().map(|r| (r.slot.clone(), 1)))
}

fn tally(entries: impl Iterator<Item = (String, u32)>) -> Vec<(String, u32)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, u32)> = Vec::new();

    for (id, amount) in entries {
        match index.get(&id) {
            Some(&i) => counts[i].1 = counts[i].1.saturating_add(amount),
            None => {
                index.insert(id.clone(), counts.len());
                counts.push((id, amount));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::history::MockHistorySource;
    use crate::models::{FoodDetails, OrderItem, ParkingStatus};
    use chrono::Utc;

    fn order(items: &[(&str, u32)]) -> OrderRecord {
        OrderRecord {
            user_id: UserId::from("u1"),
            items: items
                .iter()
                .map(|(food, qty)| OrderItem {
                    food_id: food.to_string(),
                    quantity: *qty,
                })
                .collect(),
            ordered_at: Utc::now(),
        }
    }

    fn reservation(slot: &str) -> ParkingRecord {
        ParkingRecord {
            user_id: UserId::from("u1"),
            slot: slot.to_string(),
            status: ParkingStatus::Reserved,
            at: Utc::now(),
        }
    }

    fn details(name: &str) -> FoodDetails {
        FoodDetails {
            name: name.to_string(),
            price: 100.0,
            image: None,
        }
    }

    #[test]
    fn test_count_foods_sums_quantities() {
        let orders = vec![order(&[("a", 2), ("b", 1)]), order(&[("a", 1)])];
        assert_eq!(
            count_foods(&orders),
            vec![("a".to_string(), 3), ("b".to_string(), 1)]
        );
    }

    #[test]
    fn test_count_foods_saturates_on_huge_quantities() {
        let orders = vec![order(&[("a", u32::MAX)]), order(&[("a", 7)])];
        assert_eq!(count_foods(&orders), vec![("a".to_string(), u32::MAX)]);
    }

    #[test]
    fn test_count_slots_ties_keep_first_seen_order() {
        let reservations = vec![reservation("11"), reservation("3"), reservation("3"), reservation("11")];
        let counts = count_slots(&reservations);
        assert_eq!(counts, vec![("11".to_string(), 2), ("3".to_string(), 2)]);
    }

    #[test]
    fn test_food_reason_wording() {
        assert_eq!(food_reason(3), "Ordered 3 times");
        assert_eq!(food_reason(1), "Your recent order");
    }

    #[test]
    fn test_slot_preferences_placeholder_when_empty() {
        let prefs = slot_preferences(&[]);
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].id, PLACEHOLDER_SLOT);
        assert_eq!(prefs[0].raw_count, 1);
        assert_eq!(prefs[0].reason, "Popular campus spot");
    }

    #[test]
    fn test_slot_preferences_top_three_descending() {
        let reservations: Vec<ParkingRecord> = ["1", "2", "2", "3", "3", "3", "4", "4", "4", "4"]
            .iter()
            .map(|s| reservation(s))
            .collect();

        let prefs = slot_preferences(&reservations);
        let counts: Vec<u32> = prefs.iter().map(|p| p.raw_count).collect();

        assert_eq!(counts, vec![4, 3, 2]);
        assert!(prefs.iter().all(|p| p.reason == "Your preferred spot"));
    }

    #[tokio::test]
    async fn test_food_preferences_skips_missing_reference() {
        let mut history = MockHistorySource::new();
        history
            .expect_recent_orders()
            .returning(|_, _| Ok(vec![order(&[("gone", 5), ("a", 2), ("b", 1)])]));
        history.expect_lookup_food().returning(|id| {
            Ok(match id {
                "gone" => None,
                other => Some(details(other)),
            })
        });

        let analyzer = FrequencyAnalyzer::new(Arc::new(history));
        let foods = analyzer.food_preferences(&UserId::from("u1")).await.unwrap();
        let ids: Vec<&str> = foods.iter().map(|f| f.id.as_str()).collect();

        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(foods[0].reason, "Ordered 2 times");
    }

    #[tokio::test]
    async fn test_parking_falls_back_to_full_history() {
        let mut history = MockHistorySource::new();
        history
            .expect_recent_reservations()
            .returning(|_, _| Ok(Vec::new()));
        history
            .expect_all_reservations()
            .times(1)
            .returning(|_| Ok(vec![reservation("B-07")]));

        let analyzer = FrequencyAnalyzer::new(Arc::new(history));
        let parking = analyzer.parking_preferences(&UserId::from("u1")).await.unwrap();

        assert_eq!(parking.len(), 1);
        assert_eq!(parking[0].id, "B-07");
        assert_eq!(parking[0].reason, "Your preferred spot");
    }
}
