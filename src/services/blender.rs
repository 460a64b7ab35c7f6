//! Adaptive re-ranking of preference lists using per-item trend coefficients.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::{ItemKind, PreferenceScore};

/// Final list length returned to callers
pub const RESULT_LIMIT: usize = 3;

const TRENDING_UP: f64 = 0.5;
const TRENDING_DOWN: f64 = -0.5;
const BOOST_PER_TREND: f64 = 0.3;
const DAMPEN_FACTOR: f64 = 0.7;

/// Sorts descending by weighted score and truncates
///
/// The sort is stable, so equal scores keep their incoming order.
pub fn rank(items: &mut Vec<PreferenceScore>, limit: usize) {
    items.sort_by(|a, b| {
        b.weighted_score
            .partial_cmp(&a.weighted_score)
            .unwrap_or(Ordering::Equal)
    });
    items.truncate(limit);
}

/// Concatenates two lists, dropping secondary items whose id already appears
/// in the primary list
pub fn merge(primary: Vec<PreferenceScore>, secondary: Vec<PreferenceScore>) -> Vec<PreferenceScore> {
    let mut seen: HashSet<String> = primary.iter().map(|p| p.id.clone()).collect();
    let mut merged = primary;

    for item in secondary {
        if seen.insert(item.id.clone()) {
            merged.push(item);
        }
    }

    merged
}

/// Re-weights items by trend, then re-ranks to `limit`
///
/// A trend above 0.5 multiplies the score by `1 + trend * 0.3`; a trend below
/// -0.5 multiplies it by 0.7. Anything in between is left untouched.
pub fn apply_trends(
    items: Vec<PreferenceScore>,
    trends: &HashMap<String, f64>,
    kind: ItemKind,
    limit: usize,
) -> Vec<PreferenceScore> {
    let mut adjusted: Vec<PreferenceScore> = items
        .into_iter()
        .map(|mut item| {
            let trend = trends.get(&item.id).copied().unwrap_or(0.0);

            if trend > TRENDING_UP {
                item.weighted_score *= 1.0 + trend * BOOST_PER_TREND;
                item.reason = format!("Trending up in your recent {}", kind.activity());
            } else if trend < TRENDING_DOWN {
                item.weighted_score *= DAMPEN_FACTOR;
                item.reason = format!("Less frequent in recent {}", kind.activity());
            }

            item
        })
        .collect();

    rank(&mut adjusted, limit);
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: &str, score: f64) -> PreferenceScore {
        PreferenceScore::slot(id.to_string(), score as u32, score, "Your preferred spot")
    }

    #[test]
    fn test_merge_primary_wins_on_conflict() {
        let primary = vec![slot("A", 3.0)];
        let secondary = vec![slot("A", 9.0), slot("B", 1.0)];

        let merged = merge(primary, secondary);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].weighted_score, 3.0);
        assert_eq!(merged[1].id, "B");
    }

    #[test]
    fn test_rising_trend_boosts_and_reorders() {
        let items = vec![slot("A", 3.0), slot("B", 2.5)];
        let trends = HashMap::from([("B".to_string(), 1.0)]);

        let blended = apply_trends(items, &trends, ItemKind::Parking, RESULT_LIMIT);

        assert_eq!(blended[0].id, "B");
        assert!((blended[0].weighted_score - 3.25).abs() < 1e-9);
        assert_eq!(blended[0].reason, "Trending up in your recent reservations");
        assert_eq!(blended[1].reason, "Your preferred spot");
    }

    #[test]
    fn test_falling_trend_dampens() {
        let items = vec![slot("A", 2.0)];
        let trends = HashMap::from([("A".to_string(), -1.0)]);

        let blended = apply_trends(items, &trends, ItemKind::Food, RESULT_LIMIT);

        assert!((blended[0].weighted_score - 1.4).abs() < 1e-9);
        assert_eq!(blended[0].reason, "Less frequent in recent orders");
    }

    #[test]
    fn test_boundary_trends_leave_item_unchanged() {
        let items = vec![slot("A", 2.0), slot("B", 1.0)];
        let trends = HashMap::from([("A".to_string(), 0.5), ("B".to_string(), -0.5)]);

        let blended = apply_trends(items, &trends, ItemKind::Food, RESULT_LIMIT);

        assert_eq!(blended[0].weighted_score, 2.0);
        assert_eq!(blended[1].weighted_score, 1.0);
        assert_eq!(blended[1].reason, "Your preferred spot");
    }

    #[test]
    fn test_truncates_to_limit_sorted_descending() {
        let items = vec![slot("A", 1.0), slot("B", 4.0), slot("C", 2.0), slot("D", 3.0)];

        let blended = apply_trends(items, &HashMap::new(), ItemKind::Food, RESULT_LIMIT);
        let ids: Vec<&str> = blended.iter().map(|p| p.id.as_str()).collect();

        assert_eq!(ids, vec!["B", "D", "C"]);
    }
}
