//! Short- vs long-window trend detection over a user's own history.
//!
//! The recent window is `[now - 7d, now]`, the older window `[now - 30d, now - 7d)`.
//! Anything older than 30 days carries no trend signal.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{OrderRecord, ParkingRecord};

pub const RECENT_WINDOW_DAYS: i64 = 7;
pub const TREND_HORIZON_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Window {
    Recent,
    Older,
}

fn window_of(at: DateTime<Utc>, now: DateTime<Utc>) -> Option<Window> {
    let recent_start = now - Duration::days(RECENT_WINDOW_DAYS);
    let horizon = now - Duration::days(TREND_HORIZON_DAYS);

    if at >= recent_start {
        Some(Window::Recent)
    } else if at >= horizon {
        Some(Window::Older)
    } else {
        None
    }
}

/// Per-item trend coefficients for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendReport {
    pub food_trends: HashMap<String, f64>,
    pub parking_trends: HashMap<String, f64>,
    /// True if any order or reservation falls in the recent window
    pub has_recent_activity: bool,
    pub period_days: i64,
}

impl TrendReport {
    /// Coefficient for a food, 0 when there is no signal
    pub fn food(&self, food_id: &str) -> f64 {
        self.food_trends.get(food_id).copied().unwrap_or(0.0)
    }

    /// Coefficient for a slot, 0 when there is no signal
    pub fn parking(&self, slot: &str) -> f64 {
        self.parking_trends.get(slot).copied().unwrap_or(0.0)
    }
}

/// Relative change from the older to the recent window
pub fn trend_coefficient(recent: u32, older: u32) -> f64 {
    if older > 0 {
        (recent as f64 - older as f64) / older as f64
    } else if recent > 0 {
        1.0
    } else {
        0.0
    }
}

#[derive(Default)]
struct WindowCounts {
    recent: HashMap<String, u32>,
    older: HashMap<String, u32>,
    any_recent: bool,
}

impl WindowCounts {
    fn add(&mut self, window: Window, id: &str, amount: u32) {
        let bucket = match window {
            Window::Recent => &mut self.recent,
            Window::Older => &mut self.older,
        };
        let count = bucket.entry(id.to_string()).or_insert(0);
        *count = count.saturating_add(amount);
    }

    /// Only items active in the recent window get a coefficient
    fn coefficients(&self) -> HashMap<String, f64> {
        self.recent
            .iter()
            .map(|(id, &recent)| {
                let older = self.older.get(id).copied().unwrap_or(0);
                (id.clone(), trend_coefficient(recent, older))
            })
            .collect()
    }
}

/// Compares the recent and older windows of the user's orders and parking
pub fn analyze(orders: &[OrderRecord], reservations: &[ParkingRecord], now: DateTime<Utc>) -> TrendReport {
    let mut foods = WindowCounts::default();
    for order in orders {
        if let Some(window) = window_of(order.ordered_at, now) {
            foods.any_recent |= window == Window::Recent;
            for item in &order.items {
                foods.add(window, &item.food_id, item.quantity);
            }
        }
    }

    let mut slots = WindowCounts::default();
    for reservation in reservations {
        if let Some(window) = window_of(reservation.at, now) {
            slots.any_recent |= window == Window::Recent;
            slots.add(window, &reservation.slot, 1);
        }
    }

    TrendReport {
        food_trends: foods.coefficients(),
        parking_trends: slots.coefficients(),
        has_recent_activity: foods.any_recent || slots.any_recent,
        period_days: RECENT_WINDOW_DAYS,
    }
}
