use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FoodId, SlotId, UserId};

/// One line of a food order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub food_id: FoodId,
    pub quantity: u32,
}

/// A placed food order, owned by the order subsystem
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRecord {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub ordered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParkingStatus {
    Reserved,
    Occupied,
}

/// A parking reservation or occupation, owned by the parking subsystem
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParkingRecord {
    pub user_id: UserId,
    pub slot: SlotId,
    pub status: ParkingStatus,
    /// Reservation time, or occupation time when the slot was taken directly
    pub at: DateTime<Utc>,
}

/// Display fields of a menu item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodDetails {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
}
