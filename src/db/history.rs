use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{FoodDetails, FoodId, OrderRecord, ParkingRecord, UserId},
};

/// Read-only access to the order and parking history owned by other subsystems
///
/// Lookups are expected to be short. Any error returned here aborts the local
/// fallback pipeline for the current request.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait HistorySource: Send + Sync {
    /// Most recent orders first
    async fn recent_orders(&self, user_id: &UserId, limit: usize) -> AppResult<Vec<OrderRecord>>;

    async fn all_orders(&self, user_id: &UserId) -> AppResult<Vec<OrderRecord>>;

    /// Distinct users with at least one order, excluding the given user
    async fn users_with_orders(&self, excluding: &UserId) -> AppResult<Vec<UserId>>;

    /// Most recent reservations/occupations first
    async fn recent_reservations(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> AppResult<Vec<ParkingRecord>>;

    async fn all_reservations(&self, user_id: &UserId) -> AppResult<Vec<ParkingRecord>>;

    /// `None` when the food no longer exists in the catalogue
    async fn lookup_food(&self, food_id: &str) -> AppResult<Option<FoodDetails>>;
}

/// Resolves a food, failing with `MissingReference` when it is not in the catalogue
pub async fn require_food(history: &dyn HistorySource, food_id: &str) -> AppResult<FoodDetails> {
    history
        .lookup_food(food_id)
        .await?
        .ok_or_else(|| AppError::MissingReference(format!("food {}", food_id)))
}

/// Raw history, as loaded from a seed file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryData {
    #[serde(default)]
    pub foods: HashMap<FoodId, FoodDetails>,
    #[serde(default)]
    pub orders: Vec<OrderRecord>,
    #[serde(default)]
    pub reservations: Vec<ParkingRecord>,
}

/// History store kept entirely in memory
///
/// Used by the standalone binary and by tests. Collaborators append through
/// `record_order` / `record_reservation`.
#[derive(Default)]
pub struct InMemoryHistory {
    data: RwLock<HistoryData>,
}

impl InMemoryHistory {
    pub fn new(data: HistoryData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Loads history from a JSON file shaped like [`HistoryData`]
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let data: HistoryData = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid history seed {}: {}", path.display(), e))?;

        tracing::info!(
            foods = data.foods.len(),
            orders = data.orders.len(),
            reservations = data.reservations.len(),
            "Loaded history seed"
        );

        Ok(Self::new(data))
    }

    pub async fn add_food(&self, food_id: impl Into<FoodId>, details: FoodDetails) {
        self.data.write().await.foods.insert(food_id.into(), details);
    }

    pub async fn record_order(&self, order: OrderRecord) {
        self.data.write().await.orders.push(order);
    }

    pub async fn record_reservation(&self, reservation: ParkingRecord) {
        self.data.write().await.reservations.push(reservation);
    }

    fn orders_of(data: &HistoryData, user_id: &UserId) -> Vec<OrderRecord> {
        let mut orders: Vec<OrderRecord> = data
            .orders
            .iter()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.ordered_at.cmp(&a.ordered_at));
        orders
    }

    fn reservations_of(data: &HistoryData, user_id: &UserId) -> Vec<ParkingRecord> {
        let mut reservations: Vec<ParkingRecord> = data
            .reservations
            .iter()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.at.cmp(&a.at));
        reservations
    }
}

#[async_trait::async_trait]
impl HistorySource for InMemoryHistory {
    async fn recent_orders(&self, user_id: &UserId, limit: usize) -> AppResult<Vec<OrderRecord>> {
        let data = self.data.read().await;
        let mut orders = Self::orders_of(&data, user_id);
        orders.truncate(limit);
        Ok(orders)
    }

    async fn all_orders(&self, user_id: &UserId) -> AppResult<Vec<OrderRecord>> {
        let data = self.data.read().await;
        Ok(Self::orders_of(&data, user_id))
    }

    async fn users_with_orders(&self, excluding: &UserId) -> AppResult<Vec<UserId>> {
        let data = self.data.read().await;
        let users: BTreeSet<&UserId> = data
            .orders
            .iter()
            .map(|o| &o.user_id)
            .filter(|u| *u != excluding)
            .collect();
        Ok(users.into_iter().cloned().collect())
    }

    async fn recent_reservations(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> AppResult<Vec<ParkingRecord>> {
        let data = self.data.read().await;
        let mut reservations = Self::reservations_of(&data, user_id);
        reservations.truncate(limit);
        Ok(reservations)
    }

    async fn all_reservations(&self, user_id: &UserId) -> AppResult<Vec<ParkingRecord>> {
        let data = self.data.read().await;
        Ok(Self::reservations_of(&data, user_id))
    }

    async fn lookup_food(&self, food_id: &str) -> AppResult<Option<FoodDetails>> {
        Ok(self.data.read().await.foods.get(food_id).cloned())
    }
}
