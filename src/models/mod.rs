use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod history;

pub use history::{FoodDetails, OrderItem, OrderRecord, ParkingRecord, ParkingStatus};

/// Menu item identifier
pub type FoodId = String;

/// Parking slot identifier (e.g. "A-02")
pub type SlotId = String;

/// Identifier of a campus user, supplied explicitly by the caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What kind of item a preference list holds; drives reason wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Food,
    Parking,
}

impl ItemKind {
    /// Noun used in trend reasons ("orders" / "reservations")
    pub fn activity(&self) -> &'static str {
        match self {
            ItemKind::Food => "orders",
            ItemKind::Parking => "reservations",
        }
    }
}

// ============================================================================
// Recommendation Output Types
// ============================================================================

/// One recommended item with its score and the reason shown to the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreferenceScore {
    /// Food id or parking slot id
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub raw_count: u32,
    pub weighted_score: f64,
    pub reason: String,
}

impl PreferenceScore {
    pub fn food(
        id: FoodId,
        details: &FoodDetails,
        raw_count: u32,
        weighted_score: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: Some(details.name.clone()),
            price: Some(details.price),
            image: details.image.clone(),
            raw_count,
            weighted_score,
            reason: reason.into(),
        }
    }

    pub fn slot(id: SlotId, raw_count: u32, weighted_score: f64, reason: impl Into<String>) -> Self {
        Self {
            id,
            name: None,
            price: None,
            image: None,
            raw_count,
            weighted_score,
            reason: reason.into(),
        }
    }
}

/// Which pipeline produced a snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    /// External predictor
    Ml,
    /// Local frequency/collaborative/trend pipeline
    FallbackBasic,
}

/// Per-user recommendations at a point in time. Replaced, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationSnapshot {
    pub user_id: UserId,
    pub foods: Vec<PreferenceScore>,
    pub parking: Vec<PreferenceScore>,
    pub generated_at: DateTime<Utc>,
    pub source: RecommendationSource,
    #[serde(default)]
    pub has_recent_activity: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecommendationSnapshot {
    /// Snapshot with no recommendations, returned when generation failed
    pub fn empty(user_id: UserId, generated_at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            user_id,
            foods: Vec::new(),
            parking: Vec::new(),
            generated_at,
            source: RecommendationSource::FallbackBasic,
            has_recent_activity: false,
            service_status: None,
            error: Some(error.into()),
        }
    }
}

/// Snapshot as returned to callers, with cache metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    #[serde(flatten)]
    pub snapshot: RecommendationSnapshot,
    pub cached: bool,
    /// Milliseconds since the snapshot was generated, set on cache hits only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_age_ms: Option<i64>,
}

impl RecommendationResponse {
    pub fn fresh(snapshot: RecommendationSnapshot) -> Self {
        Self {
            snapshot,
            cached: false,
            cache_age_ms: None,
        }
    }

    pub fn from_cache(snapshot: RecommendationSnapshot, now: DateTime<Utc>) -> Self {
        let age = (now - snapshot.generated_at).num_milliseconds().max(0);
        Self {
            snapshot,
            cached: true,
            cache_age_ms: Some(age),
        }
    }
}
