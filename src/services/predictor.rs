//! External prediction service client
//!
//! One attempt, bounded by a timeout. Every failure mode collapses into
//! `AppError::PredictorUnavailable` and the orchestrator falls back to the
//! local pipeline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{PreferenceScore, RecommendationSnapshot, RecommendationSource, UserId},
    services::blender::{rank, RESULT_LIMIT},
};

/// Default single-attempt timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of ML-generated recommendation snapshots
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationPredictor: Send + Sync {
    /// Single attempt; never retried
    async fn fetch(&self, user_id: &UserId) -> AppResult<RecommendationSnapshot>;
}

#[derive(Debug, Deserialize)]
struct ApiPrediction {
    foods: Vec<ApiFood>,
    #[serde(default)]
    parking: Vec<ApiSlot>,
}

#[derive(Debug, Deserialize)]
struct ApiFood {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    weighted_score: Option<f64>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    total_orders: Option<u32>,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSlot {
    slot: String,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    reason: Option<String>,
}

impl From<ApiFood> for PreferenceScore {
    fn from(food: ApiFood) -> Self {
        let raw_count = food.total_orders.or(food.count).unwrap_or(0);
        Self {
            id: food.id,
            name: food.name,
            price: food.price,
            image: food.image,
            raw_count,
            weighted_score: food
                .weighted_score
                .or(food.score)
                .unwrap_or(raw_count as f64),
            reason: food.reason.unwrap_or_default(),
        }
    }
}

impl From<ApiSlot> for PreferenceScore {
    fn from(slot: ApiSlot) -> Self {
        let raw_count = slot.count.unwrap_or(0);
        PreferenceScore::slot(
            slot.slot,
            raw_count,
            slot.score.unwrap_or(raw_count as f64),
            slot.reason.unwrap_or_default(),
        )
    }
}

/// Predictor reached over HTTP at `GET {base_url}/recommendations/{user_id}`
#[derive(Clone)]
pub struct HttpPredictor {
    http_client: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl HttpPredictor {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn classify(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::PredictorUnavailable(format!("timed out after {:?}", self.timeout))
        } else if e.is_decode() {
            AppError::PredictorUnavailable(format!("malformed body: {}", e))
        } else {
            AppError::PredictorUnavailable(e.to_string())
        }
    }

    fn convert_api_response(
        user_id: &UserId,
        prediction: ApiPrediction,
        received_at: DateTime<Utc>,
    ) -> RecommendationSnapshot {
        let mut foods: Vec<PreferenceScore> =
            prediction.foods.into_iter().map(PreferenceScore::from).collect();
        let mut parking: Vec<PreferenceScore> =
            prediction.parking.into_iter().map(PreferenceScore::from).collect();

        rank(&mut foods, RESULT_LIMIT);
        rank(&mut parking, RESULT_LIMIT);

        RecommendationSnapshot {
            user_id: user_id.clone(),
            foods,
            parking,
            generated_at: received_at,
            source: RecommendationSource::Ml,
            has_recent_activity: false,
            service_status: None,
            error: None,
        }
    }
}

#[async_trait::async_trait]
impl RecommendationPredictor for HttpPredictor {
    async fn fetch(&self, user_id: &UserId) -> AppResult<RecommendationSnapshot> {
        let url = format!("{}/recommendations/{}", self.base_url, user_id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::PredictorUnavailable(format!(
                "predictor returned status {}",
                status
            )));
        }

        let prediction: ApiPrediction = response.json().await.map_err(|e| self.classify(e))?;
        let snapshot = Self::convert_api_response(user_id, prediction, Utc::now());

        tracing::info!(
            user_id = %user_id,
            foods = snapshot.foods.len(),
            parking = snapshot.parking.len(),
            "Predictor recommendations fetched"
        );

        Ok(snapshot)
    }
}
