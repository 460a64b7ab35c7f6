use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{RecommendationResponse, UserId},
    routes::AppState,
};

fn parse_user_id(raw: String) -> AppResult<UserId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("User id cannot be empty".to_string()));
    }
    Ok(UserId::from(trimmed))
}

/// Handler for fetching a user's recommendations
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
) -> AppResult<Json<RecommendationResponse>> {
    let user_id = parse_user_id(user_id)?;

    let response = state.recommendations.get_recommendations(&user_id).await;

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        cached = response.cached,
        foods = response.snapshot.foods.len(),
        parking = response.snapshot.parking.len(),
        "Recommendations served"
    );

    Ok(Json(response))
}

/// Handler called by the order and parking subsystems after history changes
pub async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
) -> AppResult<StatusCode> {
    let user_id = parse_user_id(user_id)?;

    state.recommendations.invalidate_cache(&user_id).await;

    tracing::info!(request_id = %request_id, user_id = %user_id, "Recommendation cache invalidated");

    Ok(StatusCode::NO_CONTENT)
}
