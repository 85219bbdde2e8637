use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{Rating, RatingAggregate},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    rating: u8,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    rating: Option<u8>,
}

/// Handler for recording or updating the user's rating of a show
pub async fn put_rating(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, String)>,
    Json(request): Json<RateRequest>,
) -> AppResult<StatusCode> {
    // Validated here, before anything is written.
    let rating = Rating::new(request.rating)?;
    state
        .ratings
        .record_or_update_review(&user_id, &show_id, rating)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for reading the user's rating of a show, null when unrated
pub async fn get_rating(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, String)>,
) -> AppResult<Json<RatingResponse>> {
    let rating = state.ratings.user_rating(&user_id, &show_id).await?;
    Ok(Json(RatingResponse {
        rating: rating.map(Rating::value),
    }))
}

/// Handler for removing the user's rating of a show
pub async fn delete_rating(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state.ratings.remove_review(&user_id, &show_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for reading the user's rating aggregate
pub async fn get_aggregate(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<RatingAggregate>> {
    let aggregate = state.ratings.user_aggregate(&user_id).await?;
    Ok(Json(aggregate))
}
