use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{error::AppResult, models::Favorite, state::AppState};

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    #[serde(default)]
    poster_path: Option<String>,
}

/// Handler for adding a show to the user's favorites
pub async fn put_favorite(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, String)>,
    Json(request): Json<FavoriteRequest>,
) -> AppResult<StatusCode> {
    state
        .favorites
        .add_favorite(&user_id, &show_id, request.poster_path)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for removing a show from the user's favorites
pub async fn delete_favorite(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state.favorites.remove_favorite(&user_id, &show_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for listing the user's favorites
pub async fn list_favorites(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Favorite>>> {
    let favorites = state.favorites.favorites(&user_id).await?;
    Ok(Json(favorites))
}
