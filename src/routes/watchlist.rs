use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{ShowStatus, WatchState},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct WatchStateRequest {
    watch_state: WatchState,
    #[serde(default)]
    poster_path: Option<String>,
}

/// Handler for setting a show's watch state.
/// Setting `watch_now` resets the show: status and rating are both cleared.
pub async fn put_status(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, String)>,
    Json(request): Json<WatchStateRequest>,
) -> AppResult<StatusCode> {
    state
        .watchlist
        .set_watch_state(&user_id, &show_id, request.watch_state, request.poster_path)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for reading a show's watch state, `watch_now` when nothing is stored
pub async fn get_status(
    State(state): State<AppState>,
    Path((user_id, show_id)): Path<(String, String)>,
) -> AppResult<Json<ShowStatus>> {
    let status = state.watchlist.watch_state(&user_id, &show_id).await?;
    Ok(Json(status))
}
