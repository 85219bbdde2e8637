use axum::{
    http::StatusCode,
    middleware,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};
use crate::state::AppState;

pub mod favorites;
pub mod ratings;
pub mod watchlist;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/users/:user_id/shows/:show_id/rating",
            get(ratings::get_rating)
                .put(ratings::put_rating)
                .delete(ratings::delete_rating),
        )
        .route("/users/:user_id/aggregate", get(ratings::get_aggregate))
        .route(
            "/users/:user_id/shows/:show_id/status",
            get(watchlist::get_status).put(watchlist::put_status),
        )
        .route("/users/:user_id/favorites", get(favorites::list_favorites))
        .route(
            "/users/:user_id/favorites/:show_id",
            put(favorites::put_favorite).delete(favorites::delete_favorite),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
