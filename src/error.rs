use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid rating {0}: must be between 1 and 5")]
    InvalidRating(u8),

    /// A review write committed but the follow-up aggregate update did not,
    /// so the stored totals no longer include that review.
    #[error("Aggregate for user {user_id} is stale: {source}")]
    AggregateStale {
        user_id: String,
        #[source]
        source: Box<AppError>,
    },

    /// Stored totals that could only have come from earlier drift, caught
    /// when a recompute would have driven a counter negative.
    #[error(
        "Inconsistent aggregate for user {user_id}: total={total_rating} count={rating_count}"
    )]
    InconsistentAggregate {
        user_id: String,
        total_rating: i64,
        rating_count: i64,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidRating(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Database(_)
            | AppError::AggregateStale { .. }
            | AppError::InconsistentAggregate { .. }
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
