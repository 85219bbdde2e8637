use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Favorite, Rating, RatingAggregate, RatingChange, Review, ShowStatus},
};

use super::{AggregateUpdate, DocumentStore, NewReview};

/// Attempts for the aggregate transaction before giving up on a contended row.
const MAX_TX_ATTEMPTS: u32 = 5;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Document store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the schema migrations bundled into the binary.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// One attempt at the aggregate transaction: lock the row, apply the
    /// pure transition, write the result back.
    async fn try_update_aggregate(
        &self,
        user_id: &str,
        change: &RatingChange,
    ) -> AppResult<AggregateUpdate> {
        let mut tx = self.pool.begin().await?;

        // The row must exist before it can be locked. First writer wins, the
        // loser's insert is a no-op.
        sqlx::query("INSERT INTO user_aggregates (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, AggregateRow>(
            r#"
            SELECT total_rating, rating_count, average_rating
            FROM user_aggregates
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let previous = RatingAggregate::from(row);
        let current = previous.apply(change).next;

        sqlx::query(
            r#"
            UPDATE user_aggregates
            SET total_rating = $2, rating_count = $3, average_rating = $4
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(current.total_rating)
        .bind(current.rating_count)
        .bind(current.average_rating)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AggregateUpdate { previous, current })
    }
}

/// Serialization failures and deadlocks are safe to retry: the next attempt
/// re-reads the row and re-applies the pure transition from fresh state.
fn is_retryable(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().and_then(|e| e.code()),
        Some(code) if code == "40001" || code == "40P01"
    )
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find_review(&self, user_id: &str, show_id: &str) -> AppResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, user_id, show_id, rating, updated_at
            FROM reviews
            WHERE user_id = $1 AND show_id = $2
            "#,
        )
        .bind(user_id)
        .bind(show_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Review::try_from).transpose()
    }

    async fn insert_review(&self, review: NewReview) -> AppResult<Review> {
        // id and updated_at come from the database; the API never accepts
        // either from a client.
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO reviews (user_id, show_id, rating)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, show_id, rating, updated_at
            "#,
        )
        .bind(&review.user_id)
        .bind(&review.show_id)
        .bind(i16::from(review.rating.value()))
        .fetch_one(&self.pool)
        .await?;

        Review::try_from(row)
    }

    async fn update_review(&self, id: Uuid, rating: Rating) -> AppResult<Review> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            UPDATE reviews
            SET rating = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, user_id, show_id, rating, updated_at
            "#,
        )
        .bind(id)
        .bind(i16::from(rating.value()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {id}")))?;

        Review::try_from(row)
    }

    async fn delete_review(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_aggregate(&self, user_id: &str) -> AppResult<RatingAggregate> {
        let row = sqlx::query_as::<_, AggregateRow>(
            "SELECT total_rating, rating_count, average_rating FROM user_aggregates WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RatingAggregate::from).unwrap_or_default())
    }

    async fn update_aggregate(
        &self,
        user_id: &str,
        change: &RatingChange,
    ) -> AppResult<AggregateUpdate> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_update_aggregate(user_id, change).await {
                Ok(update) => return Ok(update),
                Err(AppError::Database(e)) if is_retryable(&e) && attempt < MAX_TX_ATTEMPTS => {
                    tracing::warn!(
                        user_id = %user_id,
                        attempt,
                        error = %e,
                        "aggregate transaction conflicted, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_status(&self, user_id: &str, show_id: &str) -> AppResult<Option<ShowStatus>> {
        let row = sqlx::query_as::<_, StatusRow>(
            "SELECT watch_state, poster_path FROM show_statuses WHERE user_id = $1 AND show_id = $2",
        )
        .bind(user_id)
        .bind(show_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ShowStatus::try_from).transpose()
    }

    async fn put_status(
        &self,
        user_id: &str,
        show_id: &str,
        status: ShowStatus,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO show_statuses (user_id, show_id, watch_state, poster_path)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, show_id)
            DO UPDATE SET watch_state = EXCLUDED.watch_state, poster_path = EXCLUDED.poster_path
            "#,
        )
        .bind(user_id)
        .bind(show_id)
        .bind(status.watch_state.as_str())
        .bind(&status.poster_path)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_status(&self, user_id: &str, show_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM show_statuses WHERE user_id = $1 AND show_id = $2")
            .bind(user_id)
            .bind(show_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_favorites(&self, user_id: &str) -> AppResult<Vec<Favorite>> {
        let rows = sqlx::query_as::<_, FavoriteRow>(
            "SELECT show_id, poster_path FROM favorites WHERE user_id = $1 ORDER BY added_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Favorite::from).collect())
    }

    async fn add_favorite(&self, user_id: &str, favorite: Favorite) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO favorites (user_id, show_id, poster_path)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, show_id)
            DO UPDATE SET poster_path = EXCLUDED.poster_path
            "#,
        )
        .bind(user_id)
        .bind(&favorite.show_id)
        .bind(&favorite.poster_path)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_favorite(&self, user_id: &str, show_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND show_id = $2")
            .bind(user_id)
            .bind(show_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: String,
    show_id: String,
    rating: i16,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = AppError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        // The CHECK constraint keeps stored ratings in range; a value outside
        // it means the table was edited behind the API's back.
        let rating = u8::try_from(row.rating)
            .ok()
            .and_then(|value| Rating::new(value).ok())
            .ok_or_else(|| {
                AppError::Internal(format!("stored rating {} is out of range", row.rating))
            })?;

        Ok(Review {
            id: row.id,
            user_id: row.user_id,
            show_id: row.show_id,
            rating,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct AggregateRow {
    total_rating: i64,
    rating_count: i64,
    average_rating: f64,
}

impl From<AggregateRow> for RatingAggregate {
    fn from(row: AggregateRow) -> Self {
        RatingAggregate {
            total_rating: row.total_rating,
            rating_count: row.rating_count,
            average_rating: row.average_rating,
        }
    }
}

#[derive(FromRow)]
struct StatusRow {
    watch_state: String,
    poster_path: Option<String>,
}

impl TryFrom<StatusRow> for ShowStatus {
    type Error = AppError;

    fn try_from(row: StatusRow) -> Result<Self, Self::Error> {
        Ok(ShowStatus {
            watch_state: row.watch_state.parse()?,
            poster_path: row.poster_path,
        })
    }
}

#[derive(FromRow)]
struct FavoriteRow {
    show_id: String,
    poster_path: Option<String>,
}

impl From<FavoriteRow> for Favorite {
    fn from(row: FavoriteRow) -> Self {
        Favorite {
            show_id: row.show_id,
            poster_path: row.poster_path,
        }
    }
}
