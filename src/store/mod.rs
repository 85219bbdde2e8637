//! Document store abstraction
//!
//! The services are written against this trait instead of a concrete
//! database handle, so the same rating logic runs over PostgreSQL in
//! production and over an in-memory map in tests. The trait mirrors the
//! capabilities the services actually need: point reads and writes keyed by
//! opaque user/show ids, plus one atomic read-modify-write primitive for the
//! per-user aggregate record.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Favorite, Rating, RatingAggregate, RatingChange, Review, ShowStatus},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Fields for a review the store has not yet assigned an identity to.
///
/// The store owns the id and the write timestamp so that clients cannot
/// supply either.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub user_id: String,
    pub show_id: String,
    pub rating: Rating,
}

/// One committed aggregate transaction: the record state the transaction
/// read and the state it wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateUpdate {
    pub previous: RatingAggregate,
    pub current: RatingAggregate,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Finds the unique review for (user, show), if any.
    async fn find_review(&self, user_id: &str, show_id: &str) -> AppResult<Option<Review>>;

    /// Inserts a new review, assigning its id and write timestamp.
    ///
    /// Uniqueness per (user, show) is the caller's lookup-then-write
    /// responsibility; the PostgreSQL backend additionally enforces it with a
    /// unique index.
    async fn insert_review(&self, review: NewReview) -> AppResult<Review>;

    /// Replaces the rating on an existing review and refreshes its timestamp.
    async fn update_review(&self, id: Uuid, rating: Rating) -> AppResult<Review>;

    /// Deletes a review by id. Deleting an already absent id is not an error.
    async fn delete_review(&self, id: Uuid) -> AppResult<()>;

    /// Reads the user's aggregate, zeroed for users who have never rated.
    async fn fetch_aggregate(&self, user_id: &str) -> AppResult<RatingAggregate>;

    /// Atomically folds `change` into the user's aggregate record.
    ///
    /// The store reads the current record, applies
    /// [`RatingAggregate::apply`], and commits the result as one unit. A
    /// backend that loses a race on the record retries from the fresh state,
    /// which is safe because the transition is pure. Returns both sides of
    /// the committed transition.
    async fn update_aggregate(
        &self,
        user_id: &str,
        change: &RatingChange,
    ) -> AppResult<AggregateUpdate>;

    /// Fetches the stored watch status for (user, show), if any.
    async fn fetch_status(&self, user_id: &str, show_id: &str) -> AppResult<Option<ShowStatus>>;

    /// Creates or replaces the watch status for (user, show).
    async fn put_status(&self, user_id: &str, show_id: &str, status: ShowStatus) -> AppResult<()>;

    /// Deletes the watch status for (user, show). Absent is not an error.
    async fn delete_status(&self, user_id: &str, show_id: &str) -> AppResult<()>;

    /// All favorites for a user, oldest first.
    async fn list_favorites(&self, user_id: &str) -> AppResult<Vec<Favorite>>;

    /// Adds a favorite with set semantics: re-adding a show keeps one entry
    /// and the newest poster path wins.
    async fn add_favorite(&self, user_id: &str, favorite: Favorite) -> AppResult<()>;

    /// Removes a favorite. Absent is not an error.
    async fn remove_favorite(&self, user_id: &str, show_id: &str) -> AppResult<()>;
}
