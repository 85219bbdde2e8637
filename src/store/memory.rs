use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Favorite, Rating, RatingAggregate, RatingChange, Review, ShowStatus},
};

use super::{AggregateUpdate, DocumentStore, NewReview};

/// In-memory document store used by tests and local development.
///
/// A single lock covers all collections, so every write is serialized and
/// `update_aggregate` gets its read-modify-write atomicity without any retry
/// machinery.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

#[derive(Default)]
struct Collections {
    reviews: HashMap<Uuid, Review>,
    aggregates: HashMap<String, RatingAggregate>,
    statuses: HashMap<(String, String), ShowStatus>,
    favorites: HashMap<String, Vec<Favorite>>,
}

impl MemoryStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_review(&self, user_id: &str, show_id: &str) -> AppResult<Option<Review>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .values()
            .find(|review| review.user_id == user_id && review.show_id == show_id)
            .cloned())
    }

    async fn insert_review(&self, review: NewReview) -> AppResult<Review> {
        let mut inner = self.inner.write().await;
        let review = Review {
            id: Uuid::new_v4(),
            user_id: review.user_id,
            show_id: review.show_id,
            rating: review.rating,
            updated_at: Utc::now(),
        };
        inner.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn update_review(&self, id: Uuid, rating: Rating) -> AppResult<Review> {
        let mut inner = self.inner.write().await;
        let review = inner
            .reviews
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("review {id}")))?;
        review.rating = rating;
        review.updated_at = Utc::now();
        Ok(review.clone())
    }

    async fn delete_review(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.reviews.remove(&id);
        Ok(())
    }

    async fn fetch_aggregate(&self, user_id: &str) -> AppResult<RatingAggregate> {
        let inner = self.inner.read().await;
        Ok(inner.aggregates.get(user_id).cloned().unwrap_or_default())
    }

    async fn update_aggregate(
        &self,
        user_id: &str,
        change: &RatingChange,
    ) -> AppResult<AggregateUpdate> {
        // The write guard is held across read, apply and write, so the whole
        // transition is atomic with respect to every other store operation.
        let mut inner = self.inner.write().await;
        let previous = inner.aggregates.get(user_id).cloned().unwrap_or_default();
        let current = previous.apply(change).next;
        inner
            .aggregates
            .insert(user_id.to_string(), current.clone());
        Ok(AggregateUpdate { previous, current })
    }

    async fn fetch_status(&self, user_id: &str, show_id: &str) -> AppResult<Option<ShowStatus>> {
        let inner = self.inner.read().await;
        Ok(inner
            .statuses
            .get(&(user_id.to_string(), show_id.to_string()))
            .cloned())
    }

    async fn put_status(
        &self,
        user_id: &str,
        show_id: &str,
        status: ShowStatus,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .statuses
            .insert((user_id.to_string(), show_id.to_string()), status);
        Ok(())
    }

    async fn delete_status(&self, user_id: &str, show_id: &str) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .statuses
            .remove(&(user_id.to_string(), show_id.to_string()));
        Ok(())
    }

    async fn list_favorites(&self, user_id: &str) -> AppResult<Vec<Favorite>> {
        let inner = self.inner.read().await;
        Ok(inner.favorites.get(user_id).cloned().unwrap_or_default())
    }

    async fn add_favorite(&self, user_id: &str, favorite: Favorite) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let favorites = inner.favorites.entry(user_id.to_string()).or_default();
        match favorites.iter_mut().find(|f| f.show_id == favorite.show_id) {
            Some(existing) => existing.poster_path = favorite.poster_path,
            None => favorites.push(favorite),
        }
        Ok(())
    }

    async fn remove_favorite(&self, user_id: &str, show_id: &str) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(favorites) = inner.favorites.get_mut(user_id) {
            favorites.retain(|f| f.show_id != show_id);
        }
        Ok(())
    }
}
