use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Rating, RatingAggregate, RatingChange},
    store::{DocumentStore, NewReview},
};

/// Service owning every write to reviews and to the per-user rating
/// aggregate. No other code touches the aggregate fields.
///
/// The write order is fixed: the review mutation commits first, then the
/// matching change is folded into the aggregate. Recomputing first could fold
/// in a rating the store never accepted.
#[derive(Clone)]
pub struct RatingService {
    store: Arc<dyn DocumentStore>,
}

impl RatingService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates or updates the user's review for a show, then recomputes the
    /// user's aggregate.
    pub async fn record_or_update_review(
        &self,
        user_id: &str,
        show_id: &str,
        rating: Rating,
    ) -> AppResult<()> {
        let change = match self.store.find_review(user_id, show_id).await? {
            Some(existing) => {
                self.store.update_review(existing.id, rating).await?;
                tracing::debug!(user_id = %user_id, show_id = %show_id, rating = %rating, "review updated");
                RatingChange::Changed {
                    from: existing.rating,
                    to: rating,
                }
            }
            None => {
                self.store
                    .insert_review(NewReview {
                        user_id: user_id.to_string(),
                        show_id: show_id.to_string(),
                        rating,
                    })
                    .await?;
                tracing::debug!(user_id = %user_id, show_id = %show_id, rating = %rating, "review added");
                RatingChange::Added(rating)
            }
        };

        self.recompute_aggregate(user_id, change).await
    }

    /// Removes the user's review for a show and decrements the aggregate.
    /// Removing a show the user never rated is a no-op.
    pub async fn remove_review(&self, user_id: &str, show_id: &str) -> AppResult<()> {
        let Some(existing) = self.store.find_review(user_id, show_id).await? else {
            tracing::debug!(user_id = %user_id, show_id = %show_id, "no review to remove");
            return Ok(());
        };

        self.store.delete_review(existing.id).await?;
        tracing::debug!(user_id = %user_id, show_id = %show_id, "review removed");

        self.recompute_aggregate(user_id, RatingChange::Removed(existing.rating))
            .await
    }

    /// Folds one rating change into the user's aggregate record.
    ///
    /// Must run strictly after the review write the change describes. A
    /// failure here leaves a committed review unaccounted for in the totals;
    /// that window is reported as [`AppError::AggregateStale`] rather than
    /// retried blindly, because re-running a half-applied change would count
    /// the review twice.
    pub async fn recompute_aggregate(
        &self,
        user_id: &str,
        change: RatingChange,
    ) -> AppResult<()> {
        let update = match self.store.update_aggregate(user_id, &change).await {
            Ok(update) => update,
            Err(source) => {
                tracing::error!(
                    user_id = %user_id,
                    change = ?change,
                    error = %source,
                    "review write committed but aggregate update failed; stored totals are stale"
                );
                return Err(AppError::AggregateStale {
                    user_id: user_id.to_string(),
                    source: Box::new(source),
                });
            }
        };

        // The transition is pure, so re-applying it to the state the
        // transaction read tells us whether the commit had to clamp.
        if update.previous.apply(&change).corrected {
            let drift = AppError::InconsistentAggregate {
                user_id: user_id.to_string(),
                total_rating: update.previous.total_rating,
                rating_count: update.previous.rating_count,
            };
            tracing::error!(error = %drift, change = ?change, "aggregate drift corrected to zero");
        }

        tracing::debug!(
            user_id = %user_id,
            total_rating = update.current.total_rating,
            rating_count = update.current.rating_count,
            average_rating = update.current.average_rating,
            "aggregate recomputed"
        );

        Ok(())
    }

    /// The user's current rating for a show, if they rated it.
    pub async fn user_rating(&self, user_id: &str, show_id: &str) -> AppResult<Option<Rating>> {
        Ok(self
            .store
            .find_review(user_id, show_id)
            .await?
            .map(|review| review.rating))
    }

    /// The user's aggregate. Users who never rated get the zero aggregate.
    pub async fn user_aggregate(&self, user_id: &str) -> AppResult<RatingAggregate> {
        self.store.fetch_aggregate(user_id).await
    }
}
