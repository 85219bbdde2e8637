use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{ShowStatus, WatchState},
    store::DocumentStore,
};

use super::RatingService;

/// Watchlist transitions for a user's shows.
///
/// Only `Watching` and `Watched` are stored. `WatchNow` is the default state
/// and is represented by the absence of a record, so moving a show back to it
/// deletes the record and clears the user's rating for the show.
#[derive(Clone)]
pub struct WatchlistService {
    store: Arc<dyn DocumentStore>,
    ratings: RatingService,
}

impl WatchlistService {
    pub fn new(store: Arc<dyn DocumentStore>, ratings: RatingService) -> Self {
        Self { store, ratings }
    }

    /// Sets the watch state for a show, or resets the show entirely when the
    /// target state is `WatchNow`.
    ///
    /// A poster path already on record wins over the one supplied, so a
    /// client that no longer has the artwork cannot blank it out.
    pub async fn set_watch_state(
        &self,
        user_id: &str,
        show_id: &str,
        state: WatchState,
        poster_path: Option<String>,
    ) -> AppResult<()> {
        if state == WatchState::WatchNow {
            return self.reset(user_id, show_id).await;
        }

        let existing = self.store.fetch_status(user_id, show_id).await?;
        let poster_path = existing.and_then(|status| status.poster_path).or(poster_path);

        self.store
            .put_status(
                user_id,
                show_id,
                ShowStatus {
                    watch_state: state,
                    poster_path,
                },
            )
            .await?;

        tracing::debug!(user_id = %user_id, show_id = %show_id, state = %state, "watch state saved");
        Ok(())
    }

    /// The stored watch state, defaulting to `WatchNow` when nothing is
    /// stored.
    pub async fn watch_state(&self, user_id: &str, show_id: &str) -> AppResult<ShowStatus> {
        Ok(self
            .store
            .fetch_status(user_id, show_id)
            .await?
            .unwrap_or(ShowStatus {
                watch_state: WatchState::WatchNow,
                poster_path: None,
            }))
    }

    /// Clears the stored status and removes any rating for the show.
    ///
    /// The rating removal runs first: it drives the aggregate recompute, and
    /// if it fails the status record stays behind so the reset can be
    /// repeated.
    async fn reset(&self, user_id: &str, show_id: &str) -> AppResult<()> {
        self.ratings.remove_review(user_id, show_id).await?;
        self.store.delete_status(user_id, show_id).await?;
        tracing::debug!(user_id = %user_id, show_id = %show_id, "show reset to watch now");
        Ok(())
    }
}
