use std::sync::Arc;

use crate::services::{FavoriteService, RatingService, WatchlistService};
use crate::store::DocumentStore;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ratings: RatingService,
    pub watchlist: WatchlistService,
    pub favorites: FavoriteService,
}

impl AppState {
    /// Wires the service layer over one store handle.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let ratings = RatingService::new(store.clone());
        let watchlist = WatchlistService::new(store.clone(), ratings.clone());
        let favorites = FavoriteService::new(store);
        Self {
            ratings,
            watchlist,
            favorites,
        }
    }
}
