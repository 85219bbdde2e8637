pub mod favorites;
pub mod ratings;
pub mod watchlist;

pub use favorites::FavoriteService;
pub use ratings::RatingService;
pub use watchlist::WatchlistService;
