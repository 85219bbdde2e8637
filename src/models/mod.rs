use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// A validated 1-5 star rating.
///
/// Construction checks the range, so any `Rating` in hand is valid and the
/// rest of the code never re-checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> AppResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AppError::InvalidRating(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's single review of a show. At most one exists per (user, show).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: String,
    pub show_id: String,
    pub rating: Rating,
    /// Store-assigned write time, refreshed whenever the rating changes.
    pub updated_at: DateTime<Utc>,
}

/// The difference one review mutation makes to the owning user's aggregate.
///
/// There is no variant for "nothing was added and nothing was removed": a
/// recompute with no change to fold in is a bug at the call site, and the
/// type makes it unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingChange {
    /// First rating for a show: the review count grows by one.
    Added(Rating),
    /// Re-rating an already rated show: the count is unchanged.
    Changed { from: Rating, to: Rating },
    /// A review was deleted: the count shrinks by one.
    Removed(Rating),
}

/// Per-user running totals over all of the user's current reviews.
///
/// `average_rating` is always `total_rating / rating_count` (or zero when the
/// count is zero); `apply` is the only transition and keeps the three fields
/// in lockstep. A user's aggregate record is never deleted, it only returns
/// to all zeroes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub total_rating: i64,
    pub rating_count: i64,
    pub average_rating: f64,
}

/// Result of folding one [`RatingChange`] into an aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTransition {
    pub next: RatingAggregate,
    /// Set when the raw arithmetic drove a field below zero and the result
    /// was reset instead of stored negative. That can only happen when the
    /// stored totals had already drifted from the underlying reviews.
    pub corrected: bool,
}

impl RatingAggregate {
    /// Folds a rating change into the aggregate.
    ///
    /// Pure: storage backends call this inside their atomic update and may
    /// run it any number of times while retrying a contended write.
    pub fn apply(&self, change: &RatingChange) -> AggregateTransition {
        let (total, count) = match *change {
            RatingChange::Added(rating) => (
                self.total_rating + i64::from(rating.value()),
                self.rating_count + 1,
            ),
            RatingChange::Changed { from, to } => (
                self.total_rating - i64::from(from.value()) + i64::from(to.value()),
                self.rating_count,
            ),
            RatingChange::Removed(rating) => (
                self.total_rating - i64::from(rating.value()),
                self.rating_count - 1,
            ),
        };

        // No reviews left: every field goes back to zero. A leftover total or
        // a negative count at this point is drift, not a valid state.
        if count <= 0 {
            return AggregateTransition {
                next: RatingAggregate::default(),
                corrected: count < 0 || total != 0,
            };
        }

        let corrected = total < 0;
        let total = total.max(0);

        AggregateTransition {
            next: RatingAggregate {
                total_rating: total,
                rating_count: count,
                average_rating: total as f64 / count as f64,
            },
            corrected,
        }
    }
}

// ============================================================================
// Watchlist & Favorites Types
// ============================================================================

/// Where a show sits in the user's watch flow.
///
/// `WatchNow` is the starting state and is represented by the absence of a
/// stored status record, so moving back to it deletes the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    WatchNow,
    Watching,
    Watched,
}

impl WatchState {
    pub fn as_str(self) -> &'static str {
        match self {
            WatchState::WatchNow => "watch_now",
            WatchState::Watching => "watching",
            WatchState::Watched => "watched",
        }
    }
}

impl Display for WatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WatchState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watch_now" => Ok(WatchState::WatchNow),
            "watching" => Ok(WatchState::Watching),
            "watched" => Ok(WatchState::Watched),
            other => Err(AppError::Internal(format!("unknown watch state: {other}"))),
        }
    }
}

/// Stored watchlist entry for one (user, show) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowStatus {
    pub watch_state: WatchState,
    pub poster_path: Option<String>,
}

/// A favorited show on a user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub show_id: String,
    pub poster_path: Option<String>,
}
