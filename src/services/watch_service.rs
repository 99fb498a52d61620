//! Domain service for watch progress.
//!
//! Moves household members through the want-to-watch, in-progress and
//! finished states, and keeps their season counters consistent when a show
//! gains or loses a season.

use thiserror::Error;

use crate::db::{LinkChange, SeasonChange};
use crate::domain::watch_state::TransitionError;
use crate::domain::{ShowId, UserId};
use crate::entities::WatchStatus;

/// Errors specific to watch-state operations.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("{0} not found")]
    NotFound(String),

    /// An integrity guard refused the change.
    #[error("{0}")]
    Refused(String),

    /// The caller's snapshot is out of date, or the transition does not apply.
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for WatchError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for WatchError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TransitionError> for WatchError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::ProgressRecorded => Self::Refused(err.to_string()),
            TransitionError::AlreadyFinished | TransitionError::Stale { .. } => {
                Self::Conflict(err.to_string())
            }
        }
    }
}

/// Values the client saw when it asked to complete a season.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeasonSnapshot {
    pub current_season: Option<i32>,
    pub total_seasons: Option<i32>,
}

/// Domain service trait for the watch-state lifecycle.
///
/// Methods taking `Option<UserId>` act on a single watcher when given one and
/// on every watcher who has not finished the show otherwise.
#[async_trait::async_trait]
pub trait WatchService: Send + Sync {
    /// Restarts from season one as in-progress.
    async fn start_watching(
        &self,
        show_id: ShowId,
        user_id: Option<UserId>,
    ) -> Result<Vec<LinkChange>, WatchError>;

    /// Moves back to the wishlist, keeping the season reached.
    async fn set_want_to_watch(
        &self,
        show_id: ShowId,
        user_id: Option<UserId>,
    ) -> Result<Vec<LinkChange>, WatchError>;

    /// Marks the current season as watched.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Conflict`] when `snapshot` no longer matches
    /// storage or the watcher has already finished.
    async fn complete_season(
        &self,
        show_id: ShowId,
        user_id: Option<UserId>,
        snapshot: SeasonSnapshot,
    ) -> Result<Vec<LinkChange>, WatchError>;

    async fn add_season(
        &self,
        show_id: ShowId,
        expected_total: Option<i32>,
    ) -> Result<SeasonChange, WatchError>;

    /// Succeeds without changes when the show has a single season.
    async fn remove_season(
        &self,
        show_id: ShowId,
        expected_total: Option<i32>,
    ) -> Result<SeasonChange, WatchError>;

    /// Sets `cancelled` to the opposite of what the caller saw; returns the new value.
    async fn toggle_cancelled(&self, show_id: ShowId, seen_cancelled: bool)
    -> Result<bool, WatchError>;

    /// # Errors
    ///
    /// Returns [`WatchError::Refused`] if any watcher has made progress.
    async fn move_to_want_to_watch(&self, show_id: ShowId) -> Result<u64, WatchError>;

    /// Returns `false` when the watcher was already attached.
    async fn add_watcher(
        &self,
        show_id: ShowId,
        user_id: UserId,
        status: Option<WatchStatus>,
    ) -> Result<bool, WatchError>;

    /// Returns `false` when there was nothing to remove.
    async fn remove_watcher(&self, show_id: ShowId, user_id: UserId) -> Result<bool, WatchError>;

    async fn update_watcher_status(
        &self,
        show_id: ShowId,
        user_id: UserId,
        status: WatchStatus,
    ) -> Result<LinkChange, WatchError>;
}
