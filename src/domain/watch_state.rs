//! Watch-state transition rules.
//!
//! Everything in here is pure: the repository layer reads the current rows
//! inside a transaction, asks these functions what the rows should become,
//! and writes the answer back. Keeping the rules free of I/O lets every
//! lifecycle edge be tested without a database.
//!
//! Invariant upheld by every function: `1 <= current_season <= total_seasons`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::entities::WatchStatus;

/// The mutable part of a watch link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkState {
    pub status: WatchStatus,
    pub current_season: i32,
    pub finished_at: Option<DateTime<Utc>>,
}

impl LinkState {
    /// A freshly attached watcher.
    #[must_use]
    pub const fn new(status: WatchStatus) -> Self {
        Self {
            status,
            current_season: 1,
            finished_at: None,
        }
    }

    /// Someone has moved past season one or finished the show.
    #[must_use]
    pub fn has_progress(&self) -> bool {
        self.current_season > 1 || self.status == WatchStatus::Finished
    }
}

/// Why a transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Show is already finished")]
    AlreadyFinished,

    /// The caller acted on a snapshot that no longer matches storage.
    #[error("{field} changed: expected {expected}, found {actual}")]
    Stale {
        field: &'static str,
        expected: i32,
        actual: i32,
    },

    #[error("Some watchers have already made progress on this show")]
    ProgressRecorded,
}

/// Compares an echoed value against what was just read from storage.
pub fn check_snapshot(
    field: &'static str,
    expected: Option<i32>,
    actual: i32,
) -> Result<(), TransitionError> {
    match expected {
        Some(expected) if expected != actual => Err(TransitionError::Stale {
            field,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

/// Checks a completion request against the links it will touch.
///
/// The echoed season is compared with the lowest season among `links`, the
/// same value the dashboard card shows for a group of watchers. For a single
/// watcher that is simply their own season.
pub fn check_season_snapshot(
    expected_season: Option<i32>,
    expected_total: Option<i32>,
    links: &[LinkState],
    total_seasons: i32,
) -> Result<(), TransitionError> {
    check_snapshot("totalSeasons", expected_total, total_seasons)?;
    match links.iter().map(|link| link.current_season).min() {
        Some(lowest) => check_snapshot("currentSeason", expected_season, lowest),
        None => Ok(()),
    }
}

/// Back to the first season and actively watching.
#[must_use]
pub const fn start_watching(_link: LinkState) -> LinkState {
    LinkState {
        status: WatchStatus::InProgress,
        current_season: 1,
        finished_at: None,
    }
}

/// Parks the show on the wishlist while keeping the season reached so far.
#[must_use]
pub const fn set_want_to_watch(link: LinkState) -> LinkState {
    LinkState {
        status: WatchStatus::WantToWatch,
        current_season: link.current_season,
        finished_at: None,
    }
}

/// Finishing a season either advances to the next one or finishes the show.
pub fn complete_season(
    link: LinkState,
    total_seasons: i32,
    now: DateTime<Utc>,
) -> Result<LinkState, TransitionError> {
    if link.status == WatchStatus::Finished {
        return Err(TransitionError::AlreadyFinished);
    }

    if link.current_season < total_seasons {
        Ok(LinkState {
            status: WatchStatus::InProgress,
            current_season: link.current_season + 1,
            finished_at: link.finished_at,
        })
    } else {
        Ok(finish(total_seasons, now))
    }
}

/// Direct status edit from the show editor.
///
/// Finishing goes through the same rule as completing the last season, so a
/// FINISHED row always carries a timestamp and sits on the final season.
#[must_use]
pub fn update_status(
    link: LinkState,
    new_status: WatchStatus,
    total_seasons: i32,
    now: DateTime<Utc>,
) -> LinkState {
    match new_status {
        WatchStatus::WantToWatch => LinkState::new(WatchStatus::WantToWatch),
        WatchStatus::InProgress => LinkState {
            status: WatchStatus::InProgress,
            current_season: link.current_season.clamp(1, total_seasons.max(1)),
            finished_at: None,
        },
        WatchStatus::Finished => finish(total_seasons, now),
    }
}

const fn finish(total_seasons: i32, now: DateTime<Utc>) -> LinkState {
    LinkState {
        status: WatchStatus::Finished,
        current_season: total_seasons,
        finished_at: Some(now),
    }
}

/// A new season was announced: everybody is pulled back into it.
///
/// Returns the new total and the state every link on the show takes.
#[must_use]
pub const fn add_season(total_seasons: i32) -> (i32, LinkState) {
    let new_total = total_seasons + 1;
    (
        new_total,
        LinkState {
            status: WatchStatus::InProgress,
            current_season: new_total,
            finished_at: None,
        },
    )
}

/// The new total after dropping the last season, or `None` when the show
/// already has a single season left.
#[must_use]
pub const fn remove_season(total_seasons: i32) -> Option<i32> {
    if total_seasons <= 1 {
        None
    } else {
        Some(total_seasons - 1)
    }
}

/// Keeps a link inside the show's season range; status is left alone.
#[must_use]
pub fn clamp_to_total(link: LinkState, total_seasons: i32) -> LinkState {
    LinkState {
        current_season: link.current_season.min(total_seasons),
        ..link
    }
}

/// A show that nobody has really started can go back to the wishlist.
///
/// Returns the replacement for each link, `None` where the link is untouched.
pub fn move_to_want_to_watch(links: &[LinkState]) -> Result<Vec<Option<LinkState>>, TransitionError> {
    if links.iter().any(LinkState::has_progress) {
        return Err(TransitionError::ProgressRecorded);
    }

    Ok(links
        .iter()
        .map(|link| {
            (link.status == WatchStatus::InProgress)
                .then(|| LinkState::new(WatchStatus::WantToWatch))
        })
        .collect())
}

/// Shows can only be deleted while nobody has made progress.
pub fn ensure_deletable(links: &[LinkState]) -> Result<(), TransitionError> {
    if links.iter().any(LinkState::has_progress) {
        Err(TransitionError::ProgressRecorded)
    } else {
        Ok(())
    }
}

/// Flips the cancelled flag relative to what the caller last saw.
#[must_use]
pub const fn toggle_cancelled(seen_cancelled: bool) -> bool {
    !seen_cancelled
}
