//! `SeaORM` implementation of the `WatchService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::constants::metrics::WATCH_TRANSITIONS;
use crate::db::{LinkChange, Outcome, SeasonChange, Store};
use crate::domain::watch_state::{self, LinkState, TransitionError};
use crate::domain::{ShowId, UserId};
use crate::entities::{WatchStatus, shows};
use crate::services::watch_service::{SeasonSnapshot, WatchError, WatchService};

pub struct SeaOrmWatchService {
    store: Store,
}

impl SeaOrmWatchService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn apply<F>(
        &self,
        action: &'static str,
        show_id: ShowId,
        user_id: Option<UserId>,
        rule: F,
    ) -> Result<Vec<LinkChange>, WatchError>
    where
        F: Fn(LinkState, &shows::Model) -> Result<LinkState, TransitionError> + Send + Sync,
    {
        self.apply_guarded(action, show_id, user_id, |_, _| Ok(()), rule)
            .await
    }

    async fn apply_guarded<G, F>(
        &self,
        action: &'static str,
        show_id: ShowId,
        user_id: Option<UserId>,
        guard: G,
        rule: F,
    ) -> Result<Vec<LinkChange>, WatchError>
    where
        G: FnOnce(&[LinkState], &shows::Model) -> Result<(), TransitionError> + Send,
        F: Fn(LinkState, &shows::Model) -> Result<LinkState, TransitionError> + Send + Sync,
    {
        let changes = settle(
            self.store
                .transition_links(show_id, user_id, guard, rule)
                .await?,
        )?;
        record_transitions(action, changes.len());
        Ok(changes)
    }
}

/// Turns a repository outcome into the service result.
fn settle<T>(outcome: Outcome<T>) -> Result<T, WatchError> {
    match outcome {
        Outcome::Applied(value) => Ok(value),
        Outcome::Missing(what) => Err(WatchError::NotFound(what.to_string())),
        Outcome::Stale => Err(WatchError::Conflict(
            "The show was changed by someone else, reload and try again".to_string(),
        )),
        Outcome::Rejected(err) => Err(err.into()),
        Outcome::Duplicate | Outcome::InUse(_) => Err(WatchError::Internal(
            "Unexpected outcome for a watch-state change".to_string(),
        )),
    }
}

fn record_transitions(action: &'static str, count: usize) {
    if count > 0 {
        metrics::counter!(WATCH_TRANSITIONS, "action" => action).increment(count as u64);
    }
}

#[async_trait]
impl WatchService for SeaOrmWatchService {
    async fn start_watching(
        &self,
        show_id: ShowId,
        user_id: Option<UserId>,
    ) -> Result<Vec<LinkChange>, WatchError> {
        self.apply("start_watching", show_id, user_id, |link, _| {
            Ok(watch_state::start_watching(link))
        })
        .await
    }

    async fn set_want_to_watch(
        &self,
        show_id: ShowId,
        user_id: Option<UserId>,
    ) -> Result<Vec<LinkChange>, WatchError> {
        self.apply("set_want_to_watch", show_id, user_id, |link, _| {
            Ok(watch_state::set_want_to_watch(link))
        })
        .await
    }

    async fn complete_season(
        &self,
        show_id: ShowId,
        user_id: Option<UserId>,
        snapshot: SeasonSnapshot,
    ) -> Result<Vec<LinkChange>, WatchError> {
        let now = Utc::now();
        let changes = self
            .apply_guarded(
                "complete_season",
                show_id,
                user_id,
                move |links, show| {
                    watch_state::check_season_snapshot(
                        snapshot.current_season,
                        snapshot.total_seasons,
                        links,
                        show.total_seasons,
                    )
                },
                move |link, show| watch_state::complete_season(link, show.total_seasons, now),
            )
            .await?;

        for change in &changes {
            if change.after.status == WatchStatus::Finished {
                info!("User {} finished show {}", change.user_id, show_id);
            }
        }
        Ok(changes)
    }

    async fn add_season(
        &self,
        show_id: ShowId,
        expected_total: Option<i32>,
    ) -> Result<SeasonChange, WatchError> {
        let change = settle(self.store.add_season(show_id, expected_total).await?)?;
        record_transitions("add_season", usize::from(change.changed));
        Ok(change)
    }

    async fn remove_season(
        &self,
        show_id: ShowId,
        expected_total: Option<i32>,
    ) -> Result<SeasonChange, WatchError> {
        let change = settle(self.store.remove_season(show_id, expected_total).await?)?;
        record_transitions("remove_season", usize::from(change.changed));
        Ok(change)
    }

    async fn toggle_cancelled(
        &self,
        show_id: ShowId,
        seen_cancelled: bool,
    ) -> Result<bool, WatchError> {
        let cancelled = self
            .store
            .set_show_cancelled(show_id, seen_cancelled)
            .await?
            .ok_or_else(|| WatchError::NotFound("Show".to_string()))?;

        info!("Show {} cancelled flag set to {}", show_id, cancelled);
        Ok(cancelled)
    }

    async fn move_to_want_to_watch(&self, show_id: ShowId) -> Result<u64, WatchError> {
        let moved = settle(self.store.move_show_to_want_to_watch(show_id).await?)?;
        record_transitions(
            "move_to_want_to_watch",
            usize::try_from(moved).unwrap_or(usize::MAX),
        );
        Ok(moved)
    }

    async fn add_watcher(
        &self,
        show_id: ShowId,
        user_id: UserId,
        status: Option<WatchStatus>,
    ) -> Result<bool, WatchError> {
        let status = status.unwrap_or(WatchStatus::WantToWatch);
        settle(self.store.add_watcher(show_id, user_id, status).await?)
    }

    async fn remove_watcher(&self, show_id: ShowId, user_id: UserId) -> Result<bool, WatchError> {
        let removed = self.store.remove_watcher(show_id, user_id).await?;
        Ok(removed > 0)
    }

    async fn update_watcher_status(
        &self,
        show_id: ShowId,
        user_id: UserId,
        status: WatchStatus,
    ) -> Result<LinkChange, WatchError> {
        let now = Utc::now();
        let changes = self
            .apply("update_status", show_id, Some(user_id), move |link, show| {
                Ok(watch_state::update_status(
                    link,
                    status,
                    show.total_seasons,
                    now,
                ))
            })
            .await?;

        changes
            .into_iter()
            .next()
            .ok_or_else(|| WatchError::NotFound("Watch link".to_string()))
    }
}
