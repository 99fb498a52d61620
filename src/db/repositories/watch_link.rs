use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, TransactionTrait,
};
use tracing::{debug, info};

use super::show::link_state;
use crate::db::Outcome;
use crate::domain::watch_state::{self, LinkState, TransitionError};
use crate::domain::{ShowId, UserId};
use crate::entities::{WatchStatus, prelude::*, shows, shows_to_users};

/// One link rewritten by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkChange {
    pub user_id: UserId,
    pub before: LinkState,
    pub after: LinkState,
}

/// Result of adding or removing a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeasonChange {
    pub total_seasons: i32,
    pub changed: bool,
    pub links_updated: u64,
}

pub struct WatchLinkRepository {
    conn: DatabaseConnection,
}

impl WatchLinkRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Applies `rule` to one watcher's link, or to every active link on the
    /// show when `user_id` is `None`. Finished watchers are only reached by
    /// naming them.
    ///
    /// `guard` sees all selected links before anything is written. The show
    /// and links are read inside the transaction and each write is
    /// conditional on the status and season that were read, so a concurrent
    /// edit turns into [`Outcome::Stale`] instead of a lost update.
    pub async fn transition<G, F>(
        &self,
        show_id: ShowId,
        user_id: Option<UserId>,
        guard: G,
        rule: F,
    ) -> Result<Outcome<Vec<LinkChange>>>
    where
        G: FnOnce(&[LinkState], &shows::Model) -> Result<(), TransitionError> + Send,
        F: Fn(LinkState, &shows::Model) -> Result<LinkState, TransitionError> + Send + Sync,
    {
        let txn = self.conn.begin().await?;

        let Some(show) = Shows::find_by_id(show_id.value()).one(&txn).await? else {
            return Ok(Outcome::Missing("Show"));
        };

        let mut query =
            ShowsToUsers::find().filter(shows_to_users::Column::ShowId.eq(show_id.value()));
        if let Some(user_id) = user_id {
            query = query.filter(shows_to_users::Column::UserId.eq(user_id.value()));
        }
        let mut links = query
            .all(&txn)
            .await
            .context("Failed to read watch links")?;

        if links.is_empty() {
            return Ok(Outcome::Missing("Watch link"));
        }

        if user_id.is_none() {
            links.retain(|link| link.status.is_active());
            if links.is_empty() {
                return Ok(Outcome::Rejected(TransitionError::AlreadyFinished));
            }
        }

        let states: Vec<LinkState> = links.iter().map(link_state).collect();
        if let Err(err) = guard(&states, &show) {
            return Ok(Outcome::Rejected(err));
        }

        let mut changes = Vec::with_capacity(links.len());
        for (link, &before) in links.iter().zip(&states) {
            let after = match rule(before, &show) {
                Ok(after) => after,
                Err(err) => return Ok(Outcome::Rejected(err)),
            };

            let written = Self::write_if_unchanged(&txn, link, before, after).await?;
            if !written {
                return Ok(Outcome::Stale);
            }

            changes.push(LinkChange {
                user_id: UserId::new(link.user_id),
                before,
                after,
            });
        }

        txn.commit().await?;

        debug!(
            "Applied transition to {} link(s) on show {}",
            changes.len(),
            show_id
        );
        Ok(Outcome::Applied(changes))
    }

    async fn write_if_unchanged(
        txn: &DatabaseTransaction,
        link: &shows_to_users::Model,
        before: LinkState,
        after: LinkState,
    ) -> Result<bool> {
        let update = shows_to_users::ActiveModel {
            status: Set(after.status),
            current_season: Set(after.current_season),
            finished_at: Set(after.finished_at),
            ..Default::default()
        };

        let result = ShowsToUsers::update_many()
            .set(update)
            .filter(shows_to_users::Column::ShowId.eq(link.show_id))
            .filter(shows_to_users::Column::UserId.eq(link.user_id))
            .filter(shows_to_users::Column::Status.eq(before.status))
            .filter(shows_to_users::Column::CurrentSeason.eq(before.current_season))
            .exec(txn)
            .await
            .context("Failed to update watch link")?;

        Ok(result.rows_affected > 0)
    }

    /// Bumps the season count and pulls every watcher into the new season.
    pub async fn add_season(
        &self,
        show_id: ShowId,
        expected_total: Option<i32>,
    ) -> Result<Outcome<SeasonChange>> {
        let txn = self.conn.begin().await?;

        let Some(show) = Shows::find_by_id(show_id.value()).one(&txn).await? else {
            return Ok(Outcome::Missing("Show"));
        };

        if let Err(err) =
            watch_state::check_snapshot("totalSeasons", expected_total, show.total_seasons)
        {
            return Ok(Outcome::Rejected(err));
        }

        let (new_total, state) = watch_state::add_season(show.total_seasons);
        if !Self::set_total(&txn, &show, new_total).await? {
            return Ok(Outcome::Stale);
        }

        let update = shows_to_users::ActiveModel {
            status: Set(state.status),
            current_season: Set(state.current_season),
            finished_at: Set(state.finished_at),
            ..Default::default()
        };
        let links = ShowsToUsers::update_many()
            .set(update)
            .filter(shows_to_users::Column::ShowId.eq(show_id.value()))
            .exec(&txn)
            .await
            .context("Failed to move watchers to the new season")?;

        txn.commit().await?;

        info!(
            "Show {} now has {} seasons ({} watchers moved)",
            show_id, new_total, links.rows_affected
        );
        Ok(Outcome::Applied(SeasonChange {
            total_seasons: new_total,
            changed: true,
            links_updated: links.rows_affected,
        }))
    }

    /// Drops the last season, clamping anyone who was past it. A show with a
    /// single season is left untouched.
    pub async fn remove_season(
        &self,
        show_id: ShowId,
        expected_total: Option<i32>,
    ) -> Result<Outcome<SeasonChange>> {
        let txn = self.conn.begin().await?;

        let Some(show) = Shows::find_by_id(show_id.value()).one(&txn).await? else {
            return Ok(Outcome::Missing("Show"));
        };

        if let Err(err) =
            watch_state::check_snapshot("totalSeasons", expected_total, show.total_seasons)
        {
            return Ok(Outcome::Rejected(err));
        }

        let Some(new_total) = watch_state::remove_season(show.total_seasons) else {
            debug!("Show {} has a single season, nothing to remove", show_id);
            return Ok(Outcome::Applied(SeasonChange {
                total_seasons: show.total_seasons,
                changed: false,
                links_updated: 0,
            }));
        };

        if !Self::set_total(&txn, &show, new_total).await? {
            return Ok(Outcome::Stale);
        }

        let update = shows_to_users::ActiveModel {
            current_season: Set(new_total),
            ..Default::default()
        };
        let links = ShowsToUsers::update_many()
            .set(update)
            .filter(shows_to_users::Column::ShowId.eq(show_id.value()))
            .filter(shows_to_users::Column::CurrentSeason.gt(new_total))
            .exec(&txn)
            .await
            .context("Failed to clamp watchers to the remaining seasons")?;

        txn.commit().await?;

        info!(
            "Show {} now has {} seasons ({} watchers clamped)",
            show_id, new_total, links.rows_affected
        );
        Ok(Outcome::Applied(SeasonChange {
            total_seasons: new_total,
            changed: true,
            links_updated: links.rows_affected,
        }))
    }

    async fn set_total(txn: &DatabaseTransaction, show: &shows::Model, total: i32) -> Result<bool> {
        let update = shows::ActiveModel {
            total_seasons: Set(total),
            ..Default::default()
        };

        let result = Shows::update_many()
            .set(update)
            .filter(shows::Column::Id.eq(show.id))
            .filter(shows::Column::TotalSeasons.eq(show.total_seasons))
            .exec(txn)
            .await
            .context("Failed to update season count")?;

        Ok(result.rows_affected > 0)
    }

    /// Sends an untouched show back to everybody's wishlist.
    pub async fn move_to_want_to_watch(&self, show_id: ShowId) -> Result<Outcome<u64>> {
        let txn = self.conn.begin().await?;

        if Shows::find_by_id(show_id.value()).one(&txn).await?.is_none() {
            return Ok(Outcome::Missing("Show"));
        }

        let links = ShowsToUsers::find()
            .filter(shows_to_users::Column::ShowId.eq(show_id.value()))
            .all(&txn)
            .await
            .context("Failed to read watch links")?;

        let states: Vec<LinkState> = links.iter().map(link_state).collect();
        let replacements = match watch_state::move_to_want_to_watch(&states) {
            Ok(replacements) => replacements,
            Err(err) => return Ok(Outcome::Rejected(err)),
        };

        let mut moved = 0;
        for ((link, before), after) in links.iter().zip(states).zip(replacements) {
            let Some(after) = after else { continue };
            if !Self::write_if_unchanged(&txn, link, before, after).await? {
                return Ok(Outcome::Stale);
            }
            moved += 1;
        }

        txn.commit().await?;

        info!("Moved {} watchers of show {} to want-to-watch", moved, show_id);
        Ok(Outcome::Applied(moved))
    }

    /// Attaches a watcher. Returns `false` when the pair already existed.
    pub async fn add(
        &self,
        show_id: ShowId,
        user_id: UserId,
        status: WatchStatus,
    ) -> Result<Outcome<bool>> {
        let txn = self.conn.begin().await?;

        let Some(show) = Shows::find_by_id(show_id.value()).one(&txn).await? else {
            return Ok(Outcome::Missing("Show"));
        };
        if Users::find_by_id(user_id.value()).one(&txn).await?.is_none() {
            return Ok(Outcome::Missing("User"));
        }

        let existing = ShowsToUsers::find_by_id((show_id.value(), user_id.value()))
            .one(&txn)
            .await
            .context("Failed to look up watch link")?;
        if existing.is_some() {
            return Ok(Outcome::Applied(false));
        }

        let state = watch_state::update_status(
            LinkState::new(WatchStatus::WantToWatch),
            status,
            show.total_seasons,
            Utc::now(),
        );
        let model = shows_to_users::ActiveModel {
            show_id: Set(show_id.value()),
            user_id: Set(user_id.value()),
            status: Set(state.status),
            current_season: Set(state.current_season),
            finished_at: Set(state.finished_at),
        };
        ShowsToUsers::insert(model)
            .exec_without_returning(&txn)
            .await
            .context("Failed to insert watch link")?;

        txn.commit().await?;

        info!("User {} now watching show {} ({})", user_id, show_id, state.status);
        Ok(Outcome::Applied(true))
    }

    /// Detaches a watcher regardless of progress.
    pub async fn remove(&self, show_id: ShowId, user_id: UserId) -> Result<u64> {
        let result = ShowsToUsers::delete_many()
            .filter(shows_to_users::Column::ShowId.eq(show_id.value()))
            .filter(shows_to_users::Column::UserId.eq(user_id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to remove watch link")?;

        if result.rows_affected > 0 {
            info!("User {} no longer watching show {}", user_id, show_id);
        }
        Ok(result.rows_affected)
    }
}
