use anyhow::{Context, Result};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

use crate::db::Outcome;
use crate::domain::views::{ShowRecord, WatcherRecord};
use crate::domain::watch_state::{self, LinkState};
use crate::domain::{PlatformId, ShowId, UserId};
use crate::entities::{WatchStatus, platforms, prelude::*, shows, shows_to_users, users};

/// Fields needed to create a show.
#[derive(Debug, Clone)]
pub struct NewShow {
    pub name: String,
    pub total_seasons: i32,
    pub platform_id: PlatformId,
    pub user_ids: Vec<UserId>,
}

pub struct ShowRepository {
    conn: DatabaseConnection,
}

impl ShowRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the show and a wishlist link per initial watcher in one transaction.
    pub async fn create(&self, show: &NewShow) -> Result<Outcome<ShowId>> {
        let txn = self.conn.begin().await?;

        if Platforms::find_by_id(show.platform_id.value())
            .one(&txn)
            .await?
            .is_none()
        {
            return Ok(Outcome::Missing("Platform"));
        }

        let user_ids: BTreeSet<i32> = show.user_ids.iter().map(UserId::value).collect();
        if !user_ids.is_empty() {
            let found = Users::find()
                .filter(users::Column::Id.is_in(user_ids.iter().copied()))
                .count(&txn)
                .await
                .context("Failed to verify watchers")?;
            if found != user_ids.len() as u64 {
                return Ok(Outcome::Missing("User"));
            }
        }

        let model = shows::ActiveModel {
            name: Set(show.name.clone()),
            total_seasons: Set(show.total_seasons),
            platform_id: Set(show.platform_id.value()),
            cancelled: Set(false),
            ..Default::default()
        };
        let show_id = Shows::insert(model)
            .exec(&txn)
            .await
            .context("Failed to insert show")?
            .last_insert_id;

        if !user_ids.is_empty() {
            let state = LinkState::new(WatchStatus::WantToWatch);
            let links = user_ids.iter().map(|user_id| shows_to_users::ActiveModel {
                show_id: Set(show_id),
                user_id: Set(*user_id),
                status: Set(state.status),
                current_season: Set(state.current_season),
                finished_at: Set(state.finished_at),
            });
            ShowsToUsers::insert_many(links)
                .exec_without_returning(&txn)
                .await
                .context("Failed to attach watchers")?;
        }

        txn.commit().await?;

        info!(
            "Created show {}: {} ({} seasons, {} watchers)",
            show_id,
            show.name,
            show.total_seasons,
            user_ids.len()
        );
        Ok(Outcome::Applied(ShowId::new(show_id)))
    }

    pub async fn get(&self, id: ShowId) -> Result<Option<ShowRecord>> {
        let Some((show, platform)) = Shows::find_by_id(id.value())
            .find_also_related(Platforms)
            .one(&self.conn)
            .await
            .context("Failed to query show")?
        else {
            return Ok(None);
        };

        let links = ShowsToUsers::find()
            .filter(shows_to_users::Column::ShowId.eq(id.value()))
            .find_also_related(Users)
            .all(&self.conn)
            .await
            .context("Failed to query watchers")?;

        let mut watchers = group_watchers(links);
        Ok(Some(Self::record(
            show,
            platform.as_ref(),
            watchers.remove(&id.value()).unwrap_or_default(),
        )))
    }

    /// Loads every show with its platform and watchers.
    pub async fn list_records(&self) -> Result<Vec<ShowRecord>> {
        let rows = Shows::find()
            .find_also_related(Platforms)
            .order_by_asc(shows::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list shows")?;

        let links = ShowsToUsers::find()
            .find_also_related(Users)
            .all(&self.conn)
            .await
            .context("Failed to list watch links")?;

        let mut watchers = group_watchers(links);

        Ok(rows
            .into_iter()
            .map(|(show, platform)| {
                let attached = watchers.remove(&show.id).unwrap_or_default();
                Self::record(show, platform.as_ref(), attached)
            })
            .collect())
    }

    fn record(
        show: shows::Model,
        platform: Option<&platforms::Model>,
        watchers: Vec<WatcherRecord>,
    ) -> ShowRecord {
        ShowRecord {
            id: ShowId::new(show.id),
            name: show.name,
            total_seasons: show.total_seasons,
            platform_id: PlatformId::new(show.platform_id),
            platform_name: platform.map(|p| p.name.clone()).unwrap_or_default(),
            cancelled: show.cancelled,
            watchers,
        }
    }

    pub async fn rename(&self, id: ShowId, name: &str) -> Result<bool> {
        let update = shows::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };

        let result = Shows::update_many()
            .set(update)
            .filter(shows::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to rename show")?;

        let renamed = result.rows_affected > 0;
        if renamed {
            info!("Renamed show {} to {}", id, name);
        }
        Ok(renamed)
    }

    /// Writes the flipped cancelled flag; `None` when the show does not exist.
    pub async fn set_cancelled(&self, id: ShowId, seen_cancelled: bool) -> Result<Option<bool>> {
        let cancelled = watch_state::toggle_cancelled(seen_cancelled);
        let update = shows::ActiveModel {
            cancelled: Set(cancelled),
            ..Default::default()
        };

        let result = Shows::update_many()
            .set(update)
            .filter(shows::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to update cancelled flag")?;

        Ok((result.rows_affected > 0).then_some(cancelled))
    }

    /// Removes a show nobody has made progress on, links first.
    pub async fn delete(&self, id: ShowId) -> Result<Outcome<()>> {
        let txn = self.conn.begin().await?;

        if Shows::find_by_id(id.value()).one(&txn).await?.is_none() {
            return Ok(Outcome::Missing("Show"));
        }

        let links: Vec<LinkState> = ShowsToUsers::find()
            .filter(shows_to_users::Column::ShowId.eq(id.value()))
            .all(&txn)
            .await?
            .iter()
            .map(link_state)
            .collect();

        if let Err(err) = watch_state::ensure_deletable(&links) {
            return Ok(Outcome::Rejected(err));
        }

        ShowsToUsers::delete_many()
            .filter(shows_to_users::Column::ShowId.eq(id.value()))
            .exec(&txn)
            .await?;
        Shows::delete_by_id(id.value()).exec(&txn).await?;

        txn.commit().await?;

        info!("Deleted show {} and {} watch links", id, links.len());
        Ok(Outcome::Applied(()))
    }
}

pub(super) const fn link_state(link: &shows_to_users::Model) -> LinkState {
    LinkState {
        status: link.status,
        current_season: link.current_season,
        finished_at: link.finished_at,
    }
}

fn group_watchers(
    links: Vec<(shows_to_users::Model, Option<users::Model>)>,
) -> HashMap<i32, Vec<WatcherRecord>> {
    let mut grouped: HashMap<i32, Vec<WatcherRecord>> = HashMap::new();

    for (link, user) in links {
        let Some(user) = user else { continue };
        grouped.entry(link.show_id).or_default().push(WatcherRecord {
            user_id: UserId::new(user.id),
            name: user.name,
            status: link.status,
            current_season: link.current_season,
            finished_at: link.finished_at,
        });
    }

    for watchers in grouped.values_mut() {
        watchers.sort_by(|a, b| a.name.cmp(&b.name));
    }

    grouped
}
