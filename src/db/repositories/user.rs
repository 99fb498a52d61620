use anyhow::{Context, Result};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashMap;
use tracing::info;

use super::{CatalogEntry, is_unique_violation};
use crate::db::Outcome;
use crate::domain::UserId;
use crate::entities::{prelude::*, shows_to_users, users};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Every household member ordered by name, with the number of shows they follow.
    pub async fn list(&self) -> Result<Vec<CatalogEntry<UserId>>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        let counts: HashMap<i32, i64> = ShowsToUsers::find()
            .select_only()
            .column(shows_to_users::Column::UserId)
            .column_as(shows_to_users::Column::ShowId.count(), "show_count")
            .group_by(shows_to_users::Column::UserId)
            .into_tuple::<(i32, i64)>()
            .all(&self.conn)
            .await
            .context("Failed to count shows per user")?
            .into_iter()
            .collect();

        Ok(rows
            .into_iter()
            .map(|u| CatalogEntry {
                id: UserId::new(u.id),
                show_count: counts
                    .get(&u.id)
                    .map_or(0, |c| u64::try_from(*c).unwrap_or(0)),
                name: u.name,
            })
            .collect())
    }

    pub async fn create(&self, name: &str) -> Result<Outcome<CatalogEntry<UserId>>> {
        let model = users::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };

        match Users::insert(model).exec(&self.conn).await {
            Ok(res) => {
                info!("Created user {}: {}", res.last_insert_id, name);
                Ok(Outcome::Applied(CatalogEntry {
                    id: UserId::new(res.last_insert_id),
                    name: name.to_string(),
                    show_count: 0,
                }))
            }
            Err(err) if is_unique_violation(&err) => Ok(Outcome::Duplicate),
            Err(err) => Err(err).context("Failed to insert user"),
        }
    }

    pub async fn rename(&self, id: UserId, name: &str) -> Result<Outcome<()>> {
        let update = users::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };

        let result = Users::update_many()
            .set(update)
            .filter(users::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await;

        match result {
            Ok(res) if res.rows_affected == 0 => Ok(Outcome::Missing("User")),
            Ok(_) => {
                info!("Renamed user {} to {}", id, name);
                Ok(Outcome::Applied(()))
            }
            Err(err) if is_unique_violation(&err) => Ok(Outcome::Duplicate),
            Err(err) => Err(err).context("Failed to rename user"),
        }
    }

    /// Deletes a user nobody's watch list refers to. The dependent count is
    /// taken inside the same transaction as the delete.
    pub async fn delete(&self, id: UserId) -> Result<Outcome<()>> {
        let txn = self.conn.begin().await?;

        if Users::find_by_id(id.value()).one(&txn).await?.is_none() {
            return Ok(Outcome::Missing("User"));
        }

        let dependents = ShowsToUsers::find()
            .filter(shows_to_users::Column::UserId.eq(id.value()))
            .count(&txn)
            .await
            .context("Failed to count watch links for user")?;

        if dependents > 0 {
            return Ok(Outcome::InUse(dependents));
        }

        Users::delete_by_id(id.value()).exec(&txn).await?;
        txn.commit().await?;

        info!("Deleted user {}", id);
        Ok(Outcome::Applied(()))
    }
}
