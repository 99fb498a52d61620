use anyhow::{Context, Result};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashMap;
use tracing::info;

use super::{CatalogEntry, is_unique_violation};
use crate::db::Outcome;
use crate::domain::PlatformId;
use crate::entities::{platforms, prelude::*, shows};

pub struct PlatformRepository {
    conn: DatabaseConnection,
}

impl PlatformRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<CatalogEntry<PlatformId>>> {
        let rows = Platforms::find()
            .order_by_asc(platforms::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list platforms")?;

        let counts: HashMap<i32, i64> = Shows::find()
            .select_only()
            .column(shows::Column::PlatformId)
            .column_as(shows::Column::Id.count(), "show_count")
            .group_by(shows::Column::PlatformId)
            .into_tuple::<(i32, i64)>()
            .all(&self.conn)
            .await
            .context("Failed to count shows per platform")?
            .into_iter()
            .collect();

        Ok(rows
            .into_iter()
            .map(|p| CatalogEntry {
                id: PlatformId::new(p.id),
                show_count: counts
                    .get(&p.id)
                    .map_or(0, |c| u64::try_from(*c).unwrap_or(0)),
                name: p.name,
            })
            .collect())
    }

    pub async fn create(&self, name: &str) -> Result<Outcome<CatalogEntry<PlatformId>>> {
        let model = platforms::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };

        match Platforms::insert(model).exec(&self.conn).await {
            Ok(res) => {
                info!("Created platform {}: {}", res.last_insert_id, name);
                Ok(Outcome::Applied(CatalogEntry {
                    id: PlatformId::new(res.last_insert_id),
                    name: name.to_string(),
                    show_count: 0,
                }))
            }
            Err(err) if is_unique_violation(&err) => Ok(Outcome::Duplicate),
            Err(err) => Err(err).context("Failed to insert platform"),
        }
    }

    pub async fn rename(&self, id: PlatformId, name: &str) -> Result<Outcome<()>> {
        let update = platforms::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };

        let result = Platforms::update_many()
            .set(update)
            .filter(platforms::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await;

        match result {
            Ok(res) if res.rows_affected == 0 => Ok(Outcome::Missing("Platform")),
            Ok(_) => {
                info!("Renamed platform {} to {}", id, name);
                Ok(Outcome::Applied(()))
            }
            Err(err) if is_unique_violation(&err) => Ok(Outcome::Duplicate),
            Err(err) => Err(err).context("Failed to rename platform"),
        }
    }

    pub async fn delete(&self, id: PlatformId) -> Result<Outcome<()>> {
        let txn = self.conn.begin().await?;

        if Platforms::find_by_id(id.value()).one(&txn).await?.is_none() {
            return Ok(Outcome::Missing("Platform"));
        }

        let dependents = Shows::find()
            .filter(shows::Column::PlatformId.eq(id.value()))
            .count(&txn)
            .await
            .context("Failed to count shows for platform")?;

        if dependents > 0 {
            return Ok(Outcome::InUse(dependents));
        }

        Platforms::delete_by_id(id.value()).exec(&txn).await?;
        txn.commit().await?;

        info!("Deleted platform {}", id);
        Ok(Outcome::Applied(()))
    }
}
