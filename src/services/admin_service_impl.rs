//! `SeaORM` implementation of the `AdminService` trait.

use async_trait::async_trait;

use crate::db::{CatalogEntry, Outcome, Store};
use crate::domain::{PlatformId, UserId, normalize_name};
use crate::services::admin_service::{AdminError, AdminService};

pub struct SeaOrmAdminService {
    store: Store,
}

impl SeaOrmAdminService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

/// `kind` names the entity, `dependents` what references it.
fn settle<T>(
    outcome: Outcome<T>,
    kind: &str,
    name: Option<&str>,
    dependents: &str,
) -> Result<T, AdminError> {
    match outcome {
        Outcome::Applied(value) => Ok(value),
        Outcome::Missing(what) => Err(AdminError::NotFound(what.to_string())),
        Outcome::Duplicate => Err(AdminError::Conflict(format!(
            "A {} named '{}' already exists",
            kind.to_lowercase(),
            name.unwrap_or_default()
        ))),
        Outcome::InUse(count) => Err(AdminError::InUse(format!(
            "Cannot delete {} attached to {count} {dependents}",
            kind.to_lowercase()
        ))),
        Outcome::Stale | Outcome::Rejected(_) => Err(AdminError::Internal(format!(
            "Unexpected outcome for a {} change",
            kind.to_lowercase()
        ))),
    }
}

fn clean(kind: &str, raw: &str) -> Result<String, AdminError> {
    normalize_name(kind, raw).map_err(AdminError::Validation)
}

#[async_trait]
impl AdminService for SeaOrmAdminService {
    async fn list_users(&self) -> Result<Vec<CatalogEntry<UserId>>, AdminError> {
        Ok(self.store.list_users().await?)
    }

    async fn create_user(&self, name: &str) -> Result<CatalogEntry<UserId>, AdminError> {
        let name = clean("User", name)?;
        settle(
            self.store.create_user(&name).await?,
            "User",
            Some(&name),
            "show(s)",
        )
    }

    async fn rename_user(&self, id: UserId, name: &str) -> Result<(), AdminError> {
        let name = clean("User", name)?;
        settle(
            self.store.rename_user(id, &name).await?,
            "User",
            Some(&name),
            "show(s)",
        )
    }

    async fn delete_user(&self, id: UserId) -> Result<(), AdminError> {
        settle(self.store.delete_user(id).await?, "User", None, "show(s)")
    }

    async fn list_platforms(&self) -> Result<Vec<CatalogEntry<PlatformId>>, AdminError> {
        Ok(self.store.list_platforms().await?)
    }

    async fn create_platform(&self, name: &str) -> Result<CatalogEntry<PlatformId>, AdminError> {
        let name = clean("Platform", name)?;
        settle(
            self.store.create_platform(&name).await?,
            "Platform",
            Some(&name),
            "show(s)",
        )
    }

    async fn rename_platform(&self, id: PlatformId, name: &str) -> Result<(), AdminError> {
        let name = clean("Platform", name)?;
        settle(
            self.store.rename_platform(id, &name).await?,
            "Platform",
            Some(&name),
            "show(s)",
        )
    }

    async fn delete_platform(&self, id: PlatformId) -> Result<(), AdminError> {
        settle(
            self.store.delete_platform(id).await?,
            "Platform",
            None,
            "show(s)",
        )
    }
}
