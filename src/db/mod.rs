use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::views::ShowRecord;
use crate::domain::watch_state::{LinkState, TransitionError};
use crate::domain::{PlatformId, ShowId, UserId};
use crate::entities::{WatchStatus, shows};

pub mod migrator;
pub mod repositories;

pub use repositories::CatalogEntry;
pub use repositories::show::NewShow;
pub use repositories::watch_link::{LinkChange, SeasonChange};

/// What a guarded write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),

    /// The named row does not exist.
    Missing(&'static str),

    /// A row changed between the read and the conditional write.
    Stale,

    /// A unique name is already taken.
    Duplicate,

    /// Rows still reference the target; carries how many.
    InUse(u64),

    Rejected(TransitionError),
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn platform_repo(&self) -> repositories::platform::PlatformRepository {
        repositories::platform::PlatformRepository::new(self.conn.clone())
    }

    fn show_repo(&self) -> repositories::show::ShowRepository {
        repositories::show::ShowRepository::new(self.conn.clone())
    }

    fn watch_link_repo(&self) -> repositories::watch_link::WatchLinkRepository {
        repositories::watch_link::WatchLinkRepository::new(self.conn.clone())
    }

    // Users

    pub async fn list_users(&self) -> Result<Vec<CatalogEntry<UserId>>> {
        self.user_repo().list().await
    }

    pub async fn create_user(&self, name: &str) -> Result<Outcome<CatalogEntry<UserId>>> {
        self.user_repo().create(name).await
    }

    pub async fn rename_user(&self, id: UserId, name: &str) -> Result<Outcome<()>> {
        self.user_repo().rename(id, name).await
    }

    pub async fn delete_user(&self, id: UserId) -> Result<Outcome<()>> {
        self.user_repo().delete(id).await
    }

    // Platforms

    pub async fn list_platforms(&self) -> Result<Vec<CatalogEntry<PlatformId>>> {
        self.platform_repo().list().await
    }

    pub async fn create_platform(&self, name: &str) -> Result<Outcome<CatalogEntry<PlatformId>>> {
        self.platform_repo().create(name).await
    }

    pub async fn rename_platform(&self, id: PlatformId, name: &str) -> Result<Outcome<()>> {
        self.platform_repo().rename(id, name).await
    }

    pub async fn delete_platform(&self, id: PlatformId) -> Result<Outcome<()>> {
        self.platform_repo().delete(id).await
    }

    // Shows

    pub async fn create_show(&self, show: &NewShow) -> Result<Outcome<ShowId>> {
        self.show_repo().create(show).await
    }

    pub async fn get_show(&self, id: ShowId) -> Result<Option<ShowRecord>> {
        self.show_repo().get(id).await
    }

    pub async fn list_show_records(&self) -> Result<Vec<ShowRecord>> {
        self.show_repo().list_records().await
    }

    pub async fn rename_show(&self, id: ShowId, name: &str) -> Result<bool> {
        self.show_repo().rename(id, name).await
    }

    pub async fn set_show_cancelled(&self, id: ShowId, seen_cancelled: bool) -> Result<Option<bool>> {
        self.show_repo().set_cancelled(id, seen_cancelled).await
    }

    pub async fn delete_show(&self, id: ShowId) -> Result<Outcome<()>> {
        self.show_repo().delete(id).await
    }

    // Watch links

    pub async fn transition_links<G, F>(
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
        self.watch_link_repo()
            .transition(show_id, user_id, guard, rule)
            .await
    }

    pub async fn add_season(
        &self,
        show_id: ShowId,
        expected_total: Option<i32>,
    ) -> Result<Outcome<SeasonChange>> {
        self.watch_link_repo()
            .add_season(show_id, expected_total)
            .await
    }

    pub async fn remove_season(
        &self,
        show_id: ShowId,
        expected_total: Option<i32>,
    ) -> Result<Outcome<SeasonChange>> {
        self.watch_link_repo()
            .remove_season(show_id, expected_total)
            .await
    }

    pub async fn move_show_to_want_to_watch(&self, show_id: ShowId) -> Result<Outcome<u64>> {
        self.watch_link_repo().move_to_want_to_watch(show_id).await
    }

    pub async fn add_watcher(
        &self,
        show_id: ShowId,
        user_id: UserId,
        status: WatchStatus,
    ) -> Result<Outcome<bool>> {
        self.watch_link_repo().add(show_id, user_id, status).await
    }

    pub async fn remove_watcher(&self, show_id: ShowId, user_id: UserId) -> Result<u64> {
        self.watch_link_repo().remove(show_id, user_id).await
    }
}
