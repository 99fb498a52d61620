//! Domain service for the show catalog and its read views.

use serde::Serialize;
use thiserror::Error;

use crate::db::CatalogEntry;
use crate::domain::views::{Dashboard, FinishedRow, ManageRow, Page, ShowRecord};
use crate::domain::{PlatformId, ShowId, UserId};

/// Errors specific to show catalog operations.
#[derive(Debug, Error)]
pub enum ShowError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// An integrity guard refused the change.
    #[error("{0}")]
    Refused(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ShowError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ShowError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Input for creating a show, before validation.
#[derive(Debug, Clone)]
pub struct CreateShow {
    pub name: String,
    pub total_seasons: i32,
    pub platform_id: PlatformId,
    pub user_ids: Vec<UserId>,
}

/// Everything the show editor needs.
#[derive(Debug, Clone, Serialize)]
pub struct ShowDetail {
    #[serde(flatten)]
    pub show: ShowRecord,
    /// Every household member, for the add-watcher picker.
    pub all_users: Vec<CatalogEntry<UserId>>,
}

/// Domain service trait for shows.
#[async_trait::async_trait]
pub trait ShowService: Send + Sync {
    /// Creates a show with each listed user attached as want-to-watch.
    ///
    /// # Errors
    ///
    /// Returns [`ShowError::Validation`] for a blank name, a season count
    /// below one or an empty watcher list, and [`ShowError::NotFound`] for an unknown platform or user.
    async fn create_show(&self, input: CreateShow) -> Result<ShowId, ShowError>;

    async fn get_show(&self, id: ShowId) -> Result<ShowDetail, ShowError>;

    async fn rename_show(&self, id: ShowId, name: &str) -> Result<(), ShowError>;

    /// # Errors
    ///
    /// Returns [`ShowError::Refused`] once anybody has made progress.
    async fn delete_show(&self, id: ShowId) -> Result<(), ShowError>;

    async fn dashboard(&self) -> Result<Dashboard, ShowError>;

    async fn manage_shows(&self, search: &str, page: u64) -> Result<Page<ManageRow>, ShowError>;

    async fn finished_shows(
        &self,
        show_name: &str,
        platform: &str,
        page: u64,
    ) -> Result<Page<FinishedRow>, ShowError>;
}
