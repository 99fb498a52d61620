//! Domain service for user and platform maintenance.

use thiserror::Error;

use crate::db::CatalogEntry;
use crate::domain::{PlatformId, UserId};

/// Errors specific to admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    /// Other rows still reference the target.
    #[error("{0}")]
    InUse(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AdminError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for the household's users and platforms.
///
/// Names are trimmed before they are stored. Deletes are refused while any
/// show or watch link still refers to the target.
#[async_trait::async_trait]
pub trait AdminService: Send + Sync {
    async fn list_users(&self) -> Result<Vec<CatalogEntry<UserId>>, AdminError>;

    async fn create_user(&self, name: &str) -> Result<CatalogEntry<UserId>, AdminError>;

    async fn rename_user(&self, id: UserId, name: &str) -> Result<(), AdminError>;

    async fn delete_user(&self, id: UserId) -> Result<(), AdminError>;

    async fn list_platforms(&self) -> Result<Vec<CatalogEntry<PlatformId>>, AdminError>;

    async fn create_platform(&self, name: &str) -> Result<CatalogEntry<PlatformId>, AdminError>;

    async fn rename_platform(&self, id: PlatformId, name: &str) -> Result<(), AdminError>;

    async fn delete_platform(&self, id: PlatformId) -> Result<(), AdminError>;
}
