pub mod platform;
pub mod show;
pub mod user;
pub mod watch_link;

use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

/// A user or platform together with how many rows depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry<Id> {
    pub id: Id,
    pub name: String,
    pub show_count: u64,
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
