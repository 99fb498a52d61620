use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a household member is with a show.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchStatus {
    #[sea_orm(string_value = "WANT_TO_WATCH")]
    WantToWatch,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "FINISHED")]
    Finished,
}

impl WatchStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WantToWatch => "WANT_TO_WATCH",
            Self::InProgress => "IN_PROGRESS",
            Self::Finished => "FINISHED",
        }
    }

    /// Still on the dashboard: watching or wishlisted.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::InProgress | Self::WantToWatch)
    }

    /// Human label used by the CLI listing.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::WantToWatch => "Want to Watch",
            Self::InProgress => "Watching",
            Self::Finished => "Finished",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "shows_to_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub show_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    #[sea_orm(default_value = "WANT_TO_WATCH")]
    pub status: WatchStatus,
    #[sea_orm(default_value = 1)]
    pub current_season: i32,
    pub finished_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shows::Entity",
        from = "Column::ShowId",
        to = "super::shows::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Shows,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::shows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shows.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names_match_storage() {
        for status in [
            WatchStatus::WantToWatch,
            WatchStatus::InProgress,
            WatchStatus::Finished,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.to_value(), status.as_str());
            assert_eq!(serde_json::from_str::<WatchStatus>(&json).unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(serde_json::from_str::<WatchStatus>("\"WATCHING\"").is_err());
        assert!(serde_json::from_str::<WatchStatus>("\"paused\"").is_err());
    }

    #[test]
    fn test_only_finished_is_inactive() {
        assert!(WatchStatus::WantToWatch.is_active());
        assert!(WatchStatus::InProgress.is_active());
        assert!(!WatchStatus::Finished.is_active());
    }
}
