//! Dashboard endpoints: the watch board and its quick actions.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::parse_body;
use super::{ApiError, ApiResponse, AppState};
use crate::db::LinkChange;
use crate::domain::views::Dashboard;
use crate::domain::{ShowId, UserId};
use crate::services::SeasonSnapshot;

/// Without `user_id` an action applies to every watcher still on the card,
/// that is everyone who has not finished the show.
#[derive(Debug, Deserialize)]
#[serde(tag = "_action", rename_all = "camelCase")]
pub enum DashboardAction {
    CompleteSeason {
        show_id: ShowId,
        user_id: Option<UserId>,
        /// Season the client showed when the button was pressed.
        current_season: Option<i32>,
        total_seasons: Option<i32>,
    },
    StartWatching {
        show_id: ShowId,
        user_id: Option<UserId>,
    },
    SetToWantToWatch {
        show_id: ShowId,
        user_id: Option<UserId>,
    },
}

/// `GET /api/dashboard`
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Dashboard>>, ApiError> {
    let dashboard = state.show_service().dashboard().await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

/// `POST /api/dashboard/actions`
pub async fn dashboard_action(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DashboardAction>, JsonRejection>,
) -> Result<Json<ApiResponse<Vec<LinkChange>>>, ApiError> {
    let watch = state.watch_service();

    let changes = match parse_body(payload)? {
        DashboardAction::CompleteSeason {
            show_id,
            user_id,
            current_season,
            total_seasons,
        } => {
            let snapshot = SeasonSnapshot {
                current_season,
                total_seasons,
            };
            watch.complete_season(show_id, user_id, snapshot).await?
        }
        DashboardAction::StartWatching { show_id, user_id } => {
            watch.start_watching(show_id, user_id).await?
        }
        DashboardAction::SetToWantToWatch { show_id, user_id } => {
            watch.set_want_to_watch(show_id, user_id).await?
        }
    };

    Ok(Json(ApiResponse::success(changes)))
}
