use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::{parse_body, require, validate_id};
use super::{ApiError, ApiResponse, AppState};
use crate::db::LinkChange;
use crate::domain::{ShowId, UserId};
use crate::entities::WatchStatus;

#[derive(Debug, Deserialize)]
#[serde(tag = "_action", rename_all = "camelCase")]
pub enum WatcherAction {
    AddWatcher {
        user_id: UserId,
        status: Option<WatchStatus>,
    },
    RemoveWatcher {
        user_id: UserId,
    },
    UpdateStatus {
        user_id: UserId,
        new_status: Option<WatchStatus>,
    },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WatcherActionResponse {
    Added { added: bool },
    Removed { removed: bool },
    Updated(LinkChange),
}

/// `POST /api/shows/{id}/watchers/actions`
pub async fn watcher_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    payload: Result<Json<WatcherAction>, JsonRejection>,
) -> Result<Json<ApiResponse<WatcherActionResponse>>, ApiError> {
    let show_id = ShowId::new(validate_id("show", id)?);
    let watch = state.watch_service();

    let response = match parse_body(payload)? {
        WatcherAction::AddWatcher { user_id, status } => {
            let added = watch.add_watcher(show_id, user_id, status).await?;
            WatcherActionResponse::Added { added }
        }
        WatcherAction::RemoveWatcher { user_id } => {
            let removed = watch.remove_watcher(show_id, user_id).await?;
            WatcherActionResponse::Removed { removed }
        }
        WatcherAction::UpdateStatus {
            user_id,
            new_status,
        } => {
            let status = require("new_status", new_status)?;
            let change = watch
                .update_watcher_status(show_id, user_id, status)
                .await?;
            WatcherActionResponse::Updated(change)
        }
    };

    Ok(Json(ApiResponse::success(response)))
}
