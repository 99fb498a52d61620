//! Show catalog endpoints.
//!
//! Covers the manage and finished listings, show creation, the edit loader
//! and the cancelled toggle. Handlers only map HTTP to the show and watch
//! services.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::{parse_body, require, validate_id, validate_search_query};
use super::{ApiError, ApiResponse, AppState, CreatedResponse, MessageResponse};
use crate::db::SeasonChange;
use crate::domain::views::{FinishedRow, ManageRow, Page};
use crate::domain::{PlatformId, ShowId, UserId};
use crate::services::{CreateShow, ShowDetail};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ManageQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct FinishedQuery {
    pub show_name: Option<String>,
    pub platform: Option<String>,
    pub page: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "_action", rename_all = "camelCase")]
pub enum ManageAction {
    Delete { show_id: ShowId },
    MoveToWantToWatch { show_id: ShowId },
    EditName { show_id: ShowId, name: Option<String> },
}

/// `total_seasons` echoes the total the client saw.
#[derive(Debug, Deserialize)]
#[serde(tag = "_action", rename_all = "camelCase")]
pub enum FinishedAction {
    AddSeason {
        show_id: ShowId,
        total_seasons: Option<i32>,
    },
    RemoveSeason {
        show_id: ShowId,
        total_seasons: Option<i32>,
    },
}

#[derive(Debug, Deserialize)]
pub struct CreateShowRequest {
    pub name: Option<String>,
    pub total_seasons: Option<i32>,
    pub platform_id: Option<PlatformId>,
    #[serde(default)]
    pub user_ids: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    /// The flag as the client last saw it.
    #[serde(default)]
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ManageActionResponse {
    Message(MessageResponse),
    Moved { moved: u64 },
}

// ============================================================================
// Handlers
// ============================================================================

/// `GET /api/shows/manage?search&page`
pub async fn list_manage(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ManageQuery>,
) -> Result<Json<ApiResponse<Page<ManageRow>>>, ApiError> {
    let search = validate_search_query(query.search.as_deref())?;
    let page = state
        .show_service()
        .manage_shows(&search, query.page.unwrap_or(1))
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// `POST /api/shows/manage/actions`
pub async fn manage_action(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ManageAction>, JsonRejection>,
) -> Result<Json<ApiResponse<ManageActionResponse>>, ApiError> {
    let response = match parse_body(payload)? {
        ManageAction::Delete { show_id } => {
            state.show_service().delete_show(show_id).await?;
            ManageActionResponse::Message(MessageResponse::new("Show deleted"))
        }
        ManageAction::MoveToWantToWatch { show_id } => {
            let moved = state.watch_service().move_to_want_to_watch(show_id).await?;
            ManageActionResponse::Moved { moved }
        }
        ManageAction::EditName { show_id, name } => {
            let name = require("name", name)?;
            state.show_service().rename_show(show_id, &name).await?;
            ManageActionResponse::Message(MessageResponse::new("Show renamed"))
        }
    };

    Ok(Json(ApiResponse::success(response)))
}

/// `GET /api/shows/finished?show_name&platform&page`
pub async fn list_finished(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FinishedQuery>,
) -> Result<Json<ApiResponse<Page<FinishedRow>>>, ApiError> {
    let show_name = validate_search_query(query.show_name.as_deref())?;
    let platform = validate_search_query(query.platform.as_deref())?;

    let page = state
        .show_service()
        .finished_shows(&show_name, &platform, query.page.unwrap_or(1))
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// `POST /api/shows/finished/actions`
pub async fn finished_action(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FinishedAction>, JsonRejection>,
) -> Result<Json<ApiResponse<SeasonChange>>, ApiError> {
    let watch = state.watch_service();

    let change = match parse_body(payload)? {
        FinishedAction::AddSeason {
            show_id,
            total_seasons,
        } => watch.add_season(show_id, total_seasons).await?,
        FinishedAction::RemoveSeason {
            show_id,
            total_seasons,
        } => watch.remove_season(show_id, total_seasons).await?,
    };

    Ok(Json(ApiResponse::success(change)))
}

/// `POST /api/shows`
pub async fn create_show(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateShowRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CreatedResponse>>, ApiError> {
    let payload = parse_body(payload)?;

    let input = CreateShow {
        name: require("name", payload.name)?,
        total_seasons: require("total_seasons", payload.total_seasons)?,
        platform_id: require("platform_id", payload.platform_id)?,
        user_ids: payload.user_ids,
    };

    let id = state.show_service().create_show(input).await?;
    Ok(Json(ApiResponse::success(CreatedResponse { id: id.value() })))
}

/// `GET /api/shows/{id}`
pub async fn get_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ShowDetail>>, ApiError> {
    let id = ShowId::new(validate_id("show", id)?);
    let detail = state.show_service().get_show(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// `POST /api/shows/{id}/cancel`
///
/// Stores the opposite of the flag the client saw, so a replayed request
/// leaves the show as the first one did.
pub async fn toggle_cancelled(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    payload: Result<Json<CancelRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CancelResponse>>, ApiError> {
    let id = ShowId::new(validate_id("show", id)?);
    let payload = parse_body(payload)?;

    let cancelled = state
        .watch_service()
        .toggle_cancelled(id, payload.cancelled)
        .await?;
    Ok(Json(ApiResponse::success(CancelResponse { cancelled })))
}
