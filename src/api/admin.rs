//! Household maintenance: users and streaming platforms.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::{parse_body, require};
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::db::CatalogEntry;
use crate::domain::{PlatformId, UserId};

#[derive(Debug, Deserialize)]
#[serde(tag = "_action", rename_all = "camelCase")]
pub enum UserAction {
    CreateUser {
        name: Option<String>,
    },
    UpdateUser {
        user_id: UserId,
        name: Option<String>,
    },
    DeleteUser {
        user_id: UserId,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "_action", rename_all = "camelCase")]
pub enum PlatformAction {
    CreatePlatform {
        name: Option<String>,
    },
    UpdatePlatform {
        platform_id: PlatformId,
        name: Option<String>,
    },
    DeletePlatform {
        platform_id: PlatformId,
    },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AdminActionResponse<Id> {
    Created(CatalogEntry<Id>),
    Message(MessageResponse),
}

/// `GET /api/admin/users`
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CatalogEntry<UserId>>>>, ApiError> {
    let users = state.admin_service().list_users().await?;
    Ok(Json(ApiResponse::success(users)))
}

/// `POST /api/admin/users/actions`
pub async fn user_action(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UserAction>, JsonRejection>,
) -> Result<Json<ApiResponse<AdminActionResponse<UserId>>>, ApiError> {
    let admin = state.admin_service();

    let response = match parse_body(payload)? {
        UserAction::CreateUser { name } => {
            let user = admin.create_user(&require("name", name)?).await?;
            AdminActionResponse::Created(user)
        }
        UserAction::UpdateUser { user_id, name } => {
            admin.rename_user(user_id, &require("name", name)?).await?;
            AdminActionResponse::Message(MessageResponse::new("User updated"))
        }
        UserAction::DeleteUser { user_id } => {
            admin.delete_user(user_id).await?;
            AdminActionResponse::Message(MessageResponse::new("User deleted"))
        }
    };

    Ok(Json(ApiResponse::success(response)))
}

/// `GET /api/admin/platforms`
pub async fn list_platforms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CatalogEntry<PlatformId>>>>, ApiError> {
    let platforms = state.admin_service().list_platforms().await?;
    Ok(Json(ApiResponse::success(platforms)))
}

/// `POST /api/admin/platforms/actions`
pub async fn platform_action(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlatformAction>, JsonRejection>,
) -> Result<Json<ApiResponse<AdminActionResponse<PlatformId>>>, ApiError> {
    let admin = state.admin_service();

    let response = match parse_body(payload)? {
        PlatformAction::CreatePlatform { name } => {
            let platform = admin.create_platform(&require("name", name)?).await?;
            AdminActionResponse::Created(platform)
        }
        PlatformAction::UpdatePlatform { platform_id, name } => {
            admin
                .rename_platform(platform_id, &require("name", name)?)
                .await?;
            AdminActionResponse::Message(MessageResponse::new("Platform updated"))
        }
        PlatformAction::DeletePlatform { platform_id } => {
            admin.delete_platform(platform_id).await?;
            AdminActionResponse::Message(MessageResponse::new("Platform deleted"))
        }
    };

    Ok(Json(ApiResponse::success(response)))
}
