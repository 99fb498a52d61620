use anyhow::Context;
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use rand::Rng;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::Config;
use crate::services::{AdminService, AuthService, ShowService, WatchService};
use crate::state::SharedState;

mod admin;
pub mod auth;
mod dashboard;
mod error;
mod observability;
mod shows;
mod system;
mod types;
mod validation;
mod watchers;

pub use auth::{SessionState, is_session_valid};
pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn new(shared: Arc<SharedState>, prometheus_handle: Option<PrometheusHandle>) -> Self {
        Self {
            shared,
            start_time: std::time::Instant::now(),
            prometheus_handle,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        self.shared.config()
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn watch_service(&self) -> &Arc<dyn WatchService> {
        &self.shared.watch_service
    }

    #[must_use]
    pub fn show_service(&self) -> &Arc<dyn ShowService> {
        &self.shared.show_service
    }

    #[must_use]
    pub fn admin_service(&self) -> &Arc<dyn AdminService> {
        &self.shared.admin_service
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(Arc::new(AppState::new(shared, prometheus_handle)))
}

/// Opens the session table on the application's own pool.
pub async fn session_store(state: &AppState) -> anyhow::Result<SqliteStore> {
    let pool = state.store().conn.get_sqlite_connection_pool().clone();
    let store = SqliteStore::new(pool);
    store
        .migrate()
        .await
        .context("Failed to create the session table")?;
    Ok(store)
}

/// Signing key from `auth.session_secret`, or a random one for this process.
fn session_key(config: &Config) -> anyhow::Result<Key> {
    if let Some(secret) = &config.auth.session_secret {
        return Key::try_from(secret.as_bytes())
            .map_err(|e| anyhow::anyhow!("Invalid session secret: {e}"));
    }

    tracing::warn!("No session secret configured; sessions end when the server restarts");
    let mut bytes = [0u8; 64];
    rand::rng().fill(&mut bytes[..]);
    Ok(Key::from(&bytes))
}

pub async fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let config = state.config().clone();

    let session_layer = SessionManagerLayer::new(session_store(&state).await?)
        .with_name(config.auth.cookie_name.clone())
        .with_secure(config.server.secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            config.auth.session_max_age_hours,
        )))
        .with_signed(session_key(&config)?);

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/status", get(auth::status))
        .route("/system/health/live", get(system::health_live))
        .route("/system/health/ready", get(system::health_ready))
        .layer(session_layer)
        .with_state(state);

    let cors_origins = &config.server.cors_allowed_origins;
    let cors_layer = if cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    // Outermost first
    Ok(Router::new().nest("/api", api_router).layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(observability::logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(
                observability::security_headers_middleware,
            ))
            .layer(cors_layer.allow_methods(Any).allow_headers(Any)),
    ))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/dashboard/actions", post(dashboard::dashboard_action))
        .route("/shows", post(shows::create_show))
        .route("/shows/manage", get(shows::list_manage))
        .route("/shows/manage/actions", post(shows::manage_action))
        .route("/shows/finished", get(shows::list_finished))
        .route("/shows/finished/actions", post(shows::finished_action))
        .route("/shows/{id}", get(shows::get_show))
        .route("/shows/{id}/cancel", post(shows::toggle_cancelled))
        .route(
            "/shows/{id}/watchers/actions",
            post(watchers::watcher_action),
        )
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/actions", post(admin::user_action))
        .route("/admin/platforms", get(admin::list_platforms))
        .route("/admin/platforms/actions", post(admin::platform_action))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
