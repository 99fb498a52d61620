use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AdminService, Argon2AuthService, AuthService, SeaOrmAdminService, SeaOrmShowService,
    SeaOrmWatchService, ShowService, WatchService,
};

/// Process-wide handles, built once at start-up.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub watch_service: Arc<dyn WatchService>,

    pub show_service: Arc<dyn ShowService>,

    pub admin_service: Arc<dyn AdminService>,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    /// Wires the services around an already opened store.
    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let auth_service = Arc::new(Argon2AuthService::from_config(
            &config.auth,
            &config.security,
        )?) as Arc<dyn AuthService + Send + Sync + 'static>;

        let watch_service = Arc::new(SeaOrmWatchService::new(store.clone()))
            as Arc<dyn WatchService + Send + Sync + 'static>;

        let show_service = Arc::new(SeaOrmShowService::new(
            store.clone(),
            config.general.page_size,
        )) as Arc<dyn ShowService + Send + Sync + 'static>;

        let admin_service = Arc::new(SeaOrmAdminService::new(store.clone()))
            as Arc<dyn AdminService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(config),
            store,
            watch_service,
            show_service,
            admin_service,
            auth_service,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
