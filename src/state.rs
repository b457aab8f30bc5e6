use std::sync::Arc;

use devcamper_config::{
    CorsConfig, EmailConfig, GeocoderConfig, JwtConfig, QueryConfig, ServerConfig, StoreBackend,
};
use devcamper_core::query::CompileOptions;
use devcamper_db::{DocumentStore, MemoryStore, PgStore};
use tracing::info;

use crate::utils::geocoder::{Geocoder, geocoder_from_config};
use crate::utils::mailer::{Mailer, mailer_from_config};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub mailer: Arc<dyn Mailer>,
    pub geocoder: Arc<dyn Geocoder>,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub query_config: QueryConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cors_config", &self.cors_config)
            .field("query_config", &self.query_config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State with env-derived settings around explicit collaborators.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn Mailer>,
        geocoder: Arc<dyn Geocoder>,
        jwt_config: JwtConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            geocoder,
            jwt_config,
            cors_config: CorsConfig::from_env(),
            query_config: QueryConfig::default(),
        }
    }

    /// List compile options carrying the configured page sizes.
    pub fn list_options(&self) -> CompileOptions {
        CompileOptions::default()
            .with_default_limit(self.query_config.default_limit)
            .with_max_limit(self.query_config.max_limit)
    }

    pub fn with_query_config(mut self, query_config: QueryConfig) -> Self {
        self.query_config = query_config;
        self
    }
}

/// Opens the configured store, running migrations for PostgreSQL.
pub async fn connect_store(backend: &StoreBackend) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match backend {
        StoreBackend::Postgres { database_url } => {
            let store = PgStore::connect(database_url).await?;
            store.migrate().await?;
            info!("Connected to PostgreSQL document store");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("Using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub async fn init_app_state(server_config: &ServerConfig) -> anyhow::Result<AppState> {
    let store = connect_store(&server_config.store).await?;

    Ok(AppState {
        store,
        mailer: Arc::from(mailer_from_config(&EmailConfig::from_env())),
        geocoder: Arc::from(geocoder_from_config(&GeocoderConfig::from_env())),
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        query_config: QueryConfig::from_env(),
    })
}
