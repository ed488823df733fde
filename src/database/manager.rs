use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{DatabaseConfig, StoreBackend};
use crate::database::memory::MemoryStore;
use crate::database::postgres::PgDocumentStore;
use crate::database::store::{DocumentStore, StoreError};
use crate::database::timeout::TimeoutStore;

/// Errors raised while building the store at startup
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Builds the configured document store, wrapped in the per-operation timeout.
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
        let backend: Arc<dyn DocumentStore> = match config.backend {
            StoreBackend::Memory => {
                info!("Using in-memory document store");
                Arc::new(MemoryStore::new())
            }
            StoreBackend::Postgres => {
                let url = config.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(Duration::from_secs(config.connection_timeout))
                    .connect(url)
                    .await?;

                let store = PgDocumentStore::new(pool);
                store.bootstrap().await?;
                info!("Connected Postgres document store (max_connections={})", config.max_connections);
                Arc::new(store)
            }
        };

        Ok(Self::with_timeout(backend, config))
    }

    pub fn with_timeout(store: Arc<dyn DocumentStore>, config: &DatabaseConfig) -> Arc<dyn DocumentStore> {
        Arc::new(TimeoutStore::new(store, Duration::from_secs(config.operation_timeout_secs)))
    }
}
