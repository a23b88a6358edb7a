use std::sync::Arc;

use tracing::info;

use super::{StoreConnection, StoreError};
use crate::config::DatabaseConfig;

#[cfg(feature = "sqlite")]
use super::sqlite::SqliteStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Sqlite { path: String },
}

impl Backend {
    pub fn from_url(url: &str) -> Result<Self, StoreError> {
        if url == "sqlite::memory:" {
            return Ok(Backend::Sqlite {
                path: ":memory:".to_string(),
            });
        }
        if let Some(path) = url.strip_prefix("sqlite://") {
            if path.is_empty() {
                return Err(StoreError::Connection(
                    "sqlite url is missing a database path".to_string(),
                ));
            }
            return Ok(Backend::Sqlite {
                path: path.to_string(),
            });
        }
        Err(StoreError::Connection(format!(
            "unsupported database url: {url}"
        )))
    }
}

/// Opens the one connection shared by all callers. A single attempt is made.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn StoreConnection>, StoreError> {
    match Backend::from_url(&config.url)? {
        #[cfg(feature = "sqlite")]
        Backend::Sqlite { path } => {
            let store = tokio::task::spawn_blocking(move || SqliteStore::connect(&path))
                .await
                .map_err(|e| StoreError::Task(format!("connect task failed: {e}")))??;
            info!("connected to sqlite store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        Backend::Sqlite { .. } => Err(StoreError::Connection(
            "SQLite feature not enabled".to_string(),
        )),
    }
}
