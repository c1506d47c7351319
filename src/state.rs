// ==============================================================================
// state.rs - Application State Management
// ==============================================================================
// Description: Shared application state for the analysis gateway
// ==============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::store::{MongoRecordStore, RecordStore};

/// Shared application state. The record store client is pooled, built once at
/// process start, and reused by every request; tests inject a fake store
/// through `with_store`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn RecordStore>,
}

impl AppState {
    /// Create application state from configuration, connecting to the store.
    pub async fn new(config: &Config) -> Result<Self> {
        let store = MongoRecordStore::connect(&config.mongo_url, &config.mongo_db)
            .await
            .context("Failed to connect to document store")?;
        Ok(Self::with_store(Arc::new(store)))
    }

    /// Create application state around an already-built store.
    pub fn with_store(store: Arc<dyn RecordStore>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner { store }),
        }
    }

    /// Get the record store.
    pub fn store(&self) -> &dyn RecordStore {
        self.inner.store.as_ref()
    }
}
