//! Process-wide dataset cache.
//!
//! The dataset is loaded on first use and shared read-only between all
//! report builds until it is explicitly invalidated.

use super::{loader, DataSource, Dataset, LoadOptions};
use crate::error::LoadError;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Memoized loader for a single data source.
pub struct DatasetCache {
    source: DataSource,
    options: LoadOptions,
    slot: Mutex<Option<Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new(source: DataSource, options: LoadOptions) -> Self {
        Self {
            source,
            options,
            slot: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Shared dataset, loading it if nothing is cached.
    ///
    /// A failed load leaves the cache empty so the next call tries again.
    pub async fn get(&self) -> Result<Arc<Dataset>, LoadError> {
        let mut slot = self.slot.lock().await;

        if let Some(dataset) = &*slot {
            debug!("Using cached dataset from {}", self.source);
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(loader::load(&self.source, &self.options).await?);
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop the cached dataset; the next [`get`](Self::get) reloads it.
    pub async fn invalidate(&self) {
        debug!("Invalidating cached dataset from {}", self.source);
        *self.slot.lock().await = None;
    }
}
