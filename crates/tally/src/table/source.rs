use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::QuotaError;
use crate::table::quota::QuotaTable;
use crate::table::weight::{DEFAULT_PARTITION_WEIGHT, WeightTable};

/// Weight and quota tables used by a single evaluation.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub weights: WeightTable,
    pub quotas: QuotaTable,
}

/// Provides the tables for each evaluation.
///
/// Loading never fails: a table that cannot be read is logged and replaced by an empty one.
pub trait TableSource: Send + Sync {
    fn load_tables(&self) -> Arc<Tables>;
}

/// Re-reads both tables from disk on every evaluation.
#[derive(Debug, Clone)]
pub struct FileTableSource {
    weights_path: PathBuf,
    quotas_path: PathBuf,
    default_weight: f64,
}

impl FileTableSource {
    pub fn new(weights_path: PathBuf, quotas_path: PathBuf) -> Self {
        Self {
            weights_path,
            quotas_path,
            default_weight: DEFAULT_PARTITION_WEIGHT,
        }
    }

    pub fn with_default_weight(mut self, weight: f64) -> Self {
        self.default_weight = weight;
        self
    }

    pub fn weights_path(&self) -> &Path {
        &self.weights_path
    }

    pub fn quotas_path(&self) -> &Path {
        &self.quotas_path
    }
}

impl TableSource for FileTableSource {
    fn load_tables(&self) -> Arc<Tables> {
        let weights = read_table(&self.weights_path)
            .map(|text| WeightTable::load(&text))
            .unwrap_or_default()
            .with_default_weight(self.default_weight);
        let quotas = read_table(&self.quotas_path)
            .map(|text| QuotaTable::load(&text))
            .unwrap_or_default();

        log::debug!(
            "Loaded {} partition weight(s) from {} and {} account quota(s) from {}",
            weights.len(),
            self.weights_path.display(),
            quotas.len(),
            self.quotas_path.display()
        );
        Arc::new(Tables { weights, quotas })
    }
}

fn read_table(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            if text.trim().is_empty() {
                log::warn!("Configuration table {} is empty", path.display());
            }
            Some(text)
        }
        Err(error) => {
            let error = QuotaError::Configuration {
                path: path.to_path_buf(),
                message: error.to_string(),
            };
            log::warn!("{error}, continuing with an empty table");
            None
        }
    }
}

/// Keeps the tables loaded by the inner source until [`CachedTableSource::invalidate`] is called.
pub struct CachedTableSource<S> {
    inner: S,
    cached: RwLock<Option<Arc<Tables>>>,
}

impl<S: TableSource> CachedTableSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cached: RwLock::new(None),
        }
    }

    /// Drops the cached tables; the next evaluation reloads them from the inner source.
    pub fn invalidate(&self) {
        let mut cached = self.cached.write().unwrap_or_else(|e| e.into_inner());
        *cached = None;
    }
}

impl<S: TableSource> TableSource for CachedTableSource<S> {
    fn load_tables(&self) -> Arc<Tables> {
        if let Some(tables) = self
            .cached
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            return tables.clone();
        }

        let mut cached = self.cached.write().unwrap_or_else(|e| e.into_inner());
        // Another evaluation may have filled the cache while we waited for the lock
        cached
            .get_or_insert_with(|| self.inner.load_tables())
            .clone()
    }
}

/// Fixed tables, mostly useful for tests and for embedding the engine.
#[derive(Debug, Clone, Default)]
pub struct StaticTableSource {
    tables: Arc<Tables>,
}

impl StaticTableSource {
    pub fn new(weights: WeightTable, quotas: QuotaTable) -> Self {
        Self {
            tables: Arc::new(Tables { weights, quotas }),
        }
    }
}

impl TableSource for StaticTableSource {
    fn load_tables(&self) -> Arc<Tables> {
        self.tables.clone()
    }
}
