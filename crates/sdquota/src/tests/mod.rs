use std::path::{Path, PathBuf};
use std::sync::Arc;

use derive_builder::Builder;
use tally::tests::MemoryHistory;
use tally::{JobRecord, PartitionSet, PolicyEngine};
use tempfile::TempDir;

use crate::client::engine::build_engine;
use crate::common::config::{PolicyKind, QuotaConfig};

mod scenarios;

/// Weight and quota tables written into a temporary directory.
pub struct TablesDir {
    dir: TempDir,
    weights: PathBuf,
    quotas: PathBuf,
}

impl TablesDir {
    pub fn new(weights: &str, quotas: &str) -> Self {
        let dir = TempDir::with_prefix("sdquota").unwrap();
        let tables = Self {
            weights: dir.path().join("weights.csv"),
            quotas: dir.path().join("quotas.csv"),
            dir,
        };
        tables.write_weights(weights);
        tables.write_quotas(quotas);
        tables
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_weights(&self, text: &str) {
        std::fs::write(&self.weights, text).unwrap();
    }

    pub fn write_quotas(&self, text: &str) {
        std::fs::write(&self.quotas, text).unwrap();
    }

    pub fn config(&self) -> QuotaConfig {
        QuotaConfig {
            weights: self.weights.clone(),
            quotas: self.quotas.clone(),
            ..Default::default()
        }
    }
}

/// Policy engine reading on-disk tables, with an in-memory job history.
#[derive(Builder)]
#[builder(pattern = "owned", build_fn(name = "finish"))]
pub struct Scenario {
    #[builder(default = "\"cpu,1.0\\n\".to_string()", setter(into))]
    weights: String,
    #[builder(default = "\"alice,1000\\n\".to_string()", setter(into))]
    quotas: String,
    #[builder(default = "vec![\"cpu\".to_string(), \"cpu_low\".to_string()]")]
    partitions: Vec<String>,
    #[builder(default)]
    records: Vec<JobRecord>,
    #[builder(default)]
    policy: PolicyKind,
    #[builder(default)]
    cache_tables: bool,
}

impl ScenarioBuilder {
    pub fn build(self) -> (TablesDir, PolicyEngine) {
        let Scenario {
            weights,
            quotas,
            partitions,
            records,
            policy,
            cache_tables,
        } = self.finish().unwrap();

        let tables = TablesDir::new(&weights, &quotas);
        let config = QuotaConfig {
            policy,
            cache_tables,
            ..tables.config()
        };
        let engine = build_engine(
            &config,
            Arc::new(MemoryHistory::new(records)),
            Arc::new(PartitionSet::new(partitions)),
        );
        (tables, engine)
    }
}
