use std::sync::Arc;

use tally::{
    CachedTableSource, FileTableSource, JobHistory, PartitionRegistry, PartitionSet,
    PolicyEngine, TableSource, UsageAccountant,
};

use crate::accounting::{SacctHistory, load_partitions};
use crate::common::config::{PolicyKind, QuotaConfig};

/// Table source of an engine built from `config`.
///
/// With `cache-tables`, the tables are read by the first evaluation of the engine and kept for
/// its lifetime. Each `sdquota` invocation builds a new engine, so the cache only pays off when
/// one engine serves many evaluations (an embedding process, not the CLI).
pub fn create_table_source(config: &QuotaConfig) -> Arc<dyn TableSource> {
    let source = FileTableSource::new(config.weights.clone(), config.quotas.clone())
        .with_default_weight(config.default_weight);
    if config.cache_tables {
        Arc::new(CachedTableSource::new(source))
    } else {
        Arc::new(source)
    }
}

pub fn create_accountant(config: &QuotaConfig, history: Arc<dyn JobHistory>) -> UsageAccountant {
    UsageAccountant::new(history)
        .with_timeout(config.query_timeout)
        .with_retries(config.query_retries)
}

pub fn build_engine(
    config: &QuotaConfig,
    history: Arc<dyn JobHistory>,
    partitions: Arc<dyn PartitionRegistry>,
) -> PolicyEngine {
    PolicyEngine::new(
        config.engine_config(),
        create_table_source(config),
        create_accountant(config, history),
        partitions,
    )
}

/// Partitions known to Slurm. Priority demotion never switches partitions, so the
/// controller is not asked in that case.
///
/// `scontrol` is bounded by the same timeout as the job history query.
pub async fn load_partition_registry(
    config: &QuotaConfig,
) -> anyhow::Result<Arc<dyn PartitionRegistry>> {
    match config.policy {
        PolicyKind::Partition => {
            let partitions = load_partitions("scontrol", config.query_timeout).await?;
            Ok(Arc::new(partitions))
        }
        PolicyKind::Priority => Ok(Arc::new(PartitionSet::default())),
    }
}

/// Engine backed by `sacct` and `scontrol`.
pub async fn create_slurm_engine(config: &QuotaConfig) -> anyhow::Result<PolicyEngine> {
    let partitions = load_partition_registry(config).await?;
    Ok(build_engine(
        config,
        Arc::new(SacctHistory::default()),
        partitions,
    ))
}
