//! Decides what happens with a job once the usage and the quota of its account are known.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::common::Set;
use crate::engine::JobRequest;
use crate::Priority;

/// Partitions named `<partition><suffix>` are the lower-priority twins of `<partition>`.
pub const DEFAULT_DEMOTION_SUFFIX: &str = "_low";

/// How an over-quota job is demoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemotionPolicy {
    /// Move the job to the lower-priority twin of its partition.
    /// Jobs without such a twin are rejected.
    SwitchPartition { suffix: String },
    /// Halve the priority of the job. Never rejects.
    HalvePriority,
}

impl Default for DemotionPolicy {
    fn default() -> Self {
        Self::SwitchPartition {
            suffix: DEFAULT_DEMOTION_SUFFIX.to_string(),
        }
    }
}

/// Scheduler partition registry.
pub trait PartitionRegistry: Send + Sync {
    fn exists(&self, partition: &str) -> bool;
}

/// Registry backed by a snapshot of partition names.
#[derive(Debug, Clone, Default)]
pub struct PartitionSet {
    partitions: Set<String>,
}

impl PartitionSet {
    pub fn new<I, S>(partitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            partitions: partitions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

impl PartitionRegistry for PartitionSet {
    fn exists(&self, partition: &str) -> bool {
        self.partitions.contains(partition)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The lower-priority twin of the job's partition does not exist.
    NoEquivalentPartition {
        partition: String,
        candidate: String,
    },
    /// The job already runs in a lower-priority partition and cannot be demoted further.
    AlreadyLowestTier { partition: String },
    /// Usage of the account could not be determined.
    UsageUnknown { account: String, message: String },
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NoEquivalentPartition {
                partition,
                candidate,
            } => write!(
                f,
                "account is over quota and there is no lower priority partition equivalent to {partition} ({candidate} does not exist)"
            ),
            RejectReason::AlreadyLowestTier { partition } => write!(
                f,
                "account is over quota and partition {partition} already has the lowest priority"
            ),
            RejectReason::UsageUnknown { account, message } => write!(
                f,
                "usage of account {account} could not be determined: {message}"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    NoOp,
    SwitchPartition(String),
    ReducePriority(Priority),
    Reject(RejectReason),
}

/// Name of the lower-priority twin of `partition`.
///
/// Returns `None` if `partition` is already a lower-priority partition, demotion is never
/// chained (`cpu_low` is not demoted to `cpu_low_low`).
pub fn demotion_target(partition: &str, suffix: &str) -> Option<String> {
    if suffix.is_empty() || partition.ends_with(suffix) {
        None
    } else {
        Some(format!("{partition}{suffix}"))
    }
}

/// Chooses the action for `job`. An account is over quota only when `usage > quota`.
pub fn decide(
    usage: u64,
    quota: u64,
    job: &JobRequest,
    policy: &DemotionPolicy,
    registry: &dyn PartitionRegistry,
) -> Action {
    if usage <= quota {
        return Action::NoOp;
    }
    demote(job, policy, registry)
}

/// Action applied to a job whose account is (or has to be treated as) over quota.
pub(crate) fn demote(
    job: &JobRequest,
    policy: &DemotionPolicy,
    registry: &dyn PartitionRegistry,
) -> Action {
    match policy {
        DemotionPolicy::HalvePriority => Action::ReducePriority(job.priority / 2),
        DemotionPolicy::SwitchPartition { suffix } => {
            match demotion_target(&job.partition, suffix) {
                None => Action::Reject(RejectReason::AlreadyLowestTier {
                    partition: job.partition.clone(),
                }),
                Some(candidate) if registry.exists(&candidate) => {
                    Action::SwitchPartition(candidate)
                }
                Some(candidate) => Action::Reject(RejectReason::NoEquivalentPartition {
                    partition: job.partition.clone(),
                    candidate,
                }),
            }
        }
    }
}
