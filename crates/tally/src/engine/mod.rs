//! Admission-time quota check of a single job.
//!
//! Each evaluation runs strictly in order: load tables, compute the weighted usage of the
//! job's account, look up its quota, decide and apply the decision to the request. The
//! engine keeps no state between evaluations, so one instance can serve concurrent
//! evaluations of unrelated jobs.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decision::{Action, DemotionPolicy, PartitionRegistry, RejectReason, decide, demote};
use crate::table::source::TableSource;
use crate::usage::{USAGE_WINDOW_SECONDS, UsageAccountant, UsageWindow};
use crate::{JobId, PLUGIN_NAME, Priority};

/// Fields of a submitted (or modified) job that take part in the quota check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_id: JobId,
    pub account: String,
    pub partition: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Demotion {
    Partition { from: String, to: String },
    Priority { from: Priority, to: Priority },
}

impl Display for Demotion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Demotion::Partition { from, to } => write!(f, "partition {from} -> {to}"),
            Demotion::Priority { from, to } => write!(f, "priority {from} -> {to}"),
        }
    }
}

/// Result of one evaluation, reported back to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The job is admitted unchanged.
    Admitted,
    /// The job is admitted with a lower priority.
    Demoted(Demotion),
    /// The job must not be admitted. The request was left unmodified.
    Rejected { reason: RejectReason },
}

impl Outcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected { .. })
    }
}

/// Progress of a single evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluationState {
    Start,
    Evaluated,
    Admitted,
    Demoted,
    Rejected,
}

impl From<&Outcome> for EvaluationState {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Admitted => EvaluationState::Admitted,
            Outcome::Demoted(_) => EvaluationState::Demoted,
            Outcome::Rejected { .. } => EvaluationState::Rejected,
        }
    }
}

/// What to do when the usage of an account cannot be determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendFailurePolicy {
    /// Reject the job.
    #[default]
    Reject,
    /// Demote the job as if its account was over quota.
    Demote,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub policy: DemotionPolicy,
    pub window: Duration,
    pub on_backend_failure: BackendFailurePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: DemotionPolicy::default(),
            window: Duration::from_secs(USAGE_WINDOW_SECONDS),
            on_backend_failure: BackendFailurePolicy::default(),
        }
    }
}

pub struct PolicyEngine {
    config: EngineConfig,
    tables: Arc<dyn TableSource>,
    accountant: UsageAccountant,
    partitions: Arc<dyn PartitionRegistry>,
}

impl PolicyEngine {
    pub fn new(
        config: EngineConfig,
        tables: Arc<dyn TableSource>,
        accountant: UsageAccountant,
        partitions: Arc<dyn PartitionRegistry>,
    ) -> Self {
        Self {
            config,
            tables,
            accountant,
            partitions,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Checks a newly submitted job and demotes it in place if its account is over quota.
    pub async fn on_submit(&self, job: &mut JobRequest) -> Outcome {
        let outcome = self.evaluate(job).await;
        log::debug!(
            "Job {} evaluation: {:?} -> {:?}",
            job.job_id,
            EvaluationState::Evaluated,
            EvaluationState::from(&outcome)
        );
        outcome
    }

    /// Modifications of a job go through the same check as a submission.
    pub async fn on_modify(&self, job: &mut JobRequest) -> Outcome {
        self.on_submit(job).await
    }

    async fn evaluate(&self, job: &mut JobRequest) -> Outcome {
        log::debug!("Job {} evaluation: {:?}", job.job_id, EvaluationState::Start);

        let tables = self.tables.load_tables();
        let window = UsageWindow::trailing(self.config.window);
        let usage = self
            .accountant
            .weighted_usage(&job.account, &tables.weights, &window)
            .await;
        let quota = tables.quotas.quota_of(&job.account);

        let action = match usage {
            Ok(usage) => {
                let action = decide(
                    usage,
                    quota,
                    job,
                    &self.config.policy,
                    self.partitions.as_ref(),
                );
                if action != Action::NoOp {
                    log::info!(
                        "{PLUGIN_NAME}: account {} exceeded its quota ({usage} > {quota})",
                        job.account
                    );
                }
                action
            }
            Err(error) => {
                log::error!(
                    "{PLUGIN_NAME}: cannot determine usage of account {} for job {}: {error}",
                    job.account,
                    job.job_id
                );
                match self.config.on_backend_failure {
                    BackendFailurePolicy::Reject => Action::Reject(RejectReason::UsageUnknown {
                        account: job.account.clone(),
                        message: error.to_string(),
                    }),
                    BackendFailurePolicy::Demote => {
                        demote(job, &self.config.policy, self.partitions.as_ref())
                    }
                }
            }
        };
        apply_action(job, action)
    }
}

/// Mutates at most one field of `job` according to `action`.
fn apply_action(job: &mut JobRequest, action: Action) -> Outcome {
    match action {
        Action::NoOp => Outcome::Admitted,
        Action::SwitchPartition(partition) => {
            log::info!(
                "{PLUGIN_NAME}: changing partition of job {} to reduce its priority ({} -> {})",
                job.job_id,
                job.partition,
                partition
            );
            let from = std::mem::replace(&mut job.partition, partition.clone());
            Outcome::Demoted(Demotion::Partition {
                from,
                to: partition,
            })
        }
        Action::ReducePriority(priority) => {
            log::info!(
                "{PLUGIN_NAME}: reducing priority of job {} ({} -> {})",
                job.job_id,
                job.priority,
                priority
            );
            let from = std::mem::replace(&mut job.priority, priority);
            Outcome::Demoted(Demotion::Priority { from, to: priority })
        }
        Action::Reject(reason) => {
            log::error!("{PLUGIN_NAME}: rejecting job {}: {reason}", job.job_id);
            Outcome::Rejected { reason }
        }
    }
}
