//! Usage-quota accounting and demotion decisions for batch job admission.
//!
//! Before a job is admitted, [`engine::PolicyEngine`] computes how much weighted CPU time the
//! job's account consumed over a trailing window, compares it with the account's quota and,
//! when the account is over quota, demotes the job instead of rejecting it outright.

pub mod common;
pub mod decision;
pub mod engine;
pub mod table;
pub mod usage;

pub mod tests;

pub use crate::common::error::{MalformedRecord, QuotaError};
pub use crate::common::{Map, Set};

pub use crate::decision::{
    Action, DemotionPolicy, PartitionRegistry, PartitionSet, RejectReason, decide,
    demotion_target,
};
pub use crate::engine::{
    BackendFailurePolicy, Demotion, EngineConfig, EvaluationState, JobRequest, Outcome,
    PolicyEngine,
};
pub use crate::table::quota::QuotaTable;
pub use crate::table::source::{
    CachedTableSource, FileTableSource, StaticTableSource, TableSource, Tables,
};
pub use crate::table::weight::WeightTable;
pub use crate::usage::{
    HistoryError, HistoryQuery, JobHistory, JobRecord, USAGE_WINDOW_SECONDS, UsageAccountant,
    UsageWindow,
};

pub type Error = QuotaError;
pub type Result<T> = std::result::Result<T, Error>;

/// Slurm job identifier.
pub type JobId = u32;

// Priority: Bigger number -> Higher priority
pub type Priority = u32;

/// Name under which decisions are reported in the operator log.
pub const PLUGIN_NAME: &str = "job_submit/sdquota";
