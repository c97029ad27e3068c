//! Weighted CPU usage of an account over a trailing time window.

mod window;

pub use window::{USAGE_WINDOW_SECONDS, UsageWindow};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::weight::WeightTable;
use crate::{JobId, QuotaError};

/// Default bound on a single history query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of additional attempts after a connection failure.
pub const DEFAULT_QUERY_RETRIES: u32 = 1;

/// A query is never attempted more than `1 + MAX_QUERY_RETRIES` times.
pub const MAX_QUERY_RETRIES: u32 = 1;

/// A finished job, as recorded by the accounting backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub account: String,
    pub partition: String,
    pub cpu_seconds: u64,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub account: String,
    /// Only jobs that ran in one of these partitions are returned.
    /// An empty list does not filter by partition at all.
    pub partitions: Vec<String>,
    pub window: UsageWindow,
}

#[derive(Debug, Clone, Error)]
pub enum HistoryError {
    /// The backend could not be reached. The query may succeed if repeated.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The backend answered, but the answer cannot be used.
    #[error("query failed: {0}")]
    Query(String),
}

/// Job-history collaborator of the accounting backend.
pub trait JobHistory: Send + Sync {
    /// Returns all jobs of `query.account` that ended inside `query.window`.
    fn query_jobs<'a>(
        &'a self,
        query: &'a HistoryQuery,
    ) -> BoxFuture<'a, Result<Vec<JobRecord>, HistoryError>>;
}

/// Computes the weighted usage of accounts from the job history.
#[derive(Clone)]
pub struct UsageAccountant {
    history: Arc<dyn JobHistory>,
    timeout: Duration,
    retries: u32,
}

impl UsageAccountant {
    pub fn new(history: Arc<dyn JobHistory>) -> Self {
        Self {
            history,
            timeout: DEFAULT_QUERY_TIMEOUT,
            retries: DEFAULT_QUERY_RETRIES,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Values above [`MAX_QUERY_RETRIES`] are clamped.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.min(MAX_QUERY_RETRIES);
        self
    }

    /// Sum of `cpu_seconds * weight(partition)` over all jobs of `account` that ended within
    /// `window`, truncated to whole seconds.
    ///
    /// The history is queried only for partitions listed in `weights`; if the table is empty,
    /// all partitions are queried and weighted with the default weight.
    pub async fn weighted_usage(
        &self,
        account: &str,
        weights: &WeightTable,
        window: &UsageWindow,
    ) -> crate::Result<u64> {
        let query = HistoryQuery {
            account: account.to_string(),
            partitions: weights.partitions(),
            window: window.clone(),
        };
        let records = self.query_with_retries(&query).await?;

        let mut usage = 0.0;
        let mut counted = 0;
        for record in &records {
            if record.account != account || !window.contains(&record.end_time) {
                log::debug!(
                    "Ignoring job {} of account {} outside of the usage query",
                    record.job_id,
                    record.account
                );
                continue;
            }
            usage += record.cpu_seconds as f64 * weights.weight_of(&record.partition);
            counted += 1;
        }

        let usage = usage as u64;
        log::debug!("Account {account} used {usage} weighted CPU-seconds in {counted} job(s)");
        Ok(usage)
    }

    async fn query_with_retries(&self, query: &HistoryQuery) -> crate::Result<Vec<JobRecord>> {
        let mut attempt = 0;
        loop {
            let error = match tokio::time::timeout(self.timeout, self.history.query_jobs(query))
                .await
            {
                Ok(Ok(records)) => return Ok(records),
                Ok(Err(HistoryError::Query(message))) => {
                    return Err(QuotaError::BackendUnavailable(message));
                }
                Ok(Err(HistoryError::Connection(message))) => message,
                Err(_) => format!(
                    "job history query timed out after {}",
                    humanize(self.timeout)
                ),
            };

            if attempt >= self.retries {
                return Err(QuotaError::BackendUnavailable(error));
            }
            attempt += 1;
            log::warn!(
                "Job history query for account {} failed ({error}), retrying ({attempt}/{})",
                query.account,
                self.retries
            );
        }
    }
}

fn humanize(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
