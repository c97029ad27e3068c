use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::engine::JobRequest;
use crate::usage::{HistoryError, HistoryQuery, JobHistory, JobRecord};
use crate::{JobId, Priority};

pub fn record(
    job_id: JobId,
    account: &str,
    partition: &str,
    cpu_seconds: u64,
    end_time: DateTime<Utc>,
) -> JobRecord {
    JobRecord {
        job_id,
        account: account.to_string(),
        partition: partition.to_string(),
        cpu_seconds,
        end_time,
    }
}

#[derive(Builder)]
#[builder(pattern = "owned", build_fn(name = "finish"))]
pub struct Job {
    #[builder(default = "1")]
    job_id: JobId,
    #[builder(default = "\"alice\".to_string()", setter(into))]
    account: String,
    #[builder(default = "\"cpu\".to_string()", setter(into))]
    partition: String,
    #[builder(default = "10")]
    priority: Priority,
}

impl JobBuilder {
    pub fn build(self) -> JobRequest {
        let Job {
            job_id,
            account,
            partition,
            priority,
        } = self.finish().unwrap();
        JobRequest {
            job_id,
            account,
            partition,
            priority,
        }
    }
}

/// Job history that answers queries from a fixed list of records.
///
/// Every received query is remembered and can be inspected with [`MemoryHistory::queries`].
#[derive(Default)]
pub struct MemoryHistory {
    records: Vec<JobRecord>,
    failure: Option<HistoryError>,
    fail_first: usize,
    delay: Option<Duration>,
    ignore_query: bool,
    queries: Mutex<Vec<HistoryQuery>>,
}

impl MemoryHistory {
    pub fn new(records: Vec<JobRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// History whose every query fails with `error`.
    pub fn failing(error: HistoryError) -> Self {
        Self {
            failure: Some(error),
            ..Default::default()
        }
    }

    /// The first `count` queries fail with a connection error.
    pub fn fail_first(mut self, count: usize) -> Self {
        self.fail_first = count;
        self
    }

    /// Each query takes `delay` before it answers.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Return all records regardless of the query, like a misbehaving backend would.
    pub fn unfiltered(mut self) -> Self {
        self.ignore_query = true;
        self
    }

    pub fn queries(&self) -> Vec<HistoryQuery> {
        self.queries.lock().unwrap().clone()
    }
}

impl JobHistory for MemoryHistory {
    fn query_jobs<'a>(
        &'a self,
        query: &'a HistoryQuery,
    ) -> BoxFuture<'a, Result<Vec<JobRecord>, HistoryError>> {
        async move {
            let attempt = {
                let mut queries = self.queries.lock().unwrap();
                queries.push(query.clone());
                queries.len()
            };
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if attempt <= self.fail_first {
                return Err(HistoryError::Connection(format!(
                    "attempt {attempt} failed"
                )));
            }
            if let Some(error) = &self.failure {
                return Err(error.clone());
            }
            if self.ignore_query {
                return Ok(self.records.clone());
            }
            Ok(self
                .records
                .iter()
                .filter(|r| r.account == query.account)
                .filter(|r| query.partitions.is_empty() || query.partitions.contains(&r.partition))
                .filter(|r| query.window.contains(&r.end_time))
                .cloned()
                .collect())
        }
        .boxed()
    }
}
