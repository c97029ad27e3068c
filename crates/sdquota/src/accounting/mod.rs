//! Slurm implementations of the collaborators needed by the policy engine.
//!
//! The job history is read with `sacct` (which talks to slurmdbd) and the partition registry
//! with `scontrol`.

use std::process::Output;
use std::time::Duration;

use anyhow::Context;
use bstr::ByteSlice;
use futures::FutureExt;
use futures::future::BoxFuture;
use tally::{HistoryError, HistoryQuery, JobHistory, JobRecord, PartitionSet};
use tokio::process::Command;

use crate::common::slurm::{
    SACCT_FORMAT, format_slurm_datetime, parse_partition_names, parse_sacct_output,
};

pub fn create_command(program: &str, arguments: &[String]) -> Command {
    let mut command = Command::new(program);
    command.args(arguments);
    // The query can be abandoned on timeout, do not leave the process behind
    command.kill_on_drop(true);
    command
}

pub fn check_command_output(output: Output) -> anyhow::Result<Output> {
    let status = output.status;
    if !status.success() {
        return Err(anyhow::anyhow!(
            "Exit code: {}\nStderr: {}\nStdout: {}",
            status.code().unwrap_or(-1),
            output.stderr.to_str_lossy().trim(),
            output.stdout.to_str_lossy().trim()
        ));
    }
    Ok(output)
}

/// Job history read from the Slurm accounting database through `sacct`.
pub struct SacctHistory {
    program: String,
}

impl Default for SacctHistory {
    fn default() -> Self {
        Self::new("sacct")
    }
}

impl SacctHistory {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

pub fn build_sacct_arguments(query: &HistoryQuery) -> Vec<String> {
    let mut arguments = vec![
        "--allusers".to_string(),
        "--allocations".to_string(),
        "--noheader".to_string(),
        "--parsable2".to_string(),
        format!("--accounts={}", query.account),
    ];
    if !query.partitions.is_empty() {
        arguments.push(format!("--partition={}", query.partitions.join(",")));
    }
    arguments.push(format!(
        "--starttime={}",
        format_slurm_datetime(&query.window.start)
    ));
    arguments.push(format!(
        "--endtime={}",
        format_slurm_datetime(&query.window.end)
    ));
    arguments.push(format!("--format={SACCT_FORMAT}"));
    arguments
}

impl JobHistory for SacctHistory {
    fn query_jobs<'a>(
        &'a self,
        query: &'a HistoryQuery,
    ) -> BoxFuture<'a, Result<Vec<JobRecord>, HistoryError>> {
        async move {
            let arguments = build_sacct_arguments(query);
            log::debug!(
                "Running Slurm command `{} {}`",
                self.program,
                arguments.join(" ")
            );

            let output = create_command(&self.program, &arguments)
                .output()
                .await
                .with_context(|| format!("{} start failed", self.program))
                .and_then(|output| {
                    check_command_output(output)
                        .with_context(|| format!("{} execution failed", self.program))
                })
                .map_err(|error| HistoryError::Connection(format!("{error:#}")))?;
            let stdout = output.stdout.to_str().map_err(|error| {
                HistoryError::Query(format!("Invalid UTF-8 in sacct output: {error:?}"))
            })?;

            let records = parse_sacct_output(stdout);
            log::debug!(
                "sacct returned {} finished job(s) for account {}",
                records.len(),
                query.account
            );
            Ok(records)
        }
        .boxed()
    }
}

/// Runs `program` and waits at most `timeout` for it to finish. A command that times out is
/// killed.
pub async fn run_command(
    program: &str,
    arguments: &[String],
    timeout: Duration,
) -> anyhow::Result<Output> {
    log::debug!("Running Slurm command `{program} {}`", arguments.join(" "));

    let output = tokio::time::timeout(timeout, create_command(program, arguments).output())
        .await
        .map_err(|_| {
            anyhow::anyhow!(
                "{program} did not finish within {}",
                humantime::format_duration(timeout)
            )
        })?
        .with_context(|| format!("{program} start failed"))?;
    check_command_output(output).with_context(|| format!("{program} execution failed"))
}

/// Loads the names of all partitions known to the Slurm controller.
pub async fn load_partitions(program: &str, timeout: Duration) -> anyhow::Result<PartitionSet> {
    let arguments = vec![
        "show".to_string(),
        "partition".to_string(),
        "--oneliner".to_string(),
    ];
    let output = run_command(program, &arguments, timeout).await?;
    let output = output
        .stdout
        .to_str()
        .map_err(|err| anyhow::anyhow!("Invalid UTF-8 in {program} output: {:?}", err))?;

    let partitions = parse_partition_names(output);
    log::debug!("Known partitions: {}", partitions.join(", "));
    Ok(PartitionSet::new(partitions))
}
