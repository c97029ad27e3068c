use clap::Parser;
use tally::{JobId, JobRequest, Outcome, PolicyEngine, Priority};

use crate::client::commands::CommandStatus;
use crate::client::engine::create_slurm_engine;
use crate::client::globalsettings::GlobalSettings;

#[derive(Parser)]
pub struct EvaluateOpts {
    /// Slurm ID of the job
    #[arg(long)]
    pub job_id: JobId,

    /// Account charged for the job
    #[arg(long)]
    pub account: String,

    /// Partition requested by the job
    #[arg(long)]
    pub partition: String,

    /// Current priority of the job
    #[arg(long, default_value_t = 0)]
    pub priority: Priority,
}

impl From<EvaluateOpts> for JobRequest {
    fn from(opts: EvaluateOpts) -> Self {
        JobRequest {
            job_id: opts.job_id,
            account: opts.account,
            partition: opts.partition,
            priority: opts.priority,
        }
    }
}

/// Scheduler event that triggered the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEvent {
    Submit,
    Modify,
}

pub async fn command_evaluate(
    gsettings: &GlobalSettings,
    opts: EvaluateOpts,
    event: JobEvent,
) -> anyhow::Result<CommandStatus> {
    let config = gsettings.load_config()?;
    let engine = create_slurm_engine(&config).await?;

    let mut job = JobRequest::from(opts);
    let outcome = evaluate_job(&engine, &mut job, event).await;
    gsettings.printer().print_outcome(&job, &outcome);
    Ok(CommandStatus::from(&outcome))
}

pub async fn evaluate_job(engine: &PolicyEngine, job: &mut JobRequest, event: JobEvent) -> Outcome {
    match event {
        JobEvent::Submit => engine.on_submit(job).await,
        JobEvent::Modify => engine.on_modify(job).await,
    }
}
