use tally::{JobRequest, Outcome, Tables};

use crate::client::commands::usage::UsageReport;

#[derive(clap::ValueEnum, Clone)]
pub enum Outputs {
    CLI,
    JSON,
}

pub trait Output {
    // Evaluation of a submitted or modified job
    fn print_outcome(&self, job: &JobRequest, outcome: &Outcome);

    // Accounting
    fn print_usage(&self, report: &UsageReport);
    fn print_tables(&self, tables: &Tables);

    fn print_error(&self, error: anyhow::Error);
}
