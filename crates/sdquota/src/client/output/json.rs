use std::collections::BTreeMap;

use serde_json::{Value, json};
use tally::{EvaluationState, JobRequest, Outcome, Tables};

use crate::client::commands::usage::UsageReport;
use crate::client::output::outputs::Output;

#[derive(Default)]
pub struct JsonOutput;

impl JsonOutput {
    fn print(&self, data: Value) {
        println!("{data:#}");
    }
}

impl Output for JsonOutput {
    fn print_outcome(&self, job: &JobRequest, outcome: &Outcome) {
        self.print(format_outcome(job, outcome));
    }

    fn print_usage(&self, report: &UsageReport) {
        self.print(json!({
            "report": report,
            "over_quota": report.is_over_quota(),
        }));
    }

    fn print_tables(&self, tables: &Tables) {
        self.print(format_tables(tables));
    }

    fn print_error(&self, error: anyhow::Error) {
        self.print(json!({
            "error": format!("{error:?}")
        }));
    }
}

fn format_outcome(job: &JobRequest, outcome: &Outcome) -> Value {
    json!({
        "job": job,
        "state": EvaluationState::from(outcome),
        "outcome": outcome,
    })
}

fn format_tables(tables: &Tables) -> Value {
    let weights: BTreeMap<&str, f64> = tables.weights.iter().collect();
    let quotas: BTreeMap<&str, u64> = tables.quotas.entries().into_iter().collect();
    json!({
        "weights": weights,
        "default_weight": tables.weights.default_weight(),
        "quotas": quotas,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tally::{Demotion, JobRequest, Outcome, QuotaTable, Tables, WeightTable};

    use super::{format_outcome, format_tables};

    #[test]
    fn test_outcome_json() {
        let job = JobRequest {
            job_id: 7,
            account: "alice".to_string(),
            partition: "cpu_low".to_string(),
            priority: 10,
        };
        let outcome = Outcome::Demoted(Demotion::Partition {
            from: "cpu".to_string(),
            to: "cpu_low".to_string(),
        });
        assert_eq!(
            format_outcome(&job, &outcome),
            json!({
                "job": {"job_id": 7, "account": "alice", "partition": "cpu_low", "priority": 10},
                "state": "Demoted",
                "outcome": {"Demoted": {"Partition": {"from": "cpu", "to": "cpu_low"}}}
            })
        );
    }

    #[test]
    fn test_tables_json() {
        let tables = Tables {
            weights: WeightTable::from_entries([("gpu", 2.5), ("cpu", 1.0)]),
            quotas: QuotaTable::from_entries([("alice", 1000)]),
        };
        assert_eq!(
            format_tables(&tables),
            json!({
                "weights": {"cpu": 1.0, "gpu": 2.5},
                "default_weight": 1.0,
                "quotas": {"alice": 1000}
            })
        );
    }
}
