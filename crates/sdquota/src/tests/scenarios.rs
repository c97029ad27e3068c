use std::sync::Arc;

use chrono::{Duration, Utc};
use tally::tests::{JobBuilder, MemoryHistory, record};
use tally::{Demotion, JobRecord, Outcome, PartitionSet, RejectReason};

use crate::client::commands::CommandStatus;
use crate::client::commands::evaluate::{JobEvent, evaluate_job};
use crate::client::engine::build_engine;
use crate::common::config::{PolicyKind, QuotaConfig};
use crate::tests::{ScenarioBuilder, TablesDir};

fn alice_jobs(count: u32, cpu_seconds: u64) -> Vec<JobRecord> {
    (0..count)
        .map(|id| record(id, "alice", "cpu", cpu_seconds, Utc::now()))
        .collect()
}

#[tokio::test]
async fn over_quota_job_moves_to_low_partition() {
    let (_tables, engine) = ScenarioBuilder::default()
        .records(alice_jobs(3, 400))
        .build();

    let mut job = JobBuilder::default().job_id(42).priority(100).build();
    let outcome = evaluate_job(&engine, &mut job, JobEvent::Submit).await;
    assert_eq!(
        outcome,
        Outcome::Demoted(Demotion::Partition {
            from: "cpu".to_string(),
            to: "cpu_low".to_string()
        })
    );
    assert_eq!(job.partition, "cpu_low");
    assert_eq!(job.priority, 100);
    assert_eq!(CommandStatus::from(&outcome), CommandStatus::Success);
}

#[tokio::test]
async fn over_quota_job_without_low_partition_is_rejected() {
    let (_tables, engine) = ScenarioBuilder::default()
        .records(alice_jobs(3, 400))
        .partitions(vec!["cpu".to_string()])
        .build();

    let mut job = JobBuilder::default().build();
    let outcome = evaluate_job(&engine, &mut job, JobEvent::Submit).await;
    assert_eq!(
        outcome,
        Outcome::Rejected {
            reason: RejectReason::NoEquivalentPartition {
                partition: "cpu".to_string(),
                candidate: "cpu_low".to_string()
            }
        }
    );
    assert_eq!(job.partition, "cpu");
    assert_eq!(CommandStatus::from(&outcome).exit_code(), 1);
}

#[tokio::test]
async fn under_quota_job_is_admitted() {
    let (_tables, engine) = ScenarioBuilder::default()
        .records(alice_jobs(2, 400))
        .build();

    let mut job = JobBuilder::default().build();
    let outcome = evaluate_job(&engine, &mut job, JobEvent::Modify).await;
    assert_eq!(outcome, Outcome::Admitted);
    assert_eq!(CommandStatus::from(&outcome).exit_code(), 0);
}

#[tokio::test]
async fn account_missing_from_quota_table_is_demoted() {
    let (_tables, engine) = ScenarioBuilder::default()
        .records(vec![record(1, "bob", "cpu", 1, Utc::now())])
        .build();

    let mut job = JobBuilder::default().account("bob").build();
    let outcome = evaluate_job(&engine, &mut job, JobEvent::Submit).await;
    assert!(matches!(outcome, Outcome::Demoted(_)));
    assert_eq!(job.partition, "cpu_low");
}

#[tokio::test]
async fn old_jobs_do_not_count() {
    let old = Utc::now() - Duration::days(31);
    let (_tables, engine) = ScenarioBuilder::default()
        .records(vec![record(1, "alice", "cpu", 5000, old)])
        .build();

    let mut job = JobBuilder::default().build();
    assert_eq!(
        evaluate_job(&engine, &mut job, JobEvent::Submit).await,
        Outcome::Admitted
    );
}

#[tokio::test]
async fn weights_scale_usage() {
    let (_tables, engine) = ScenarioBuilder::default()
        .weights("cpu,1.0\ngpu,4.0\n")
        .records(vec![record(1, "alice", "gpu", 300, Utc::now())])
        .partitions(vec!["gpu".to_string(), "gpu_low".to_string()])
        .build();

    let mut job = JobBuilder::default().partition("gpu").build();
    let outcome = evaluate_job(&engine, &mut job, JobEvent::Submit).await;
    assert!(matches!(outcome, Outcome::Demoted(_)));
    assert_eq!(job.partition, "gpu_low");
}

#[tokio::test]
async fn malformed_table_lines_are_skipped() {
    let (_tables, engine) = ScenarioBuilder::default()
        .quotas("# account,quota\nalice\nalice,2000\nbob,lots\n")
        .records(alice_jobs(3, 400))
        .build();

    let mut job = JobBuilder::default().build();
    assert_eq!(
        evaluate_job(&engine, &mut job, JobEvent::Submit).await,
        Outcome::Admitted
    );
}

#[tokio::test]
async fn priority_policy_halves_priority() {
    let (_tables, engine) = ScenarioBuilder::default()
        .records(alice_jobs(3, 400))
        .partitions(vec![])
        .policy(PolicyKind::Priority)
        .build();

    let mut job = JobBuilder::default().priority(3).build();
    let outcome = evaluate_job(&engine, &mut job, JobEvent::Submit).await;
    assert_eq!(
        outcome,
        Outcome::Demoted(Demotion::Priority { from: 3, to: 1 })
    );
    assert_eq!(job.partition, "cpu");
}

#[tokio::test]
async fn tables_are_reloaded_for_every_job() {
    let (tables, engine) = ScenarioBuilder::default()
        .records(alice_jobs(3, 400))
        .build();

    let mut job = JobBuilder::default().build();
    assert!(matches!(
        evaluate_job(&engine, &mut job, JobEvent::Submit).await,
        Outcome::Demoted(_)
    ));

    tables.write_quotas("alice,5000\n");
    let mut job = JobBuilder::default().build();
    assert_eq!(
        evaluate_job(&engine, &mut job, JobEvent::Submit).await,
        Outcome::Admitted
    );
}

#[tokio::test]
async fn cached_tables_are_not_reloaded() {
    let (tables, engine) = ScenarioBuilder::default()
        .records(alice_jobs(3, 400))
        .cache_tables(true)
        .build();

    let mut job = JobBuilder::default().build();
    assert!(matches!(
        evaluate_job(&engine, &mut job, JobEvent::Submit).await,
        Outcome::Demoted(_)
    ));

    tables.write_quotas("alice,5000\n");
    let mut job = JobBuilder::default().build();
    assert!(matches!(
        evaluate_job(&engine, &mut job, JobEvent::Submit).await,
        Outcome::Demoted(_)
    ));
}

#[tokio::test]
async fn table_cache_lives_with_its_engine() {
    let tables = TablesDir::new("cpu,1.0\n", "alice,1000\n");
    let config = QuotaConfig {
        cache_tables: true,
        ..tables.config()
    };
    let create_engine = || {
        build_engine(
            &config,
            Arc::new(MemoryHistory::new(alice_jobs(3, 400))),
            Arc::new(PartitionSet::new(["cpu", "cpu_low"])),
        )
    };

    let mut job = JobBuilder::default().build();
    assert!(matches!(
        evaluate_job(&create_engine(), &mut job, JobEvent::Submit).await,
        Outcome::Demoted(_)
    ));

    // A new engine (a new CLI invocation) reads the tables again
    tables.write_quotas("alice,5000\n");
    let mut job = JobBuilder::default().build();
    assert_eq!(
        evaluate_job(&create_engine(), &mut job, JobEvent::Submit).await,
        Outcome::Admitted
    );
}

#[tokio::test]
async fn missing_tables_use_defaults() {
    let (tables, engine) = ScenarioBuilder::default()
        .records(alice_jobs(1, 10))
        .build();
    std::fs::remove_file(tables.path().join("quotas.csv")).unwrap();

    // Without quotas every account with some usage is over quota
    let mut job = JobBuilder::default().build();
    assert!(matches!(
        evaluate_job(&engine, &mut job, JobEvent::Submit).await,
        Outcome::Demoted(_)
    ));
}

#[test]
fn config_file_points_to_tables() {
    let (tables, _engine) = ScenarioBuilder::default().build();
    let path = tables.path().join("sdquota.toml");
    std::fs::write(
        &path,
        format!(
            "weights = \"{}\"\nquotas = \"{}\"\npolicy = \"priority\"\n",
            tables.path().join("weights.csv").display(),
            tables.path().join("quotas.csv").display()
        ),
    )
    .unwrap();

    let config = QuotaConfig::load(&path).unwrap();
    assert_eq!(config.weights, tables.config().weights);
    assert_eq!(config.quotas, tables.config().quotas);
    assert_eq!(config.policy, PolicyKind::Priority);
}
