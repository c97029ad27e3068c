use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use cli_table::format::{Justify, Separator};
use cli_table::{Cell, CellStruct, Color, ColorChoice, Style, Table, TableStruct, print_stdout};
use colored::Colorize;
use humantime::format_duration;
use tally::{JobRequest, Outcome, Tables};

use crate::client::commands::usage::UsageReport;
use crate::client::output::outputs::Output;

pub struct CliOutput {
    color_policy: ColorChoice,
}

impl CliOutput {
    pub fn new(color_policy: ColorChoice) -> CliOutput {
        CliOutput { color_policy }
    }

    fn print_vertical_table(&self, rows: Vec<Vec<CellStruct>>) {
        let table = rows.table().separator(
            Separator::builder()
                .column(Some(Default::default()))
                .build(),
        );
        self.print_table(table);
    }

    fn print_horizontal_table(&self, rows: Vec<Vec<CellStruct>>, header: Vec<CellStruct>) {
        let table = rows
            .table()
            .separator(
                Separator::builder()
                    .title(Some(Default::default()))
                    .column(Some(Default::default()))
                    .build(),
            )
            .title(header);
        self.print_table(table);
    }

    fn print_table(&self, table: TableStruct) {
        let table = table.color_choice(self.color_policy);
        if let Err(e) = print_stdout(table) {
            log::error!("Cannot print table to stdout: {:?}", e);
        }
    }
}

impl Output for CliOutput {
    fn print_outcome(&self, job: &JobRequest, outcome: &Outcome) {
        let rows = vec![
            vec!["Job ID".cell().bold(true), job.job_id.cell()],
            vec!["Account".cell().bold(true), job.account.as_str().cell()],
            vec!["Partition".cell().bold(true), job.partition.as_str().cell()],
            vec!["Priority".cell().bold(true), job.priority.cell()],
            vec!["Outcome".cell().bold(true), outcome_to_cell(outcome)],
            vec![
                "Detail".cell().bold(true),
                format_outcome_detail(outcome).cell(),
            ],
        ];
        self.print_vertical_table(rows);
    }

    fn print_usage(&self, report: &UsageReport) {
        let quota = if report.has_quota {
            format_cpu_time(report.quota)
        } else {
            "none".to_string()
        };
        let over_quota = if report.is_over_quota() {
            "yes".cell().foreground_color(Some(Color::Red))
        } else {
            "no".cell().foreground_color(Some(Color::Green))
        };

        let rows = vec![
            vec!["Account".cell().bold(true), report.account.as_str().cell()],
            vec![
                "Window".cell().bold(true),
                format!(
                    "{} - {}",
                    format_time(report.window.start),
                    format_time(report.window.end)
                )
                .cell(),
            ],
            vec![
                "Weighted usage".cell().bold(true),
                format_cpu_time(report.usage).cell(),
            ],
            vec!["Quota".cell().bold(true), quota.cell()],
            vec!["Over quota".cell().bold(true), over_quota],
        ];
        self.print_vertical_table(rows);
    }

    fn print_tables(&self, tables: &Tables) {
        if tables.weights.is_empty() {
            println!(
                "No partition weights loaded, every partition has weight {}",
                tables.weights.default_weight()
            );
        } else {
            let rows: Vec<_> = tables
                .weights
                .partitions()
                .into_iter()
                .map(|partition| {
                    let weight = tables.weights.weight_of(&partition);
                    vec![partition.cell(), weight.cell().justify(Justify::Right)]
                })
                .collect();
            let header = vec!["Partition".cell().bold(true), "Weight".cell().bold(true)];
            self.print_horizontal_table(rows, header);
            println!(
                "Other partitions have weight {}",
                tables.weights.default_weight()
            );
        }

        if tables.quotas.is_empty() {
            println!(
                "{}",
                "No account quotas loaded, every account with usage is over quota"
                    .color(colored::Color::Yellow)
            );
        } else {
            let rows: Vec<_> = tables
                .quotas
                .entries()
                .into_iter()
                .map(|(account, quota)| {
                    vec![
                        account.cell(),
                        quota.cell().justify(Justify::Right),
                        format_cpu_time(quota).cell(),
                    ]
                })
                .collect();
            let header = vec![
                "Account".cell().bold(true),
                "Quota".cell().bold(true),
                "CPU time".cell().bold(true),
            ];
            self.print_horizontal_table(rows, header);
        }
    }

    fn print_error(&self, error: anyhow::Error) {
        eprintln!("{:?}", error);
    }
}

fn outcome_to_cell(outcome: &Outcome) -> CellStruct {
    match outcome {
        Outcome::Admitted => "ADMITTED".cell().foreground_color(Some(Color::Green)),
        Outcome::Demoted(_) => "DEMOTED".cell().foreground_color(Some(Color::Yellow)),
        Outcome::Rejected { .. } => "REJECTED".cell().foreground_color(Some(Color::Red)),
    }
}

fn format_outcome_detail(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Admitted => "account is within its quota".to_string(),
        Outcome::Demoted(demotion) => format!("account is over quota, {demotion}"),
        Outcome::Rejected { reason } => reason.to_string(),
    }
}

/// Weighted CPU seconds, with a human readable form.
fn format_cpu_time(seconds: u64) -> String {
    if seconds == 0 {
        return "0".to_string();
    }
    format!(
        "{seconds} ({})",
        format_duration(Duration::from_secs(seconds))
    )
}

fn format_time(time: DateTime<Utc>) -> impl std::fmt::Display {
    time.with_timezone(&Local).format("%d.%m.%Y %H:%M:%S")
}
