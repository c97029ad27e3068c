use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tally::{JobHistory, UsageWindow};

use crate::accounting::SacctHistory;
use crate::client::commands::CommandStatus;
use crate::client::engine::{create_accountant, create_table_source};
use crate::client::globalsettings::GlobalSettings;
use crate::common::config::QuotaConfig;

#[derive(Parser)]
pub struct UsageOpts {
    /// Account whose usage is computed
    #[arg(long)]
    pub account: String,
}

/// Weighted usage of an account compared with its quota.
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub account: String,
    pub usage: u64,
    pub quota: u64,
    /// `false` if the account is missing from the quota table (its quota is zero).
    pub has_quota: bool,
    pub window: UsageWindow,
}

impl UsageReport {
    pub fn is_over_quota(&self) -> bool {
        self.usage > self.quota
    }
}

pub async fn command_usage(
    gsettings: &GlobalSettings,
    opts: UsageOpts,
) -> anyhow::Result<CommandStatus> {
    let config = gsettings.load_config()?;
    let report = compute_usage(&config, Arc::new(SacctHistory::default()), &opts.account).await?;
    gsettings.printer().print_usage(&report);
    Ok(CommandStatus::Success)
}

pub async fn compute_usage(
    config: &QuotaConfig,
    history: Arc<dyn JobHistory>,
    account: &str,
) -> crate::Result<UsageReport> {
    let tables = create_table_source(config).load_tables();
    let window = UsageWindow::trailing(config.window);
    let usage = create_accountant(config, history)
        .weighted_usage(account, &tables.weights, &window)
        .await?;

    Ok(UsageReport {
        account: account.to_string(),
        usage,
        quota: tables.quotas.quota_of(account),
        has_quota: tables.quotas.contains(account),
        window,
    })
}
