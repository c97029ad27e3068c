use std::path::PathBuf;

use clap::Parser;

use crate::client::commands::evaluate::EvaluateOpts;
use crate::client::commands::usage::UsageOpts;
use crate::client::output::outputs::Outputs;
use crate::common::config::DEFAULT_CONFIG_PATH;

#[derive(clap::ValueEnum, Clone)]
pub enum ColorPolicy {
    /// Use colors if the stdout is detected to be a terminal.
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

// Common CLI options
#[derive(Parser)]
pub struct CommonOpts {
    /// Path to the quota policy configuration
    #[arg(
        long,
        value_hint = clap::ValueHint::FilePath,
        global = true,
        env = "SDQUOTA_CONFIG",
        default_value = DEFAULT_CONFIG_PATH,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub config: PathBuf,

    /// Sets console color policy
    #[arg(
        long,
        default_value_t = ColorPolicy::Auto,
        value_enum,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub colors: ColorPolicy,

    /// Sets output formatting
    #[arg(
        long,
        env = "SDQUOTA_OUTPUT_MODE",
        default_value_t = Outputs::CLI,
        value_enum,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub output_mode: Outputs,

    /// Enables more detailed log output
    #[arg(
        long,
        env = "SDQUOTA_DEBUG",
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub debug: bool,
}

// Root CLI options
#[derive(Parser)]
#[command(
    author,
    about,
    version(crate::SDQUOTA_VERSION),
    disable_help_subcommand(true),
    help_expected(true)
)]
pub struct RootOptions {
    #[clap(flatten)]
    pub common: CommonOpts,

    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Parser)]
pub enum SubCommand {
    /// Check a newly submitted job and demote it if its account is over quota
    Submit(EvaluateOpts),
    /// Check a modified job, with the same rules as a submission
    Modify(EvaluateOpts),
    /// Show the weighted usage and the quota of an account
    Usage(UsageOpts),
    /// Show the loaded partition weights and account quotas
    Tables,
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{RootOptions, SubCommand};
    use crate::client::output::outputs::Outputs;

    #[test]
    fn test_parse_submit() {
        let opts = RootOptions::try_parse_from([
            "sdquota",
            "submit",
            "--job-id",
            "42",
            "--account",
            "alice",
            "--partition",
            "cpu",
            "--priority",
            "100",
            "--output-mode",
            "json",
        ])
        .unwrap();
        assert!(matches!(opts.common.output_mode, Outputs::JSON));
        match opts.subcmd {
            SubCommand::Submit(opts) => {
                assert_eq!(opts.job_id, 42);
                assert_eq!(opts.account, "alice");
                assert_eq!(opts.partition, "cpu");
                assert_eq!(opts.priority, 100);
            }
            _ => panic!("Expected the submit command"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let opts =
            RootOptions::try_parse_from(["sdquota", "tables", "--config", "/tmp/sdquota.toml"])
                .unwrap();
        assert_eq!(opts.common.config, PathBuf::from("/tmp/sdquota.toml"));
        assert!(matches!(opts.subcmd, SubCommand::Tables));
    }

    #[test]
    fn test_submit_requires_account() {
        assert!(
            RootOptions::try_parse_from(["sdquota", "submit", "--job-id", "1", "--partition", "cpu"])
                .is_err()
        );
    }
}
