use std::io::IsTerminal;

use clap::{CommandFactory, FromArgMatches};
use cli_table::ColorChoice;

use sdquota::client::commands::evaluate::{JobEvent, command_evaluate};
use sdquota::client::commands::tables::command_tables;
use sdquota::client::commands::usage::command_usage;
use sdquota::client::globalsettings::GlobalSettings;
use sdquota::client::output::cli::CliOutput;
use sdquota::client::output::json::JsonOutput;
use sdquota::client::output::outputs::{Output, Outputs};
use sdquota::common::cli::{ColorPolicy, CommonOpts, RootOptions, SubCommand};
use sdquota::common::setup::setup_logging;

fn make_global_settings(opts: CommonOpts) -> GlobalSettings {
    let color_policy = match opts.colors {
        ColorPolicy::Always => ColorChoice::AlwaysAnsi,
        ColorPolicy::Auto => {
            if std::io::stdout().is_terminal() {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            }
        }
        ColorPolicy::Never => ColorChoice::Never,
    };

    // Create Printer
    let printer: Box<dyn Output> = match opts.output_mode {
        Outputs::CLI => {
            // Set colored public for CLI
            match color_policy {
                ColorChoice::Always | ColorChoice::AlwaysAnsi => {
                    colored::control::set_override(true)
                }
                ColorChoice::Never => colored::control::set_override(false),
                _ => {}
            }

            Box::new(CliOutput::new(color_policy))
        }
        Outputs::JSON => Box::<JsonOutput>::default(),
    };

    GlobalSettings::new(opts.config, printer)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> sdquota::Result<()> {
    let matches = RootOptions::command().get_matches();
    let top_opts = match RootOptions::from_arg_matches(&matches) {
        Ok(opts) => opts,
        Err(error) => error.exit(),
    };

    setup_logging(top_opts.common.debug);

    let gsettings = make_global_settings(top_opts.common);
    log::debug!(
        "Using configuration {}",
        gsettings.config_path().display()
    );

    let result = match top_opts.subcmd {
        SubCommand::Submit(opts) => command_evaluate(&gsettings, opts, JobEvent::Submit).await,
        SubCommand::Modify(opts) => command_evaluate(&gsettings, opts, JobEvent::Modify).await,
        SubCommand::Usage(opts) => command_usage(&gsettings, opts).await,
        SubCommand::Tables => command_tables(&gsettings),
    };

    match result {
        Ok(status) => {
            let code = status.exit_code();
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            gsettings.printer().print_error(e);
            std::process::exit(1);
        }
    }

    Ok(())
}
