use crate::client::commands::CommandStatus;
use crate::client::engine::create_table_source;
use crate::client::globalsettings::GlobalSettings;

pub fn command_tables(gsettings: &GlobalSettings) -> anyhow::Result<CommandStatus> {
    let config = gsettings.load_config()?;
    log::debug!(
        "Reading partition weights from {} and account quotas from {}",
        config.weights.display(),
        config.quotas.display()
    );
    let tables = create_table_source(&config).load_tables();
    gsettings.printer().print_tables(&tables);
    Ok(CommandStatus::Success)
}
