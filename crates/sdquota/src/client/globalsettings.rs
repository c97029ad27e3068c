use std::path::{Path, PathBuf};

use crate::client::output::outputs::Output;
use crate::common::config::QuotaConfig;

pub struct GlobalSettings {
    config_path: PathBuf,
    printer: Box<dyn Output>,
}

impl GlobalSettings {
    pub fn new(config_path: PathBuf, printer: Box<dyn Output>) -> Self {
        GlobalSettings {
            config_path,
            printer,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load_config(&self) -> crate::Result<QuotaConfig> {
        QuotaConfig::load(&self.config_path)
    }

    pub fn printer(&self) -> &dyn Output {
        self.printer.as_ref()
    }
}
