pub mod eval;
pub mod list;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, ConfigProvider, FileConfigProvider};
use crate::io::paths::TripwirePaths;
use crate::Result;

/// Common trait for all command handlers
pub trait CommandHandler {
    /// Execute the command
    fn execute(&self) -> Result<()>;

    /// Get command name for logging
    fn name(&self) -> &'static str;
}

/// Load the file named on the command line, or the home-directory default
pub(crate) fn load_config(config: Option<&PathBuf>) -> Result<(PathBuf, Arc<Config>)> {
    let path = TripwirePaths::resolve_config_file(config.map(PathBuf::as_path))?;
    let config = FileConfigProvider::new(&path).load()?;
    Ok((path, config))
}
