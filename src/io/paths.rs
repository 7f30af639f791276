use crate::{Result, TripwireError};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// Fixed name of the breakpoint configuration file in the home directory
pub const CONFIG_FILE_NAME: &str = ".tripwire.config.yml";

/// Path management for the breakpoint configuration file
#[derive(Debug, Clone)]
pub struct TripwirePaths {
    /// User's home directory
    pub home_dir: PathBuf,
    /// `<home>/.tripwire.config.yml`
    pub config_file: PathBuf,
}

impl TripwirePaths {
    /// Resolve paths from the current user's home directory
    pub fn discover() -> Result<Self> {
        let dirs = BaseDirs::new().ok_or_else(|| {
            TripwireError::Path("Failed to determine the home directory".to_string())
        })?;
        Ok(Self::for_home(dirs.home_dir()))
    }

    /// Paths rooted at an explicit home directory
    pub fn for_home(home: &Path) -> Self {
        Self {
            home_dir: home.to_path_buf(),
            config_file: home.join(CONFIG_FILE_NAME),
        }
    }

    /// An explicit config file wins over the home-directory default
    pub fn resolve_config_file(override_path: Option<&Path>) -> Result<PathBuf> {
        match override_path {
            Some(path) => Ok(path.to_path_buf()),
            None => Ok(Self::discover()?.config_file),
        }
    }
}
