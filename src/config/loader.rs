use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use super::types::Config;
use crate::io::paths::TripwirePaths;
use crate::{Result, TripwireError};

/// Source of breakpoint configuration
pub trait ConfigProvider: Send + Sync {
    /// Return the current configuration. Implementations may memoize.
    fn load(&self) -> Result<Arc<Config>>;
}

/// Default provider: one YAML file, parsed once per provider instance
#[derive(Debug)]
pub struct FileConfigProvider {
    path: PathBuf,
    cache: OnceCell<Arc<Config>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }

    /// Provider for the fixed config file under the user's home directory
    pub fn from_home() -> Result<Self> {
        Ok(Self::new(TripwirePaths::discover()?.config_file))
    }

    fn read(&self) -> Result<Arc<Config>> {
        if !self.path.exists() {
            return Err(TripwireError::ConfigMissing(self.path.clone()));
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let config = Config::from_yaml(&contents).map_err(|source| TripwireError::ConfigParse {
            path: self.path.clone(),
            source,
        })?;

        info!(
            path = %self.path.display(),
            breakpoints = config.breakpoints.len(),
            "Loaded breakpoint configuration"
        );
        Ok(Arc::new(config))
    }
}

impl ConfigProvider for FileConfigProvider {
    fn load(&self) -> Result<Arc<Config>> {
        // A failed read is not cached; the next caller retries
        self.cache.get_or_try_init(|| self.read()).map(Arc::clone)
    }
}

/// In-memory provider for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: Arc<Config>,
}

impl StaticConfigProvider {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config = Config::from_yaml(text).map_err(|source| TripwireError::ConfigParse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Ok(Self::new(config))
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn load(&self) -> Result<Arc<Config>> {
        Ok(Arc::clone(&self.config))
    }
}

static ACTIVE_PROVIDER: RwLock<Option<Arc<dyn ConfigProvider>>> = RwLock::new(None);

/// Install the process-wide provider, replacing any previous one.
///
/// A replaced provider keeps its own cache; it is simply no longer consulted.
pub fn set_config_provider(provider: Arc<dyn ConfigProvider>) {
    debug!("Installing custom config provider");
    let mut slot = ACTIVE_PROVIDER.write().unwrap_or_else(|e| e.into_inner());
    *slot = Some(provider);
}

/// Drop the installed provider so the next access builds the default again
pub fn reset_config_provider() {
    let mut slot = ACTIVE_PROVIDER.write().unwrap_or_else(|e| e.into_inner());
    *slot = None;
}

/// The active provider, lazily creating the home-directory file provider
pub fn config_provider() -> Result<Arc<dyn ConfigProvider>> {
    {
        let slot = ACTIVE_PROVIDER.read().unwrap_or_else(|e| e.into_inner());
        if let Some(provider) = slot.as_ref() {
            return Ok(Arc::clone(provider));
        }
    }

    let mut slot = ACTIVE_PROVIDER.write().unwrap_or_else(|e| e.into_inner());
    // Another thread may have won the race between the two locks
    if let Some(provider) = slot.as_ref() {
        return Ok(Arc::clone(provider));
    }
    let provider: Arc<dyn ConfigProvider> = Arc::new(FileConfigProvider::from_home()?);
    debug!("Created default file config provider");
    *slot = Some(Arc::clone(&provider));
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_file_provider_loads_and_memoizes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("breakpoints.yml");
        fs::write(&path, "breakpoints:\n  fuel:\n    return: 0.5\n").unwrap();

        let provider = FileConfigProvider::new(&path);
        let first = provider.load().unwrap();
        assert!(first.breakpoint("fuel").is_some());

        // Later edits are not observed by an already-loaded provider
        fs::write(&path, "breakpoints: {}\n").unwrap();
        let second = provider.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_missing_file_is_an_error_until_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.yml");
        let provider = FileConfigProvider::new(&path);

        match provider.load() {
            Err(TripwireError::ConfigMissing(p)) => assert_eq!(p, path),
            other => panic!("expected ConfigMissing, got {:?}", other),
        }

        fs::write(&path, "breakpoints: {}\n").unwrap();
        assert!(provider.load().is_ok());
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.yml");
        fs::write(&path, "breakpoints: [unclosed\n").unwrap();

        let err = FileConfigProvider::new(&path).load().unwrap_err();
        assert!(matches!(err, TripwireError::ConfigParse { .. }));
        assert!(err.to_string().contains("broken.yml"));
    }

    #[test]
    fn test_static_provider_from_yaml() {
        let provider = StaticConfigProvider::from_yaml("breakpoints:\n  t: {}\n").unwrap();
        let config = provider.load().unwrap();
        assert!(config.breakpoint("t").unwrap().is_enabled());
        assert!(Arc::ptr_eq(&config, &provider.load().unwrap()));
    }
}
