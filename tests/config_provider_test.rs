//! Default provider discovery from the home directory
//!
//! These tests mutate HOME and the process-wide provider slot.

use std::env;
use std::fs;

use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::TempDir;
use tripwire::{
    checkpoint, config_provider, reset_config_provider, ConfigProvider, Scope, TripwireError,
    Value,
};

struct HomeGuard {
    previous: Option<String>,
    _dir: TempDir,
}

impl HomeGuard {
    fn new() -> (Self, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        let previous = env::var("HOME").ok();
        env::set_var("HOME", &path);
        reset_config_provider();
        (
            Self {
                previous,
                _dir: dir,
            },
            path,
        )
    }
}

impl Drop for HomeGuard {
    fn drop(&mut self) {
        match &self.previous {
            Some(home) => env::set_var("HOME", home),
            None => env::remove_var("HOME"),
        }
        reset_config_provider();
    }
}

#[test]
#[serial]
fn test_missing_home_config_is_an_error() {
    let (_guard, home) = HomeGuard::new();

    let err = checkpoint("anything", &mut Scope::new()).unwrap_err();
    match err {
        TripwireError::ConfigMissing(path) => {
            assert_eq!(path, home.join(".tripwire.config.yml"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
#[serial]
fn test_home_config_is_loaded() {
    let (_guard, home) = HomeGuard::new();
    fs::write(
        home.join(".tripwire.config.yml"),
        "breakpoints:\n  probe:\n    return_code: '40 + 2'\n",
    )
    .unwrap();

    let out = checkpoint("probe", &mut Scope::new()).unwrap();
    assert_eq!(out, Value::Int(42));
}

#[test]
#[serial]
fn test_failed_load_is_retried() {
    let (_guard, home) = HomeGuard::new();
    assert!(config_provider().unwrap().load().is_err());

    fs::write(home.join(".tripwire.config.yml"), "breakpoints: {}\n").unwrap();
    let config = config_provider().unwrap().load().unwrap();
    assert!(config.breakpoints.is_empty());
}
