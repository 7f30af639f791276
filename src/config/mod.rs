pub mod loader;
pub mod types;

pub use loader::{
    config_provider, reset_config_provider, set_config_provider, ConfigProvider,
    FileConfigProvider, StaticConfigProvider,
};
pub use types::{Actions, BreakpointDefinition, Config, ValidationIssue};
