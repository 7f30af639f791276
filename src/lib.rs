//! Tripwire: tagged interception points armed from a YAML file.
//!
//! Code declares a point with [`intercept`]; the configuration decides per
//! tag whether to run `pre_call`, `return_call` and `post_call` actions and
//! whether to override the returned value.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;

pub use config::{
    config_provider, reset_config_provider, set_config_provider, BreakpointDefinition, Config,
    ConfigProvider, FileConfigProvider, StaticConfigProvider,
};
pub use engine::global::{
    checkpoint, global_engine, intercept, intercept_as, parse_cache, register_function,
    registered_functions, unregister_function,
};
pub use engine::{Engine, FunctionRegistry, ParseCache, Receiver, Scope, Value};
pub use error::{Result, TripwireError};
