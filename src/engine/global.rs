//! Process-wide interception API.
//!
//! Uses the provider installed with
//! [`set_config_provider`](crate::config::set_config_provider), or the
//! home-directory file provider when none was installed, together with the
//! functions registered here.

use once_cell::sync::Lazy;
use std::sync::RwLock;

use super::{Engine, FunctionRegistry, ParseCache, Scope, Value};
use crate::config::config_provider;
use crate::{Result, TripwireError};

static FUNCTIONS: Lazy<RwLock<FunctionRegistry>> =
    Lazy::new(|| RwLock::new(FunctionRegistry::new()));

// Parsing only depends on the source text, so every global engine shares it
static PARSED: Lazy<ParseCache> = Lazy::new(ParseCache::new);

/// Make a host function callable from actions run by [`intercept`]
pub fn register_function<F>(name: impl Into<String>, f: F)
where
    F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
{
    FUNCTIONS
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .register(name, f);
}

pub fn unregister_function(name: &str) -> bool {
    FUNCTIONS
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .unregister(name)
}

/// Snapshot of the process-wide functions
pub fn registered_functions() -> FunctionRegistry {
    FUNCTIONS.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Engine over the active provider and the registered functions
pub fn global_engine() -> Result<Engine> {
    Ok(Engine::with_cache(
        config_provider()?,
        registered_functions(),
        PARSED.clone(),
    ))
}

/// Statements parsed by the process-wide engines so far
pub fn parse_cache() -> ParseCache {
    PARSED.clone()
}

/// Declare an interception point around `guarded`
pub fn intercept<R, F>(tag: &str, scope: &mut Scope<'_>, guarded: F) -> Result<Value>
where
    R: Into<Value>,
    F: FnOnce() -> R,
{
    global_engine()?.intercept(tag, scope, guarded)
}

/// Typed variant of [`intercept`]
pub fn intercept_as<T, F>(tag: &str, scope: &mut Scope<'_>, guarded: F) -> Result<T>
where
    T: Into<Value> + TryFrom<Value, Error = TripwireError>,
    F: FnOnce() -> T,
{
    global_engine()?.intercept_as(tag, scope, guarded)
}

/// Declare an interception point with no guarded code
pub fn checkpoint(tag: &str, scope: &mut Scope<'_>) -> Result<Value> {
    global_engine()?.checkpoint(tag, scope)
}
