//! Decides whether a tag is armed and hands out its definition.

use std::sync::Arc;

use tracing::trace;

use crate::config::{BreakpointDefinition, Config, ConfigProvider};
use crate::Result;

/// Looks tags up in the configuration supplied by a provider
#[derive(Clone)]
pub struct BreakpointResolver {
    provider: Arc<dyn ConfigProvider>,
}

impl BreakpointResolver {
    pub fn new(provider: Arc<dyn ConfigProvider>) -> Self {
        Self { provider }
    }

    pub fn config(&self) -> Result<Arc<Config>> {
        self.provider.load()
    }

    /// The definition configured for `tag`, armed or not
    pub fn definition_for(&self, tag: &str) -> Result<Option<BreakpointDefinition>> {
        Ok(self.config()?.breakpoint(tag).cloned())
    }

    /// True iff a definition exists and is not explicitly disabled
    pub fn armed(&self, tag: &str) -> Result<bool> {
        Ok(self.armed_definition(tag)?.is_some())
    }

    /// The definition for `tag` only if it is armed
    pub fn armed_definition(&self, tag: &str) -> Result<Option<BreakpointDefinition>> {
        let definition = self.definition_for(tag)?;
        match definition {
            Some(def) if def.is_enabled() => Ok(Some(def)),
            Some(_) => {
                trace!(tag, "Breakpoint disabled");
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
