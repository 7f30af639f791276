use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::expr::{parse, ParseError};
use crate::engine::value::Value;

/// One action string or an ordered list of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Actions {
    One(String),
    Many(Vec<String>),
}

impl Actions {
    /// Normalized view, in declaration order
    pub fn as_slice(&self) -> &[String] {
        match self {
            Actions::One(action) => std::slice::from_ref(action),
            Actions::Many(actions) => actions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl From<&str> for Actions {
    fn from(action: &str) -> Self {
        Actions::One(action.to_string())
    }
}

impl From<Vec<&str>> for Actions {
    fn from(actions: Vec<&str>) -> Self {
        Actions::Many(actions.into_iter().map(str::to_string).collect())
    }
}

/// Keeps an explicit `null` distinguishable from an absent key
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Configuration entry for one tag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreakpointDefinition {
    /// Absent means enabled; a present falsy value (`false`, `null`) disables
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Value>,

    /// Run before the guarded code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_call: Option<Actions>,

    /// Run after the guarded code and after return-call inspection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_call: Option<Actions>,

    /// Literal override of the return value, numerically coerced
    #[serde(
        rename = "return",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub return_value: Option<Value>,

    /// Expression whose result overrides the return value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_code: Option<String>,

    /// Run with `retval` bound to the guarded code's result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_call: Option<Actions>,
}

impl BreakpointDefinition {
    pub fn is_enabled(&self) -> bool {
        self.enabled.as_ref().map_or(true, Value::is_truthy)
    }

    /// The `return` override when present and meaningful.
    ///
    /// `null`, empty strings and empty lists count as absent; numbers and
    /// booleans always count.
    pub fn return_override(&self) -> Option<&Value> {
        self.return_value.as_ref().filter(|value| match value {
            Value::Nil => false,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            _ => true,
        })
    }

    /// The `return_code` expression when present and non-empty
    pub fn return_code_override(&self) -> Option<&str> {
        self.return_code.as_deref().filter(|code| !code.trim().is_empty())
    }

    pub fn pre_call_actions(&self) -> &[String] {
        self.pre_call.as_ref().map(Actions::as_slice).unwrap_or_default()
    }

    pub fn post_call_actions(&self) -> &[String] {
        self.post_call.as_ref().map(Actions::as_slice).unwrap_or_default()
    }

    pub fn return_call_actions(&self) -> &[String] {
        self.return_call.as_ref().map(Actions::as_slice).unwrap_or_default()
    }

    /// Names of the facets this definition configures
    pub fn facets(&self) -> Vec<&'static str> {
        let mut facets = Vec::new();
        if !self.pre_call_actions().is_empty() {
            facets.push("pre_call");
        }
        if !self.return_call_actions().is_empty() {
            facets.push("return_call");
        }
        if !self.post_call_actions().is_empty() {
            facets.push("post_call");
        }
        if self.return_override().is_some() {
            facets.push("return");
        }
        if self.return_code_override().is_some() {
            facets.push("return_code");
        }
        facets
    }
}

/// A syntax problem found by [`Config::validate`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub tag: String,
    pub facet: &'static str,
    pub expression: String,
    pub message: String,
}

/// Root configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, deserialize_with = "breakpoints_or_empty")]
    pub breakpoints: BTreeMap<String, BreakpointDefinition>,
}

fn breakpoints_or_empty<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, BreakpointDefinition>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<BTreeMap<String, BreakpointDefinition>>::deserialize(deserializer)
        .map(Option::unwrap_or_default)
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml_ng::Error> {
        // An empty document deserializes as null
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(text)
    }

    pub fn with_breakpoint(mut self, tag: impl Into<String>, def: BreakpointDefinition) -> Self {
        self.breakpoints.insert(tag.into(), def);
        self
    }

    pub fn breakpoint(&self, tag: &str) -> Option<&BreakpointDefinition> {
        self.breakpoints.get(tag)
    }

    /// Parse every expression and collect the syntax errors, tag by tag
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for (tag, def) in &self.breakpoints {
            let facets: [(&'static str, &[String]); 3] = [
                ("pre_call", def.pre_call_actions()),
                ("return_call", def.return_call_actions()),
                ("post_call", def.post_call_actions()),
            ];
            for (facet, actions) in facets {
                for action in actions {
                    if let Err(e) = parse(action) {
                        issues.push(issue(tag, facet, action, &e));
                    }
                }
            }
            if let Some(code) = def.return_code_override() {
                if let Err(e) = parse(code) {
                    issues.push(issue(tag, "return_code", code, &e));
                }
            }
        }
        issues
    }
}

fn issue(tag: &str, facet: &'static str, expression: &str, err: &ParseError) -> ValidationIssue {
    ValidationIssue {
        tag: tag.to_string(),
        facet,
        expression: expression.to_string(),
        message: err.to_string(),
    }
}
