use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use regex::Regex;

use crate::engine::coerce::coerce;
use crate::engine::value::Value;

/// Tripwire: config-driven interception points
#[derive(Parser, Debug)]
#[command(name = "tripwire")]
#[command(version)]
#[command(about = "Inspect and exercise tripwire breakpoint configurations")]
#[command(
    long_about = "Tripwire arms tagged interception points from ~/.tripwire.config.yml. These commands check that file and evaluate action expressions outside of a running program."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the configuration file and every expression in it
    Validate {
        /// Configuration file (defaults to ~/.tripwire.config.yml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured tags and what each one does
    List {
        /// Configuration file (defaults to ~/.tripwire.config.yml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate an expression against ad-hoc bindings
    Eval {
        /// Expression to evaluate, e.g. "amount / (divider * 2.0)"
        expression: String,

        /// Variable binding NAME=VALUE; numeric values are coerced
        #[arg(long = "var", value_parser = parse_binding)]
        vars: Vec<(String, Value)>,
    },
}

impl Commands {
    /// Get the command name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Validate { .. } => "validate",
            Commands::List { .. } => "list",
            Commands::Eval { .. } => "eval",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Parse a `NAME=VALUE` binding
pub fn parse_binding(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    let identifier = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| e.to_string())?;
    if !identifier.is_match(name) {
        return Err(format!("'{}' is not a valid variable name", name));
    }
    let value = match value.trim() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "nil" => Value::Nil,
        other => coerce(&Value::from(other)),
    };
    Ok((name.to_string(), value))
}
