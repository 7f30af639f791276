use std::path::PathBuf;

use thiserror::Error;

use crate::engine::expr::ParseError;

#[derive(Error, Debug)]
pub enum TripwireError {
    #[error("Missing configuration in: {}", .0.display())]
    ConfigMissing(PathBuf),

    #[error("Failed to parse configuration {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Expression syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("Expression evaluation error: {0}")]
    Eval(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TripwireError>;
