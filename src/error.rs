use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Query `{query}` failed: {reason}")]
    Query { query: String, reason: String },

    #[error("Query `{query}` timed out after {after:?}")]
    Timeout { query: String, after: Duration },

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Collector `{collector}` failed: {reason}")]
    Collection { collector: String, reason: String },

    #[error("Version resolution failed: {0}")]
    Version(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
