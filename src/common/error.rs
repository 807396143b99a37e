//! Error types for the probe CLI
//!
//! Every failure is local to the exchange that produced it; a batch never
//! aborts sibling exchanges because one of them errored.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the probe CLI
#[derive(Error, Debug)]
pub enum Error {
    // === Exchange Errors ===
    #[error("Failed to reach {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Reply is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Exchange timed out after {0} seconds")]
    Timeout(u64),

    #[error("{failed} of {total} exchanges failed")]
    Batch { failed: usize, total: usize },

    // === Command Errors ===
    #[error("Command verb must not be empty")]
    EmptyCommand,

    #[error("Invalid field '{0}': expected KEY=VALUE")]
    InvalidField(String),

    // === Scenario Errors ===
    #[error("Unknown scenario '{name}'. Built-ins: {known}")]
    UnknownScenario { name: String, known: String },

    #[error("Scenario assertion failed: {0}")]
    ScenarioAssertion(String),

    #[error("Scenario '{0}' failed")]
    ScenarioFailed(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a connection error for the given target address
    pub fn connection(addr: impl Into<String>, source: io::Error) -> Self {
        Self::Connection {
            addr: addr.into(),
            source,
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: &io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
