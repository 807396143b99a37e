//! Command objects and reply values
//!
//! A command is one flat JSON object: a `command` verb plus free-form text
//! fields. The recognized verbs are `ping`, `compile` and `shutdown`, but the
//! set is open. The reply is kept opaque - no response schema is assumed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::common::{Error, Result};

/// A command object sent to the server
///
/// Serializes to a single flat JSON object; `fields` flatten next to the
/// `command` verb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// The command verb; must be non-empty
    pub command: String,

    /// Free-form text fields (e.g. `code` for compile)
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl Command {
    /// Create a command with the given verb and no extra fields
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            command: verb.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Liveness check
    pub fn ping() -> Self {
        Self::new("ping")
    }

    /// Submit source text for compilation
    pub fn compile(code: impl Into<String>) -> Self {
        Self::new("compile").with_field("code", code)
    }

    /// Ask the server to terminate
    pub fn shutdown() -> Self {
        Self::new("shutdown")
    }

    /// Attach a free-form text field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Serialize to the UTF-8 JSON bytes that go on the wire
    ///
    /// Rejects an empty verb instead of sending a malformed command.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.command.is_empty() {
            return Err(Error::EmptyCommand);
        }
        Ok(serde_json::to_vec(self)?)
    }
}

/// The outcome of one exchange
///
/// A zero-length response is a legitimate outcome, distinct from a decode
/// failure; it is never handed to the JSON decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Non-empty response that parsed as JSON
    Decoded(serde_json::Value),
    /// The peer closed without sending any bytes
    Empty,
}

impl Reply {
    /// Whether the peer sent nothing back
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The decoded value, if any
    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Decoded(value) => Some(value),
            Self::Empty => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decoded(value) => {
                let pretty = serde_json::to_string_pretty(value).map_err(|_| fmt::Error)?;
                write!(f, "{pretty}")
            }
            Self::Empty => write!(f, "(empty reply)"),
        }
    }
}
