//! Scenario configuration types
//!
//! Defines the data structures for deserializing YAML scenarios. Built-in
//! scenarios construct the same types in code.

use serde::Deserialize;
use std::collections::BTreeMap;

/// A complete scenario: a named sequence of exchange steps
#[derive(Deserialize, Debug, Clone)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario exercises
    pub description: Option<String>,
    /// The sequence of steps to execute
    pub steps: Vec<Step>,
}

/// A single step in the execution flow
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// One exchange on a fresh connection
    Send {
        /// The command verb (e.g. "ping")
        command: String,
        /// Free-form text fields attached to the command
        #[serde(default)]
        fields: BTreeMap<String, String>,
        /// Optional expectations for the outcome
        expect: Option<Expectation>,
    },
    /// Many concurrent exchanges, one connection each
    Burst {
        /// The command verb sent on every connection
        command: String,
        /// Number of concurrent connections
        connections: usize,
        /// Fields shared by every connection
        #[serde(default)]
        fields: BTreeMap<String, String>,
        /// Field key given a distinct per-connection payload
        distinct_field: Option<String>,
        /// Expectation applied to every connection's outcome
        expect: Option<Expectation>,
    },
}

/// Expectations for an exchange outcome
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Expectation {
    /// Whether the exchange should succeed (default: true)
    pub success: Option<bool>,
    /// Whether the reply should be empty
    pub empty: Option<bool>,
    /// Whether the reply must structurally echo the request
    pub echo: Option<bool>,
}
