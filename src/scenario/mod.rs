//! Named scenarios
//!
//! The throwaway probe scripts this tool replaces differed only in command
//! verb, payload size and connection count. They collapse into a small table
//! of built-in scenarios plus a YAML format for custom ones.

pub mod config;
pub mod runner;

use std::collections::BTreeMap;

pub use config::{Expectation, Scenario, Step};
pub use runner::{load_scenario, run_scenario, ScenarioResult};

/// Names resolvable by [`builtin`]
pub const BUILTIN_NAMES: &[&str] = &[
    "ping",
    "compile-small",
    "compile-large",
    "compile-burst",
    "ping-then-shutdown",
];

/// Look up a built-in scenario by name
pub fn builtin(name: &str) -> Option<Scenario> {
    let expect_success = Some(Expectation {
        success: Some(true),
        ..Expectation::default()
    });

    match name {
        "ping" => Some(Scenario {
            name: "ping".to_string(),
            description: Some("one bare liveness check".to_string()),
            steps: vec![Step::Send {
                command: "ping".to_string(),
                fields: BTreeMap::new(),
                expect: expect_success,
            }],
        }),

        "compile-small" => Some(Scenario {
            name: "compile-small".to_string(),
            description: Some("one compile with a single small payload field".to_string()),
            steps: vec![Step::Send {
                command: "compile".to_string(),
                fields: BTreeMap::from([("code".to_string(), "source code text".to_string())]),
                expect: expect_success,
            }],
        }),

        "compile-large" => Some(Scenario {
            name: "compile-large".to_string(),
            description: Some("one compile padded with 99 numbered payload fields".to_string()),
            steps: vec![Step::Send {
                command: "compile".to_string(),
                fields: large_payload_fields(),
                expect: expect_success,
            }],
        }),

        "compile-burst" => Some(Scenario {
            name: "compile-burst".to_string(),
            description: Some("250 concurrent compiles, each with a distinct payload".to_string()),
            steps: vec![Step::Burst {
                command: "compile".to_string(),
                connections: 250,
                fields: BTreeMap::new(),
                distinct_field: Some("code".to_string()),
                expect: expect_success,
            }],
        }),

        "ping-then-shutdown" => Some(Scenario {
            name: "ping-then-shutdown".to_string(),
            description: Some("liveness check followed by a termination request".to_string()),
            steps: vec![
                Step::Send {
                    command: "ping".to_string(),
                    fields: BTreeMap::new(),
                    expect: expect_success.clone(),
                },
                Step::Send {
                    command: "shutdown".to_string(),
                    fields: BTreeMap::new(),
                    expect: expect_success,
                },
            ],
        }),

        _ => None,
    }
}

/// One `code` field plus 99 numbered `code N` fields of filler text
fn large_payload_fields() -> BTreeMap<String, String> {
    let mut fields = BTreeMap::from([(
        "code".to_string(),
        "source code text ".repeat(12).trim_end().to_string(),
    )]);
    for i in 1..100 {
        fields.insert(format!("code {i}"), format!("source code text {i}"));
    }
    fields
}
