//! Scenario runner
//!
//! Executes scenario steps against a probe target and checks expectations,
//! reporting each step with a pass/fail marker.

use std::collections::BTreeMap;
use std::path::Path;

use colored::Colorize;

use crate::client::Probe;
use crate::common::{Error, Result};
use crate::wire::command::{Command, Reply};

use super::config::{Expectation, Scenario, Step};

/// Result of a scenario run
#[derive(Debug)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    pub error: Option<String>,
}

/// Load a scenario from a YAML file
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read scenario '{}': {}",
            path.display(),
            e
        ))
    })?;

    serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse scenario: {}", e)))
}

/// Run a scenario against the given probe target
pub async fn run_scenario(scenario: &Scenario, probe: &Probe, verbose: bool) -> ScenarioResult {
    let steps_total = scenario.steps.len();

    println!(
        "\n{} {}",
        "Running Scenario:".blue().bold(),
        scenario.name.white().bold()
    );

    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    println!("  target: {}", probe.target().to_string().dimmed());
    println!("\n{}", "Steps:".cyan());

    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;

        if let Err(e) = execute_step(probe, step, step_num, verbose).await {
            println!("  {} Step {}: {}", "✗".red(), step_num, e);

            return ScenarioResult {
                name: scenario.name.clone(),
                passed: false,
                steps_run: step_num,
                steps_total,
                error: Some(e.to_string()),
            };
        }
    }

    println!(
        "\n{} {}\n",
        "✓".green().bold(),
        "Scenario Passed".green().bold()
    );

    ScenarioResult {
        name: scenario.name.clone(),
        passed: true,
        steps_run: steps_total,
        steps_total,
        error: None,
    }
}

/// Execute a single step
async fn execute_step(probe: &Probe, step: &Step, step_num: usize, verbose: bool) -> Result<()> {
    match step {
        Step::Send {
            command,
            fields,
            expect,
        } => {
            let cmd = build_command(command, fields);
            let outcome = probe.send(&cmd).await;

            if verbose {
                match &outcome {
                    Ok(reply) => println!("    {}", reply.to_string().dimmed()),
                    Err(e) => println!("    {}", e.to_string().dimmed()),
                }
            }

            check_expectation(&cmd, &outcome, expect.as_ref())?;

            println!(
                "  {} Step {}: send {} ({})",
                "✓".green(),
                step_num,
                command.dimmed(),
                outcome_summary(&outcome).dimmed()
            );
            Ok(())
        }

        Step::Burst {
            command,
            connections,
            fields,
            distinct_field,
            expect,
        } => {
            let commands: Vec<Command> = (0..*connections)
                .map(|i| {
                    let mut cmd = build_command(command, fields);
                    if let Some(key) = distinct_field {
                        cmd = cmd.with_field(key.clone(), format!("source code text {i}"));
                    }
                    cmd
                })
                .collect();

            let results = probe.send_many(commands.clone()).await;

            for (i, (cmd, outcome)) in commands.iter().zip(&results).enumerate() {
                check_expectation(cmd, outcome, expect.as_ref())
                    .map_err(|e| Error::ScenarioAssertion(format!("connection {i}: {e}")))?;
            }

            println!(
                "  {} Step {}: burst {} x{}",
                "✓".green(),
                step_num,
                command.dimmed(),
                connections
            );
            Ok(())
        }
    }
}

/// Build a command from a verb and a field table
fn build_command(verb: &str, fields: &BTreeMap<String, String>) -> Command {
    let mut cmd = Command::new(verb);
    for (key, value) in fields {
        cmd = cmd.with_field(key.clone(), value.clone());
    }
    cmd
}

/// Check an outcome against an optional expectation
///
/// With no expectation, the exchange is still required to succeed; failures
/// are never swallowed.
fn check_expectation(
    command: &Command,
    outcome: &Result<Reply>,
    expect: Option<&Expectation>,
) -> Result<()> {
    let want_success = expect.and_then(|e| e.success).unwrap_or(true);

    let reply = match outcome {
        Err(e) => {
            if want_success {
                return Err(Error::ScenarioAssertion(format!(
                    "expected success, got error: {e}"
                )));
            }
            return Ok(());
        }
        Ok(reply) => {
            if !want_success {
                return Err(Error::ScenarioAssertion(format!(
                    "expected failure, got {}",
                    outcome_summary(outcome)
                )));
            }
            reply
        }
    };

    if let Some(want_empty) = expect.and_then(|e| e.empty) {
        if reply.is_empty() != want_empty {
            return Err(Error::ScenarioAssertion(format!(
                "expected empty={want_empty}, got {}",
                outcome_summary(outcome)
            )));
        }
    }

    if expect.and_then(|e| e.echo) == Some(true) {
        let sent = serde_json::to_value(command)?;
        match reply.as_value() {
            Some(value) if *value == sent => {}
            Some(value) => {
                return Err(Error::ScenarioAssertion(format!(
                    "reply does not echo the request: {value}"
                )));
            }
            None => {
                return Err(Error::ScenarioAssertion(
                    "expected an echoed reply, got an empty one".to_string(),
                ));
            }
        }
    }

    Ok(())
}

/// Short label for a step's outcome
fn outcome_summary(outcome: &Result<Reply>) -> String {
    match outcome {
        Ok(Reply::Decoded(_)) => "decoded reply".to_string(),
        Ok(Reply::Empty) => "empty reply".to_string(),
        Err(e) => format!("error: {e}"),
    }
}
