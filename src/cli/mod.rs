//! CLI command handling
//!
//! Builds command objects from CLI input, runs the exchanges and prints each
//! outcome. Every exchange in a batch is reported individually; a failed
//! exchange never hides a sibling's result.

use std::path::Path;
use std::time::Duration;

use crate::client::{Probe, Target};
use crate::commands::{Commands, TargetArgs};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::scenario;
use crate::wire::command::{Command, Reply};
use crate::wire::framing::HalfClose;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    let config = Config::load()?;

    match command {
        Commands::Ping { target } => {
            let probe = probe_for(&config, &target);
            let reply = probe.send(&Command::ping()).await?;
            print_reply(&reply);
            Ok(())
        }

        Commands::Compile {
            file,
            code,
            stress_fields,
            connections,
            target,
        } => {
            let source = match (file, code) {
                (Some(path), None) => std::fs::read_to_string(&path)
                    .map_err(|e| Error::file_read(&path, &e))?,
                (None, Some(code)) => code,
                (None, None) => {
                    return Err(Error::Config(
                        "compile requires a FILE argument or --code".to_string(),
                    ));
                }
                (Some(_), Some(_)) => unreachable!("clap rejects file together with --code"),
            };

            let mut cmd = Command::compile(source);
            if let Some(n) = stress_fields {
                for i in 1..=n {
                    cmd = cmd.with_field(format!("code {i}"), format!("source code text {i}"));
                }
            }

            let probe = probe_for(&config, &target);

            if connections <= 1 {
                let reply = probe.send(&cmd).await?;
                print_reply(&reply);
                Ok(())
            } else {
                let commands = vec![cmd; connections];
                let results = probe.send_many(commands).await;
                print_batch(&results)
            }
        }

        Commands::Shutdown { target } => {
            let probe = probe_for(&config, &target);
            let reply = probe.send(&Command::shutdown()).await?;
            print_reply(&reply);
            Ok(())
        }

        Commands::Send {
            command,
            fields,
            target,
        } => {
            let mut cmd = Command::new(command);
            for field in &fields {
                let (key, value) = parse_field(field)?;
                cmd = cmd.with_field(key, value);
            }

            let probe = probe_for(&config, &target);
            let reply = probe.send(&cmd).await?;
            print_reply(&reply);
            Ok(())
        }

        Commands::Scenario {
            name,
            list,
            verbose,
            target,
        } => {
            if list {
                println!("Built-in scenarios:");
                for name in scenario::BUILTIN_NAMES {
                    println!("  {name}");
                }
                return Ok(());
            }

            let name = name.ok_or_else(|| {
                Error::Config("scenario requires a name or a YAML file path".to_string())
            })?;

            let scenario = match scenario::builtin(&name) {
                Some(scenario) => scenario,
                None if Path::new(&name).exists() => scenario::load_scenario(Path::new(&name))?,
                None => {
                    return Err(Error::UnknownScenario {
                        name,
                        known: scenario::BUILTIN_NAMES.join(", "),
                    });
                }
            };

            let probe = probe_for(&config, &target);
            let result = scenario::run_scenario(&scenario, &probe, verbose).await;

            if result.passed {
                Ok(())
            } else {
                Err(Error::ScenarioFailed(result.name))
            }
        }
    }
}

/// Build a probe from the config file with CLI overrides applied
fn probe_for(config: &Config, args: &TargetArgs) -> Probe {
    let host = args
        .host
        .clone()
        .unwrap_or_else(|| config.target.host.clone());
    let port = args.port.unwrap_or(config.target.port);

    let mut probe = Probe::new(Target::new(host, port))
        .with_framing(std::sync::Arc::new(HalfClose::new(config.limits.max_reply_bytes)));

    let timeout_secs = args.timeout.unwrap_or(config.timeouts.exchange_secs);
    if timeout_secs > 0 {
        probe = probe.with_timeout(Duration::from_secs(timeout_secs));
    }

    probe
}

/// Split a KEY=VALUE argument
fn parse_field(field: &str) -> Result<(String, String)> {
    match field.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(Error::InvalidField(field.to_string())),
    }
}

/// Print a single reply
fn print_reply(reply: &Reply) {
    println!("{reply}");
}

/// Print every outcome of a batch, then summarize
fn print_batch(results: &[Result<Reply>]) -> Result<()> {
    let total = results.len();
    let mut failed = 0;

    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(Reply::Decoded(value)) => println!("[{i}] {value}"),
            Ok(Reply::Empty) => println!("[{i}] (empty reply)"),
            Err(e) => {
                failed += 1;
                println!("[{i}] error: {e}");
            }
        }
    }

    println!("{}/{} exchanges succeeded", total - failed, total);

    if failed > 0 {
        Err(Error::Batch { failed, total })
    } else {
        Ok(())
    }
}
