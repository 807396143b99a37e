//! End-to-end tests for the probe harness
//!
//! Each test talks to a small in-process TCP server that plays one peer
//! role: echoing, delaying, staying silent, replying with garbage, framing
//! replies with a length prefix, or shutting down on request.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use probe::client::batch::{send_many, Exchange};
use probe::scenario;
use probe::wire::framing::LengthPrefixed;
use probe::{Command, Error, Probe, Reply, Target};

/// Bind an ephemeral listener and return it with its target address
async fn bind_server() -> (TcpListener, Target) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, Target::new("127.0.0.1", port))
}

/// Read one half-close-framed request from the client
async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut request = Vec::new();
    let _ = stream.read_to_end(&mut request).await;
    request
}

/// Echo server: replies with the raw request bytes
async fn spawn_echo_server() -> Target {
    let (listener, target) = bind_server().await;
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let request = read_request(&mut stream).await;
                if !request.is_empty() {
                    let _ = stream.write_all(&request).await;
                }
            });
        }
    });
    target
}

/// Delay server: sleeps for the request's `delay_ms` field, then echoes
async fn spawn_delay_server() -> Target {
    let (listener, target) = bind_server().await;
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let request = read_request(&mut stream).await;
                let delay_ms = serde_json::from_slice::<serde_json::Value>(&request)
                    .ok()
                    .and_then(|value| {
                        value
                            .get("delay_ms")
                            .and_then(|field| field.as_str())
                            .and_then(|text| text.parse::<u64>().ok())
                    })
                    .unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                let _ = stream.write_all(&request).await;
            });
        }
    });
    target
}

/// Silent server: consumes the request and closes without replying
async fn spawn_silent_server() -> Target {
    let (listener, target) = bind_server().await;
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let _ = read_request(&mut stream).await;
            });
        }
    });
    target
}

/// Garbage server: replies with bytes that are not JSON
async fn spawn_garbage_server() -> Target {
    let (listener, target) = bind_server().await;
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let _ = read_request(&mut stream).await;
                let _ = stream.write_all(b"definitely not json").await;
            });
        }
    });
    target
}

/// Hung server: reads the request, then keeps the connection open forever
async fn spawn_hung_server() -> Target {
    let (listener, target) = bind_server().await;
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let _ = read_request(&mut stream).await;
                tokio::time::sleep(Duration::from_secs(120)).await;
                drop(stream);
            });
        }
    });
    target
}

/// Length-prefixed echo server: u32-LE length framing on both directions
async fn spawn_framed_echo_server() -> Target {
    let (listener, target) = bind_server().await;
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut len_buf = [0u8; 4];
                if stream.read_exact(&mut len_buf).await.is_err() {
                    return;
                }
                let len = u32::from_le_bytes(len_buf) as usize;
                let mut body = vec![0u8; len];
                if stream.read_exact(&mut body).await.is_err() {
                    return;
                }
                let _ = stream.write_all(&len_buf).await;
                let _ = stream.write_all(&body).await;
            });
        }
    });
    target
}

/// Shutdown-aware echo server: stops accepting after a `shutdown` command
async fn spawn_shutdown_server() -> Target {
    let (listener, target) = bind_server().await;
    tokio::spawn(async move {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                accepted = listener.accept() => {
                    let Ok((mut stream, _)) = accepted else { break };
                    let shutdown_tx = shutdown_tx.clone();
                    tokio::spawn(async move {
                        let request = read_request(&mut stream).await;
                        if request.is_empty() {
                            return;
                        }
                        let _ = stream.write_all(&request).await;
                        let _ = stream.flush().await;
                        let is_shutdown = serde_json::from_slice::<serde_json::Value>(&request)
                            .ok()
                            .and_then(|value| {
                                value.get("command").and_then(|verb| verb.as_str()).map(String::from)
                            })
                            .is_some_and(|verb| verb == "shutdown");
                        if is_shutdown {
                            let _ = shutdown_tx.send(()).await;
                        }
                    });
                }
            }
        }
    });
    target
}

#[tokio::test]
async fn ping_yields_a_decoded_reply() {
    let target = spawn_echo_server().await;
    let probe = Probe::new(target);

    let reply = probe.send(&Command::ping()).await.unwrap();
    assert_eq!(
        reply,
        Reply::Decoded(serde_json::json!({ "command": "ping" }))
    );
}

#[tokio::test]
async fn echo_round_trip_preserves_structure() {
    let target = spawn_echo_server().await;
    let probe = Probe::new(target);

    let cmd = Command::compile("source code text")
        .with_field("code 1", "source code text 1")
        .with_field("code 2", "source code text 2");

    let reply = probe.send(&cmd).await.unwrap();
    assert_eq!(
        reply.as_value().unwrap(),
        &serde_json::to_value(&cmd).unwrap()
    );
}

#[tokio::test]
async fn empty_reply_is_reported_not_decoded() {
    let target = spawn_silent_server().await;
    let probe = Probe::new(target);

    let reply = probe.send(&Command::ping()).await.unwrap();
    assert!(reply.is_empty());
    assert!(reply.as_value().is_none());
}

#[tokio::test]
async fn garbage_reply_is_a_decode_error() {
    let target = spawn_garbage_server().await;
    let probe = Probe::new(target);

    let err = probe.send(&Command::ping()).await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_target_is_a_connection_error() {
    // Bind then drop so the port is known to refuse connections
    let (listener, target) = bind_server().await;
    drop(listener);

    let probe = Probe::new(target);
    let err = probe.send(&Command::ping()).await.unwrap_err();
    assert!(matches!(err, Error::Connection { .. }), "got {err:?}");
}

#[tokio::test]
async fn hung_peer_is_bounded_by_the_timeout() {
    let target = spawn_hung_server().await;
    let probe = Probe::new(target).with_timeout(Duration::from_millis(200));

    let err = probe.send(&Command::ping()).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "got {err:?}");
}

#[tokio::test]
async fn empty_verb_is_rejected_before_connecting() {
    // Target is never contacted; any port works
    let probe = Probe::new(Target::new("127.0.0.1", 1));
    let err = probe.send(&Command::new("")).await.unwrap_err();
    assert!(matches!(err, Error::EmptyCommand), "got {err:?}");
}

#[tokio::test]
async fn batch_results_come_back_in_input_order() {
    let target = spawn_delay_server().await;
    let probe = Probe::new(target);

    // Earlier commands sleep longer, so completion order is reversed
    let commands: Vec<Command> = (0..8)
        .map(|i| {
            Command::compile(format!("source {i}"))
                .with_field("delay_ms", format!("{}", (8 - i) * 50))
        })
        .collect();

    let results = probe.send_many(commands.clone()).await;

    assert_eq!(results.len(), commands.len());
    for (cmd, result) in commands.iter().zip(&results) {
        let reply = result.as_ref().unwrap();
        assert_eq!(
            reply.as_value().unwrap(),
            &serde_json::to_value(cmd).unwrap()
        );
    }
}

#[tokio::test]
async fn concurrent_burst_has_no_cross_contamination() {
    let target = spawn_echo_server().await;
    let probe = Probe::new(target);

    let commands: Vec<Command> = (0..250)
        .map(|i| Command::compile(format!("source code text {i}")))
        .collect();

    let results = probe.send_many(commands.clone()).await;

    assert_eq!(results.len(), 250);
    for (i, (cmd, result)) in commands.iter().zip(&results).enumerate() {
        let reply = result
            .as_ref()
            .unwrap_or_else(|e| panic!("exchange {i} failed: {e}"));
        assert_eq!(
            reply.as_value().unwrap(),
            &serde_json::to_value(cmd).unwrap(),
            "reply {i} does not match its own request"
        );
    }
}

#[tokio::test]
async fn one_failed_exchange_does_not_abort_siblings() {
    let good = spawn_echo_server().await;
    let (listener, refused) = bind_server().await;
    drop(listener);

    let exchanges = vec![
        Exchange::new(Command::ping(), good.clone()),
        Exchange::new(Command::ping(), refused),
        Exchange::new(Command::ping(), good),
    ];

    let results = send_many(exchanges).await;

    assert!(results[0].is_ok());
    assert!(matches!(&results[1], Err(Error::Connection { .. })));
    assert!(results[2].is_ok());
}

#[tokio::test]
async fn shutdown_succeeds_even_though_the_server_then_refuses() {
    let target = spawn_shutdown_server().await;
    let probe = Probe::new(target.clone());

    let ping = probe.send(&Command::ping()).await.unwrap();
    assert!(!ping.is_empty());

    let shutdown = probe.send(&Command::shutdown()).await.unwrap();
    assert_eq!(
        shutdown,
        Reply::Decoded(serde_json::json!({ "command": "shutdown" }))
    );

    // The listener closes shortly after the shutdown reply; poll until
    // new connections are refused
    let mut refused = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if probe.send(&Command::ping()).await.is_err() {
            refused = true;
            break;
        }
    }
    assert!(refused, "server kept accepting after shutdown");
}

#[tokio::test]
async fn length_prefixed_framing_substitutes_cleanly() {
    let target = spawn_framed_echo_server().await;
    let probe = Probe::new(target).with_framing(Arc::new(LengthPrefixed::default()));

    let cmd = Command::compile("framed source");
    let reply = probe.send(&cmd).await.unwrap();
    assert_eq!(
        reply.as_value().unwrap(),
        &serde_json::to_value(&cmd).unwrap()
    );
}

#[tokio::test]
async fn builtin_ping_scenario_passes_against_an_echo_server() {
    let target = spawn_echo_server().await;
    let probe = Probe::new(target);

    let ping = scenario::builtin("ping").unwrap();
    let result = scenario::run_scenario(&ping, &probe, false).await;
    assert!(result.passed, "{:?}", result.error);
    assert_eq!(result.steps_run, result.steps_total);
}

#[tokio::test]
async fn yaml_scenario_runs_from_disk() {
    let target = spawn_echo_server().await;
    let probe = Probe::new(target);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
name: echo-smoke
description: ping then a small burst against an echo double
steps:
  - action: send
    command: ping
    expect:
      echo: true
  - action: burst
    command: compile
    connections: 8
    distinct_field: code
    expect:
      echo: true
"#
    )
    .unwrap();

    let scenario = scenario::load_scenario(file.path()).unwrap();
    let result = scenario::run_scenario(&scenario, &probe, false).await;
    assert!(result.passed, "{:?}", result.error);
}

#[tokio::test]
async fn failed_expectation_fails_the_scenario() {
    let target = spawn_silent_server().await;
    let probe = Probe::new(target);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
name: wants-echo
steps:
  - action: send
    command: ping
    expect:
      echo: true
"#
    )
    .unwrap();

    let scenario = scenario::load_scenario(file.path()).unwrap();
    let result = scenario::run_scenario(&scenario, &probe, false).await;
    assert!(!result.passed);
    assert_eq!(result.steps_run, 1);
    assert!(result.error.is_some());
}
