//! Mock command server for exercising the probe without a real backend
//!
//! Accepts TCP connections, reads one JSON request per connection (the
//! request ends when the client half-closes), and echoes the raw bytes back.
//! A `shutdown` command stops the listener after its reply is sent.

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(4120);

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    println!("mock server listening on 127.0.0.1:{port}");

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                println!("shutdown requested, closing listener");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                println!("client connected: {peer}");
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, shutdown_tx).await {
                        eprintln!("client error: {e}");
                    }
                });
            }
        }
    }

    Ok(())
}

/// Serve one connection: read until half-close, echo, flag shutdown requests
async fn handle_client(
    mut stream: TcpStream,
    shutdown_tx: mpsc::Sender<()>,
) -> std::io::Result<()> {
    let mut request = Vec::new();
    stream.read_to_end(&mut request).await?;

    if request.is_empty() {
        return Ok(());
    }

    stream.write_all(&request).await?;
    stream.flush().await?;

    if is_shutdown(&request) {
        let _ = shutdown_tx.send(()).await;
    }

    Ok(())
}

fn is_shutdown(request: &[u8]) -> bool {
    serde_json::from_slice::<Value>(request)
        .ok()
        .and_then(|value| {
            value
                .get("command")
                .and_then(Value::as_str)
                .map(|command| command == "shutdown")
        })
        .unwrap_or(false)
}
