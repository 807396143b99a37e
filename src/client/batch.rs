//! Concurrent exchange batches
//!
//! Every exchange in a batch runs on its own task and its own connection, so
//! no blocking read stalls a sibling. Results come back in input order no
//! matter when each exchange completes, and an error stays local to the
//! exchange that produced it.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use crate::common::{Error, Result};
use crate::wire::command::{Command, Reply};
use crate::wire::framing::{Framing, HalfClose};

use super::exchange::{Probe, Target};

/// One command aimed at one target
#[derive(Debug, Clone)]
pub struct Exchange {
    pub command: Command,
    pub target: Target,
}

impl Exchange {
    pub fn new(command: Command, target: Target) -> Self {
        Self { command, target }
    }
}

/// Fire all exchanges concurrently and collect replies in input order
///
/// Uses half-close framing and no timeout; see [`send_many_with`] for
/// control over both.
pub async fn send_many(exchanges: Vec<Exchange>) -> Vec<Result<Reply>> {
    send_many_with(exchanges, Arc::new(HalfClose::default()), None).await
}

/// [`send_many`] with an explicit framing strategy and optional timeout
pub async fn send_many_with(
    exchanges: Vec<Exchange>,
    framing: Arc<dyn Framing>,
    timeout: Option<Duration>,
) -> Vec<Result<Reply>> {
    let tasks: Vec<_> = exchanges
        .into_iter()
        .map(|exchange| {
            let framing = Arc::clone(&framing);
            tokio::spawn(async move {
                let mut probe = Probe::new(exchange.target).with_framing(framing);
                if let Some(timeout) = timeout {
                    probe = probe.with_timeout(timeout);
                }
                probe.send(&exchange.command).await
            })
        })
        .collect();

    // join_all preserves input order regardless of completion order
    join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap_or_else(|e| Err(Error::Internal(e.to_string()))))
        .collect()
}
