//! Single request/response exchange
//!
//! An exchange owns exactly one connection: connect, serialize, write,
//! half-close, read the reply, decode, close. No reuse, no retries.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;

use crate::common::{Error, Result};
use crate::wire::command::{Command, Reply};
use crate::wire::framing::{Framing, HalfClose};

/// A host/port pair to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The address string passed to the connector
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Client for issuing command exchanges against a configured target
#[derive(Clone)]
pub struct Probe {
    target: Target,
    framing: Arc<dyn Framing>,
    timeout: Option<Duration>,
}

impl Probe {
    /// Create a probe with half-close framing and no timeout
    pub fn new(target: Target) -> Self {
        Self {
            target,
            framing: Arc::new(HalfClose::default()),
            timeout: None,
        }
    }

    /// Substitute the framing strategy
    pub fn with_framing(mut self, framing: Arc<dyn Framing>) -> Self {
        self.framing = framing;
        self
    }

    /// Bound each exchange to the given duration
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Send one command and wait for the reply
    ///
    /// Opens a fresh connection, writes the encoded command, half-closes the
    /// write direction, then reads until the peer closes. A zero-length
    /// response is reported as [`Reply::Empty`] and never decoded.
    pub async fn send(&self, command: &Command) -> Result<Reply> {
        let payload = command.encode()?;

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.exchange(&payload))
                .await
                .map_err(|_| Error::Timeout(timeout.as_secs()))?,
            None => self.exchange(&payload).await,
        }
    }

    /// Send the same-target batch concurrently, results in input order
    pub async fn send_many(&self, commands: Vec<Command>) -> Vec<Result<Reply>> {
        let exchanges = commands
            .into_iter()
            .map(|command| super::batch::Exchange {
                command,
                target: self.target.clone(),
            })
            .collect();
        super::batch::send_many_with(exchanges, Arc::clone(&self.framing), self.timeout).await
    }

    async fn exchange(&self, payload: &[u8]) -> Result<Reply> {
        let addr = self.target.addr();

        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| Error::connection(&addr, e))?;

        tracing::debug!("connected to {addr}, sending {} bytes", payload.len());

        self.framing
            .write_request(&mut stream, payload)
            .await
            .map_err(|e| Error::connection(&addr, e))?;

        let bytes = self
            .framing
            .read_reply(&mut stream)
            .await
            .map_err(|e| Error::connection(&addr, e))?;

        tracing::debug!("received {} bytes from {addr}", bytes.len());

        if bytes.is_empty() {
            return Ok(Reply::Empty);
        }

        let value = serde_json::from_slice(&bytes).map_err(Error::Decode)?;
        Ok(Reply::Decoded(value))
    }
}
