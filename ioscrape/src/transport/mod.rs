//! Transport layer: an ssh client running on a pseudo-terminal.
//!
//! The login negotiator and command executor only ever see the narrow
//! [`Transport`] capability (`send`, `expect`, `close`). The byte-level side
//! ([`ByteStream`]) is what actually talks to the spawned process, and is
//! wrapped by [`PtyChannel`](crate::channel::PtyChannel) to provide pattern
//! matching.

pub mod config;
mod ssh;

pub use config::TransportConfig;
pub use ssh::SshProcess;

use std::future::Future;
use std::time::Duration;

use regex::bytes::Regex;
use tokio::time::Instant;

use crate::channel::PtyChannel;
use crate::error::Result;

/// Outcome of waiting for a set of patterns.
///
/// Timeout and end-of-stream are ordinary outcomes so that callers decide
/// what they mean at their stage of the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectOutcome {
    /// Pattern `index` matched; `before` is the text preceding the match.
    Matched { index: usize, before: String },

    /// Nothing matched before the timeout. `before` is what had arrived so far.
    Timeout { before: String },

    /// The process closed its output. `before` holds whatever was left.
    EndOfStream { before: String },
}

impl ExpectOutcome {
    /// Text received ahead of the outcome.
    pub fn before(&self) -> &str {
        match self {
            ExpectOutcome::Matched { before, .. }
            | ExpectOutcome::Timeout { before }
            | ExpectOutcome::EndOfStream { before } => before,
        }
    }
}

/// Line-oriented duplex session with expect-style waits.
pub trait Transport: Send {
    /// Write `line` followed by a line terminator.
    fn send(&mut self, line: &str) -> impl Future<Output = Result<()>> + Send;

    /// Wait until one of `patterns` appears, the stream ends, or `timeout` elapses.
    fn expect(
        &mut self,
        patterns: &[Regex],
        timeout: Duration,
    ) -> impl Future<Output = Result<ExpectOutcome>> + Send;

    /// Terminate the underlying process. Calling it again is a no-op.
    ///
    /// With `force` the process is killed right away; otherwise it gets a
    /// grace period to exit on its own first.
    fn close(&mut self, force: bool) -> impl Future<Output = Result<()>> + Send;

    /// Whether [`close`](Self::close) has completed.
    fn is_closed(&self) -> bool;
}

/// One read from a [`ByteStream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    Data(Vec<u8>),
    Timeout,
    Eof,
}

/// Raw byte pipe to a spawned process.
pub trait ByteStream: Send {
    /// Wait for the next chunk of output until `deadline`.
    fn read_chunk(&mut self, deadline: Instant) -> impl Future<Output = Result<ReadEvent>> + Send;

    /// Write all of `data` to the process input.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Stop the process, see [`Transport::close`].
    fn terminate(&mut self, force: bool) -> impl Future<Output = Result<()>> + Send;
}

/// Opens a fresh transport for a connection alias.
pub trait TransportFactory: Send + Sync {
    type Transport: Transport;

    fn open(
        &self,
        connection_alias: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Transport>> + Send;
}

/// Factory spawning `ssh -tt -F <config> <alias>` on a pseudo-terminal.
#[derive(Debug, Clone, Default)]
pub struct SshTransportFactory {
    config: TransportConfig,
}

impl SshTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl TransportFactory for SshTransportFactory {
    type Transport = PtyChannel<SshProcess>;

    async fn open(&self, connection_alias: &str, timeout: Duration) -> Result<Self::Transport> {
        let process = SshProcess::spawn(&self.config, connection_alias, timeout)?;
        Ok(PtyChannel::new(process, self.config.search_depth))
    }
}
