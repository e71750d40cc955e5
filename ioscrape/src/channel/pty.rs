//! PTY channel: expect-style pattern waits over a byte stream.

use std::borrow::Cow;
use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{Result, TransportError};
use crate::transport::{ByteStream, ExpectOutcome, ReadEvent, Transport};

/// High-level channel for interactive device sessions.
///
/// This wraps a [`ByteStream`] and provides pattern-based reads with
/// timeout and end-of-stream handling.
#[derive(Debug)]
pub struct PtyChannel<S> {
    stream: S,

    /// Pattern buffer for accumulating output.
    buffer: PatternBuffer,

    /// The stream reported end-of-file; no more reads.
    eof: bool,

    closed: bool,
}

impl<S: ByteStream> PtyChannel<S> {
    /// Create a new channel over `stream`.
    pub fn new(stream: S, search_depth: usize) -> Self {
        Self {
            stream,
            buffer: PatternBuffer::new(search_depth),
            eof: false,
            closed: false,
        }
    }

    /// The underlying stream.
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Output received but not yet consumed by an `expect`.
    pub fn pending(&self) -> Cow<'_, str> {
        self.buffer.as_str_lossy()
    }

    /// Whether the stream has ended.
    pub fn at_eof(&self) -> bool {
        self.eof
    }
}

impl<S: ByteStream> Transport for PtyChannel<S> {
    async fn send(&mut self, line: &str) -> Result<()> {
        if self.closed {
            return Err(TransportError::Closed.into());
        }
        trace!("sending {} bytes", line.len() + 1);
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.stream.write_all(&data).await
    }

    async fn expect(&mut self, patterns: &[Regex], timeout: Duration) -> Result<ExpectOutcome> {
        if self.closed {
            return Err(TransportError::Closed.into());
        }
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(m) = self.buffer.find_first(patterns) {
                trace!("pattern {} matched at {}..{}", m.index, m.start, m.end);
                return Ok(ExpectOutcome::Matched {
                    index: m.index,
                    before: self.buffer.consume(&m),
                });
            }

            if self.eof {
                let rest = self.buffer.take();
                return Ok(ExpectOutcome::EndOfStream {
                    before: String::from_utf8_lossy(&rest).into_owned(),
                });
            }

            match self.stream.read_chunk(deadline).await? {
                ReadEvent::Data(chunk) => self.buffer.extend(&chunk),
                ReadEvent::Eof => self.eof = true,
                ReadEvent::Timeout => {
                    return Ok(ExpectOutcome::Timeout {
                        before: self.buffer.as_str_lossy().into_owned(),
                    });
                }
            }
        }
    }

    async fn close(&mut self, force: bool) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.stream.terminate(force).await?;
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
