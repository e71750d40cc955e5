//! In-memory byte stream replaying a fixed device script, for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use super::PtyChannel;
use crate::error::Result;
use crate::transport::{ByteStream, ReadEvent, TransportFactory};

/// One scripted read result.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Output(Vec<u8>),
    Timeout,
    Eof,
}

impl Step {
    pub(crate) fn output(text: &str) -> Self {
        Step::Output(text.as_bytes().to_vec())
    }
}

#[derive(Debug, Default)]
struct Record {
    writes: Vec<String>,
    terminations: usize,
    forced: bool,
    opened: Vec<String>,
}

/// Shared view of what the code under test did to the stream.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptLog(Arc<Mutex<Record>>);

impl ScriptLog {
    fn lock(&self) -> MutexGuard<'_, Record> {
        self.0.lock().unwrap()
    }

    pub(crate) fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    pub(crate) fn terminations(&self) -> usize {
        self.lock().terminations
    }

    pub(crate) fn forced(&self) -> bool {
        self.lock().forced
    }

    pub(crate) fn opened(&self) -> Vec<String> {
        self.lock().opened.clone()
    }
}

/// Replays `steps` in order; once they run out the device stays silent.
#[derive(Debug)]
pub(crate) struct ScriptedStream {
    steps: VecDeque<Step>,
    log: ScriptLog,
}

impl ScriptedStream {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self::with_log(steps, ScriptLog::default())
    }

    fn with_log(steps: Vec<Step>, log: ScriptLog) -> Self {
        Self {
            steps: steps.into(),
            log,
        }
    }

    pub(crate) fn log(&self) -> ScriptLog {
        self.log.clone()
    }
}

impl ByteStream for ScriptedStream {
    async fn read_chunk(&mut self, _deadline: Instant) -> Result<ReadEvent> {
        Ok(match self.steps.pop_front() {
            Some(Step::Output(bytes)) => ReadEvent::Data(bytes),
            Some(Step::Eof) => ReadEvent::Eof,
            Some(Step::Timeout) | None => ReadEvent::Timeout,
        })
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.log
            .lock()
            .writes
            .push(String::from_utf8_lossy(data).into_owned());
        Ok(())
    }

    async fn terminate(&mut self, force: bool) -> Result<()> {
        let mut record = self.log.lock();
        record.terminations += 1;
        record.forced |= force;
        Ok(())
    }
}

/// Factory handing out one scripted channel per `open`.
#[derive(Debug, Default)]
pub(crate) struct ScriptedFactory {
    steps: Vec<Step>,
    log: ScriptLog,
}

impl ScriptedFactory {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            log: ScriptLog::default(),
        }
    }

    pub(crate) fn log(&self) -> ScriptLog {
        self.log.clone()
    }
}

impl TransportFactory for ScriptedFactory {
    type Transport = PtyChannel<ScriptedStream>;

    async fn open(&self, connection_alias: &str, _timeout: Duration) -> Result<Self::Transport> {
        self.log.lock().opened.push(connection_alias.to_string());
        let stream = ScriptedStream::with_log(self.steps.clone(), self.log.clone());
        Ok(PtyChannel::new(stream, 1000))
    }
}
