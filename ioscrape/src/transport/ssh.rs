//! ssh client process on a pseudo-terminal.
//!
//! The device CLI only paginates and prompts correctly when it sees a real
//! terminal, so the system `ssh` binary is started with `-tt` inside a PTY
//! rather than on plain pipes.
//!
//! PTY reads, writes and process kills all block. Reads run on a dedicated
//! thread; writes and kills go through `spawn_blocking` so the async side
//! never stalls on them.

use std::io::{self, ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, trace, warn};
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::mpsc;
use tokio::task::spawn_blocking;
use tokio::time::{Instant, sleep, timeout_at};

use super::config::TransportConfig;
use super::{ByteStream, ReadEvent};
use crate::error::{Result, TransportError};

const READ_CHUNK: usize = 4096;
const EXIT_POLL: Duration = Duration::from_millis(50);

type SharedChild = Arc<Mutex<Box<dyn Child + Send + Sync>>>;
type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// A running `ssh -tt` process.
pub struct SshProcess {
    program: String,
    pid: Option<u32>,
    child: SharedChild,

    /// Keeps the PTY open for as long as the process is in use.
    _master: Box<dyn MasterPty + Send>,

    /// Dropped on terminate; no more input after that.
    writer: Option<SharedWriter>,

    /// Output chunks from the reader thread; closed at end of stream.
    output: mpsc::Receiver<Vec<u8>>,

    close_grace: Duration,
}

impl SshProcess {
    /// Build the ssh command line for `alias`.
    pub fn command(config: &TransportConfig, alias: &str, connect_timeout: Duration) -> CommandBuilder {
        let mut cmd = CommandBuilder::new(&config.ssh_program);
        cmd.arg("-tt");
        cmd.arg("-F");
        cmd.arg(&config.ssh_config_path);
        cmd.arg("-o");
        cmd.arg(format!("ConnectTimeout={}", connect_timeout.as_secs().max(1)));
        cmd.arg(alias);
        cmd
    }

    /// Spawn ssh for `alias` on a fresh pseudo-terminal.
    pub fn spawn(config: &TransportConfig, alias: &str, connect_timeout: Duration) -> Result<Self> {
        let program = config.ssh_program.clone();
        let spawn_error = |message: String| TransportError::Spawn {
            program: program.clone(),
            message,
        };

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: config.terminal_height,
                cols: config.terminal_width,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| spawn_error(e.to_string()))?;

        let child = pair
            .slave
            .spawn_command(Self::command(config, alias, connect_timeout))
            .map_err(|e| spawn_error(e.to_string()))?;
        // Only the child may hold the slave side, otherwise the reader never
        // sees end-of-stream when ssh exits.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| spawn_error(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| spawn_error(e.to_string()))?;

        let (tx, rx) = mpsc::channel(64);
        std::thread::Builder::new()
            .name(format!("ioscrape-pty-{alias}"))
            .spawn(move || pump_output(reader, tx))
            .map_err(TransportError::from)?;

        let pid = child.process_id();
        debug!("spawned {} for '{}' (pid {:?})", program, alias, pid);

        Ok(Self {
            program,
            pid,
            child: Arc::new(Mutex::new(child)),
            _master: pair.master,
            writer: Some(Arc::new(Mutex::new(writer))),
            output: rx,
            close_grace: config.close_grace,
        })
    }

    /// Whether the process is still running.
    ///
    /// A process found to have exited is reaped by this check.
    pub fn is_alive(&self) -> bool {
        match self.child.lock() {
            Ok(mut child) => matches!(child.try_wait(), Ok(None)),
            Err(_) => false,
        }
    }

    /// OS process id, if known.
    pub fn process_id(&self) -> Option<u32> {
        self.pid
    }

    async fn kill(&mut self) -> Result<()> {
        debug!("killing {} (pid {:?})", self.program, self.pid);
        let child = Arc::clone(&self.child);
        spawn_blocking(move || kill_and_reap(&child))
            .await
            .map_err(io::Error::other)
            .and_then(|killed| killed)
            .map_err(TransportError::from)?;
        Ok(())
    }
}

/// Kill the process if it is still running and wait for it, so no zombie
/// is left behind. Blocks for as long as the kill takes.
fn kill_and_reap(child: &Mutex<Box<dyn Child + Send + Sync>>) -> io::Result<()> {
    let mut child = child
        .lock()
        .map_err(|_| io::Error::other("child process lock poisoned"))?;
    if child.try_wait()?.is_some() {
        return Ok(());
    }
    if let Err(e) = child.kill() {
        // Lost the race with a normal exit.
        if child.try_wait()?.is_some() {
            return Ok(());
        }
        return Err(e);
    }
    child.wait()?;
    Ok(())
}

/// Blocking read loop feeding the async side.
fn pump_output(mut reader: Box<dyn Read + Send>, tx: mpsc::Sender<Vec<u8>>) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.blocking_send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            // Linux reports EIO once the slave side is gone.
            Err(e) => {
                trace!("pty read ended: {}", e);
                break;
            }
        }
    }
}

impl ByteStream for SshProcess {
    async fn read_chunk(&mut self, deadline: Instant) -> Result<ReadEvent> {
        match timeout_at(deadline, self.output.recv()).await {
            Ok(Some(chunk)) => {
                trace!("read {} bytes", chunk.len());
                Ok(ReadEvent::Data(chunk))
            }
            Ok(None) => Ok(ReadEvent::Eof),
            Err(_) => Ok(ReadEvent::Timeout),
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let writer = Arc::clone(self.writer.as_ref().ok_or(TransportError::Closed)?);
        let data = data.to_vec();
        let len = data.len();

        spawn_blocking(move || -> io::Result<()> {
            let mut writer = writer
                .lock()
                .map_err(|_| io::Error::other("pty writer lock poisoned"))?;
            writer.write_all(&data)?;
            writer.flush()
        })
        .await
        .map_err(io::Error::other)
        .and_then(|written| written)
        .map_err(TransportError::from)?;

        trace!("wrote {} bytes", len);
        Ok(())
    }

    async fn terminate(&mut self, force: bool) -> Result<()> {
        self.writer.take();

        if !force {
            let deadline = Instant::now() + self.close_grace;
            while Instant::now() < deadline {
                if !self.is_alive() {
                    debug!("{} exited on its own", self.program);
                    return Ok(());
                }
                sleep(EXIT_POLL).await;
            }
        }

        self.kill().await
    }
}

impl Drop for SshProcess {
    fn drop(&mut self) {
        if !self.is_alive() {
            return;
        }
        warn!(
            "{} (pid {:?}) dropped while running, killing it",
            self.program, self.pid
        );
        let child = Arc::clone(&self.child);
        let reaper = std::thread::Builder::new()
            .name("ioscrape-reaper".to_string())
            .spawn(move || {
                if let Err(e) = kill_and_reap(&child) {
                    warn!("failed to kill dropped ssh process: {}", e);
                }
            });
        if let Err(e) = reaper {
            warn!("could not start reaper thread: {}", e);
        }
    }
}
