//! Sequential command execution on a logged-in session.

use std::time::Instant;

use log::{debug, info};

use super::normalize::{normalize, strip_echo};
use super::response::CommandResult;
use super::session::{Session, SessionState};
use crate::error::{DriverError, Result};
use crate::transport::{ExpectOutcome, Transport};

/// Disables the pager so long output arrives without `--More--` stops.
pub const DEFAULT_PAGING_COMMAND: &str = "terminal length 0";

pub const DEFAULT_EXIT_COMMAND: &str = "exit";

/// Runs a batch of commands, then ends the session.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    paging_command: Option<String>,
    exit_command: String,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self {
            paging_command: Some(DEFAULT_PAGING_COMMAND.to_string()),
            exit_command: DEFAULT_EXIT_COMMAND.to_string(),
        }
    }
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command sent before the batch, or `None` to leave paging alone.
    pub fn with_paging_command(mut self, command: Option<String>) -> Self {
        self.paging_command = command;
        self
    }

    pub fn with_exit_command(mut self, command: impl Into<String>) -> Self {
        self.exit_command = command.into();
        self
    }

    /// Run `commands` in order on a [`Ready`](SessionState::Ready) session.
    ///
    /// The session is always finished afterwards: closed normally after the
    /// last command, or force-closed and [`Failed`](SessionState::Failed) if
    /// anything goes wrong.
    pub async fn run_commands<T: Transport>(
        &self,
        session: &mut Session<T>,
        commands: &[&str],
    ) -> Result<Vec<CommandResult>> {
        session.require(SessionState::Ready)?;
        session.set_state(SessionState::Executing);

        let results = match self.execute(session, commands).await {
            Ok(results) => results,
            Err(e) => {
                debug!(
                    "{}: execution failed: {}",
                    session.profile().display_id,
                    e
                );
                session.abort().await;
                return Err(e);
            }
        };

        session.set_state(SessionState::Closing);
        if let Err(e) = session.transport_mut().send(&self.exit_command).await {
            session.abort().await;
            return Err(e);
        }
        session.close().await?;

        Ok(results)
    }

    async fn execute<T: Transport>(
        &self,
        session: &mut Session<T>,
        commands: &[&str],
    ) -> Result<Vec<CommandResult>> {
        if let Some(paging) = &self.paging_command {
            self.send_command(session, paging).await?;
        }

        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let result = self.send_command(session, command).await?;
            info!(
                "{}: '{}' returned {} bytes in {:?}",
                session.profile().display_id,
                command,
                result.output.len(),
                result.elapsed
            );
            results.push(result);
        }
        Ok(results)
    }

    async fn send_command<T: Transport>(
        &self,
        session: &mut Session<T>,
        command: &str,
    ) -> Result<CommandResult> {
        let prompt = session.profile().prompt.clone();
        let timeout = session.timeout();
        let start = Instant::now();

        session.transport_mut().send(command).await?;
        let outcome = session
            .transport_mut()
            .expect(std::slice::from_ref(&prompt), timeout)
            .await?;

        let raw = match outcome {
            ExpectOutcome::Matched { before, .. } => before,
            ExpectOutcome::Timeout { .. } => {
                return Err(DriverError::ExecutionTimeout {
                    command: command.to_string(),
                    timeout,
                }
                .into());
            }
            ExpectOutcome::EndOfStream { .. } => {
                return Err(DriverError::UnexpectedEndOfStream {
                    command: command.to_string(),
                }
                .into());
            }
        };

        let output = normalize(strip_echo(&raw, command), &prompt);
        Ok(CommandResult::new(command, output, raw, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::channel::PtyChannel;
    use crate::channel::scripted::{ScriptLog, ScriptedStream, Step};
    use crate::error::ErrorKind;
    use crate::registry::DeviceProfile;

    fn ready_session(steps: Vec<Step>) -> (Session<PtyChannel<ScriptedStream>>, ScriptLog) {
        let stream = ScriptedStream::new(steps);
        let log = stream.log();
        let profile = DeviceProfile::new("Cisco-3560-PoE-switch", "cisco-3560-poe")
            .with_prompt(r"(?m)^Cat_3560-PoE[>#]\s*$")
            .unwrap();
        let mut session =
            Session::new(PtyChannel::new(stream, 1000), profile, Duration::from_secs(5));
        session.set_state(SessionState::Ready);
        (session, log)
    }

    #[tokio::test]
    async fn test_two_commands() {
        let (mut session, log) = ready_session(vec![
            Step::output("terminal length 0\r\nCat_3560-PoE#"),
            Step::output("show clock\r\n*09:14:02.123 UTC Mon Oct 12 2026\r\nCat_3560-PoE#"),
            Step::output("show users\r\n    Line       User       Host(s)\r\n"),
            Step::output("*  1 vty 0     admin      idle\r\n\r\nCat_3560-PoE#"),
        ]);
        let results = assert_ok!(
            CommandExecutor::default()
                .run_commands(&mut session, &["show clock", "show users"])
                .await
        );

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].command, "show clock");
        assert_eq!(results[0].output, "*09:14:02.123 UTC Mon Oct 12 2026");
        assert_eq!(
            results[1].output,
            "    Line       User       Host(s)\n*  1 vty 0     admin      idle"
        );
        assert!(results[1].raw_output.starts_with("show users\r\n"));

        assert_eq!(
            log.writes(),
            vec!["terminal length 0\n", "show clock\n", "show users\n", "exit\n"]
        );
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(log.terminations(), 1);
        assert!(!log.forced());
    }

    #[tokio::test]
    async fn test_empty_output() {
        let (mut session, _) = ready_session(vec![
            Step::output("terminal length 0\r\nCat_3560-PoE#"),
            Step::output("clear counters\r\n\r\nCat_3560-PoE#"),
        ]);
        let results = CommandExecutor::default()
            .run_commands(&mut session, &["clear counters"])
            .await
            .unwrap();
        assert!(results[0].is_empty());
    }

    #[tokio::test]
    async fn test_end_of_stream_mid_command() {
        let (mut session, log) = ready_session(vec![
            Step::output("terminal length 0\r\nCat_3560-PoE#"),
            Step::output("show version\r\nCisco IOS Software, C3560 Software"),
            Step::Eof,
        ]);
        let err = assert_err!(
            CommandExecutor::default()
                .run_commands(&mut session, &["show version"])
                .await
        );
        assert_eq!(err.kind(), ErrorKind::UnexpectedEndOfStream);
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(log.terminations(), 1);
        assert!(log.forced());
        assert!(!log.writes().contains(&"exit\n".to_string()));
    }

    #[tokio::test]
    async fn test_prompt_timeout() {
        let (mut session, log) = ready_session(vec![
            Step::output("terminal length 0\r\nCat_3560-PoE#"),
            Step::output("show tech-support\r\n------------------ show version"),
            Step::Timeout,
        ]);
        let err = CommandExecutor::default()
            .run_commands(&mut session, &["show tech-support"])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionTimeout);
        assert!(err.to_string().contains("show tech-support"));
        assert_eq!(log.terminations(), 1);
    }

    #[tokio::test]
    async fn test_without_paging_command() {
        let (mut session, log) = ready_session(vec![Step::output(
            "show clock\r\n09:14:02 UTC\r\nCat_3560-PoE#",
        )]);
        let results = CommandExecutor::default()
            .with_paging_command(None)
            .with_exit_command("logout")
            .run_commands(&mut session, &["show clock"])
            .await
            .unwrap();
        assert_eq!(results[0].output, "09:14:02 UTC");
        assert_eq!(log.writes(), vec!["show clock\n", "logout\n"]);
    }

    #[tokio::test]
    async fn test_requires_ready_session() {
        let (mut session, log) = ready_session(vec![]);
        session.set_state(SessionState::Connecting);
        let err = CommandExecutor::default()
            .run_commands(&mut session, &["show clock"])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(log.writes().is_empty());
    }
}
