//! Result type for one executed command.

use std::time::Duration;

/// Output of one command run in a ready session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// The command that was sent.
    pub command: String,

    /// Normalized output: no echoed command line, no trailing prompt.
    pub output: String,

    /// Everything between sending the command and the next prompt.
    pub raw_output: String,

    /// Time from sending the command to seeing the prompt.
    pub elapsed: Duration,
}

impl CommandResult {
    pub fn new(
        command: impl Into<String>,
        output: impl Into<String>,
        raw_output: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            raw_output: raw_output.into(),
            elapsed,
        }
    }

    /// Whether the command printed nothing.
    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Get the output lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines()
    }
}

impl std::fmt::Display for CommandResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output)
    }
}
