//! Transport configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default location of the operator-managed ssh client config.
pub const DEFAULT_SSH_CONFIG_PATH: &str = "./config/ssh_config";

/// How the ssh client process is started and driven.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// ssh client binary (default: `ssh` from `PATH`).
    pub ssh_program: String,

    /// File passed to `ssh -F`. Its contents are never parsed here.
    pub ssh_config_path: PathBuf,

    /// Terminal width for the PTY.
    pub terminal_width: u16,

    /// Terminal height for the PTY.
    pub terminal_height: u16,

    /// Look-back depth for pattern searches.
    pub search_depth: usize,

    /// How long a graceful close waits for the process to exit by itself.
    pub close_grace: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ssh_program: "ssh".to_string(),
            ssh_config_path: PathBuf::from(DEFAULT_SSH_CONFIG_PATH),
            terminal_width: 511,
            terminal_height: 24,
            search_depth: 1000,
            close_grace: Duration::from_secs(1),
        }
    }
}

impl TransportConfig {
    /// Use a different ssh client config file.
    pub fn with_ssh_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_config_path = path.into();
        self
    }

    /// Use a different ssh binary.
    pub fn with_ssh_program(mut self, program: impl Into<String>) -> Self {
        self.ssh_program = program.into();
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set the graceful close period.
    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }
}
