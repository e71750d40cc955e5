//! Runtime settings, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::credential::EnvCredential;
use crate::error::{ConfigError, Result};
use crate::transport::TransportConfig;
use crate::transport::config::DEFAULT_SSH_CONFIG_PATH;

/// Overrides the ssh client config path.
pub const SSH_CONFIG_ENV: &str = "MCP_SSH_CONFIG";

/// Names the variable that holds the password.
pub const PASSWORD_ENV_OVERRIDE: &str = "CISCO_PASSWORD_ENV";

/// Password variable used when no override is set.
pub const DEFAULT_PASSWORD_ENV: &str = "CISCO_PASSWORD";

/// Overrides the per-wait timeout, in whole seconds.
pub const TIMEOUT_ENV: &str = "MCP_SSH_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

/// Process-wide settings for tool calls.
#[derive(Debug, Clone)]
pub struct Settings {
    /// File handed to `ssh -F`.
    pub ssh_config_path: PathBuf,

    /// Environment variable holding the device password.
    pub password_env: String,

    /// Timeout applied to every wait in login and command execution.
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ssh_config_path: PathBuf::from(DEFAULT_SSH_CONFIG_PATH),
            password_env: DEFAULT_PASSWORD_ENV.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(path) = lookup(SSH_CONFIG_ENV).filter(|v| !v.is_empty()) {
            settings.ssh_config_path = PathBuf::from(path);
        }
        if let Some(var) = lookup(PASSWORD_ENV_OVERRIDE).filter(|v| !v.is_empty()) {
            settings.password_env = var;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: TIMEOUT_ENV.to_string(),
                    value: raw.clone(),
                })?;
            settings.timeout = Duration::from_secs(secs);
        }

        Ok(settings)
    }

    /// Transport configuration pointing at the configured ssh config file.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::default().with_ssh_config_path(&self.ssh_config_path)
    }

    /// Credential source reading the configured password variable.
    pub fn credentials(&self) -> EnvCredential {
        EnvCredential::new(&self.password_env)
    }
}
