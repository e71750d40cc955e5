//! Error types for ioscrape.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ioscrape operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Host registry lookups
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Pseudo-terminal / process errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Login handshake failures
    #[error("Login error: {0}")]
    Login(#[from] LoginError),

    /// Command execution failures
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Invalid settings
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Classify this error for callers and logs.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Registry(RegistryError::UnknownHost { .. }) => ErrorKind::UnknownHost,
            Error::Registry(
                RegistryError::DuplicateHost { .. } | RegistryError::EmptyHostId { .. },
            ) => ErrorKind::Config,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Login(e) => match e {
                LoginError::MissingCredential { .. } => ErrorKind::MissingCredential,
                LoginError::PermissionDenied => ErrorKind::PermissionDenied,
                LoginError::UnexpectedEndOfStream => ErrorKind::UnexpectedEndOfStream,
                LoginError::Timeout(_) => ErrorKind::LoginTimeout,
                LoginError::ProtocolExhausted { .. } => ErrorKind::LoginProtocolExhausted,
            },
            Error::Driver(e) => match e {
                DriverError::ExecutionTimeout { .. } => ErrorKind::ExecutionTimeout,
                DriverError::UnexpectedEndOfStream { .. } => ErrorKind::UnexpectedEndOfStream,
                DriverError::InvalidState { .. } => ErrorKind::InvalidState,
            },
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the device simply stopped answering in time.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::LoginTimeout | ErrorKind::ExecutionTimeout
        )
    }
}

/// Flat classification of every failure a tool call can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The host identifier is not in the registry
    UnknownHost,
    /// A password was requested but none is configured
    MissingCredential,
    /// The device rejected the login
    PermissionDenied,
    /// The ssh process ended during login or a command
    UnexpectedEndOfStream,
    /// No login prompt or device prompt arrived in time
    LoginTimeout,
    /// The prompt did not return after a command
    ExecutionTimeout,
    /// Too many login prompts without reaching the device prompt
    LoginProtocolExhausted,
    /// The pseudo-terminal or ssh process failed
    Transport,
    /// Settings or registry contents are invalid
    Config,
    /// The session was used out of order
    InvalidState,
}

/// Host registry errors.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The requested identifier is not in the registry
    #[error("Host '{host}' is not allowed. Allowed hosts: {}", .known.join(", "))]
    UnknownHost {
        host: String,
        /// Sorted list of valid identifiers.
        known: Vec<String>,
    },

    /// Two profiles share one identifier
    #[error("Host '{host}' is defined more than once")]
    DuplicateHost { host: String },

    /// A profile without an identifier
    #[error("Profile for alias '{alias}' has an empty host identifier")]
    EmptyHostId { alias: String },
}

/// Transport errors (process spawn, PTY I/O).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not allocate the pseudo-terminal or start the ssh process
    #[error("Failed to spawn '{program}': {message}")]
    Spawn { program: String, message: String },

    /// Operation on a transport that was already closed
    #[error("Transport closed")]
    Closed,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Login handshake errors.
#[derive(Error, Debug)]
pub enum LoginError {
    /// A password prompt appeared but no credential is configured
    #[error("SSH requested a password, but {source_name} is not set")]
    MissingCredential { source_name: String },

    /// The device rejected the credentials
    #[error("Permission denied (bad username/password)")]
    PermissionDenied,

    /// The ssh process ended during login
    #[error("SSH session ended unexpectedly (EOF) during login")]
    UnexpectedEndOfStream,

    /// Nothing recognizable arrived in time
    #[error("Timed out after {0:?} waiting for SSH login/prompt")]
    Timeout(Duration),

    /// Too many prompts without reaching the device prompt
    #[error("SSH login flow exceeded {rounds} prompt rounds")]
    ProtocolExhausted { rounds: usize },
}

/// Command execution errors.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The prompt did not come back after a command
    #[error("Timed out after {timeout:?} waiting for prompt after '{command}'")]
    ExecutionTimeout { command: String, timeout: Duration },

    /// The ssh process ended while a command was running
    #[error("SSH session ended unexpectedly (EOF) while running '{command}'")]
    UnexpectedEndOfStream { command: String },

    /// Session used out of order
    #[error("Session is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Settings errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A setting could not be parsed
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    /// A regex in a device profile does not compile
    #[error("Invalid prompt pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type alias using ioscrape's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_host_message_lists_hosts() {
        let err = Error::from(RegistryError::UnknownHost {
            host: "nope".into(),
            known: vec!["a".into(), "b".into()],
        });
        assert_eq!(err.kind(), ErrorKind::UnknownHost);
        assert!(err.to_string().contains("Allowed hosts: a, b"));
    }

    #[test]
    fn test_timeouts_are_distinguishable() {
        let login = Error::from(LoginError::Timeout(Duration::from_secs(1)));
        let exec = Error::from(DriverError::ExecutionTimeout {
            command: "show version".into(),
            timeout: Duration::from_secs(1),
        });
        assert_eq!(login.kind(), ErrorKind::LoginTimeout);
        assert_eq!(exec.kind(), ErrorKind::ExecutionTimeout);
        assert!(login.is_timeout() && exec.is_timeout());
        assert!(!Error::from(LoginError::PermissionDenied).is_timeout());
    }

    #[test]
    fn test_eof_kind_shared_by_login_and_exec() {
        let login = Error::from(LoginError::UnexpectedEndOfStream);
        let exec = Error::from(DriverError::UnexpectedEndOfStream {
            command: "show version".into(),
        });
        assert_eq!(login.kind(), ErrorKind::UnexpectedEndOfStream);
        assert_eq!(exec.kind(), ErrorKind::UnexpectedEndOfStream);
    }

    #[test]
    fn test_plumbing_failure_kinds() {
        let state = Error::from(DriverError::InvalidState {
            expected: "ready",
            actual: "connecting",
        });
        assert_eq!(state.kind(), ErrorKind::InvalidState);
        assert_eq!(state.to_string(), "Driver error: Session is connecting, expected ready");

        let duplicate = Error::from(RegistryError::DuplicateHost { host: "Dev-A".into() });
        assert_eq!(duplicate.kind(), ErrorKind::Config);
        assert_eq!(Error::from(TransportError::Closed).kind(), ErrorKind::Transport);
    }
}
