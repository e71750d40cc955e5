//! Where the login password comes from.
//!
//! The password is only looked up when a password prompt actually appears,
//! so key-based devices work without any credential configured.

use secrecy::SecretString;

/// Supplies the password for the login handshake.
pub trait CredentialSource: Send + Sync {
    /// The password, if one is configured.
    fn password(&self) -> Option<SecretString>;

    /// Human-readable name of the source, used in error messages.
    fn describe(&self) -> String;
}

/// Reads the password from an environment variable at lookup time.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the environment variable.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl CredentialSource for EnvCredential {
    fn password(&self) -> Option<SecretString> {
        std::env::var(&self.var)
            .ok()
            .filter(|value| !value.is_empty())
            .map(SecretString::from)
    }

    fn describe(&self) -> String {
        format!("env var '{}'", self.var)
    }
}

/// A fixed password, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential {
    password: Option<String>,
}

impl StaticCredential {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
        }
    }

    /// No password; key-based logins only.
    pub fn none() -> Self {
        Self::default()
    }
}

impl CredentialSource for StaticCredential {
    fn password(&self) -> Option<SecretString> {
        self.password.clone().map(SecretString::from)
    }

    fn describe(&self) -> String {
        "static credential".to_string()
    }
}
