//! The caller-facing operation: run commands on a registered device.
//!
//! Every call opens its own session, logs in, runs the commands and closes
//! the session again. Nothing is kept between calls except the registry and
//! the credential source, which are only read.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_TIMEOUT, Settings};
use crate::credential::{CredentialSource, EnvCredential};
use crate::driver::{CommandExecutor, LoginNegotiator, Session, join_outputs};
use crate::error::Result;
use crate::registry::HostRegistry;
use crate::transport::{SshTransportFactory, TransportFactory};

pub const SHOW_VERSION: &str = "show version";

/// Name under which the show-version operation is published to RPC clients.
pub const TOOL_NAME: &str = "cisco_show_version";

pub const TOOL_DESCRIPTION: &str =
    "Run 'show version' on a known Cisco IOS device and return the raw output.";

/// What a successful call returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Identifier the caller asked for.
    pub host: String,

    #[serde(rename = "ssh_alias")]
    pub connection_alias: String,

    pub platform: String,
    pub role: String,

    /// Label of what was run, e.g. `show version`.
    pub command: String,

    /// Non-empty command outputs separated by one blank line.
    pub raw: String,
}

/// Request body of the show-version operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowVersionRequest {
    pub host: String,
}

/// Runs commands on devices from a [`HostRegistry`].
pub struct DeviceTool<F, C> {
    registry: Arc<HostRegistry>,
    factory: F,
    credentials: C,
    timeout: Duration,
    negotiator: LoginNegotiator,
    executor: CommandExecutor,
}

impl DeviceTool<SshTransportFactory, EnvCredential> {
    /// Tool over the built-in registry, using the system ssh client.
    pub fn from_settings(settings: &Settings) -> Self {
        DeviceTool::new(
            Arc::new(HostRegistry::builtin()),
            SshTransportFactory::new(settings.transport_config()),
            settings.credentials(),
        )
        .with_timeout(settings.timeout)
    }
}

impl<F, C> DeviceTool<F, C>
where
    F: TransportFactory,
    C: CredentialSource,
{
    pub fn new(registry: Arc<HostRegistry>, factory: F, credentials: C) -> Self {
        Self {
            registry,
            factory,
            credentials,
            timeout: DEFAULT_TIMEOUT,
            negotiator: LoginNegotiator::default(),
            executor: CommandExecutor::default(),
        }
    }

    /// Timeout for each wait during login and execution.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_negotiator(mut self, negotiator: LoginNegotiator) -> Self {
        self.negotiator = negotiator;
        self
    }

    pub fn with_executor(mut self, executor: CommandExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `commands` on `host`, reporting them under `label`.
    ///
    /// Unknown hosts are rejected before any process is started. The result
    /// is all or nothing: any failure yields the error alone.
    pub async fn run(&self, host: &str, commands: &[&str], label: &str) -> Result<ToolResult> {
        let profile = self.registry.resolve(host)?.clone();
        info!(
            "{}: opening session via '{}'",
            profile.display_id, profile.connection_alias
        );

        let transport = self
            .factory
            .open(&profile.connection_alias, self.timeout)
            .await?;
        let mut session = Session::new(transport, profile, self.timeout);

        self.negotiator
            .authenticate(&mut session, &self.credentials)
            .await?;
        let results = self.executor.run_commands(&mut session, commands).await?;

        let profile = session.profile();
        Ok(ToolResult {
            host: profile.display_id.clone(),
            connection_alias: profile.connection_alias.clone(),
            platform: profile.platform.clone(),
            role: profile.role.clone(),
            command: label.to_string(),
            raw: join_outputs(results.iter().map(|r| r.output.as_str())),
        })
    }

    /// Run `show version` on `host`.
    pub async fn fetch_show_version(&self, host: &str) -> Result<ToolResult> {
        self.run(host, &[SHOW_VERSION], SHOW_VERSION).await
    }

    /// Entry point for RPC adapters.
    pub async fn call(&self, request: ShowVersionRequest) -> Result<ToolResult> {
        self.fetch_show_version(&request.host).await
    }
}
