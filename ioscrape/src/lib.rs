//! # ioscrape
//!
//! Async expect-style driver for Cisco IOS devices reached over SSH.
//!
//! ioscrape runs the system `ssh` client on a pseudo-terminal, answers the
//! login prompts, runs read-only commands and hands back their cleaned-up
//! output. Devices are addressed by identifiers from a fixed
//! [`HostRegistry`]; everything about how to reach them lives in an ssh
//! client config file.
//!
//! ## Features
//!
//! - Unknown-host confirmation, password and key-based logins
//! - Pattern buffer with ANSI stripping and tail search
//! - Echo and prompt removal from command output
//! - Timeouts on every wait, with the ssh process always cleaned up
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ioscrape::{DeviceTool, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ioscrape::Error> {
//!     let settings = Settings::from_env()?;
//!     let tool = DeviceTool::from_settings(&settings);
//!
//!     let result = tool.fetch_show_version("Cisco-3560-PoE-switch").await?;
//!     println!("{}", result.raw);
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod config;
pub mod credential;
pub mod driver;
pub mod error;
pub mod registry;
pub mod tool;
pub mod transport;

// Re-export main types for convenience
pub use config::Settings;
pub use credential::{CredentialSource, EnvCredential, StaticCredential};
pub use driver::{CommandExecutor, CommandResult, LoginNegotiator, Session, SessionState};
pub use error::{Error, ErrorKind, Result};
pub use registry::{DeviceProfile, HostRegistry};
pub use tool::{DeviceTool, ShowVersionRequest, ToolResult};
pub use transport::{SshTransportFactory, Transport, TransportConfig, TransportFactory};
