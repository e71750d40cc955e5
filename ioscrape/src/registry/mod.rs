//! Device registry.
//!
//! Maps the caller-facing device identifier onto the parameters needed to
//! reach and drive that device: the ssh alias, classification tags and the
//! prompt pattern.

mod builtin;
mod hosts;
mod profile;

pub use hosts::HostRegistry;
pub use profile::{DEFAULT_PROMPT_PATTERN, DeviceProfile};
