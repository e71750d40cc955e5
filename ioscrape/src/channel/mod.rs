//! Channel layer for pattern matching over the PTY stream.
//!
//! This module handles the expect-style waits, including escape-sequence
//! stripping and prompt detection.

mod buffer;
pub mod patterns;
mod pty;
#[cfg(test)]
pub(crate) mod scripted;

pub use buffer::{PatternBuffer, PatternMatch};
pub use patterns::LoginPatterns;
pub use pty::PtyChannel;
