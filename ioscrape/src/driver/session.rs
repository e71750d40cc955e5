//! One live connection to a device and its lifecycle state.

use std::fmt;
use std::time::Duration;

use log::{debug, warn};

use crate::error::{DriverError, Result};
use crate::registry::DeviceProfile;
use crate::transport::Transport;

/// Where a session is in its lifecycle.
///
/// ```text
/// Connecting -> Authenticating -> Ready -> Executing -> Closing -> Closed
///      \               \                      \
///       +---------------+----------------------+--> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    Ready,
    Executing,
    Closing,
    Closed,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Connecting => "connecting",
            SessionState::Authenticating => "authenticating",
            SessionState::Ready => "ready",
            SessionState::Executing => "executing",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
            SessionState::Failed => "failed",
        }
    }

    /// Closed and Failed sessions have released their transport.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport bound to one device for the duration of one tool call.
///
/// The session owns its transport exclusively. It is never reused: once it
/// reaches [`Closed`](SessionState::Closed) or [`Failed`](SessionState::Failed)
/// the transport has been released.
pub struct Session<T> {
    transport: T,
    profile: DeviceProfile,
    state: SessionState,
    timeout: Duration,
}

impl<T: Transport> Session<T> {
    /// Wrap a freshly opened transport.
    pub fn new(transport: T, profile: DeviceProfile, timeout: Duration) -> Self {
        Self {
            transport,
            profile,
            state: SessionState::Connecting,
            timeout,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Timeout applied to each wait on this session.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub(crate) fn require(&self, expected: SessionState) -> Result<()> {
        if self.state != expected {
            return Err(DriverError::InvalidState {
                expected: expected.as_str(),
                actual: self.state.as_str(),
            }
            .into());
        }
        Ok(())
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        debug!(
            "{}: session {} -> {}",
            self.profile.display_id, self.state, state
        );
        self.state = state;
    }

    /// Close the transport normally.
    ///
    /// If the graceful close fails the transport is force-closed and the
    /// session ends up [`Failed`](SessionState::Failed).
    pub async fn close(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Ok(());
        }
        self.set_state(SessionState::Closing);
        match self.transport.close(false).await {
            Ok(()) => {
                self.set_state(SessionState::Closed);
                Ok(())
            }
            Err(e) => {
                self.abort().await;
                Err(e)
            }
        }
    }

    /// Force-close the transport after a failure.
    ///
    /// Close errors are logged, not returned, so that the original failure
    /// is what reaches the caller.
    pub async fn abort(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Err(e) = self.transport.close(true).await {
            warn!(
                "{}: forced close failed: {}",
                self.profile.display_id, e
            );
        }
        if self.state != SessionState::Failed {
            self.set_state(SessionState::Failed);
        }
    }

    /// Give up the session, returning its transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("device", &self.profile.display_id)
            .field("state", &self.state)
            .field("timeout", &self.timeout)
            .finish()
    }
}
