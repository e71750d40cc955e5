//! SSH login handshake up to the first device prompt.
//!
//! Each round waits for one of the login prompts, classifies what arrived as
//! a [`LoginEvent`] and feeds it to [`transition`], which decides the next
//! step. The loop itself only performs the I/O.

use log::{debug, info};
use regex::bytes::Regex;
use secrecy::ExposeSecret;

use super::session::{Session, SessionState};
use crate::channel::LoginPatterns;
use crate::credential::CredentialSource;
use crate::error::{Error, LoginError, Result};
use crate::transport::{ExpectOutcome, Transport};

/// Prompt rounds before giving up on reaching the device prompt.
pub const MAX_LOGIN_ROUNDS: usize = 4;

/// What the remote side showed during one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginEvent {
    HostConfirm,
    PasswordPrompt,
    DevicePrompt,
    PermissionDenied,
    EndOfStream,
    Timeout,
}

/// Whether a password has been submitted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPhase {
    AwaitingPrompt,
    PasswordSent,
}

impl LoginPhase {
    /// Pattern events that can be reported in this phase, in match priority order.
    ///
    /// End-of-stream and timeout are always possible on top of these.
    pub fn candidates(&self) -> &'static [LoginEvent] {
        match self {
            LoginPhase::AwaitingPrompt => &[
                LoginEvent::HostConfirm,
                LoginEvent::PasswordPrompt,
                LoginEvent::DevicePrompt,
                LoginEvent::PermissionDenied,
            ],
            LoginPhase::PasswordSent => &[LoginEvent::DevicePrompt, LoginEvent::PermissionDenied],
        }
    }
}

/// Why a login failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    MissingCredential,
    PermissionDenied,
    EndOfStream,
    Timeout,
}

/// Next action of the negotiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    /// Accept the unknown host key.
    ConfirmHost,
    /// Send the password and wait for the outcome.
    SubmitPassword,
    /// The device prompt is showing.
    Ready,
    Fail(LoginFailure),
}

/// Decide what to do with `event` seen in `phase`.
///
/// `has_credential` only matters for a password prompt before any password
/// was sent. Once the password is out, anything other than the device prompt
/// counts as a rejection.
pub fn transition(phase: LoginPhase, event: LoginEvent, has_credential: bool) -> LoginStep {
    match (phase, event) {
        (_, LoginEvent::DevicePrompt) => LoginStep::Ready,
        (_, LoginEvent::EndOfStream) => LoginStep::Fail(LoginFailure::EndOfStream),
        (_, LoginEvent::Timeout) => LoginStep::Fail(LoginFailure::Timeout),
        (_, LoginEvent::PermissionDenied) => LoginStep::Fail(LoginFailure::PermissionDenied),
        (LoginPhase::AwaitingPrompt, LoginEvent::HostConfirm) => LoginStep::ConfirmHost,
        (LoginPhase::AwaitingPrompt, LoginEvent::PasswordPrompt) if has_credential => {
            LoginStep::SubmitPassword
        }
        (LoginPhase::AwaitingPrompt, LoginEvent::PasswordPrompt) => {
            LoginStep::Fail(LoginFailure::MissingCredential)
        }
        (LoginPhase::PasswordSent, LoginEvent::HostConfirm | LoginEvent::PasswordPrompt) => {
            LoginStep::Fail(LoginFailure::PermissionDenied)
        }
    }
}

/// Drives a fresh session through the login handshake.
#[derive(Debug, Clone)]
pub struct LoginNegotiator {
    patterns: LoginPatterns,
    max_rounds: usize,
    confirm_response: String,
}

impl Default for LoginNegotiator {
    fn default() -> Self {
        Self::new(LoginPatterns::default())
    }
}

impl LoginNegotiator {
    pub fn new(patterns: LoginPatterns) -> Self {
        Self {
            patterns,
            max_rounds: MAX_LOGIN_ROUNDS,
            confirm_response: "yes".to_string(),
        }
    }

    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Answer sent to the unknown-host question.
    pub fn with_confirm_response(mut self, response: impl Into<String>) -> Self {
        self.confirm_response = response.into();
        self
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Log in, leaving the session [`Ready`](SessionState::Ready).
    ///
    /// On failure the transport is force-closed and the session is
    /// [`Failed`](SessionState::Failed) before the error is returned.
    pub async fn authenticate<T, C>(&self, session: &mut Session<T>, credentials: &C) -> Result<()>
    where
        T: Transport,
        C: CredentialSource + ?Sized,
    {
        session.require(SessionState::Connecting)?;
        session.set_state(SessionState::Authenticating);

        match self.negotiate(session, credentials).await {
            Ok(()) => {
                info!("{}: logged in", session.profile().display_id);
                session.set_state(SessionState::Ready);
                Ok(())
            }
            Err(e) => {
                debug!("{}: login failed: {}", session.profile().display_id, e);
                session.abort().await;
                Err(e)
            }
        }
    }

    async fn negotiate<T, C>(&self, session: &mut Session<T>, credentials: &C) -> Result<()>
    where
        T: Transport,
        C: CredentialSource + ?Sized,
    {
        for round in 1..=self.max_rounds {
            let event = self.wait(session, LoginPhase::AwaitingPrompt).await?;
            debug!("{}: login round {}: {:?}", session.profile().display_id, round, event);

            let password = match event {
                LoginEvent::PasswordPrompt => credentials.password(),
                _ => None,
            };

            match transition(LoginPhase::AwaitingPrompt, event, password.is_some()) {
                LoginStep::ConfirmHost => {
                    session.transport_mut().send(&self.confirm_response).await?;
                }
                LoginStep::SubmitPassword => {
                    let Some(password) = password else {
                        return Err(self.failure(LoginFailure::MissingCredential, session, credentials));
                    };
                    session.transport_mut().send(password.expose_secret()).await?;

                    let event = self.wait(session, LoginPhase::PasswordSent).await?;
                    debug!("{}: after password: {:?}", session.profile().display_id, event);
                    return match transition(LoginPhase::PasswordSent, event, true) {
                        LoginStep::Ready => Ok(()),
                        LoginStep::Fail(failure) => Err(self.failure(failure, session, credentials)),
                        LoginStep::ConfirmHost | LoginStep::SubmitPassword => {
                            Err(self.failure(LoginFailure::PermissionDenied, session, credentials))
                        }
                    };
                }
                LoginStep::Ready => return Ok(()),
                LoginStep::Fail(failure) => return Err(self.failure(failure, session, credentials)),
            }
        }

        Err(LoginError::ProtocolExhausted {
            rounds: self.max_rounds,
        }
        .into())
    }

    async fn wait<T: Transport>(&self, session: &mut Session<T>, phase: LoginPhase) -> Result<LoginEvent> {
        let events = phase.candidates();
        let patterns: Vec<Regex> = events
            .iter()
            .map(|event| self.pattern(*event, &session.profile().prompt).clone())
            .collect();
        let timeout = session.timeout();

        Ok(match session.transport_mut().expect(&patterns, timeout).await? {
            ExpectOutcome::Matched { index, .. } => events[index],
            ExpectOutcome::Timeout { .. } => LoginEvent::Timeout,
            ExpectOutcome::EndOfStream { .. } => LoginEvent::EndOfStream,
        })
    }

    fn pattern<'a>(&'a self, event: LoginEvent, prompt: &'a Regex) -> &'a Regex {
        match event {
            LoginEvent::HostConfirm => &self.patterns.host_confirm,
            LoginEvent::PasswordPrompt => &self.patterns.password,
            LoginEvent::PermissionDenied => &self.patterns.permission_denied,
            LoginEvent::DevicePrompt | LoginEvent::EndOfStream | LoginEvent::Timeout => prompt,
        }
    }

    fn failure<T, C>(&self, failure: LoginFailure, session: &Session<T>, credentials: &C) -> Error
    where
        T: Transport,
        C: CredentialSource + ?Sized,
    {
        match failure {
            LoginFailure::MissingCredential => LoginError::MissingCredential {
                source_name: credentials.describe(),
            },
            LoginFailure::PermissionDenied => LoginError::PermissionDenied,
            LoginFailure::EndOfStream => LoginError::UnexpectedEndOfStream,
            LoginFailure::Timeout => LoginError::Timeout(session.timeout()),
        }
        .into()
    }
}
