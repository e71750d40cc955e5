//! Session lifecycle, login and command execution.
//!
//! A [`Session`] wraps one freshly opened transport. The
//! [`LoginNegotiator`] takes it from `Connecting` to `Ready`, and the
//! [`CommandExecutor`] runs a batch of commands and closes it. Both
//! force-close the transport on any failure, so a session never outlives
//! the call that created it.

mod executor;
pub mod login;
pub mod normalize;
mod response;
mod session;

pub use executor::{CommandExecutor, DEFAULT_EXIT_COMMAND, DEFAULT_PAGING_COMMAND};
pub use login::{LoginEvent, LoginNegotiator, LoginPhase, LoginStep, MAX_LOGIN_ROUNDS};
pub use normalize::{join_outputs, normalize, strip_echo};
pub use response::CommandResult;
pub use session::{Session, SessionState};
