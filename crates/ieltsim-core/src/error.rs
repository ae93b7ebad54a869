//! Session error types.
//!
//! Only intent-level misuse surfaces as an `Err`: provider failures,
//! incomplete answers, and stale responses are policy, absorbed into the
//! session state by the machine itself.

use thiserror::Error;

use crate::session::Phase;

/// Errors returned by session transition methods.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The intent is not valid in the session's current phase.
    #[error("{intent} is not allowed while {phase}")]
    InvalidTransition {
        intent: &'static str,
        phase: Phase,
    },
}
