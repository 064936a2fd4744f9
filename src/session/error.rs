//! Session error types

use super::directive::ControlDirective;
use super::state::SessionPhase;

/// Error type for control directives
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Directive is not valid in the current phase; nothing was forwarded
    #[error("{directive} is not valid while {from}")]
    InvalidTransition {
        from: SessionPhase,
        directive: ControlDirective,
    },

    /// No producer is connected to act on the directive
    #[error("No producer available for {0}")]
    NoProducerAvailable(ControlDirective),
}

impl SessionError {
    /// Stable error kind reported to the invoking client
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::InvalidTransition { .. } => "InvalidTransition",
            SessionError::NoProducerAvailable(_) => "NoProducerAvailable",
        }
    }
}
