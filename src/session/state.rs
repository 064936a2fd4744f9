//! Session phases and the transition table
//!
//! ```text
//!            InitCapture(t)                 StartLiveStream
//!   Capturing ◄──────────── Idle ──────────────────► Streaming ─┐
//!       │                    ▲  ▲                       │       │ CaptureStill
//!       └──── EndCapture ────┘  └──── StopLiveStream ───┘ ◄─────┘
//! ```

use super::directive::{ControlDirective, ProducerCommand};

/// Shared session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No capture or stream in progress
    #[default]
    Idle,
    /// A timed capture is in progress
    Capturing,
    /// Live streaming is in progress
    Streaming,
}

impl SessionPhase {
    /// Next phase and producer command for `directive`, `None` if the pair
    /// is not a valid transition
    pub fn next(self, directive: ControlDirective) -> Option<(SessionPhase, ProducerCommand)> {
        use ControlDirective as D;
        use SessionPhase as P;

        match (self, directive) {
            (P::Idle, D::InitCapture { timeout_secs }) => {
                Some((P::Capturing, ProducerCommand::StartCapture { timeout_secs }))
            }
            (P::Capturing, D::EndCapture) => Some((P::Idle, ProducerCommand::StopCapture)),
            (P::Idle, D::StartLiveStream) => {
                Some((P::Streaming, ProducerCommand::StartLiveStream))
            }
            (P::Streaming, D::StopLiveStream) => Some((P::Idle, ProducerCommand::EndLiveStream)),
            (P::Streaming, D::CaptureStill) => Some((P::Streaming, ProducerCommand::TakeImage)),
            _ => None,
        }
    }

    /// Lowercase name used on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Capturing => "capturing",
            SessionPhase::Streaming => "streaming",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
