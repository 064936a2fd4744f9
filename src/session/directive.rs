//! Control directives and the producer commands they produce

use serde_json::Value;

/// Viewer-originated control directive
///
/// Directed at the producer group as a whole, never at a single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlDirective {
    /// Begin a capture session that producers end after `timeout_secs`
    InitCapture { timeout_secs: u32 },
    /// End the capture session
    EndCapture,
    /// Begin live streaming
    StartLiveStream,
    /// End live streaming
    StopLiveStream,
    /// Take a single still image while streaming
    CaptureStill,
}

impl ControlDirective {
    /// Every directive kind, with a representative timeout for `InitCapture`
    pub const ALL: [ControlDirective; 5] = [
        ControlDirective::InitCapture { timeout_secs: 10 },
        ControlDirective::EndCapture,
        ControlDirective::StartLiveStream,
        ControlDirective::StopLiveStream,
        ControlDirective::CaptureStill,
    ];

    /// Invocation name of the directive
    pub fn name(&self) -> &'static str {
        match self {
            ControlDirective::InitCapture { .. } => "InitCapture",
            ControlDirective::EndCapture => "EndCapture",
            ControlDirective::StartLiveStream => "StartLiveStream",
            ControlDirective::StopLiveStream => "StopLiveStream",
            ControlDirective::CaptureStill => "CaptureStill",
        }
    }
}

impl std::fmt::Display for ControlDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlDirective::InitCapture { timeout_secs } => {
                write!(f, "InitCapture({})", timeout_secs)
            }
            other => f.write_str(other.name()),
        }
    }
}

/// Command delivered to the producer group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerCommand {
    /// Start capturing for `timeout_secs`
    StartCapture { timeout_secs: u32 },
    /// Stop capturing
    StopCapture,
    /// Start live streaming
    StartLiveStream,
    /// Stop live streaming
    EndLiveStream,
    /// Take a single image
    TakeImage,
}

impl ProducerCommand {
    /// Event name seen by producers
    pub fn event_name(&self) -> &'static str {
        match self {
            ProducerCommand::StartCapture { .. } => "StartCapture",
            ProducerCommand::StopCapture => "StopCapture",
            ProducerCommand::StartLiveStream => "StartLiveStream",
            ProducerCommand::EndLiveStream => "EndLiveStream",
            ProducerCommand::TakeImage => "TakeImage",
        }
    }

    /// Event arguments
    pub fn arguments(&self) -> Vec<Value> {
        match self {
            ProducerCommand::StartCapture { timeout_secs } => vec![Value::from(*timeout_secs)],
            _ => Vec::new(),
        }
    }
}
