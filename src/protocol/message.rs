//! JSON invocations and outbound events
//!
//! Inbound text frames are invocations:
//!
//! ```json
//! {"target": "InitCapture", "arguments": [10]}
//! {"target": "SendFrame", "arguments": [{"data": "...", "sequenceIndex": 0, "totalChunks": 3}]}
//! ```
//!
//! Outbound text frames are tagged by `type`: `connected`, `event` or
//! `completion`.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::codec;
use super::error::ProtocolError;
use crate::registry::{ConnectionId, Role};
use crate::relay::{FrameChunk, PayloadEncoding};
use crate::session::{ControlDirective, ProducerCommand, SessionPhase};

/// Event name under which consumers receive text chunks
pub const RECEIVE_FRAME_EVENT: &str = "ReceiveFrame";

/// Invocation target carrying a chunk
pub const SEND_FRAME_TARGET: &str = "SendFrame";

/// Event announcing an injected upload to consumers
pub const FILE_UPLOADED_EVENT: &str = "FileUploaded";

/// A frame ready for the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireFrame {
    Text(String),
    Binary(Bytes),
}

/// Raw inbound invocation
#[derive(Debug, Clone, Deserialize)]
pub struct Invocation {
    /// Method name
    pub target: String,

    /// Positional arguments
    #[serde(default)]
    pub arguments: Vec<Value>,
}

/// A decoded inbound event
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Viewer control directive
    Control(ControlDirective),
    /// Producer frame chunk
    Chunk(FrameChunk),
}

/// Chunk object as carried in JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireChunk {
    data: String,
    #[serde(alias = "chunkIndex")]
    sequence_index: i64,
    total_chunks: i64,
    #[serde(default, alias = "messageId", skip_serializing_if = "String::is_empty")]
    stream_id: String,
}

impl Invocation {
    /// Parse a text frame
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Classify the invocation into a closed event type
    pub fn into_event(self) -> Result<InboundEvent, ProtocolError> {
        let directive = match self.target.as_str() {
            "InitCapture" => ControlDirective::InitCapture {
                timeout_secs: self.argument(0)?,
            },
            "EndCapture" => ControlDirective::EndCapture,
            "StartLiveStream" => ControlDirective::StartLiveStream,
            "StopLiveStream" => ControlDirective::StopLiveStream,
            "CaptureStill" | "CaptureImage" => ControlDirective::CaptureStill,
            SEND_FRAME_TARGET => {
                let wire: WireChunk = self.argument(0)?;
                let chunk = FrameChunk::text(wire.data, wire.sequence_index, wire.total_chunks)
                    .with_stream_id(wire.stream_id);
                return Ok(InboundEvent::Chunk(chunk));
            }
            _ => return Err(ProtocolError::UnknownTarget(self.target)),
        };

        Ok(InboundEvent::Control(directive))
    }

    fn argument<T: DeserializeOwned>(&self, index: usize) -> Result<T, ProtocolError> {
        self.arguments
            .get(index)
            .and_then(|value| T::deserialize(value).ok())
            .ok_or_else(|| ProtocolError::InvalidArgument {
                target: self.target.clone(),
                index,
            })
    }
}

/// Error half of a completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionError {
    /// Error kind, e.g. `InvalidTransition`
    pub kind: &'static str,
    /// Human readable description
    pub message: String,
}

/// Message queued for a single connection
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// Sent once after registration
    Connected {
        connection_id: ConnectionId,
        role: Role,
    },
    /// Command for producers
    Command(ProducerCommand),
    /// Chunk for consumers
    Frame(FrameChunk),
    /// Upload notice for consumers
    FileUploaded { file_name: String, size: usize },
    /// Result of a control invocation, sent to the invoker only
    Completion {
        target: &'static str,
        outcome: Result<SessionPhase, CompletionError>,
    },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Envelope<'a> {
    Connected {
        #[serde(rename = "connectionId")]
        connection_id: u64,
        role: &'a str,
    },
    Event {
        event: &'a str,
        arguments: Vec<Value>,
    },
    Completion {
        target: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<&'a CompletionError>,
    },
}

impl OutboundMessage {
    /// Encode for the socket
    ///
    /// Binary chunks stay binary; everything else is a JSON text frame.
    pub fn encode(&self) -> Result<WireFrame, ProtocolError> {
        let envelope = match self {
            OutboundMessage::Connected {
                connection_id,
                role,
            } => Envelope::Connected {
                connection_id: connection_id.get(),
                role: role.as_str(),
            },
            OutboundMessage::Command(command) => Envelope::Event {
                event: command.event_name(),
                arguments: command.arguments(),
            },
            OutboundMessage::Frame(chunk) => match chunk.encoding {
                PayloadEncoding::Binary => {
                    return Ok(WireFrame::Binary(codec::encode_chunk(chunk)?));
                }
                PayloadEncoding::Text => {
                    let data = std::str::from_utf8(&chunk.payload)
                        .map_err(|_| ProtocolError::InvalidUtf8("chunk payload"))?;
                    let body = WireChunk {
                        data: data.to_owned(),
                        sequence_index: chunk.sequence_index,
                        total_chunks: chunk.total_chunks,
                        stream_id: chunk.stream_id.clone(),
                    };
                    Envelope::Event {
                        event: RECEIVE_FRAME_EVENT,
                        arguments: vec![serde_json::to_value(body)?],
                    }
                }
            },
            OutboundMessage::FileUploaded { file_name, size } => Envelope::Event {
                event: FILE_UPLOADED_EVENT,
                arguments: vec![Value::from(file_name.as_str()), Value::from(*size)],
            },
            OutboundMessage::Completion { target, outcome } => Envelope::Completion {
                target,
                state: outcome.as_ref().ok().map(|phase| phase.as_str()),
                error: outcome.as_ref().err(),
            },
        };

        Ok(WireFrame::Text(serde_json::to_string(&envelope)?))
    }
}
