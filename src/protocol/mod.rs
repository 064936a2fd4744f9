//! Transport wire format
//!
//! JSON invocations and events for text frames, and a compact header codec
//! for binary chunk frames.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{decode_chunk, encode_chunk};
pub use error::ProtocolError;
pub use message::{
    CompletionError, InboundEvent, Invocation, OutboundMessage, WireFrame, FILE_UPLOADED_EVENT,
    RECEIVE_FRAME_EVENT, SEND_FRAME_TARGET,
};
