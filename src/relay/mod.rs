//! Chunk relay
//!
//! Validates the sequencing metadata of producer chunks and forwards them to
//! the consumer group. There is no server-side buffering, reordering or
//! reassembly: consumers rebuild frames themselves.

pub mod chunk;
pub mod error;
pub mod forward;

pub use chunk::{FrameChunk, PayloadEncoding};
pub use error::RelayError;
pub use forward::ChunkRelay;
