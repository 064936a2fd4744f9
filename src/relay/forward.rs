//! Chunk forwarding

use std::sync::Arc;

use super::chunk::FrameChunk;
use super::error::RelayError;
use crate::protocol::OutboundMessage;
use crate::registry::ConnectionId;
use crate::router::{DeliveryReport, GroupName, GroupRouter};

/// Validating pass-through from producers to the consumer group
///
/// Chunks from one connection reach consumers in the order they were relayed.
/// Chunks of the same stream from different producers are not reordered.
pub struct ChunkRelay {
    router: Arc<GroupRouter>,
}

impl ChunkRelay {
    /// Create a relay over `router`
    pub fn new(router: Arc<GroupRouter>) -> Self {
        Self { router }
    }

    /// Validate and forward a chunk to all consumers
    ///
    /// A malformed chunk is logged and dropped; the connection is unaffected.
    pub async fn relay(
        &self,
        origin: ConnectionId,
        chunk: FrameChunk,
    ) -> Result<DeliveryReport, RelayError> {
        if let Err(e) = chunk.validate() {
            tracing::warn!(
                connection_id = %origin,
                stream_id = %chunk.stream_id,
                error = %e,
                "Dropping malformed chunk"
            );
            return Err(e);
        }

        tracing::trace!(
            connection_id = %origin,
            stream_id = %chunk.stream_id,
            sequence_index = chunk.sequence_index,
            total_chunks = chunk.total_chunks,
            size = chunk.len(),
            "Relaying chunk"
        );

        Ok(self
            .router
            .deliver(GroupName::Consumers, OutboundMessage::Frame(chunk))
            .await)
    }
}
