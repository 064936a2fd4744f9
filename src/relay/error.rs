//! Chunk relay error types

/// Error type for chunk relay operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Chunk index outside `0..total_chunks`; the chunk is dropped
    #[error("Malformed chunk: index {sequence_index} out of range for {total_chunks} chunks")]
    MalformedChunk {
        sequence_index: i64,
        total_chunks: i64,
    },
}
