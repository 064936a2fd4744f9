//! Wire protocol errors

/// Error decoding or encoding a transport message
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Text frame is not a valid invocation
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invocation target is not a known directive or message
    #[error("Unknown invocation target: {0}")]
    UnknownTarget(String),

    /// Required argument missing or of the wrong type
    #[error("Invalid argument {index} for {target}")]
    InvalidArgument { target: String, index: usize },

    /// Binary frame shorter than its header claims
    #[error("Truncated chunk frame: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// Stream id or text payload is not UTF-8
    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    /// Chunk indices outside the binary header range
    #[error("Chunk index {sequence_index}/{total_chunks} does not fit the binary header")]
    IndexOutOfRange {
        sequence_index: i64,
        total_chunks: i64,
    },

    /// Stream id longer than the codec can carry
    #[error("Stream id too long: {0} bytes")]
    StreamIdTooLong(usize),
}
