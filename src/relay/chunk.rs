//! Frame chunk type
//!
//! A frame is split by the producer into `total_chunks` fragments, each
//! carrying its zero-based `sequence_index`. The relay never reassembles them.

use bytes::Bytes;

use super::error::RelayError;

/// How a chunk payload arrived, and how it is forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    /// UTF-8 text inside a JSON invocation (typically base64 image data)
    Text,
    /// Raw bytes in a binary WebSocket frame
    Binary,
}

/// One fragment of a frame
///
/// Cheap to clone: the payload is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameChunk {
    /// Chunk payload, forwarded verbatim
    pub payload: Bytes,

    /// Zero-based index of this chunk, as sent by the producer
    pub sequence_index: i64,

    /// Number of chunks in the frame; 0 marks a self-contained unit
    pub total_chunks: i64,

    /// Identifier of the frame this chunk belongs to (may be empty)
    pub stream_id: String,

    /// Payload encoding
    pub encoding: PayloadEncoding,
}

impl FrameChunk {
    /// Create a text chunk
    pub fn text(data: impl Into<String>, sequence_index: i64, total_chunks: i64) -> Self {
        Self {
            payload: Bytes::from(data.into()),
            sequence_index,
            total_chunks,
            stream_id: String::new(),
            encoding: PayloadEncoding::Text,
        }
    }

    /// Create a binary chunk
    pub fn binary(payload: Bytes, sequence_index: i64, total_chunks: i64) -> Self {
        Self {
            payload,
            sequence_index,
            total_chunks,
            stream_id: String::new(),
            encoding: PayloadEncoding::Binary,
        }
    }

    /// Set the stream identifier
    pub fn with_stream_id(mut self, stream_id: impl Into<String>) -> Self {
        self.stream_id = stream_id.into();
        self
    }

    /// A chunk with `total_chunks == 0` is a complete unit with no sequencing
    pub fn is_complete_unit(&self) -> bool {
        self.total_chunks == 0
    }

    /// Whether this is the final chunk of its frame
    pub fn is_last(&self) -> bool {
        self.is_complete_unit() || self.sequence_index.checked_add(1) == Some(self.total_chunks)
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Check the sequencing invariant `0 <= sequence_index < total_chunks`
    pub fn validate(&self) -> Result<(), RelayError> {
        let in_range =
            self.is_complete_unit() || (0..self.total_chunks).contains(&self.sequence_index);

        if !in_range {
            return Err(RelayError::MalformedChunk {
                sequence_index: self.sequence_index,
                total_chunks: self.total_chunks,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_in_range() {
        for index in 0..3 {
            assert!(FrameChunk::text("A", index, 3).validate().is_ok());
        }
    }

    #[test]
    fn test_validate_out_of_range() {
        let err = FrameChunk::text("A", 5, 3).validate().unwrap_err();
        assert_eq!(
            err,
            RelayError::MalformedChunk {
                sequence_index: 5,
                total_chunks: 3
            }
        );

        assert!(FrameChunk::text("A", 3, 3).validate().is_err());
    }

    #[test]
    fn test_validate_negative() {
        assert!(FrameChunk::text("A", -1, 3).validate().is_err());
        assert!(FrameChunk::text("A", 0, -2).validate().is_err());
    }

    #[test]
    fn test_complete_unit_has_no_sequencing() {
        let chunk = FrameChunk::binary(Bytes::from_static(b"jpeg"), 9, 0);

        assert!(chunk.is_complete_unit());
        assert!(chunk.is_last());
        assert!(chunk.validate().is_ok());
    }

    #[test]
    fn test_is_last() {
        assert!(!FrameChunk::text("A", 0, 2).is_last());
        assert!(FrameChunk::text("A", 1, 2).is_last());
    }

    #[test]
    fn test_with_stream_id() {
        let chunk = FrameChunk::text("abc", 0, 1).with_stream_id("frame-1");

        assert_eq!(chunk.stream_id, "frame-1");
        assert_eq!(chunk.len(), 3);
        assert_eq!(chunk.encoding, PayloadEncoding::Text);
    }
}
