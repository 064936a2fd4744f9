//! Binary chunk codec
//!
//! Chunks sent as binary WebSocket frames use a fixed big-endian header:
//!
//! ```text
//! +----------------+--------------+-------------+-----------+---------+
//! | sequence_index | total_chunks | id_len (16) | stream_id | payload |
//! |   u32 BE       |   u32 BE     |   u16 BE    |  id_len B |  rest   |
//! +----------------+--------------+-------------+-----------+---------+
//! ```
//!
//! Decoding slices the payload out of the frame without copying.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::error::ProtocolError;
use crate::relay::FrameChunk;

/// Fixed header size before the stream id
pub const CHUNK_HEADER_LEN: usize = 10;

/// Decode a binary chunk frame
pub fn decode_chunk(mut frame: Bytes) -> Result<FrameChunk, ProtocolError> {
    if frame.len() < CHUNK_HEADER_LEN {
        return Err(ProtocolError::Truncated {
            needed: CHUNK_HEADER_LEN,
            available: frame.len(),
        });
    }

    let sequence_index = i64::from(frame.get_u32());
    let total_chunks = i64::from(frame.get_u32());
    let id_len = frame.get_u16() as usize;

    if frame.len() < id_len {
        return Err(ProtocolError::Truncated {
            needed: CHUNK_HEADER_LEN + id_len,
            available: CHUNK_HEADER_LEN + frame.len(),
        });
    }

    let id_bytes = frame.split_to(id_len);
    let stream_id = std::str::from_utf8(&id_bytes)
        .map_err(|_| ProtocolError::InvalidUtf8("stream id"))?
        .to_owned();

    Ok(FrameChunk::binary(frame, sequence_index, total_chunks).with_stream_id(stream_id))
}

/// Encode a chunk as a binary frame
pub fn encode_chunk(chunk: &FrameChunk) -> Result<Bytes, ProtocolError> {
    let (sequence_index, total_chunks) = match (
        u32::try_from(chunk.sequence_index),
        u32::try_from(chunk.total_chunks),
    ) {
        (Ok(index), Ok(total)) => (index, total),
        _ => {
            return Err(ProtocolError::IndexOutOfRange {
                sequence_index: chunk.sequence_index,
                total_chunks: chunk.total_chunks,
            })
        }
    };
    let id = chunk.stream_id.as_bytes();
    let id_len =
        u16::try_from(id.len()).map_err(|_| ProtocolError::StreamIdTooLong(id.len()))?;

    let mut buf = BytesMut::with_capacity(CHUNK_HEADER_LEN + id.len() + chunk.payload.len());
    buf.put_u32(sequence_index);
    buf.put_u32(total_chunks);
    buf.put_u16(id_len);
    buf.put_slice(id);
    buf.put_slice(&chunk.payload);

    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::PayloadEncoding;

    #[test]
    fn test_decode_layout() {
        let frame = Bytes::from_static(&[
            0, 0, 0, 1, // sequence_index
            0, 0, 0, 4, // total_chunks
            0, 2, // id_len
            b'f', b'1', // stream_id
            0xFF, 0xD8, 0xFF, // payload
        ]);

        let chunk = decode_chunk(frame).unwrap();

        assert_eq!(chunk.sequence_index, 1);
        assert_eq!(chunk.total_chunks, 4);
        assert_eq!(chunk.stream_id, "f1");
        assert_eq!(&chunk.payload[..], &[0xFF, 0xD8, 0xFF]);
        assert_eq!(chunk.encoding, PayloadEncoding::Binary);
    }

    #[test]
    fn test_decode_without_stream_id() {
        let frame = Bytes::from_static(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2]);

        let chunk = decode_chunk(frame).unwrap();

        assert!(chunk.is_complete_unit());
        assert!(chunk.stream_id.is_empty());
        assert_eq!(chunk.len(), 2);
    }

    #[test]
    fn test_decode_truncated_header() {
        let err = decode_chunk(Bytes::from_static(&[0, 0, 0])).unwrap_err();

        assert!(matches!(
            err,
            ProtocolError::Truncated {
                needed: 10,
                available: 3
            }
        ));
    }

    #[test]
    fn test_decode_truncated_stream_id() {
        let frame = Bytes::from_static(&[0, 0, 0, 0, 0, 0, 0, 1, 0, 8, b'a']);

        assert!(matches!(
            decode_chunk(frame),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_invalid_stream_id() {
        let frame = Bytes::from_static(&[0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 0xFF]);

        assert!(matches!(
            decode_chunk(frame),
            Err(ProtocolError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_encode_preserves_metadata() {
        let chunk = FrameChunk::binary(Bytes::from_static(b"img"), 2, 3).with_stream_id("x");

        let encoded = encode_chunk(&chunk).unwrap();
        assert_eq!(encoded.len(), CHUNK_HEADER_LEN + 1 + 3);

        let decoded = decode_chunk(encoded).unwrap();
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn test_encode_rejects_negative_index() {
        let chunk = FrameChunk::binary(Bytes::new(), -1, 2);

        assert!(matches!(
            encode_chunk(&chunk),
            Err(ProtocolError::IndexOutOfRange {
                sequence_index: -1,
                total_chunks: 2
            })
        ));
    }

    #[test]
    fn test_encode_rejects_long_stream_id() {
        let chunk = FrameChunk::binary(Bytes::new(), 0, 1).with_stream_id("a".repeat(70_000));

        assert!(matches!(
            encode_chunk(&chunk),
            Err(ProtocolError::StreamIdTooLong(70_000))
        ));
    }
}
