//! Length-prefixed chunk framing.
//!
//! ```text
//! | length (4, LE u32) | payload (length bytes) |
//! ```
//!
//! The journal body is a plain sequence of chunks. A reader stops at the
//! first chunk whose length prefix or payload is incomplete and reports the
//! remaining bytes as *slop*: the tail of a write that never finished.

use crate::error::{CodecError, CodecResult};

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Frames `payload` as a single chunk.
///
/// # Errors
///
/// Returns [`CodecError::ChunkTooLarge`] if the payload length does not fit
/// in a `u32`.
pub fn encode_chunk(payload: &[u8]) -> CodecResult<Vec<u8>> {
    let mut out = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    write_chunk(&mut out, payload)?;
    Ok(out)
}

/// Appends `payload`, framed as a chunk, to `out`.
///
/// # Errors
///
/// Returns [`CodecError::ChunkTooLarge`] if the payload length does not fit
/// in a `u32`.
pub fn write_chunk(out: &mut Vec<u8>, payload: &[u8]) -> CodecResult<()> {
    let len = u32::try_from(payload.len()).map_err(|_| CodecError::ChunkTooLarge {
        len: payload.len(),
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(payload);
    Ok(())
}

/// The result of splitting a buffer into chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSplit<'a> {
    /// Number of trailing bytes that do not form a complete chunk.
    pub slop: u64,
    /// Complete chunk payloads, in buffer order.
    pub chunks: Vec<&'a [u8]>,
}

/// Splits `buffer` into chunk payloads plus trailing slop.
///
/// Never fails: anything after the last complete chunk is slop.
#[must_use]
pub fn split_chunks(buffer: &[u8]) -> ChunkSplit<'_> {
    let mut chunks = Vec::new();
    let mut rest = buffer;

    loop {
        let Some((prefix, after_prefix)) = rest.split_first_chunk::<LENGTH_PREFIX_SIZE>()
        else {
            break;
        };
        let len = u32::from_le_bytes(*prefix) as usize;
        if after_prefix.len() < len {
            break;
        }
        let (payload, remaining) = after_prefix.split_at(len);
        chunks.push(payload);
        rest = remaining;
    }

    ChunkSplit {
        slop: rest.len() as u64,
        chunks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn framed(payloads: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for payload in payloads {
            write_chunk(&mut out, payload).unwrap();
        }
        out
    }

    #[test]
    fn encode_prefixes_little_endian_length() {
        let chunk = encode_chunk(b"abc").unwrap();
        assert_eq!(chunk, [3, 0, 0, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn empty_payload_is_a_valid_chunk() {
        let buffer = encode_chunk(b"").unwrap();
        let split = split_chunks(&buffer);
        assert_eq!(split.chunks, vec![&b""[..]]);
        assert_eq!(split.slop, 0);
    }

    #[test]
    fn split_empty_buffer() {
        let split = split_chunks(&[]);
        assert!(split.chunks.is_empty());
        assert_eq!(split.slop, 0);
    }

    #[test]
    fn split_multiple_chunks() {
        let buffer = framed(&[&b"one"[..], &b"two"[..], &b"three"[..]]);
        let split = split_chunks(&buffer);
        assert_eq!(split.chunks, vec![&b"one"[..], &b"two"[..], &b"three"[..]]);
        assert_eq!(split.slop, 0);
    }

    #[test]
    fn partial_length_prefix_is_slop() {
        let mut buffer = framed(&[&b"one"[..]]);
        buffer.extend_from_slice(&[9, 0, 0]);
        let split = split_chunks(&buffer);
        assert_eq!(split.chunks, vec![&b"one"[..]]);
        assert_eq!(split.slop, 3);
    }

    #[test]
    fn partial_payload_is_slop() {
        let mut buffer = framed(&[&b"one"[..]]);
        buffer.extend_from_slice(&[10, 0, 0, 0, b'x', b'y']);
        let split = split_chunks(&buffer);
        assert_eq!(split.chunks.len(), 1);
        assert_eq!(split.slop, 6);
    }

    #[test]
    fn oversized_length_is_slop_not_error() {
        let buffer = [0xFF, 0xFF, 0xFF, 0xFF, 1, 2, 3];
        let split = split_chunks(&buffer);
        assert!(split.chunks.is_empty());
        assert_eq!(split.slop, 7);
    }

    proptest! {
        #[test]
        fn split_accounts_for_every_byte(buffer in prop::collection::vec(any::<u8>(), 0..256)) {
            let split = split_chunks(&buffer);
            let framed_len: usize = split
                .chunks
                .iter()
                .map(|c| LENGTH_PREFIX_SIZE + c.len())
                .sum();
            prop_assert_eq!(framed_len as u64 + split.slop, buffer.len() as u64);
        }

        #[test]
        fn truncation_keeps_complete_prefix(
            payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..24), 1..12),
            cut in any::<prop::sample::Index>(),
        ) {
            let refs: Vec<&[u8]> = payloads.iter().map(Vec::as_slice).collect();
            let buffer = framed(&refs);
            let cut_at = cut.index(buffer.len() + 1);
            let split = split_chunks(&buffer[..cut_at]);

            let mut boundary = 0usize;
            let mut complete = 0usize;
            for payload in &payloads {
                let next = boundary + LENGTH_PREFIX_SIZE + payload.len();
                if next > cut_at {
                    break;
                }
                boundary = next;
                complete += 1;
            }

            prop_assert_eq!(split.chunks.len(), complete);
            prop_assert_eq!(split.slop, (cut_at - boundary) as u64);
            for (got, want) in split.chunks.iter().zip(&payloads) {
                prop_assert_eq!(*got, want.as_slice());
            }
        }
    }
}
