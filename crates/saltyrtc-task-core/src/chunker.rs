//! Fragment a message into size-bounded chunks and reassemble them.
//!
//! The underlying data channel is reliable and ordered, so the unchunker
//! does not need to garbage-collect partial messages: chunks for a given
//! message id always arrive contiguously, in order, before the next
//! message's chunks begin.

use saltyrtc_task_proto::{ChunkHeader, payload_capacity};

use crate::error::TransportError;

/// Split `payload` into chunks of at most `chunk_length` bytes, each
/// prefixed with a [`ChunkHeader`].
///
/// # Errors
///
/// Returns [`TransportError::ChunkLengthTooSmall`] if `chunk_length` does
/// not leave room for at least one payload byte after the chunk header.
pub fn chunk(message_id: u32, payload: &[u8], chunk_length: usize) -> Result<Vec<Vec<u8>>, TransportError> {
    let capacity =
        payload_capacity(chunk_length).map_err(|_| TransportError::ChunkLengthTooSmall(chunk_length))?;

    if payload.is_empty() {
        let header = ChunkHeader::new(message_id, 0, true);
        return Ok(vec![header_and_payload(&header, &[])]);
    }

    let chunks: Vec<Vec<u8>> = payload
        .chunks(capacity)
        .enumerate()
        .map(|(serial, slice)| {
            let is_last = serial as u64 * capacity as u64 + slice.len() as u64 == payload.len() as u64;
            let header = ChunkHeader::new(message_id, serial as u32, is_last);
            header_and_payload(&header, slice)
        })
        .collect();
    Ok(chunks)
}

fn header_and_payload(header: &ChunkHeader, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ChunkHeader::SIZE + payload.len());
    out.extend_from_slice(&header.encode());
    out.extend_from_slice(payload);
    out
}

/// Reassembles chunks belonging to a single in-flight message.
///
/// One [`Unchunker`] is created per [`crate::SignalingTransport`]; it is
/// stateful across calls to [`Unchunker::add`].
#[derive(Debug, Default)]
pub struct Unchunker {
    current_message_id: Option<u32>,
    buffer: Vec<u8>,
}

impl Unchunker {
    /// Construct an empty unchunker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk. Returns the reassembled message once its final
    /// chunk has been added, `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Protocol`] if the chunk header fails to
    /// parse.
    pub fn add(&mut self, chunk: &[u8]) -> Result<Option<Vec<u8>>, TransportError> {
        let header = ChunkHeader::decode(chunk)?;
        let payload = &chunk[ChunkHeader::SIZE..];

        if self.current_message_id != Some(header.message_id()) {
            self.current_message_id = Some(header.message_id());
            self.buffer.clear();
        }
        self.buffer.extend_from_slice(payload);

        if header.is_end_of_message() {
            self.current_message_id = None;
            return Ok(Some(std::mem::take(&mut self.buffer)));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn chunk_then_unchunk_round_trips(
            payload in prop::collection::vec(any::<u8>(), 0..4096),
            chunk_length in 10usize..128,
        ) {
            let chunks = chunk(7, &payload, chunk_length).unwrap();
            let mut unchunker = Unchunker::new();
            let mut reassembled = None;
            for c in &chunks {
                reassembled = unchunker.add(c).unwrap();
            }
            prop_assert_eq!(reassembled, Some(payload));
        }
    }

    #[test]
    fn chunk_count_matches_ceiling_division() {
        let payload = vec![0u8; 100];
        let chunk_length = 19; // header 9 + payload capacity 10
        let chunks = chunk(1, &payload, chunk_length).unwrap();
        assert_eq!(chunks.len(), 10); // ceil(100/10)
    }

    #[test]
    fn empty_payload_produces_one_empty_chunk() {
        let chunks = chunk(1, &[], 32).unwrap();
        assert_eq!(chunks.len(), 1);
        let header = ChunkHeader::decode(&chunks[0]).unwrap();
        assert!(header.is_end_of_message());
        assert_eq!(chunks[0].len(), ChunkHeader::SIZE);
    }

    #[test]
    fn reject_chunk_length_too_small() {
        assert!(matches!(
            chunk(1, b"x", ChunkHeader::SIZE),
            Err(TransportError::ChunkLengthTooSmall(_))
        ));
    }

    #[test]
    fn interleaved_message_ids_reset_buffer() {
        let mut unchunker = Unchunker::new();
        let first = chunk(1, b"hello", 32).unwrap();
        let second = chunk(2, b"world", 32).unwrap();
        // Feed a stray chunk from a different message id before `first`
        // completes; the reliable/ordered channel guarantees this never
        // happens in practice, but the unchunker must not corrupt state.
        assert!(unchunker.add(&second[0]).unwrap().is_some());
        for c in &first {
            let result = unchunker.add(c).unwrap();
            if c == first.last().unwrap() {
                assert_eq!(result, Some(b"hello".to_vec()));
            }
        }
    }
}
