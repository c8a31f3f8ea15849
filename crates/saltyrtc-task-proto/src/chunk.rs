//! Chunk framing header.
//!
//! Every fragment handed to the host data channel is prefixed with this
//! fixed 9-byte header: `flags(1) || message_id(4) || serial(4)`, all
//! integers Big Endian. Bit 0 of `flags` marks the final chunk of a
//! message.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{ProtocolError, Result};

const END_OF_MESSAGE_BIT: u8 = 0b0000_0001;

/// Fixed 9-byte chunk header (Big Endian network byte order).
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct ChunkHeader {
    flags: u8,
    message_id: [u8; 4],
    serial: [u8; 4],
}

impl ChunkHeader {
    /// Serialized size in bytes.
    pub const SIZE: usize = 9;

    /// Build a header for one chunk of a message.
    #[must_use]
    pub fn new(message_id: u32, serial: u32, end_of_message: bool) -> Self {
        Self {
            flags: if end_of_message { END_OF_MESSAGE_BIT } else { 0 },
            message_id: message_id.to_be_bytes(),
            serial: serial.to_be_bytes(),
        }
    }

    /// Parse the header from the first [`Self::SIZE`] bytes of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ChunkHeaderTooShort`] if fewer than
    /// [`Self::SIZE`] bytes are available.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = Self::ref_from_prefix(bytes)
            .map_err(|_| ProtocolError::ChunkHeaderTooShort {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?
            .0;
        Ok(*header)
    }

    /// Serialize to a fixed-size byte array.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let bytes = IntoBytes::as_bytes(self);
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(bytes);
        arr
    }

    /// Id of the message this chunk belongs to.
    #[must_use]
    pub fn message_id(&self) -> u32 {
        u32::from_be_bytes(self.message_id)
    }

    /// Position of this chunk within its message.
    #[must_use]
    pub fn serial(&self) -> u32 {
        u32::from_be_bytes(self.serial)
    }

    /// Whether this is the final chunk of its message.
    #[must_use]
    pub fn is_end_of_message(&self) -> bool {
        self.flags & END_OF_MESSAGE_BIT != 0
    }
}

impl std::fmt::Debug for ChunkHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkHeader")
            .field("message_id", &self.message_id())
            .field("serial", &self.serial())
            .field("end_of_message", &self.is_end_of_message())
            .finish()
    }
}

impl PartialEq for ChunkHeader {
    fn eq(&self, other: &Self) -> bool {
        self.encode() == other.encode()
    }
}

impl Eq for ChunkHeader {}

/// Split `chunk_length` into the payload budget available after the header.
///
/// # Errors
///
/// Returns [`ProtocolError::ChunkTooLarge`] if `chunk_length` does not
/// leave room for at least one payload byte after [`ChunkHeader::SIZE`].
pub fn payload_capacity(chunk_length: usize) -> Result<usize> {
    chunk_length
        .checked_sub(ChunkHeader::SIZE)
        .filter(|cap| *cap > 0)
        .ok_or(ProtocolError::ChunkTooLarge {
            size: ChunkHeader::SIZE,
            max: chunk_length,
        })
}
