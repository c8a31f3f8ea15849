//! Wire-level errors shared by the nonce and chunk header codecs.

use thiserror::Error;

/// Errors produced while decoding fixed-layout wire structures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// A nonce buffer was not exactly [`crate::Nonce::SIZE`] bytes.
    #[error("invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Required length.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// A chunk buffer was shorter than [`crate::ChunkHeader::SIZE`].
    #[error("chunk header too short: expected at least {expected}, got {actual}")]
    ChunkHeaderTooShort {
        /// Required minimum length.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// A chunk (header + payload) exceeded the negotiated chunk length.
    #[error("chunk of {size} bytes exceeds negotiated maximum {max}")]
    ChunkTooLarge {
        /// Size of the offending chunk.
        size: usize,
        /// Negotiated maximum.
        max: usize,
    },
}

/// Convenience result alias for this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
