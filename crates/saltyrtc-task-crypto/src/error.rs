//! Crypto context errors.

use thiserror::Error;

/// Errors raised while encrypting or decrypting through a [`crate::CryptoContext`].
///
/// The first four variants correspond directly to the ordered validation
/// steps a decrypting context runs against an incoming box; they are
/// distinct variants (rather than one `Validation(String)`) so callers can
/// match on exactly which invariant was broken.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The box's leading bytes did not form a valid 24-byte nonce.
    #[error("bad packet length")]
    BadNonceLength,

    /// The incoming nonce's cookie equals our own outgoing cookie.
    #[error("local and remote cookie are equal")]
    CookieCollision,

    /// The incoming nonce's cookie differs from the one we first adopted
    /// for this context.
    #[error("remote cookie changed")]
    CookieChanged,

    /// The incoming combined sequence number repeats the last one we saw.
    #[error("CSN reuse detected")]
    CsnReuse,

    /// The incoming nonce's channel id does not match this context's.
    #[error("channel id mismatch")]
    ChannelIdMismatch,

    /// The underlying AEAD primitive rejected the box (tampered ciphertext,
    /// wrong key, or similar).
    #[error("authenticated decryption failed: {0}")]
    Aead(String),
}
