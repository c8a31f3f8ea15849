//! `AeadService`: the authenticated-encryption primitive the crypto context
//! delegates to.
//!
//! The outer SaltyRTC session owns the long-term/ephemeral key exchange and
//! hands the task a bound encrypt/decrypt pair; this trait is the seam at
//! which the task treats that primitive as a black box (see crate-level
//! Non-goals). [`NullAead`] is a concrete, inspectable implementation of
//! the trait for standalone testing, not a stand-in for session key
//! exchange.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// A bound authenticated-encryption primitive, keyed by the outer session.
pub trait AeadService {
    /// Encrypt `plaintext` under `nonce`.
    ///
    /// Implementations must not fail: key setup errors are the session's
    /// responsibility to surface before the task ever calls this.
    fn encrypt(&self, plaintext: &[u8], nonce: &[u8; 24]) -> Vec<u8>;

    /// Decrypt `ciphertext`, which was produced under `nonce`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Aead`] if authentication fails (wrong key,
    /// tampered ciphertext, or nonce mismatch).
    fn decrypt(&self, ciphertext: &[u8], nonce: &[u8; 24]) -> Result<Vec<u8>, CryptoError>;
}

/// XChaCha20-Poly1305-backed [`AeadService`] keyed by a single shared
/// session key.
///
/// This is the concrete reference implementation used by this crate's own
/// tests; a production host plugs in its own `AeadService` bound to the
/// session's negotiated keys instead.
pub struct NullAead {
    key: [u8; 32],
}

impl NullAead {
    /// Construct a service keyed by `key`.
    #[must_use]
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }
}

impl Drop for NullAead {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl AeadService for NullAead {
    fn encrypt(&self, plaintext: &[u8], nonce: &[u8; 24]) -> Vec<u8> {
        let cipher = XChaCha20Poly1305::new((&self.key).into());
        let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(nonce), plaintext) else {
            unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
        };
        ciphertext
    }

    fn decrypt(&self, ciphertext: &[u8], nonce: &[u8; 24]) -> Result<Vec<u8>, CryptoError> {
        let cipher = XChaCha20Poly1305::new((&self.key).into());
        cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Aead("authentication failed".to_string()))
    }
}
