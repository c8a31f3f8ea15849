//! Per-channel cryptographic state: cookie pair, CSN pair, and the ordered
//! nonce validation rules a decrypting context runs against every incoming
//! box.

use saltyrtc_task_proto::{Cookie, Nonce};

use crate::{aead::AeadService, error::CryptoError};

/// An encrypted box: a nonce plus the ciphertext it authenticated.
///
/// Wire serialisation is `nonce || ciphertext`, exactly 24 bytes followed
/// by the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalBox {
    /// The nonce the ciphertext was encrypted under.
    pub nonce: Nonce,
    /// Authenticated ciphertext.
    pub ciphertext: Vec<u8>,
}

impl SignalBox {
    /// Serialise to `nonce || ciphertext`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Nonce::SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.nonce.encode());
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse `nonce || ciphertext` back into a [`SignalBox`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::BadNonceLength`] if fewer than
    /// [`Nonce::SIZE`] bytes are present.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < Nonce::SIZE {
            return Err(CryptoError::BadNonceLength);
        }
        let (nonce_bytes, ciphertext) = bytes.split_at(Nonce::SIZE);
        let nonce = Nonce::decode(nonce_bytes).map_err(|_| CryptoError::BadNonceLength)?;
        Ok(Self {
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// Per-channel cryptographic state bound to one `channel_id`.
///
/// A context is created once for each data channel id the task addresses
/// (the handover channel, or an application-owned channel) and lives as
/// long as that channel id is in use. It is never shared across channel
/// ids: each handover to a new channel gets a fresh context with a fresh
/// cookie.
pub struct CryptoContext<A> {
    channel_id: u16,
    our_cookie: Cookie,
    their_cookie: Option<Cookie>,
    our_csn: u64,
    last_incoming_csn: Option<u64>,
    aead: A,
}

impl<A: AeadService> CryptoContext<A> {
    /// Construct a context for `channel_id`, using `our_cookie` as the
    /// freshly generated outgoing cookie and `initial_csn` as the starting
    /// combined sequence number (overflow 0 implied unless `initial_csn`
    /// already carries one).
    #[must_use]
    pub fn new(channel_id: u16, our_cookie: Cookie, initial_csn: u64, aead: A) -> Self {
        Self {
            channel_id,
            our_cookie,
            their_cookie: None,
            our_csn: initial_csn,
            last_incoming_csn: None,
            aead,
        }
    }

    /// The channel id this context is bound to.
    #[must_use]
    pub fn channel_id(&self) -> u16 {
        self.channel_id
    }

    /// Our outgoing cookie.
    #[must_use]
    pub fn our_cookie(&self) -> Cookie {
        self.our_cookie
    }

    /// The peer's cookie, once observed on a decrypted box.
    #[must_use]
    pub fn their_cookie(&self) -> Option<Cookie> {
        self.their_cookie
    }

    /// Encrypt `data`, advancing our outgoing CSN by one.
    pub fn encrypt(&mut self, data: &[u8]) -> SignalBox {
        self.our_csn += 1;
        let overflow = (self.our_csn >> 32) as u16;
        let sequence = self.our_csn as u32;
        let nonce = Nonce::new(self.our_cookie, self.channel_id, overflow, sequence);
        let ciphertext = self.aead.encrypt(data, &nonce.encode());
        SignalBox { nonce, ciphertext }
    }

    /// Validate and decrypt an incoming box.
    ///
    /// Runs, in order: nonce-length check (already done by the caller via
    /// [`SignalBox::from_bytes`]), cookie-collision check, cookie-stability
    /// check, CSN-reuse check, channel-id check, then delegates to the AEAD
    /// service.
    ///
    /// # Errors
    ///
    /// See [`CryptoError`] variants for each rejection reason.
    pub fn decrypt(&mut self, signal_box: &SignalBox) -> Result<Vec<u8>, CryptoError> {
        let nonce = &signal_box.nonce;

        if nonce.cookie() == self.our_cookie {
            return Err(CryptoError::CookieCollision);
        }

        match self.their_cookie {
            None => self.their_cookie = Some(nonce.cookie()),
            Some(known) if known == nonce.cookie() => {}
            Some(_) => return Err(CryptoError::CookieChanged),
        }

        let incoming_csn = nonce.combined_sequence_number();
        if self.last_incoming_csn == Some(incoming_csn) {
            return Err(CryptoError::CsnReuse);
        }

        if nonce.channel_id() != self.channel_id {
            return Err(CryptoError::ChannelIdMismatch);
        }

        let plaintext = self.aead.decrypt(&signal_box.ciphertext, &nonce.encode())?;
        self.last_incoming_csn = Some(incoming_csn);
        Ok(plaintext)
    }
}

/// Length in bytes of a serialised nonce.
pub const NONCE_LENGTH: usize = Nonce::SIZE;

/// Total per-box overhead: nonce plus the Poly1305 authenticator.
pub const OVERHEAD_LENGTH: usize = NONCE_LENGTH + 16;
