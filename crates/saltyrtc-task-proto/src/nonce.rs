//! Signalling nonce: a fixed 24-byte structure carried as the leading bytes
//! of every encrypted box exchanged between peers.
//!
//! All multi-byte integers are stored in Big Endian format to match network
//! byte order. The layout is part of the wire protocol and must never
//! change shape: `cookie(16) || channel_id(2) || overflow(2) || sequence(4)`.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{ProtocolError, Result};

/// 16-byte random endpoint identifier, established once per crypto context.
pub type Cookie = [u8; 16];

/// Fixed 24-byte nonce (Big Endian network byte order).
///
/// # Security
///
/// The `#[repr(C, packed)]` layout with zerocopy traits ensures this struct
/// can be cast from untrusted network bytes without risking undefined
/// behavior: every 24-byte pattern is a valid `Nonce`. Semantic validation
/// (cookie equality, CSN reuse, channel binding) happens one layer up, in
/// the crypto context.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Nonce {
    cookie: [u8; 16],
    channel_id: [u8; 2],
    overflow: [u8; 2],
    sequence: [u8; 4],
}

impl Nonce {
    /// Serialized size in bytes.
    pub const SIZE: usize = 24;

    /// Build a nonce from its constituent fields.
    #[must_use]
    pub fn new(cookie: Cookie, channel_id: u16, overflow: u16, sequence: u32) -> Self {
        Self {
            cookie,
            channel_id: channel_id.to_be_bytes(),
            overflow: overflow.to_be_bytes(),
            sequence: sequence.to_be_bytes(),
        }
    }

    /// Parse a nonce from exactly [`Self::SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidNonceLength`] if `bytes.len() !=
    /// Self::SIZE`. No other validation is performed here; cookie and CSN
    /// semantics are the crypto context's responsibility.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let nonce =
            Self::read_from_bytes(bytes).map_err(|_| ProtocolError::InvalidNonceLength {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?;
        Ok(nonce)
    }

    /// Serialize to a fixed-size byte array.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let bytes = IntoBytes::as_bytes(self);
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(bytes);
        arr
    }

    /// Sender cookie.
    #[must_use]
    pub fn cookie(&self) -> Cookie {
        self.cookie
    }

    /// Channel id this nonce is bound to.
    #[must_use]
    pub fn channel_id(&self) -> u16 {
        u16::from_be_bytes(self.channel_id)
    }

    /// 16-bit overflow counter.
    #[must_use]
    pub fn overflow(&self) -> u16 {
        u16::from_be_bytes(self.overflow)
    }

    /// 32-bit sequence counter.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        u32::from_be_bytes(self.sequence)
    }

    /// The 48-bit combined sequence number: `overflow * 2^32 + sequence`.
    #[must_use]
    pub fn combined_sequence_number(&self) -> u64 {
        (u64::from(self.overflow()) << 32) + u64::from(self.sequence())
    }
}

// Manual Debug impl: packed repr forbids taking references to fields, so the
// derive would need to copy anyway.
impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nonce")
            .field("cookie", &self.cookie())
            .field("channel_id", &self.channel_id())
            .field("overflow", &self.overflow())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl PartialEq for Nonce {
    fn eq(&self, other: &Self) -> bool {
        self.encode() == other.encode()
    }
}

impl Eq for Nonce {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn arbitrary_cookie() -> impl Strategy<Value = Cookie> {
        prop::collection::vec(any::<u8>(), 16).prop_map(|v| {
            let mut arr = [0u8; 16];
            arr.copy_from_slice(&v);
            arr
        })
    }

    proptest! {
        #[test]
        fn nonce_round_trip(
            cookie in arbitrary_cookie(),
            channel_id in any::<u16>(),
            overflow in any::<u16>(),
            sequence in any::<u32>(),
        ) {
            let nonce = Nonce::new(cookie, channel_id, overflow, sequence);
            let bytes = nonce.encode();
            let decoded = Nonce::decode(&bytes).expect("valid nonce bytes");
            prop_assert_eq!(decoded, nonce);
            prop_assert_eq!(decoded.cookie(), cookie);
            prop_assert_eq!(decoded.channel_id(), channel_id);
            prop_assert_eq!(decoded.overflow(), overflow);
            prop_assert_eq!(decoded.sequence(), sequence);
        }

        #[test]
        fn encode_decode_is_identity_on_raw_bytes(bytes in prop::collection::vec(any::<u8>(), Nonce::SIZE)) {
            let decoded = Nonce::decode(&bytes).expect("24 bytes always decode");
            prop_assert_eq!(decoded.encode().to_vec(), bytes);
        }
    }

    #[test]
    fn concrete_nonce_vector() {
        let cookie: Cookie = [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
            0x0F, 0x10,
        ];
        let nonce = Nonce::new(cookie, 4370, 4884, 84_281_096);
        let expected: [u8; 24] = [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
            0x0F, 0x10, 0x11, 0x12, 0x13, 0x14, 0x05, 0x06, 0x07, 0x08,
        ];
        assert_eq!(nonce.encode(), expected);
        assert_eq!(nonce.combined_sequence_number(), 20_976_704_554_760);
    }

    #[test]
    fn reject_wrong_length() {
        let err = Nonce::decode(&[0u8; 23]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidNonceLength {
                expected: 24,
                actual: 23
            }
        );
    }
}
