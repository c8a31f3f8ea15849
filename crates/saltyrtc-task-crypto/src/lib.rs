//! Per-channel cryptographic context for the WebRTC signalling task.
//!
//! ```text
//!           Outer session keys (out of scope)
//!                      |
//!                      v
//!              +---------------+
//!              |  AeadService  |  <- black box, bound per session
//!              +---------------+
//!                      |
//!                      v
//!              +---------------+
//!              | CryptoContext |  <- one per channel id
//!              +---------------+
//!                      |
//!                      v
//!                  SignalBox        (nonce || ciphertext on the wire)
//! ```
//!
//! A [`CryptoContext`] owns the cookie pair, the CSN pair, and the ordered
//! validation steps a decrypting context runs against every incoming box.
//! It never performs key exchange itself; that is the outer session's job.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod aead;
mod context;
mod error;

pub use aead::{AeadService, NullAead};
pub use context::{CryptoContext, NONCE_LENGTH, OVERHEAD_LENGTH, SignalBox};
pub use error::CryptoError;
