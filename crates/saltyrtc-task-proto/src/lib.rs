//! Wire-format types for the WebRTC signalling task: the 24-byte nonce
//! carried on every encrypted box, and the 9-byte chunk header used to
//! fragment messages across the host data channel.
//!
//! Both structures are `#[repr(C, packed)]` with `zerocopy` derives so that
//! parsing untrusted bytes off the wire is a zero-copy cast rather than a
//! field-by-field deserialization, matching the proto layer's role as pure
//! wire-format code with no protocol logic attached.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chunk;
mod error;
mod nonce;

pub use chunk::{ChunkHeader, payload_capacity};
pub use error::{ProtocolError, Result};
pub use nonce::{Cookie, Nonce};
