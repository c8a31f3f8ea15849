//! Chunked, encrypted signalling transport over a host-provided data
//! channel, plus the `Environment` abstraction used to keep the task state
//! machine's time- and randomness-dependent behavior deterministically
//! testable.
//!
//! ```text
//! host channel --chunk--> Unchunker --message--> CryptoContext::decrypt --> queue or deliver
//!                 ^                                      |
//!                 |                                      v
//!              chunker <---------------------- CryptoContext::encrypt <-- outgoing message
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod chunker;
pub mod env;
mod error;
mod link;
mod transport;

pub use chunker::Unchunker;
pub use env::{Environment, StdEnvironment};
pub use error::TransportError;
pub use link::{CHANNEL_LABEL, SignalingTransportHandler, TransportLink};
pub use transport::{SignalingTransport, TransportAction};
