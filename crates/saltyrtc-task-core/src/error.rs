//! Transport-layer errors: chunking, link binding, and host I/O failures.

use saltyrtc_task_crypto::CryptoError;
use saltyrtc_task_proto::ProtocolError;
use thiserror::Error;

/// Errors raised by the chunker/unchunker and [`crate::SignalingTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The negotiated chunk length leaves no room for payload after the
    /// chunk header.
    #[error("chunk length {0} too small, must exceed the chunk header size")]
    ChunkLengthTooSmall(usize),

    /// The host handler's `send` raised an error.
    #[error("host send failed: {0}")]
    HostSend(String),

    /// The host handler's `close` raised an error.
    #[error("host close failed: {0}")]
    HostClose(String),

    /// A transport operation was attempted on a link that has not been (or
    /// is no longer) bound to a live transport.
    #[error("link is not tied to a transport")]
    NotTied,

    /// `flush_message_queue` was called a second time.
    #[error("message queue already flushed")]
    QueueAlreadyFlushed,

    /// A chunk or nonce failed to parse.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A box failed cryptographic validation.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl TransportError {
    /// Whether this error represents a fatal condition that must escalate
    /// to closing the transport and resetting the session, as opposed to a
    /// benign local misuse error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::HostSend(_) | Self::HostClose(_) | Self::Protocol(_) | Self::Crypto(_)
        )
    }
}
