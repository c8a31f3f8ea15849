//! Task-level errors.

use saltyrtc_task_core::TransportError;
use saltyrtc_task_crypto::CryptoError;
use saltyrtc_task_proto::ProtocolError;
use thiserror::Error;

/// Errors raised by the [`crate::Task`] state machine.
#[derive(Debug, Error)]
pub enum TaskError {
    /// No channel id was available during negotiation (every id in
    /// `0..65535` was excluded) and handover is enabled.
    #[error("no channel id available for handover")]
    NoChannelIdAvailable,

    /// `handover` was called but handover was disabled during negotiation.
    #[error("handover is disabled for this task")]
    HandoverDisabled,

    /// An operation requiring a negotiated channel id (e.g. `handover`)
    /// was called before `init` completed successfully. A programming
    /// error: the caller must always `init` before using the task.
    #[error("task has not been initialized (no channel id negotiated)")]
    NotInitialized,

    /// `handover` was called a second time.
    #[error("handover already initiated")]
    HandoverAlreadyInitiated,

    /// `send_signaling_message` was called before handover completed.
    #[error("signalling channel has not been handed over yet")]
    NotHandedOver,

    /// A task message failed validation and was dropped.
    #[error("invalid task message: {0}")]
    InvalidMessage(&'static str),

    /// The outer session rejected a task message send.
    #[error("session rejected message: {0}")]
    SessionSend(String),

    /// `max_chunk_length` given to the builder does not leave room for a
    /// single payload byte after the chunk header.
    #[error("max_chunk_length {0} too small")]
    ChunkLengthTooSmall(usize),

    /// CBOR (de)serialization of a task message failed.
    #[error("task message encoding failed: {0}")]
    Encoding(String),

    /// Wire-format parsing failed below the task message layer.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A box failed cryptographic validation.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The chunked transport hit a fatal error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
