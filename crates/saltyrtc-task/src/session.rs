//! The outer SaltyRTC session: the collaborator this task extends.
//!
//! Session handshake, key exchange, and the WebSocket relay are explicitly
//! out of scope (see crate-level docs); [`SignalingSession`] is the narrow
//! seam this task actually calls into, mirroring the host-handler seam
//! `saltyrtc_task_core::SignalingTransportHandler` provides on the
//! transport side.

/// Close codes the task can ask the outer session to report to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    /// A peer violated the protocol (malformed or out-of-order message).
    ProtocolError,
    /// An unexpected local failure occurred.
    InternalError,
    /// Orderly shutdown, not an error.
    GoingAway,
}

/// Operations the task performs against the outer session.
pub trait SignalingSession {
    /// Send a task message to the peer over the existing signalling
    /// channel.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description if the session rejects the
    /// send (e.g. the session is not in the `task` state).
    fn send_task_message(&mut self, message: &crate::message::TaskMessage) -> Result<(), String>;

    /// Ask the session to close the connection with `code`.
    fn reset_connection(&mut self, code: CloseCode);

    /// Deliver a decrypted post-handover signalling message to the
    /// application.
    fn deliver_message(&mut self, plaintext: Vec<u8>);
}
