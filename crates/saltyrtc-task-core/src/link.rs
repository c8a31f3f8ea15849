//! `TransportLink`: the boundary descriptor handed to the host application
//! so it can create the peer-to-peer data channel.
//!
//! In the imperative formulation of this protocol the link also carries
//! live `closed`/`receive` callbacks that get bound to the active
//! transport and rebound to "not tied" stubs on closure. Here that tied/
//! untied lifecycle is represented as data instead of callbacks: the link
//! is a plain descriptor, and "tied" vs. "untied" is simply whether
//! [`crate::transport::SignalingTransport`] driving this channel id still
//! exists. Host code feeds channel chunks into the owning task's
//! `on_chunk_received`/`send_signaling_message` methods (in `saltyrtc-task`)
//! rather than invoking a callback object directly; those methods return
//! `TaskError::NotHandedOver` if no transport is bound yet.

/// Constant label used for the negotiated data channel.
pub const CHANNEL_LABEL: &str = "saltyrtc-signaling";

/// Descriptor used by the host application to create the negotiated,
/// ordered, reliable data channel that will carry chunked signalling
/// traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportLink {
    /// Constant channel label, always [`CHANNEL_LABEL`].
    pub label: &'static str,
    /// Negotiated data channel id.
    pub id: u16,
    /// Sub-protocol string, `"<version>.webrtc.tasks.saltyrtc.org"`.
    pub protocol: String,
}

impl TransportLink {
    /// Construct a link descriptor for `channel_id` under `protocol`.
    #[must_use]
    pub fn new(channel_id: u16, protocol: impl Into<String>) -> Self {
        Self {
            label: CHANNEL_LABEL,
            id: channel_id,
            protocol: protocol.into(),
        }
    }
}

/// Host-provided binding for the negotiated data channel.
///
/// Implemented by the application; the chunk `max_message_size` it reports
/// bounds the chunk length the transport negotiates down to.
pub trait SignalingTransportHandler {
    /// Maximum message size the host channel can carry in one call to
    /// [`Self::send`].
    fn max_message_size(&self) -> u32;

    /// Send one chunk over the host channel.
    ///
    /// # Errors
    ///
    /// Returns a human-readable error description on host I/O failure.
    fn send(&mut self, chunk: &[u8]) -> Result<(), String>;

    /// Close the host channel.
    ///
    /// # Errors
    ///
    /// Returns a human-readable error description on host I/O failure.
    fn close(&mut self) -> Result<(), String>;
}
