//! Signalling transport: encrypts and chunks outgoing messages onto the
//! host data channel, reassembles and decrypts incoming chunks, and queues
//! messages that arrive before the peer's handover completes.
//!
//! Calls down to the host (`send`, `close`) are synchronous, matching the
//! concurrency model in which the host handler has no asynchronous
//! boundary visible to the task. Delivering a fully reassembled message up
//! is expressed as a returned [`TransportAction`] rather than a direct
//! callback into the session, so the transport stays a pure,
//! independently testable state machine. A fatal parse or cryptographic
//! error is never wrapped into an action — it is returned as a plain
//! `Err`, and it is the caller's (the task's) job to escalate that into
//! closing the transport and resetting the session.

use std::collections::VecDeque;

use saltyrtc_task_crypto::{AeadService, CryptoContext, SignalBox};
use tracing::{debug, warn};

use crate::{
    chunker::{self, Unchunker},
    error::TransportError,
    link::SignalingTransportHandler,
};

/// Action for the driver (the owning [`crate::chunker`]'s caller, i.e. the
/// task) to execute after feeding the transport an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportAction {
    /// A fully reassembled, decrypted message is ready for the session.
    Deliver(Vec<u8>),
}

/// Per-channel chunked signalling transport.
pub struct SignalingTransport<A, H> {
    crypto: CryptoContext<A>,
    host: H,
    chunk_length: usize,
    unchunker: Unchunker,
    next_message_id: u32,
    /// `Some` while the peer has not yet completed handover; messages
    /// decrypted in the meantime are queued here in arrival order.
    queue: Option<VecDeque<Vec<u8>>>,
}

impl<A: AeadService, H: SignalingTransportHandler> SignalingTransport<A, H> {
    /// Construct a transport bound to `host`, with `crypto` already scoped
    /// to the negotiated channel id.
    ///
    /// `chunk_length` is `min(host.max_message_size(), requested_max)`; the
    /// caller (the task) is responsible for computing that minimum. `queue`
    /// starts populated only if the peer has not yet signalled handover.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ChunkLengthTooSmall`] if `chunk_length`
    /// leaves no room for payload after the chunk header.
    pub fn new(
        crypto: CryptoContext<A>,
        host: H,
        chunk_length: usize,
        peer_handed_over: bool,
    ) -> Result<Self, TransportError> {
        saltyrtc_task_proto::payload_capacity(chunk_length)
            .map_err(|_| TransportError::ChunkLengthTooSmall(chunk_length))?;
        Ok(Self {
            crypto,
            host,
            chunk_length,
            unchunker: Unchunker::new(),
            next_message_id: 0,
            queue: (!peer_handed_over).then(VecDeque::new),
        })
    }

    /// Encrypt and chunk `message`, sending each chunk to the host in
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::HostSend`] if the host rejects a chunk.
    /// The caller should treat this as fatal and tear the transport down.
    pub fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        let signal_box = self.crypto.encrypt(message);
        let bytes = signal_box.to_bytes();
        let message_id = self.next_message_id;
        self.next_message_id = self.next_message_id.wrapping_add(1);

        let chunks = chunker::chunk(message_id, &bytes, self.chunk_length)?;
        for chunk in &chunks {
            if let Err(reason) = self.host.send(chunk) {
                warn!(%reason, "host channel rejected chunk, tearing down transport");
                return Err(TransportError::HostSend(reason));
            }
        }
        Ok(())
    }

    /// Feed one chunk received from the host channel.
    ///
    /// Returns `TransportAction::Deliver` once a message is fully
    /// reassembled and decrypted and the peer has completed handover;
    /// otherwise the message (if any) is queued and an empty action list
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the chunk fails to parse or the
    /// reassembled box fails cryptographic validation; both are fatal.
    pub fn receive_chunk(&mut self, chunk: &[u8]) -> Result<Vec<TransportAction>, TransportError> {
        let Some(reassembled) = self.unchunker.add(chunk)? else {
            return Ok(Vec::new());
        };

        let signal_box = SignalBox::from_bytes(&reassembled)?;
        let plaintext = self.crypto.decrypt(&signal_box)?;

        match &mut self.queue {
            Some(queue) => {
                queue.push_back(plaintext);
                Ok(Vec::new())
            }
            None => Ok(vec![TransportAction::Deliver(plaintext)]),
        }
    }

    /// Drain the pre-handover message queue, in arrival order, once the
    /// peer's handover message has arrived.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::QueueAlreadyFlushed`] if called more than
    /// once.
    pub fn flush_message_queue(&mut self) -> Result<Vec<TransportAction>, TransportError> {
        let mut queue = self.queue.take().ok_or(TransportError::QueueAlreadyFlushed)?;
        debug!(count = queue.len(), "flushing pre-handover message queue");
        Ok(queue.drain(..).map(TransportAction::Deliver).collect())
    }

    /// Close the host channel. Errors are logged and swallowed: once the
    /// task decides to close, there is nothing further to escalate to.
    pub fn close(&mut self) {
        if let Err(reason) = self.host.close() {
            warn!(%reason, "host channel close failed, ignoring");
        }
    }
}
