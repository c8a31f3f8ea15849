//! The WebRTC signalling task state machine.
//!
//! ```text
//! init --select channel id, merge handover/chunk length--> negotiated
//!   negotiated --send_offer/send_answer/send_candidate--> outgoing task message (via session)
//!   negotiated --on_task_message--> dispatched Event (offer/answer/candidates) or peer handover noted
//!   negotiated --handover(host)--> transport bound, own Handover message sent
//!   transport bound --on_chunk_received--> decrypted message delivered (queued until peer handover seen)
//! ```
//!
//! Exposes a set of named operations rather than one `handle(event)`
//! dispatcher, since this state machine's external interface is itself a
//! list of named operations, not a single event stream.

use std::time::Duration;

use saltyrtc_task_core::{Environment, SignalingTransport, SignalingTransportHandler, TransportAction};
use saltyrtc_task_crypto::AeadService;
use tracing::{debug, warn};

use crate::{
    builder::{LogLevel, TaskConfig},
    error::TaskError,
    event::{Event, EventKind, EventRegistry, HandlerAction, HandlerToken},
    message::{Candidate, SessionDescription, TaskMessage, validate_candidates, validate_session_description},
    negotiation::{self, NegotiationPayload},
    session::{CloseCode, SignalingSession},
};

/// Candidates queued by `send_candidate` are coalesced and sent as a single
/// `candidates` message after this much time has elapsed since the first
/// one was buffered.
pub const CANDIDATE_BUFFER_DELAY: Duration = Duration::from_millis(5);

/// An action the driver must perform that the task cannot perform itself
/// (arming a timer requires access to the runtime's scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction<I> {
    /// Call [`Task::tick`] with a time `>= at` so the buffered candidates
    /// get flushed.
    ArmCandidateTimer {
        /// Deadline at which the candidate buffer should be flushed.
        at: I,
    },
}

/// The WebRTC signalling task.
///
/// Generic over the environment (time/randomness), the outer session
/// seam, the host data-channel handler, and the AEAD primitive used for
/// the handover channel's cryptographic context.
pub struct Task<E: Environment, S: SignalingSession, H: SignalingTransportHandler, A: AeadService> {
    env: E,
    config: TaskConfig,
    log_level: LogLevel,
    session: S,
    events: EventRegistry,

    initialized: bool,
    negotiated_handover: bool,
    effective_chunk_length: u32,
    link: Option<saltyrtc_task_core::TransportLink>,

    /// Taken (via `Option::take`) the first and only time `handover` is
    /// called, to construct the handover channel's crypto context.
    aead: Option<A>,
    transport: Option<SignalingTransport<A, H>>,
    /// Set once the peer's own `Handover` task message has been seen,
    /// whether that happens before or after our own `handover` call.
    peer_handed_over: bool,

    candidate_buffer: Vec<Option<Candidate>>,
    candidate_deadline: Option<E::Instant>,
}

impl<E, S, H, A> Task<E, S, H, A>
where
    E: Environment,
    S: SignalingSession,
    H: SignalingTransportHandler,
    A: AeadService,
{
    /// Construct a task from validated `config`, bound to `session` (the
    /// outer SaltyRTC session) and `aead` (the encryption primitive used
    /// for the handover channel, once negotiated).
    #[must_use]
    pub fn new(env: E, config: TaskConfig, session: S, aead: A) -> Self {
        let effective_chunk_length = config.max_chunk_length;
        let log_level = config.log_level;
        Self {
            env,
            config,
            log_level,
            session,
            events: EventRegistry::new(),
            initialized: false,
            negotiated_handover: false,
            effective_chunk_length,
            link: None,
            aead: Some(aead),
            transport: None,
            peer_handed_over: false,
            candidate_buffer: Vec::new(),
            candidate_deadline: None,
        }
    }

    /// The negotiation payload this endpoint offers, for the outer session
    /// to embed in its handshake message.
    #[must_use]
    pub fn local_negotiation_payload(&self) -> NegotiationPayload {
        NegotiationPayload {
            exclude: self.config.exclude.clone(),
            handover: self.config.do_handover,
            max_packet_size: matches!(self.config.version, crate::builder::TaskVersion::V0)
                .then_some(self.config.max_chunk_length),
        }
    }

    /// Negotiate task parameters against the peer's payload: AND-merge
    /// handover, (v0 only) merge `max_packet_size`, and select a channel
    /// id.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NoChannelIdAvailable`] if every channel id is
    /// excluded by one side or the other *and* handover was negotiated on
    /// (a channel id is only required to carry the handover channel; with
    /// handover off, `init` still succeeds and [`Self::get_transport_link`]
    /// simply returns `None`).
    pub fn init(&mut self, peer: &NegotiationPayload) -> Result<(), TaskError> {
        self.negotiated_handover = negotiation::merge_handover(self.config.do_handover, peer.handover);
        if matches!(self.config.version, crate::builder::TaskVersion::V0) {
            let local = self.config.max_chunk_length;
            let remote = peer.max_packet_size.unwrap_or(local);
            self.effective_chunk_length = negotiation::merge_max_packet_size(local, remote);
        }
        match negotiation::select_channel_id(&self.config.exclude, &peer.exclude) {
            Ok(channel_id) => {
                self.link = Some(saltyrtc_task_core::TransportLink::new(
                    channel_id,
                    self.config.version.protocol_id(),
                ));
            }
            Err(err) if self.negotiated_handover => return Err(err),
            Err(_) => self.link = None,
        }
        self.initialized = true;
        if self.log_enabled(LogLevel::Debug) {
            debug!(
                channel_id = self.link.as_ref().map(|link| link.id),
                handover = self.negotiated_handover,
                "task initialized"
            );
        }
        Ok(())
    }

    /// The negotiated channel descriptor, once [`Self::init`] has run.
    #[must_use]
    pub fn get_transport_link(&self) -> Option<&saltyrtc_task_core::TransportLink> {
        self.link.as_ref()
    }

    /// Whether the task's configured log level permits logging at `level`.
    #[must_use]
    fn log_enabled(&self, level: LogLevel) -> bool {
        self.log_level >= level
    }

    /// Register a handler for `kind`, invoked until it returns
    /// [`HandlerAction::Remove`].
    pub fn on(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&Event) -> HandlerAction + Send + 'static,
    ) -> HandlerToken {
        self.events.on(kind, handler)
    }

    /// Register a handler for `kind`, invoked at most once.
    pub fn once(&mut self, kind: EventKind, handler: impl FnMut(&Event) + Send + 'static) -> HandlerToken {
        self.events.once(kind, handler)
    }

    /// Deregister a previously registered handler.
    pub fn off(&mut self, token: HandlerToken) {
        self.events.off(token);
    }

    /// Called once the outer session completes the peer handshake; the
    /// task may now exchange task messages.
    pub fn on_peer_handshake_done(&mut self) {
        debug!("peer handshake complete, task messages may now flow");
    }

    /// Send an SDP offer to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidMessage`] if the offer's SDP is empty,
    /// or propagates a session send failure.
    pub fn send_offer(&mut self, offer: SessionDescription) -> Result<(), TaskError> {
        validate_session_description(&offer).map_err(TaskError::InvalidMessage)?;
        self.send_task_message(&TaskMessage::Offer { offer })
    }

    /// Send an SDP answer to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidMessage`] if the answer's SDP is empty,
    /// or propagates a session send failure.
    pub fn send_answer(&mut self, answer: SessionDescription) -> Result<(), TaskError> {
        validate_session_description(&answer).map_err(TaskError::InvalidMessage)?;
        self.send_task_message(&TaskMessage::Answer { answer })
    }

    /// Buffer `candidate` (or `None` for end-of-candidates) for batched
    /// delivery. The first candidate buffered since the last flush arms a
    /// [`CANDIDATE_BUFFER_DELAY`] timer; the caller must arrange for
    /// [`Self::tick`] to be called once it elapses.
    ///
    /// # Errors
    ///
    /// Propagates a session send failure if the buffer happens to flush
    /// synchronously (it never does today, but the signature stays
    /// fallible to match the other `send_*` operations).
    pub fn send_candidate(
        &mut self,
        candidate: Option<Candidate>,
        now: E::Instant,
    ) -> Result<Vec<TaskAction<E::Instant>>, TaskError>
    where
        E::Instant: std::ops::Add<Duration, Output = E::Instant>,
    {
        self.candidate_buffer.push(candidate);
        if self.candidate_deadline.is_some() {
            return Ok(Vec::new());
        }
        let at = now + CANDIDATE_BUFFER_DELAY;
        self.candidate_deadline = Some(at);
        Ok(vec![TaskAction::ArmCandidateTimer { at }])
    }

    /// Drive buffered-candidate flushing. A no-op unless a candidate
    /// buffer timer armed by [`Self::send_candidate`] is due.
    ///
    /// # Errors
    ///
    /// Propagates a session send failure.
    pub fn tick(&mut self, now: E::Instant) -> Result<(), TaskError> {
        let Some(deadline) = self.candidate_deadline else {
            return Ok(());
        };
        if now < deadline {
            return Ok(());
        }
        self.candidate_deadline = None;
        let candidates = std::mem::take(&mut self.candidate_buffer);
        validate_candidates(&candidates).map_err(TaskError::InvalidMessage)?;
        self.send_task_message(&TaskMessage::Candidates { candidates })
    }

    fn send_task_message(&mut self, message: &TaskMessage) -> Result<(), TaskError> {
        // Encoding is validated here even though the session carries the
        // message opaquely, so a malformed message never reaches the wire.
        message.encode()?;
        self.session
            .send_task_message(message)
            .map_err(TaskError::SessionSend)
    }

    /// Process a task message received from the peer via the outer
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidMessage`] if the message fails
    /// validation, or propagates a transport error raised while flushing a
    /// pending message queue.
    pub fn on_task_message(&mut self, bytes: &[u8]) -> Result<(), TaskError> {
        let message = TaskMessage::decode(bytes)?;
        match message {
            TaskMessage::Offer { offer } => {
                validate_session_description(&offer).map_err(TaskError::InvalidMessage)?;
                self.events.dispatch(&Event::Offer(offer));
            }
            TaskMessage::Answer { answer } => {
                validate_session_description(&answer).map_err(TaskError::InvalidMessage)?;
                self.events.dispatch(&Event::Answer(answer));
            }
            TaskMessage::Candidates { candidates } => {
                validate_candidates(&candidates).map_err(TaskError::InvalidMessage)?;
                self.events.dispatch(&Event::Candidates(candidates));
            }
            TaskMessage::Handover => self.on_peer_handover()?,
        }
        Ok(())
    }

    fn on_peer_handover(&mut self) -> Result<(), TaskError> {
        if !self.negotiated_handover {
            if self.log_enabled(LogLevel::Warn) {
                warn!("peer sent handover while handover was not negotiated, resetting session");
            }
            self.session.reset_connection(CloseCode::ProtocolError);
            return Ok(());
        }
        if self.peer_handed_over {
            return Ok(());
        }
        self.peer_handed_over = true;
        if let Some(transport) = &mut self.transport {
            let actions = transport.flush_message_queue()?;
            self.dispatch_transport_actions(actions);
        }
        Ok(())
    }

    /// Bind the negotiated data channel's host handler and begin the
    /// handover: constructs the channel's crypto context, sends our own
    /// `Handover` task message, and is ready to carry chunked signalling
    /// traffic via [`Self::on_chunk_received`] / [`Self::send_signaling_message`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::HandoverDisabled`] if handover was not
    /// negotiated, [`TaskError::NotInitialized`] if called before
    /// [`Self::init`] completed successfully, [`TaskError::HandoverAlreadyInitiated`]
    /// if called twice, or propagates a chunk-length or send failure.
    pub fn handover(&mut self, host: H) -> Result<(), TaskError> {
        if !self.negotiated_handover {
            return Err(TaskError::HandoverDisabled);
        }
        let channel_id = self.link.as_ref().ok_or(TaskError::NotInitialized)?.id;
        let Some(aead) = self.aead.take() else {
            return Err(TaskError::HandoverAlreadyInitiated);
        };
        let cookie = self.env.random_cookie();
        let crypto = saltyrtc_task_crypto::CryptoContext::new(channel_id, cookie, 0, aead);
        let chunk_length = host.max_message_size().min(self.effective_chunk_length) as usize;
        let transport = SignalingTransport::new(crypto, host, chunk_length, self.peer_handed_over)?;
        self.transport = Some(transport);
        self.send_task_message(&TaskMessage::Handover)
    }

    /// Send a post-handover payload over the negotiated data channel.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotHandedOver`] if [`Self::handover`] has not
    /// completed, or propagates a transport failure.
    pub fn send_signaling_message(&mut self, payload: &[u8]) -> Result<(), TaskError> {
        let transport = self.transport.as_mut().ok_or(TaskError::NotHandedOver)?;
        if let Err(err) = transport.send(payload) {
            self.die(&err);
            return Err(err.into());
        }
        Ok(())
    }

    /// Feed one chunk received from the host data channel.
    ///
    /// A fatal parse or cryptographic error closes the transport and asks
    /// the outer session to reset the connection with
    /// [`CloseCode::ProtocolError`] before being returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotHandedOver`] if no transport is bound yet,
    /// or propagates the fatal transport error that triggered the reset.
    pub fn on_chunk_received(&mut self, chunk: &[u8]) -> Result<(), TaskError> {
        let transport = self.transport.as_mut().ok_or(TaskError::NotHandedOver)?;
        match transport.receive_chunk(chunk) {
            Ok(actions) => {
                self.dispatch_transport_actions(actions);
                Ok(())
            }
            Err(err) => {
                self.die(&err);
                Err(err.into())
            }
        }
    }

    /// `die()`: a fatal transport error closes the transport and requests
    /// a session reset with [`CloseCode::ProtocolError`] (§7 of the
    /// transport error table: nonce/crypto/chunk errors are always fatal).
    fn die(&mut self, err: &saltyrtc_task_core::TransportError) {
        if self.log_enabled(LogLevel::Error) {
            tracing::error!(%err, "fatal transport error, closing");
        }
        self.close(CloseCode::ProtocolError);
    }

    fn dispatch_transport_actions(&mut self, actions: Vec<TransportAction>) {
        for action in actions {
            let TransportAction::Deliver(plaintext) = action;
            self.session.deliver_message(plaintext);
        }
    }

    /// Notify the task that the host reports the negotiated data channel
    /// closed, outside of an explicit `close` call (e.g. the peer's
    /// browser tore it down).
    pub fn on_host_channel_closed(&mut self, channel_id: u16) {
        self.transport = None;
        self.events.dispatch(&Event::Disconnected { id: channel_id });
    }

    /// Notify handlers that the peer disconnected from the outer session
    /// entirely.
    pub fn on_disconnected(&mut self, channel_id: u16) {
        self.events.dispatch(&Event::Disconnected { id: channel_id });
    }

    /// Tear the task down: closes the handover transport (if bound) and
    /// asks the outer session to reset the connection with `code`.
    pub fn close(&mut self, code: CloseCode) {
        if let Some(transport) = &mut self.transport {
            transport.close();
        }
        self.transport = None;
        self.events.off_all();
        self.session.reset_connection(code);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Instant,
    };

    use saltyrtc_task_crypto::NullAead;

    use super::*;
    use crate::builder::TaskBuilder;

    #[derive(Clone)]
    struct TestEnv;

    impl Environment for TestEnv {
        type Instant = Instant;

        #[allow(clippy::disallowed_methods)]
        fn now(&self) -> Self::Instant {
            Instant::now()
        }

        fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            std::future::ready(())
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(0x42);
        }
    }

    #[derive(Default)]
    struct FakeSession {
        sent: Vec<TaskMessage>,
        delivered: Vec<Vec<u8>>,
        reset: Option<CloseCode>,
    }

    impl SignalingSession for FakeSession {
        fn send_task_message(&mut self, message: &TaskMessage) -> Result<(), String> {
            self.sent.push(message.clone());
            Ok(())
        }

        fn reset_connection(&mut self, code: CloseCode) {
            self.reset = Some(code);
        }

        fn deliver_message(&mut self, plaintext: Vec<u8>) {
            self.delivered.push(plaintext);
        }
    }

    struct FakeHost {
        max_message_size: u32,
        sent: Vec<Vec<u8>>,
    }

    impl SignalingTransportHandler for FakeHost {
        fn max_message_size(&self) -> u32 {
            self.max_message_size
        }

        fn send(&mut self, chunk: &[u8]) -> Result<(), String> {
            self.sent.push(chunk.to_vec());
            Ok(())
        }

        fn close(&mut self) -> Result<(), String> {
            Ok(())
        }
    }

    fn new_task() -> Task<TestEnv, FakeSession, FakeHost, NullAead> {
        let config = TaskBuilder::new().build().unwrap();
        Task::new(TestEnv, config, FakeSession::default(), NullAead::new([7u8; 32]))
    }

    #[test]
    fn init_selects_channel_and_merges_handover() {
        let mut task = new_task();
        task.init(&NegotiationPayload {
            exclude: vec![0, 1],
            handover: true,
            max_packet_size: None,
        })
        .unwrap();
        assert_eq!(task.get_transport_link().unwrap().id, 2);
        assert!(task.negotiated_handover);
    }

    #[test]
    fn handover_disabled_when_peer_declines() {
        let mut task = new_task();
        task.init(&NegotiationPayload {
            exclude: vec![],
            handover: false,
            max_packet_size: None,
        })
        .unwrap();
        let host = FakeHost { max_message_size: 256, sent: Vec::new() };
        assert!(matches!(task.handover(host), Err(TaskError::HandoverDisabled)));
    }

    #[test]
    fn send_offer_reaches_session() {
        let mut task = new_task();
        task.send_offer(SessionDescription { kind: "offer".into(), sdp: "v=0".into() }).unwrap();
        assert_eq!(task.session.sent.len(), 1);
    }

    #[test]
    fn send_offer_rejects_empty_sdp() {
        let mut task = new_task();
        let err = task
            .send_offer(SessionDescription { kind: "offer".into(), sdp: String::new() })
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidMessage(_)));
    }

    #[test]
    fn candidate_buffer_flushes_once_deadline_elapses() {
        let mut task = new_task();
        let t0 = task.env.now();
        let actions = task
            .send_candidate(
                Some(Candidate { candidate: "c1".into(), sdp_mid: None, sdp_mline_index: None }),
                t0,
            )
            .unwrap();
        assert_eq!(actions, vec![TaskAction::ArmCandidateTimer { at: t0 + CANDIDATE_BUFFER_DELAY }]);

        // A second candidate before the deadline does not re-arm the timer.
        let actions = task
            .send_candidate(
                Some(Candidate { candidate: "c2".into(), sdp_mid: None, sdp_mline_index: None }),
                t0,
            )
            .unwrap();
        assert!(actions.is_empty());

        task.tick(t0).unwrap();
        assert!(task.session.sent.is_empty(), "not yet due");

        task.tick(t0 + CANDIDATE_BUFFER_DELAY).unwrap();
        match task.session.sent.as_slice() {
            [TaskMessage::Candidates { candidates }] => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected sent messages: {other:?}"),
        }
    }

    #[test]
    fn on_task_message_dispatches_offer_event() {
        let mut task = new_task();
        let received = Arc::new(Mutex::new(None));
        let received_clone = received.clone();
        task.on(EventKind::Offer, move |event| {
            if let Event::Offer(desc) = event {
                *received_clone.lock().unwrap() = Some(desc.clone());
            }
            HandlerAction::Continue
        });

        let msg = TaskMessage::Offer {
            offer: SessionDescription { kind: "offer".into(), sdp: "v=0".into() },
        };
        task.on_task_message(&msg.encode().unwrap()).unwrap();
        assert!(received.lock().unwrap().is_some());
    }

    #[test]
    fn send_signaling_message_requires_handover() {
        let mut task = new_task();
        assert!(matches!(
            task.send_signaling_message(b"x"),
            Err(TaskError::NotHandedOver)
        ));
    }

    #[test]
    fn full_handover_then_chunk_round_trip() {
        let mut a = new_task();
        a.init(&NegotiationPayload { exclude: vec![], handover: true, max_packet_size: None }).unwrap();
        let host = FakeHost { max_message_size: 256, sent: Vec::new() };
        a.handover(host).unwrap();
        assert_eq!(a.session.sent, vec![TaskMessage::Handover]);

        a.send_signaling_message(b"post-handover payload").unwrap();
        assert!(a.transport.is_some());
    }

    #[test]
    fn close_resets_session_and_clears_transport() {
        let mut task = new_task();
        task.close(CloseCode::GoingAway);
        assert_eq!(task.session.reset, Some(CloseCode::GoingAway));
    }

    #[test]
    fn peer_handover_message_resets_session_when_handover_not_negotiated() {
        let mut task = new_task();
        task.init(&NegotiationPayload { exclude: vec![], handover: false, max_packet_size: None })
            .unwrap();
        assert!(!task.negotiated_handover);

        let msg = TaskMessage::Handover;
        task.on_task_message(&msg.encode().unwrap()).unwrap();
        assert_eq!(task.session.reset, Some(CloseCode::ProtocolError));
    }

    #[test]
    fn handover_after_failed_init_is_not_initialized() {
        let mut task = new_task();
        // Exclude every available channel id so `init` fails with
        // `NoChannelIdAvailable` while handover is still negotiated on.
        let all_excluded: Vec<u16> = (0..u16::MAX).collect();
        let err = task
            .init(&NegotiationPayload { exclude: all_excluded, handover: true, max_packet_size: None })
            .unwrap_err();
        assert!(matches!(err, TaskError::NoChannelIdAvailable));

        let host = FakeHost { max_message_size: 256, sent: Vec::new() };
        assert!(matches!(task.handover(host), Err(TaskError::NotInitialized)));
    }
}
