//! Shared test doubles for the `saltyrtc-task` integration tests.
//!
//! Not every scenario file exercises every item here; unused ones vary
//! from binary to binary.
#![allow(dead_code)]

use std::{
    cell::RefCell,
    rc::Rc,
    time::{Duration, Instant},
};

use saltyrtc_task::{CloseCode, SignalingSession, TaskMessage};
use saltyrtc_task_core::{Environment, SignalingTransportHandler};

/// Deterministic [`Environment`]: real monotonic time, fixed "randomness".
#[derive(Clone)]
pub struct TestEnv;

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
        buffer.fill(0x24);
    }
}

/// Like [`TestEnv`], but stamps a distinct byte into generated randomness
/// (cookies in particular), so two tasks constructed with different
/// `TestEnvTagged` values never collide on their own cookie.
#[derive(Clone)]
pub struct TestEnvTagged(pub u8);

impl Environment for TestEnvTagged {
    type Instant = Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        buffer.fill(self.0);
    }
}

/// A [`SignalingSession`] that records everything sent/delivered/reset
/// through shared, clonable handles, so the test driving a [`Task`] that
/// owns this session by value can still inspect what happened to it.
#[derive(Default)]
pub struct RecordingSession {
    sent: Rc<RefCell<Vec<TaskMessage>>>,
    delivered: Rc<RefCell<Vec<Vec<u8>>>>,
    reset: Rc<RefCell<Option<CloseCode>>>,
}

impl RecordingSession {
    /// Obtain a clonable handle that keeps observing this session after it
    /// has been moved into a [`saltyrtc_task::Task`].
    #[must_use]
    pub fn handle(&self) -> RecordingSessionHandle {
        RecordingSessionHandle {
            sent: self.sent.clone(),
            delivered: self.delivered.clone(),
            reset: self.reset.clone(),
        }
    }
}

/// Shared view onto a [`RecordingSession`] moved into a `Task`.
#[derive(Clone, Default)]
pub struct RecordingSessionHandle {
    sent: Rc<RefCell<Vec<TaskMessage>>>,
    delivered: Rc<RefCell<Vec<Vec<u8>>>>,
    reset: Rc<RefCell<Option<CloseCode>>>,
}

impl RecordingSessionHandle {
    /// Task messages sent so far, in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<TaskMessage> {
        self.sent.borrow().clone()
    }

    /// Post-handover payloads delivered so far, in delivery order.
    #[must_use]
    pub fn delivered(&self) -> Vec<Vec<u8>> {
        self.delivered.borrow().clone()
    }

    /// The close code the task last asked the session to reset with, if
    /// any.
    #[must_use]
    pub fn reset(&self) -> Option<CloseCode> {
        *self.reset.borrow()
    }
}

impl SignalingSession for RecordingSession {
    fn send_task_message(&mut self, message: &TaskMessage) -> Result<(), String> {
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }

    fn reset_connection(&mut self, code: CloseCode) {
        *self.reset.borrow_mut() = Some(code);
    }

    fn deliver_message(&mut self, plaintext: Vec<u8>) {
        self.delivered.borrow_mut().push(plaintext);
    }
}

/// A [`SignalingTransportHandler`] that records every chunk handed to it,
/// so a peer's chunks can be fed into another `Task`'s
/// `on_chunk_received`.
pub struct RecordingHost {
    /// Reported maximum host message size.
    pub max_message_size: u32,
    /// Every chunk passed to [`Self::send`], in send order.
    pub sent: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl RecordingHost {
    /// Construct a host reporting `max_message_size` with an empty send
    /// log.
    #[must_use]
    pub fn new(max_message_size: u32) -> Self {
        Self { max_message_size, sent: Rc::new(RefCell::new(Vec::new())) }
    }
}

impl SignalingTransportHandler for RecordingHost {
    fn max_message_size(&self) -> u32 {
        self.max_message_size
    }

    fn send(&mut self, chunk: &[u8]) -> Result<(), String> {
        self.sent.borrow_mut().push(chunk.to_vec());
        Ok(())
    }

    fn close(&mut self) -> Result<(), String> {
        Ok(())
    }
}
