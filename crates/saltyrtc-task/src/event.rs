//! Event registry: dispatches `offer`/`answer`/`candidates`/`disconnected`
//! notifications to handlers registered via [`EventRegistry::on`] /
//! [`EventRegistry::once`].
//!
//! The original formulation lets a handler return `false` to deregister
//! itself. Per the redesign recorded in `DESIGN.md`, that is replaced here
//! with explicit subscription tokens (returned from `on`/`once`) and a
//! handler return value of [`HandlerAction::Remove`] — the registry mutates
//! only after every handler in a dispatch snapshot has run, so a handler
//! removing itself never perturbs the handlers still pending in that round.

use std::{collections::HashMap, panic::AssertUnwindSafe};

use tracing::error;

use crate::message::{Candidate, SessionDescription};

/// A notification the task dispatches to registered handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A peer offer arrived.
    Offer(SessionDescription),
    /// A peer answer arrived.
    Answer(SessionDescription),
    /// A batch of peer candidates arrived.
    Candidates(Vec<Option<Candidate>>),
    /// The host data channel reported closure.
    Disconnected {
        /// Channel id that disconnected.
        id: u16,
    },
}

/// Which [`Event`] kind a handler is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// See [`Event::Offer`].
    Offer,
    /// See [`Event::Answer`].
    Answer,
    /// See [`Event::Candidates`].
    Candidates,
    /// See [`Event::Disconnected`].
    Disconnected,
}

impl Event {
    fn kind(&self) -> EventKind {
        match self {
            Self::Offer(_) => EventKind::Offer,
            Self::Answer(_) => EventKind::Answer,
            Self::Candidates(_) => EventKind::Candidates,
            Self::Disconnected { .. } => EventKind::Disconnected,
        }
    }
}

/// What a handler wants to happen to its own subscription after running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerAction {
    /// Keep the handler registered.
    Continue,
    /// Deregister the handler.
    Remove,
}

/// Opaque token identifying one registered handler, returned by
/// [`EventRegistry::on`] / [`EventRegistry::once`] and accepted by
/// [`EventRegistry::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerToken(u64);

type Handler = Box<dyn FnMut(&Event) -> HandlerAction + Send>;

/// Registry of event handlers, one set per [`EventKind`].
#[derive(Default)]
pub struct EventRegistry {
    next_token: u64,
    handlers: HashMap<EventKind, Vec<(HandlerToken, Handler)>>,
}

impl EventRegistry {
    /// Construct an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, invoked every time a matching event
    /// fires until it returns [`HandlerAction::Remove`] or is removed via
    /// [`Self::off`].
    pub fn on(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&Event) -> HandlerAction + Send + 'static,
    ) -> HandlerToken {
        let token = HandlerToken(self.next_token);
        self.next_token += 1;
        self.handlers.entry(kind).or_default().push((token, Box::new(handler)));
        token
    }

    /// Register `handler` for `kind`, invoked at most once.
    pub fn once(
        &mut self,
        kind: EventKind,
        mut handler: impl FnMut(&Event) + Send + 'static,
    ) -> HandlerToken {
        self.on(kind, move |event| {
            handler(event);
            HandlerAction::Remove
        })
    }

    /// Deregister the handler identified by `token`, if still registered.
    pub fn off(&mut self, token: HandlerToken) {
        for handlers in self.handlers.values_mut() {
            handlers.retain(|(t, _)| *t != token);
        }
    }

    /// Deregister every handler for `kind`.
    pub fn off_kind(&mut self, kind: EventKind) {
        self.handlers.remove(&kind);
    }

    /// Deregister every handler for every kind.
    pub fn off_all(&mut self) {
        self.handlers.clear();
    }

    /// Dispatch `event` to every handler registered for its kind, in
    /// registration order. A handler panicking or returning
    /// [`HandlerAction::Remove`] never prevents later handlers in the same
    /// dispatch from running; removal is applied after the full snapshot
    /// has run. A panic is caught, logged, and treated as
    /// [`HandlerAction::Continue`] — the handler stays registered, since a
    /// single bad event is not grounds for silently dropping it.
    pub fn dispatch(&mut self, event: &Event) {
        let kind = event.kind();
        let Some(mut handlers) = self.handlers.remove(&kind) else {
            return;
        };
        handlers.retain_mut(|(token, handler)| {
            match std::panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(action) => action == HandlerAction::Continue,
                Err(payload) => {
                    let message = panic_message(&payload);
                    error!(?token, message, "event handler panicked, continuing dispatch");
                    true
                }
            }
        });
        if !handlers.is_empty() {
            self.handlers.insert(kind, handlers);
        }
    }
}

/// Best-effort extraction of a human-readable message from a caught panic
/// payload, which is almost always a `&'static str` or `String`.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
