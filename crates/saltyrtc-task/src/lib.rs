//! WebRTC signalling task: negotiates a data channel with the peer, carries
//! SDP offers/answers/candidates over the existing SaltyRTC signalling
//! channel, and optionally hands signalling over to a chunked, encrypted
//! channel running over that negotiated data channel.
//!
//! ```text
//! outer session --init(peer negotiation)--> Task (channel id + handover negotiated)
//!   Task --send_offer/send_answer/send_candidate--> outer session --task message--> peer
//!   outer session --on_task_message--> Task --dispatch--> application event handlers
//!   Task --handover(host data channel)--> chunked, encrypted transport bound
//! ```
//!
//! Session handshake, authentication, and relay transport are the outer
//! session's responsibility, reached only through [`session::SignalingSession`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod builder;
pub mod error;
pub mod event;
pub mod message;
pub mod negotiation;
pub mod session;
mod task;

pub use builder::{DEFAULT_MAX_CHUNK_LENGTH, LogLevel, TaskBuilder, TaskConfig, TaskVersion};
pub use error::TaskError;
pub use event::{Event, EventKind, EventRegistry, HandlerAction, HandlerToken};
pub use message::{Candidate, SessionDescription, TaskMessage};
pub use negotiation::NegotiationPayload;
pub use session::{CloseCode, SignalingSession};
pub use task::{CANDIDATE_BUFFER_DELAY, Task, TaskAction};
