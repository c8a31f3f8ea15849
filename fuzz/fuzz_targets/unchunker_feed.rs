//! Fuzz target for Unchunker::add
//!
//! Feeds arbitrary bytes as a single chunk. Malformed chunk headers or
//! adversarial (message_id, serial, flags) combinations should be rejected,
//! never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use saltyrtc_task_core::Unchunker;

fuzz_target!(|data: &[u8]| {
    let mut unchunker = Unchunker::new();
    let _ = unchunker.add(data);
});
