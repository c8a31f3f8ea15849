//! Fuzz target for TaskMessage::decode (CBOR)
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use saltyrtc_task::TaskMessage;

fuzz_target!(|data: &[u8]| {
    let _ = TaskMessage::decode(data);
});
