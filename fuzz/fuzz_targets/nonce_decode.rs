//! Fuzz target for Nonce::decode
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use saltyrtc_task_proto::Nonce;

fuzz_target!(|data: &[u8]| {
    let _ = Nonce::decode(data);
});
