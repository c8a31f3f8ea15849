//! Fuzz target for ChunkHeader::decode
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use saltyrtc_task_proto::ChunkHeader;

fuzz_target!(|data: &[u8]| {
    let _ = ChunkHeader::decode(data);
});
