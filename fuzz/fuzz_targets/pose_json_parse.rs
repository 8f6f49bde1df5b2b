//! Fuzz target for posetracks JSON parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the JSON parser, which
//! must reject inconsistent shapes and labels without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use posetracks::ir::io_json::from_pose_json_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_pose_json_slice(data);
});
