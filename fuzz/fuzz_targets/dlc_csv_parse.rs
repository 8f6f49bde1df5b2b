//! Fuzz target for DeepLabCut CSV parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the DeepLabCut CSV parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use posetracks::ir::io_dlc_csv::from_dlc_csv_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_dlc_csv_slice(data, None);
    let _ = from_dlc_csv_slice(data, Some(30.0));
});
