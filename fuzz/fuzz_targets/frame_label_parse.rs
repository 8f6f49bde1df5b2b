//! Fuzz target for DeepLabCut row-label parsing.
//!
//! Row labels are frame numbers or image paths ending in one; arbitrary
//! lines must resolve to strictly increasing frame indices or fall back to
//! row positions.

#![no_main]

use libfuzzer_sys::fuzz_target;
use posetracks::ir::io_dlc_csv::fuzz_frame_indices;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let labels: Vec<String> = String::from_utf8_lossy(data)
        .lines()
        .map(str::to_string)
        .collect();
    let frames = fuzz_frame_indices(&labels);
    assert_eq!(frames.len(), labels.len());
    assert!(frames.windows(2).all(|w| w[0] < w[1]));
});
