#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array3, Array4, Dimension};
use posetracks::ir::{assemble, RawPoses};
use posetracks::PoseDataset;

/// A small two-mouse, two-keypoint 2-D dataset with a few gaps.
///
/// Frame indices are `first_frame..first_frame + n_frames`.
pub fn two_mice(n_frames: usize, first_frame: i64, fps: Option<f64>) -> PoseDataset {
    let position = Array4::from_shape_fn((n_frames, 2, 2, 2), |(t, i, k, s)| {
        if t % 5 == 3 && i == 1 {
            f64::NAN
        } else {
            100.0 * i as f64 + 10.0 * k as f64 + s as f64 + 0.5 * t as f64
        }
    });
    let confidence = Array3::from_shape_fn((n_frames, 2, 2), |(t, i, k)| {
        if t % 5 == 3 && i == 1 {
            f64::NAN
        } else {
            0.5 + 0.1 * ((t + i + k) % 5) as f64
        }
    });
    let frames = (first_frame..first_frame + n_frames as i64).collect();

    let raw = RawPoses::new(position)
        .with_confidence(confidence)
        .with_individuals(["mouse1", "mouse2"])
        .with_keypoints(["snout", "tailbase"])
        .with_frame_indices(frames);
    assemble(raw, fps).expect("assemble two_mice")
}

/// A single-individual 3-D dataset.
pub fn single_fly_3d(n_frames: usize) -> PoseDataset {
    let position = Array4::from_shape_fn((n_frames, 1, 3, 3), |(t, _, k, s)| {
        t as f64 + 0.25 * k as f64 - s as f64
    });
    let confidence = Array3::from_elem((n_frames, 1, 3), 0.8);
    let raw = RawPoses::new(position)
        .with_confidence(confidence)
        .with_individuals(["fly"])
        .with_keypoints(["head", "thorax", "abdomen"]);
    assemble(raw, None).expect("assemble single_fly_3d")
}

/// Element-wise equality where `NaN == NaN`.
pub fn nan_eq<D: Dimension>(a: &ndarray::Array<f64, D>, b: &ndarray::Array<f64, D>) -> bool {
    a.shape() == b.shape()
        && a
            .iter()
            .zip(b.iter())
            .all(|(x, y)| (x.is_nan() && y.is_nan()) || x == y)
}

/// Asserts the tensors and labels of two datasets match.
pub fn assert_same_tracks(expected: &PoseDataset, actual: &PoseDataset) {
    assert_eq!(expected.individuals, actual.individuals, "individuals");
    assert_eq!(expected.keypoints, actual.keypoints, "keypoints");
    assert!(
        nan_eq(&expected.position, &actual.position),
        "positions differ:\n{:?}\nvs\n{:?}",
        expected.position,
        actual.position
    );
    assert!(
        nan_eq(&expected.confidence, &actual.confidence),
        "confidence differs:\n{:?}\nvs\n{:?}",
        expected.confidence,
        actual.confidence
    );
}

/// Copies a file from `tests/fixtures` into `dir` under `name`.
pub fn copy_fixture(fixture: &str, dir: &Path, name: &str) -> PathBuf {
    let dest = dir.join(name);
    fs::copy(Path::new("tests/fixtures").join(fixture), &dest).expect("copy fixture");
    dest
}
