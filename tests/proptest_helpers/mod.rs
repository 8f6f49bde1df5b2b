#![allow(dead_code)]

use ndarray::{Array3, Array4};
use posetracks::ir::{assemble, RawPoses};
use posetracks::PoseDataset;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Element-wise equality where `NaN == NaN`.
pub fn nan_eq<'a>(
    a: impl IntoIterator<Item = &'a f64>,
    b: impl IntoIterator<Item = &'a f64>,
) -> bool {
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if (x.is_nan() && y.is_nan()) || x == y => {}
            _ => return false,
        }
    }
}

/// Compares everything a DeepLabCut-style table can carry: keypoints,
/// frames, positions and confidence. Individual names are compared only
/// when the table had an `individuals` level.
pub fn assert_tracks_equivalent(a: &PoseDataset, b: &PoseDataset) -> Result<(), String> {
    if a.position.dim() != b.position.dim() {
        return Err(format!(
            "shape {:?} != {:?}",
            a.position.dim(),
            b.position.dim()
        ));
    }
    if a.keypoints != b.keypoints {
        return Err(format!("keypoints {:?} != {:?}", a.keypoints, b.keypoints));
    }
    if a.n_individuals() > 1 && a.individuals != b.individuals {
        return Err(format!(
            "individuals {:?} != {:?}",
            a.individuals, b.individuals
        ));
    }
    let frames_a = a.frame_indices().map_err(|e| e.to_string())?;
    let frames_b = b.frame_indices().map_err(|e| e.to_string())?;
    if frames_a != frames_b {
        return Err(format!("frames {:?} != {:?}", frames_a, frames_b));
    }
    if !nan_eq(a.position.iter(), b.position.iter()) {
        return Err("positions differ".to_string());
    }
    if !nan_eq(a.confidence.iter(), b.confidence.iter()) {
        return Err("confidence differs".to_string());
    }
    Ok(())
}

/// Datasets of up to the given extents, 2-D or 3-D, with about one value
/// in ten missing and strictly increasing, possibly gapped, frame indices.
pub fn arb_pose_dataset(
    max_frames: usize,
    max_individuals: usize,
    max_keypoints: usize,
) -> BoxedStrategy<PoseDataset> {
    assert!(max_frames > 0, "max_frames must be > 0");
    assert!(max_individuals > 0, "max_individuals must be > 0");
    assert!(max_keypoints > 0, "max_keypoints must be > 0");

    (
        1usize..=max_frames,
        1usize..=max_individuals,
        1usize..=max_keypoints,
        prop_oneof![Just(2usize), Just(3usize)],
    )
        .prop_flat_map(|(t, i, k, s)| {
            (
                proptest::collection::btree_set(name_strategy(), i..=i),
                proptest::collection::btree_set(name_strategy(), k..=k),
                proptest::collection::vec(value_strategy(), t * i * k * s),
                proptest::collection::vec(confidence_strategy(), t * i * k),
                0i64..1000,
                proptest::collection::vec(1i64..4, t),
            )
                .prop_map(
                    move |(individuals, keypoints, values, scores, start, gaps)| {
                        build_dataset((t, i, k, s), individuals, keypoints, values, scores, start, gaps)
                    },
                )
        })
        .boxed()
}

fn name_strategy() -> BoxedStrategy<String> {
    proptest::string::string_regex("[a-z][a-z0-9_]{0,9}")
        .expect("valid name regex")
        .boxed()
}

fn value_strategy() -> BoxedStrategy<f64> {
    prop_oneof![
        9 => -1.0e4f64..1.0e4,
        1 => Just(f64::NAN),
    ]
    .boxed()
}

fn confidence_strategy() -> BoxedStrategy<f64> {
    prop_oneof![
        9 => 0.0f64..=1.0,
        1 => Just(f64::NAN),
    ]
    .boxed()
}

fn build_dataset(
    (t, i, k, s): (usize, usize, usize, usize),
    individuals: impl IntoIterator<Item = String>,
    keypoints: impl IntoIterator<Item = String>,
    values: Vec<f64>,
    scores: Vec<f64>,
    start: i64,
    gaps: Vec<i64>,
) -> PoseDataset {
    let position = Array4::from_shape_vec((t, i, k, s), values).expect("position shape");
    let confidence = Array3::from_shape_vec((t, i, k), scores).expect("confidence shape");
    let frames: Vec<i64> = gaps
        .iter()
        .scan(start, |frame, gap| {
            let current = *frame;
            *frame += gap;
            Some(current)
        })
        .collect();

    let raw = RawPoses::new(position)
        .with_confidence(confidence)
        .with_individuals(individuals)
        .with_keypoints(keypoints)
        .with_frame_indices(frames);
    assemble(raw, None).expect("generated dataset is valid")
}
