//! Integration tests for selection and confidence filtering.

use ndarray::s;
use posetracks::filtering::{filter_by_confidence, DEFAULT_CONFIDENCE_THRESHOLD};
use posetracks::{IndexSelection, PoseError, Selection, TimeRange};

mod common;

#[test]
fn select_by_names_keeps_dataset_order() {
    let ds = common::two_mice(10, 0, None);
    let sub = ds
        .sel(
            &Selection::new()
                .individuals(["mouse2", "mouse1"])
                .keypoints(["tailbase"]),
        )
        .expect("sel");

    assert_eq!(sub.individuals, vec!["mouse1", "mouse2"]);
    assert_eq!(sub.keypoints, vec!["tailbase"]);
    assert_eq!(sub.position.dim(), (10, 2, 1, 2));
    assert!(common::nan_eq(
        &sub.position,
        &ds.position.slice(s![.., .., 1..2, ..]).to_owned()
    ));
}

#[test]
fn time_range_in_seconds_is_inclusive() {
    let ds = common::two_mice(10, 0, Some(2.0));
    let sub = ds.sel(&Selection::new().time(TimeRange::between(1.0, 2.5))).expect("sel");
    assert_eq!(sub.frame_indices().expect("frames"), vec![2, 3, 4, 5]);
    assert_eq!(sub.metadata.fps, Some(2.0));

    let tail = ds.sel(&Selection::new().time(TimeRange::from(4.0))).expect("sel");
    assert_eq!(tail.frame_indices().expect("frames"), vec![8, 9]);

    let head = ds.sel(&Selection::new().time(TimeRange::until(0.5))).expect("sel");
    assert_eq!(head.n_frames(), 2);
}

#[test]
fn time_range_outside_data_is_empty() {
    let ds = common::two_mice(5, 0, None);
    let sub = ds
        .sel(&Selection::new().time(TimeRange::between(100.0, 200.0)))
        .expect("sel");
    assert_eq!(sub.n_frames(), 0);
    assert_eq!(sub.n_individuals(), 2);
}

#[test]
fn unknown_name_is_reported() {
    let ds = common::two_mice(5, 0, None);
    let err = ds.sel(&Selection::new().keypoints(["ear"])).unwrap_err();
    match err {
        PoseError::UnknownLabel { dim, label } => {
            assert_eq!(dim, "keypoints");
            assert_eq!(label, "ear");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn reversed_range_is_rejected() {
    let ds = common::two_mice(5, 0, None);
    let err = ds
        .sel(&Selection::new().time(TimeRange::between(3.0, 1.0)))
        .unwrap_err();
    assert!(matches!(err, PoseError::InvalidSelection { .. }), "{err:?}");
}

#[test]
fn positional_selection_sorts_and_dedups() {
    let ds = common::two_mice(6, 0, None);
    let sub = ds
        .isel(&IndexSelection {
            time: Some(vec![4, 1, 4]),
            individuals: Some(vec![1]),
            keypoints: None,
        })
        .expect("isel");
    assert_eq!(sub.frame_indices().expect("frames"), vec![1, 4]);
    assert_eq!(sub.individuals, vec!["mouse2"]);

    let err = ds
        .isel(&IndexSelection {
            time: Some(vec![6]),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, PoseError::InvalidSelection { .. }), "{err:?}");
}

#[test]
fn filtering_clears_low_confidence_positions_only() {
    let ds = common::two_mice(10, 0, None);
    let (filtered, report) = filter_by_confidence(&ds, DEFAULT_CONFIDENCE_THRESHOLD).expect("filter");

    assert!(common::nan_eq(&filtered.confidence, &ds.confidence));
    for ((t, i, k), &c) in ds.confidence.indexed_iter() {
        let kept = c >= DEFAULT_CONFIDENCE_THRESHOLD;
        for s in 0..2 {
            let value = filtered.position[[t, i, k, s]];
            if kept {
                assert_eq!(value, ds.position[[t, i, k, s]]);
            } else {
                assert!(value.is_nan(), "({t},{i},{k},{s}) should be cleared");
            }
        }
    }

    assert_eq!(report.total_points, 40);
    assert_eq!(report.missing_before, ds.missing_point_count());
    assert_eq!(
        report.missing_before + report.filtered_points,
        filtered.missing_point_count()
    );
}

#[test]
fn filtering_then_selecting_commutes() {
    let ds = common::two_mice(10, 0, None);
    let selection = Selection::new().individuals(["mouse1"]);

    let (a, _) = filter_by_confidence(&ds.sel(&selection).expect("sel"), 0.7).expect("filter");
    let (filtered, _) = filter_by_confidence(&ds, 0.7).expect("filter");
    let b = filtered.sel(&selection).expect("sel");
    common::assert_same_tracks(&a, &b);
}

#[test]
fn mismatched_confidence_is_a_shape_error_not_a_panic() {
    let mut ds = common::two_mice(2, 0, None);
    ds.confidence = ndarray::Array3::zeros((2, 1, 1));

    let err = ds
        .isel(&IndexSelection {
            individuals: Some(vec![1]),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, PoseError::Shape { .. }), "{:?}", err);

    let err = ds.sel(&Selection::new().keypoints(["snout"])).unwrap_err();
    assert!(matches!(err, PoseError::Shape { .. }), "{:?}", err);

    let err = filter_by_confidence(&ds, 0.5).unwrap_err();
    assert!(matches!(err, PoseError::Shape { .. }), "{:?}", err);
}
