//! Integration tests for the DeepLabCut CSV format.

use std::fs;
use std::path::Path;

use posetracks::ir::io_dlc_csv::{read_dlc_csv, to_dlc_csv_string, write_dlc_csv};
use posetracks::ir::io_lp_csv::read_lp_csv;
use posetracks::{load, save, PoseError, SourceSoftware, SplitIndividuals, TimeUnit, WriteOptions};

mod common;

#[test]
fn read_single_animal_fixture() {
    let path = Path::new("tests/fixtures/dlc_single_mouse.csv");
    let ds = read_dlc_csv(path, None).expect("read");

    assert_eq!(ds.position.dim(), (4, 1, 2, 2));
    assert_eq!(ds.keypoints, vec!["snout", "tailbase"]);
    assert_eq!(ds.individuals.len(), 1);
    assert_eq!(ds.frame_indices().expect("frames"), vec![0, 1, 2, 3]);
    assert_eq!(ds.position[[0, 0, 0, 0]], 100.5);
    assert_eq!(ds.position[[0, 0, 0, 1]], 200.25);
    assert_eq!(ds.confidence[[1, 0, 1]], 0.1);
    assert!(ds.position[[1, 0, 1, 0]].is_nan());
    assert!(ds.position[[1, 0, 1, 1]].is_nan());
    assert_eq!(
        ds.metadata.source_software,
        Some(SourceSoftware::DeepLabCut {
            scorer: Some("DLC_resnet50_openfieldOct30shuffle1_10000".to_string())
        })
    );
    assert_eq!(ds.metadata.source_file.as_deref(), Some(path));
}

#[test]
fn read_multi_animal_fixture_with_image_paths() {
    let ds = read_dlc_csv(Path::new("tests/fixtures/dlc_two_mice.csv"), Some(5.0)).expect("read");

    assert_eq!(ds.individuals, vec!["mouse1", "mouse2"]);
    assert_eq!(ds.keypoints, vec!["snout", "tailbase"]);
    assert_eq!(ds.frame_indices().expect("frames"), vec![10, 11, 15]);
    assert_eq!(ds.metadata.time_unit, TimeUnit::Seconds);
    assert_eq!(ds.time.value(0), Some(2.0));
    assert_eq!(ds.time.value(2), Some(3.0));

    // mouse2's snout is blank in the second row, likelihood included.
    assert!(ds.position[[1, 1, 0, 0]].is_nan());
    assert!(ds.confidence[[1, 1, 0]].is_nan());
    assert_eq!(ds.position[[2, 1, 1, 1]], 317.0);
}

#[test]
fn multi_animal_roundtrip_through_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let original = common::two_mice(12, 100, None);
    let path = dir.path().join("tracks.csv");

    let written = write_dlc_csv(&path, &original, &WriteOptions::default()).expect("write");
    assert_eq!(written, vec![path.clone()]);

    let restored = read_dlc_csv(&path, None).expect("read back");
    common::assert_same_tracks(&original, &restored);
    assert_eq!(
        restored.frame_indices().expect("frames"),
        (100..112).collect::<Vec<_>>()
    );
}

#[test]
fn seconds_are_written_as_frame_indices() {
    let original = common::two_mice(4, 0, Some(25.0));
    let csv = to_dlc_csv_string(&original).expect("serialize");
    let data_rows: Vec<&str> = csv.lines().skip(4).collect();
    assert!(data_rows[3].starts_with("3,"), "row label: {}", data_rows[3]);

    let restored = posetracks::ir::io_dlc_csv::from_dlc_csv_str(&csv, Some(25.0)).expect("parse");
    assert_eq!(restored.time, original.time);
}

#[test]
fn split_individuals_writes_one_file_each() {
    let dir = tempfile::tempdir().expect("tempdir");
    let original = common::two_mice(6, 0, None);
    let opts = WriteOptions::default().split_individuals(SplitIndividuals::Yes);

    let written = save::to_dlc_file(&original, &dir.path().join("poses.csv"), &opts).expect("write");
    assert_eq!(
        written,
        vec![
            dir.path().join("poses_mouse1.csv"),
            dir.path().join("poses_mouse2.csv"),
        ]
    );

    // Each split file is a single-animal table that LightningPose can read.
    let mouse2 = read_lp_csv(&written[1], None).expect("read split");
    assert_eq!(mouse2.n_individuals(), 1);
    assert!(common::nan_eq(
        &mouse2.position.index_axis(ndarray::Axis(1), 0).to_owned(),
        &original.position.index_axis(ndarray::Axis(1), 1).to_owned()
    ));
}

#[test]
fn refuses_to_overwrite_without_flag() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tracks.csv");
    fs::write(&path, "keep me").expect("seed");

    let ds = common::two_mice(3, 0, None);
    let err = write_dlc_csv(&path, &ds, &WriteOptions::default()).unwrap_err();
    assert!(matches!(err, PoseError::InvalidFile { .. }), "{err:?}");
    assert_eq!(fs::read_to_string(&path).expect("read"), "keep me");

    write_dlc_csv(&path, &ds, &WriteOptions::default().overwrite(true)).expect("overwrite");
    assert!(read_dlc_csv(&path, None).is_ok());
}

#[test]
fn split_refuses_before_writing_anything() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("poses_mouse2.csv");
    fs::write(&blocker, "keep me").expect("seed");

    let ds = common::two_mice(3, 0, None);
    let opts = WriteOptions::default().split_individuals(SplitIndividuals::Yes);
    assert!(write_dlc_csv(&dir.path().join("poses.csv"), &ds, &opts).is_err());
    assert!(!dir.path().join("poses_mouse1.csv").exists());
}

#[test]
fn load_facade_dispatches_on_suffix() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = common::copy_fixture("dlc_two_mice.csv", dir.path(), "mice.csv");
    let ds = load::from_dlc_file(&path, None).expect("load");
    assert_eq!(ds.n_individuals(), 2);

    let err = load::from_dlc_file(&dir.path().join("mice.txt"), None).unwrap_err();
    assert!(matches!(err, PoseError::InvalidFile { .. }), "{err:?}");
}

#[test]
fn upper_case_suffix_loads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = common::copy_fixture("dlc_two_mice.csv", dir.path(), "mice.CSV");
    let ds = load::from_dlc_file(&path, None).expect("load upper-case suffix");
    assert_eq!(ds.n_individuals(), 2);
}

#[test]
fn truncated_header_is_a_format_error() {
    let err = posetracks::ir::io_dlc_csv::from_dlc_csv_str("scorer,S\nbodyparts,nose\n", None)
        .unwrap_err();
    assert!(matches!(err, PoseError::Format { .. }), "{err:?}");
}
