//! Dataset validation for posetracks.
//!
//! This module checks that a dataset satisfies the IR invariants:
//! - Tensor shapes (confidence matches position, space extent is 2 or 3)
//! - Values (finite, or NaN where missing)
//! - Labels (one unique, non-empty name per individual and keypoint)
//! - Time (one finite, strictly increasing coordinate per time step)
//! - Metadata (positive fps, time unit consistent with the coordinates)
//!
//! Path-level checks performed before files are opened live in [`files`].

pub mod files;
mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::HashMap;

use crate::error::PoseError;
use crate::ir::{PoseDataset, TimeCoords, TimeUnit};

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Validates a dataset and returns a report of all issues found.
pub fn validate_dataset(dataset: &PoseDataset, _opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_shapes(dataset, &mut report);
    validate_values(dataset, &mut report);
    validate_labels(
        "individuals",
        &dataset.individuals,
        dataset.n_individuals(),
        &mut report,
    );
    validate_labels(
        "keypoints",
        &dataset.keypoints,
        dataset.n_keypoints(),
        &mut report,
    );
    validate_time(dataset, &mut report);
    validate_metadata(dataset, &mut report);

    report
}

/// Validates a dataset and converts a failing report into a `Shape` error.
pub fn ensure_valid(dataset: &PoseDataset, opts: &ValidateOptions) -> Result<(), PoseError> {
    let report = validate_dataset(dataset, opts);
    let passed = if opts.strict {
        report.is_clean()
    } else {
        report.is_ok()
    };

    if passed {
        Ok(())
    } else {
        Err(PoseError::shape(report))
    }
}

/// Validates tensor extents.
fn validate_shapes(dataset: &PoseDataset, report: &mut ValidationReport) {
    let space = dataset.n_space();
    if space != 2 && space != 3 {
        report.add(ValidationIssue::error(
            IssueCode::InvalidSpaceExtent,
            format!("space axis has extent {} (expected 2 or 3)", space),
            IssueContext::Dimension { name: "space" },
        ));
    }

    let position = &dataset.position.shape()[..3];
    let confidence = dataset.confidence.shape();
    if position != confidence {
        report.add(ValidationIssue::error(
            IssueCode::ConfidenceShapeMismatch,
            format!(
                "confidence has shape {:?} but position has (time, individuals, keypoints) = {:?}",
                confidence, position
            ),
            IssueContext::Dataset,
        ));
    }
}

/// Rejects infinite positions and confidences. NaN marks a missing value
/// and is allowed.
fn validate_values(dataset: &PoseDataset, report: &mut ValidationReport) {
    let counts = [
        ("position", dataset.position.iter().filter(|v| v.is_infinite()).count()),
        ("confidence", dataset.confidence.iter().filter(|v| v.is_infinite()).count()),
    ];
    for (name, infinite) in counts {
        if infinite > 0 {
            report.add(ValidationIssue::error(
                IssueCode::InfiniteValue,
                format!("{} has {} infinite value(s)", name, infinite),
                IssueContext::Dataset,
            ));
        }
    }
}

/// Validates one label axis (individuals or keypoints).
fn validate_labels(
    dim: &'static str,
    labels: &[String],
    extent: usize,
    report: &mut ValidationReport,
) {
    if labels.len() != extent {
        report.add(ValidationIssue::error(
            IssueCode::LabelCountMismatch,
            format!("{} label(s) for an axis of extent {}", labels.len(), extent),
            IssueContext::Dimension { name: dim },
        ));
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (index, label) in labels.iter().enumerate() {
        if label.is_empty() {
            report.add(ValidationIssue::error(
                IssueCode::EmptyLabel,
                "empty label",
                IssueContext::Label { dim, index },
            ));
            continue;
        }

        if let Some(first) = seen.get(label.as_str()) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateLabel,
                format!("duplicate label '{}' (first seen at index {})", label, first),
                IssueContext::Label { dim, index },
            ));
        } else {
            seen.insert(label, index);
        }
    }
}

/// Validates the time coordinate against the time extent.
fn validate_time(dataset: &PoseDataset, report: &mut ValidationReport) {
    let context = || IssueContext::Dimension { name: "time" };

    if dataset.time.len() != dataset.n_frames() {
        report.add(ValidationIssue::error(
            IssueCode::TimeLengthMismatch,
            format!(
                "{} time coordinate(s) for {} time step(s)",
                dataset.time.len(),
                dataset.n_frames()
            ),
            context(),
        ));
    }

    if dataset.n_frames() == 0 {
        report.add(ValidationIssue::warning(
            IssueCode::EmptyTime,
            "dataset has no time steps",
            context(),
        ));
    }

    let values = dataset.time.values();
    if let Some(index) = values.iter().position(|t| !t.is_finite()) {
        report.add(ValidationIssue::error(
            IssueCode::TimeNotFinite,
            format!("time coordinate {} is not finite", index),
            context(),
        ));
        return;
    }

    if let Some(index) = values.windows(2).position(|w| w[1] <= w[0]) {
        report.add(ValidationIssue::error(
            IssueCode::TimeNotIncreasing,
            format!(
                "time coordinates are not strictly increasing at index {} ({} then {})",
                index + 1,
                values[index],
                values[index + 1]
            ),
            context(),
        ));
    }
}

/// Validates fps and time-unit consistency.
fn validate_metadata(dataset: &PoseDataset, report: &mut ValidationReport) {
    let meta = &dataset.metadata;

    if let Some(fps) = meta.fps {
        if !(fps.is_finite() && fps > 0.0) {
            report.add(ValidationIssue::error(
                IssueCode::InvalidFrameRate,
                format!("fps must be a positive number, got {}", fps),
                IssueContext::Metadata,
            ));
        }
    }

    if meta.time_unit != dataset.time.unit() {
        report.add(ValidationIssue::error(
            IssueCode::TimeUnitMismatch,
            format!(
                "metadata declares time in {} but coordinates are in {}",
                meta.time_unit,
                dataset.time.unit()
            ),
            IssueContext::Metadata,
        ));
    }

    match (&dataset.time, meta.fps) {
        (TimeCoords::Seconds(_), None) => report.add(ValidationIssue::error(
            IssueCode::TimeUnitMismatch,
            "time is in seconds but no frame rate is set",
            IssueContext::Metadata,
        )),
        (TimeCoords::Frames(_), Some(_)) if meta.time_unit == TimeUnit::Frames => {
            report.add(ValidationIssue::error(
                IssueCode::TimeUnitMismatch,
                "a frame rate is set but time is still in frames",
                IssueContext::Metadata,
            ))
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Metadata;
    use ndarray::{Array3, Array4};

    fn valid_dataset() -> PoseDataset {
        PoseDataset {
            position: Array4::zeros((4, 2, 3, 2)),
            confidence: Array3::from_elem((4, 2, 3), 0.9),
            time: TimeCoords::Frames(vec![0, 1, 2, 3]),
            individuals: vec!["a".into(), "b".into()],
            keypoints: vec!["snout".into(), "left_ear".into(), "right_ear".into()],
            metadata: Metadata::default(),
        }
    }

    #[test]
    fn valid_dataset_is_clean() {
        let report = validate_dataset(&valid_dataset(), &ValidateOptions::default());
        assert!(report.is_clean(), "{}", report);
    }

    #[test]
    fn rejects_bad_space_extent() {
        let mut ds = valid_dataset();
        ds.position = Array4::zeros((4, 2, 3, 4));
        let report = validate_dataset(&ds, &ValidateOptions::default());
        assert!(report.has(IssueCode::InvalidSpaceExtent));
    }

    #[test]
    fn rejects_confidence_mismatch() {
        let mut ds = valid_dataset();
        ds.confidence = Array3::zeros((4, 1, 3));
        let report = validate_dataset(&ds, &ValidateOptions::default());
        assert!(report.has(IssueCode::ConfidenceShapeMismatch));
    }

    #[test]
    fn rejects_infinite_values_but_not_nan() {
        let mut ds = valid_dataset();
        ds.position[[1, 0, 2, 1]] = f64::NAN;
        ds.confidence[[1, 0, 2]] = f64::NAN;
        let report = validate_dataset(&ds, &ValidateOptions::default());
        assert!(report.is_clean(), "{}", report);

        ds.position[[2, 1, 0, 0]] = f64::NEG_INFINITY;
        ds.confidence[[3, 1, 1]] = f64::INFINITY;
        let report = validate_dataset(&ds, &ValidateOptions::default());
        assert!(report.has(IssueCode::InfiniteValue));
        assert!(!report.is_ok());
    }

    #[test]
    fn rejects_duplicate_and_missing_labels() {
        let mut ds = valid_dataset();
        ds.keypoints = vec!["snout".into(), "snout".into(), "".into()];
        ds.individuals = vec!["a".into()];
        let report = validate_dataset(&ds, &ValidateOptions::default());
        assert!(report.has(IssueCode::DuplicateLabel));
        assert!(report.has(IssueCode::EmptyLabel));
        assert!(report.has(IssueCode::LabelCountMismatch));
    }

    #[test]
    fn rejects_unordered_time() {
        let mut ds = valid_dataset();
        ds.time = TimeCoords::Frames(vec![0, 2, 1, 3]);
        let report = validate_dataset(&ds, &ValidateOptions::default());
        assert!(report.has(IssueCode::TimeNotIncreasing));
    }

    #[test]
    fn rejects_seconds_without_fps() {
        let mut ds = valid_dataset();
        ds.time = TimeCoords::Seconds(vec![0.0, 0.1, 0.2, 0.3]);
        ds.metadata.time_unit = TimeUnit::Seconds;
        let report = validate_dataset(&ds, &ValidateOptions::default());
        assert!(report.has(IssueCode::TimeUnitMismatch));

        ds.metadata.fps = Some(10.0);
        let report = validate_dataset(&ds, &ValidateOptions::default());
        assert!(report.is_clean(), "{}", report);
    }

    #[test]
    fn rejects_non_positive_fps() {
        let mut ds = valid_dataset();
        ds.metadata.fps = Some(-5.0);
        let report = validate_dataset(&ds, &ValidateOptions::default());
        assert!(report.has(IssueCode::InvalidFrameRate));
    }

    #[test]
    fn strict_mode_fails_on_warnings() {
        let mut ds = valid_dataset();
        ds.position = Array4::zeros((0, 2, 3, 2));
        ds.confidence = Array3::zeros((0, 2, 3));
        ds.time = TimeCoords::Frames(vec![]);

        assert!(ensure_valid(&ds, &ValidateOptions::default()).is_ok());
        let err = ensure_valid(&ds, &ValidateOptions { strict: true }).unwrap_err();
        assert!(matches!(err, PoseError::Shape { .. }));
    }
}
