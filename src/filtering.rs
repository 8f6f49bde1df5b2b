//! Confidence-based filtering of pose tracks.
//!
//! Low-confidence predictions are usually noise. [`filter_by_confidence`]
//! turns their positions into `NaN` so downstream code treats them as
//! missing; confidence values themselves are never changed.

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::error::PoseError;
use crate::ir::PoseDataset;
use crate::validation::{ensure_valid, ValidateOptions};

/// Threshold used when callers have no better value.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// What a filtering pass changed.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FilterReport {
    pub threshold: f64,
    /// Number of (time, individual, keypoint) points in the dataset.
    pub total_points: usize,
    /// Points that were already entirely missing before filtering.
    pub missing_before: usize,
    /// Points whose position was cleared by this pass.
    pub filtered_points: usize,
}

impl FilterReport {
    /// Share of all points that are missing after filtering.
    pub fn missing_fraction_after(&self) -> f64 {
        if self.total_points == 0 {
            0.0
        } else {
            (self.missing_before + self.filtered_points) as f64 / self.total_points as f64
        }
    }
}

impl fmt::Display for FilterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Confidence filter (threshold {})", self.threshold)?;
        writeln!(f, "  points:          {}", self.total_points)?;
        writeln!(f, "  missing before:  {}", self.missing_before)?;
        writeln!(f, "  filtered:        {}", self.filtered_points)?;
        write!(
            f,
            "  missing after:   {:.1}%",
            self.missing_fraction_after() * 100.0
        )
    }
}

/// Sets positions to `NaN` wherever confidence is below `threshold` or
/// missing, returning the filtered copy and a report.
///
/// # Errors
/// Returns `InvalidThreshold` if `threshold` is `NaN`, and `Shape` if the
/// dataset is invalid.
pub fn filter_by_confidence(
    dataset: &PoseDataset,
    threshold: f64,
) -> Result<(PoseDataset, FilterReport), PoseError> {
    if threshold.is_nan() {
        return Err(PoseError::InvalidThreshold { threshold });
    }
    ensure_valid(dataset, &ValidateOptions::default())?;

    let mut filtered = dataset.clone();
    let mut report = FilterReport {
        threshold,
        total_points: dataset.confidence.len(),
        missing_before: dataset.missing_point_count(),
        filtered_points: 0,
    };

    for ((t, i, k), &confidence) in dataset.confidence.indexed_iter() {
        if confidence.is_nan() || confidence < threshold {
            let mut point = filtered.position.slice_mut(ndarray::s![t, i, k, ..]);
            if point.iter().any(|v| !v.is_nan()) {
                report.filtered_points += 1;
            }
            point.fill(f64::NAN);
        }
    }

    info!(
        threshold,
        filtered = report.filtered_points,
        total = report.total_points,
        "Filtered low-confidence points"
    );
    Ok((filtered, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Metadata, TimeCoords};
    use ndarray::{Array3, Array4};

    fn dataset() -> PoseDataset {
        let mut confidence = Array3::from_elem((2, 1, 3), 0.9);
        confidence[[0, 0, 1]] = 0.2;
        confidence[[1, 0, 2]] = f64::NAN;
        let mut position = Array4::ones((2, 1, 3, 2));
        position[[1, 0, 0, 0]] = f64::NAN;
        position[[1, 0, 0, 1]] = f64::NAN;
        confidence[[1, 0, 0]] = 0.1;

        PoseDataset {
            position,
            confidence,
            time: TimeCoords::Frames(vec![0, 1]),
            individuals: vec!["individual_0".into()],
            keypoints: vec!["a".into(), "b".into(), "c".into()],
            metadata: Metadata::default(),
        }
    }

    #[test]
    fn masks_low_and_missing_confidence() {
        let ds = dataset();
        let (filtered, report) = filter_by_confidence(&ds, 0.6).expect("filter");

        assert!(filtered.point(0, 0, 1).iter().all(|v| v.is_nan()));
        assert!(filtered.point(1, 0, 2).iter().all(|v| v.is_nan()));
        assert_eq!(filtered.position[[0, 0, 0, 0]], 1.0);

        assert_eq!(report.total_points, 6);
        assert_eq!(report.missing_before, 1);
        // (1, 0, 0) was already missing, so it is not counted again.
        assert_eq!(report.filtered_points, 2);
    }

    #[test]
    fn confidence_is_unchanged() {
        let ds = dataset();
        let (filtered, _) = filter_by_confidence(&ds, 0.95).expect("filter");
        for (a, b) in ds.confidence.iter().zip(filtered.confidence.iter()) {
            assert!((a.is_nan() && b.is_nan()) || a == b);
        }
    }

    #[test]
    fn nan_threshold_is_rejected() {
        assert!(matches!(
            filter_by_confidence(&dataset(), f64::NAN),
            Err(PoseError::InvalidThreshold { .. })
        ));
    }
}
