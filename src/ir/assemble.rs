//! Turns raw reader output into a validated [`PoseDataset`].
//!
//! Readers only have to produce tensors and whatever labels their format
//! stores; defaults for the rest (names, confidence, frame indices) and the
//! frame-rate policy are applied here, in one place.

use ndarray::{Array3, Array4};
use std::path::PathBuf;
use tracing::{debug, warn};

use super::coords::TimeCoords;
use super::metadata::{Metadata, SourceSoftware};
use super::model::PoseDataset;
use crate::error::PoseError;
use crate::validation::{ensure_valid, ValidateOptions};

/// Raw pose data as read from a file, before assembly.
#[derive(Clone, Debug)]
pub struct RawPoses {
    /// Coordinates indexed by (time, individuals, keypoints, space).
    pub position: Array4<f64>,
    /// Scores indexed by (time, individuals, keypoints); `NaN` when absent.
    pub confidence: Option<Array3<f64>>,
    /// Individual names; `individual_{i}` when absent.
    pub individuals: Option<Vec<String>>,
    /// Keypoint names; `keypoint_{i}` when absent.
    pub keypoints: Option<Vec<String>>,
    /// Frame index of each time step; `0..n` when absent.
    pub frame_indices: Option<Vec<i64>>,
    pub source_software: Option<SourceSoftware>,
    pub source_file: Option<PathBuf>,
}

impl RawPoses {
    /// Creates raw data with only a position tensor.
    pub fn new(position: Array4<f64>) -> Self {
        Self {
            position,
            confidence: None,
            individuals: None,
            keypoints: None,
            frame_indices: None,
            source_software: None,
            source_file: None,
        }
    }

    pub fn with_confidence(mut self, confidence: Array3<f64>) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_individuals<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.individuals = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_keypoints<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.keypoints = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_frame_indices(mut self, frames: Vec<i64>) -> Self {
        self.frame_indices = Some(frames);
        self
    }

    pub fn with_source_software(mut self, source: SourceSoftware) -> Self {
        self.source_software = Some(source);
        self
    }

    pub fn with_source_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_file = Some(path.into());
        self
    }
}

/// Default names for an axis: `{prefix}_0`, `{prefix}_1`, ...
pub fn default_names(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{}_{}", prefix, i)).collect()
}

/// Assembles raw pose data into a validated dataset.
///
/// Time coordinates are seconds (`frame / fps`) when `fps` is finite and
/// positive, and frame indices otherwise; an unusable `fps` is dropped with
/// a warning. The chosen unit is recorded in the metadata.
///
/// # Errors
/// Returns a `Shape` error carrying the validation report if the tensors or
/// labels violate the IR invariants.
pub fn assemble(raw: RawPoses, fps: Option<f64>) -> Result<PoseDataset, PoseError> {
    let (n_frames, n_individuals, n_keypoints, _) = raw.position.dim();

    let fps = match fps {
        Some(fps) if fps.is_finite() && fps > 0.0 => Some(fps),
        Some(fps) => {
            warn!(fps, "Ignoring invalid fps; time coordinates will be frame indices");
            None
        }
        None => None,
    };

    let confidence = raw
        .confidence
        .unwrap_or_else(|| Array3::from_elem((n_frames, n_individuals, n_keypoints), f64::NAN));
    let individuals = raw
        .individuals
        .unwrap_or_else(|| default_names("individual", n_individuals));
    let keypoints = raw
        .keypoints
        .unwrap_or_else(|| default_names("keypoint", n_keypoints));
    let frames = raw
        .frame_indices
        .unwrap_or_else(|| (0..n_frames as i64).collect());

    let time = TimeCoords::from_frames(frames, fps);
    let metadata = Metadata {
        fps,
        time_unit: time.unit(),
        source_software: raw.source_software,
        source_file: raw.source_file,
    };

    let dataset = PoseDataset {
        position: raw.position,
        confidence,
        time,
        individuals,
        keypoints,
        metadata,
    };

    ensure_valid(&dataset, &ValidateOptions::default())?;

    debug!(
        frames = dataset.n_frames(),
        individuals = dataset.n_individuals(),
        keypoints = dataset.n_keypoints(),
        space = dataset.n_space(),
        time_unit = %dataset.metadata.time_unit,
        "Assembled pose dataset"
    );

    Ok(dataset)
}
