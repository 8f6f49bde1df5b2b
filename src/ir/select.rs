//! Label- and index-based selection along individuals, keypoints and time.
//!
//! Selections return a new dataset and never reorder: whatever order the
//! caller lists labels or indices in, the result keeps the dataset's own
//! axis order, and duplicates are selected once.

use ndarray::Axis;
use tracing::{debug, warn};

use super::model::PoseDataset;
use crate::error::PoseError;
use crate::validation::{ensure_valid, ValidateOptions};

/// An inclusive range of time coordinate values, in the dataset's own unit
/// (frame indices or seconds). Open ends are `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeRange {
    pub start: Option<f64>,
    pub stop: Option<f64>,
}

impl TimeRange {
    /// `start <= t <= stop`.
    pub fn between(start: f64, stop: f64) -> Self {
        Self {
            start: Some(start),
            stop: Some(stop),
        }
    }

    /// `t >= start`.
    pub fn from(start: f64) -> Self {
        Self {
            start: Some(start),
            stop: None,
        }
    }

    /// `t <= stop`.
    pub fn until(stop: f64) -> Self {
        Self {
            start: None,
            stop: Some(stop),
        }
    }

    fn contains(&self, t: f64) -> bool {
        self.start.map_or(true, |start| t >= start) && self.stop.map_or(true, |stop| t <= stop)
    }
}

/// Selection by label. `None` keeps the whole axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    pub individuals: Option<Vec<String>>,
    pub keypoints: Option<Vec<String>>,
    pub time: Option<TimeRange>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn individuals<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.individuals = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn keypoints<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.keypoints = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn time(mut self, range: TimeRange) -> Self {
        self.time = Some(range);
        self
    }
}

/// Selection by position along each axis. `None` keeps the whole axis.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexSelection {
    pub time: Option<Vec<usize>>,
    pub individuals: Option<Vec<usize>>,
    pub keypoints: Option<Vec<usize>>,
}

impl PoseDataset {
    /// Selects by individual and keypoint names and a time range.
    ///
    /// # Errors
    /// Returns `UnknownLabel` for a name the dataset does not have, and
    /// `InvalidSelection` for a time range with a `NaN` bound or
    /// `start > stop`.
    pub fn sel(&self, selection: &Selection) -> Result<PoseDataset, PoseError> {
        let individuals = selection
            .individuals
            .as_ref()
            .map(|names| resolve_labels("individuals", names, &self.individuals))
            .transpose()?;
        let keypoints = selection
            .keypoints
            .as_ref()
            .map(|names| resolve_labels("keypoints", names, &self.keypoints))
            .transpose()?;
        let time = selection
            .time
            .map(|range| self.time_indices(&range))
            .transpose()?;

        self.isel(&IndexSelection {
            time,
            individuals,
            keypoints,
        })
    }

    /// Selects by position along each axis.
    ///
    /// # Errors
    /// Returns `Shape` if the dataset itself is invalid (for example its
    /// confidence and position extents disagree), and `InvalidSelection` for
    /// an index past the end of its axis.
    pub fn isel(&self, selection: &IndexSelection) -> Result<PoseDataset, PoseError> {
        ensure_valid(self, &ValidateOptions::default())?;

        let time = normalize("time", selection.time.as_deref(), self.n_frames())?;
        let individuals = normalize(
            "individuals",
            selection.individuals.as_deref(),
            self.n_individuals(),
        )?;
        let keypoints = normalize(
            "keypoints",
            selection.keypoints.as_deref(),
            self.n_keypoints(),
        )?;

        let position = self
            .position
            .select(Axis(0), &time)
            .select(Axis(1), &individuals)
            .select(Axis(2), &keypoints);
        let confidence = self
            .confidence
            .select(Axis(0), &time)
            .select(Axis(1), &individuals)
            .select(Axis(2), &keypoints);

        let dataset = PoseDataset {
            position,
            confidence,
            time: self.time.select(&time),
            individuals: individuals.iter().map(|&i| self.individuals[i].clone()).collect(),
            keypoints: keypoints.iter().map(|&k| self.keypoints[k].clone()).collect(),
            metadata: self.metadata.clone(),
        };

        if dataset.position.is_empty() {
            warn!(
                frames = dataset.n_frames(),
                individuals = dataset.n_individuals(),
                keypoints = dataset.n_keypoints(),
                "Selection is empty"
            );
        } else {
            debug!(
                frames = dataset.n_frames(),
                individuals = dataset.n_individuals(),
                keypoints = dataset.n_keypoints(),
                "Selected sub-dataset"
            );
        }
        Ok(dataset)
    }

    fn time_indices(&self, range: &TimeRange) -> Result<Vec<usize>, PoseError> {
        if range.start.is_some_and(f64::is_nan) || range.stop.is_some_and(f64::is_nan) {
            return Err(PoseError::InvalidSelection {
                message: "time range bounds must not be NaN".to_string(),
            });
        }
        if let (Some(start), Some(stop)) = (range.start, range.stop) {
            if start > stop {
                return Err(PoseError::InvalidSelection {
                    message: format!("time range start {} is after stop {}", start, stop),
                });
            }
        }

        Ok(self
            .time
            .values()
            .iter()
            .enumerate()
            .filter(|(_, t)| range.contains(**t))
            .map(|(i, _)| i)
            .collect())
    }
}

fn resolve_labels(
    dim: &'static str,
    names: &[String],
    labels: &[String],
) -> Result<Vec<usize>, PoseError> {
    names
        .iter()
        .map(|name| {
            labels
                .iter()
                .position(|l| l == name)
                .ok_or_else(|| PoseError::UnknownLabel {
                    dim,
                    label: name.clone(),
                })
        })
        .collect()
}

/// Sorted, deduplicated and bounds-checked indices; all of them for `None`.
fn normalize(dim: &str, indices: Option<&[usize]>, extent: usize) -> Result<Vec<usize>, PoseError> {
    let Some(indices) = indices else {
        return Ok((0..extent).collect());
    };

    if let Some(bad) = indices.iter().find(|&&i| i >= extent) {
        return Err(PoseError::InvalidSelection {
            message: format!("{} index {} is out of range (extent {})", dim, bad, extent),
        });
    }

    let mut indices = indices.to_vec();
    indices.sort_unstable();
    indices.dedup();
    Ok(indices)
}
