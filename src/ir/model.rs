//! Core dataset model for the posetracks intermediate representation.
//!
//! This module defines the normalized, vendor-agnostic representation of
//! pose tracks. All format-specific readers convert to this IR, and all
//! writers convert from it.

use ndarray::{Array3, Array4, ArrayView1};
use std::fmt;

use super::coords::{space_labels, TimeCoords};
use super::metadata::Metadata;
use crate::error::PoseError;
use crate::validation::{IssueCode, IssueContext, ValidationIssue, ValidationReport};

/// Pose tracks for one recording in the posetracks IR format.
///
/// This is the central data structure that all format conversions work
/// through. Fields are public and construction is permissive: a dataset can
/// hold inconsistent shapes or labels, and [`crate::validation`] reports
/// them instead of anything panicking.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseDataset {
    /// Keypoint coordinates indexed by (time, individuals, keypoints, space).
    /// Missing values are `NaN`.
    pub position: Array4<f64>,

    /// Confidence scores indexed by (time, individuals, keypoints).
    /// Missing or unavailable scores are `NaN`.
    pub confidence: Array3<f64>,

    /// Time coordinate labels (frame indices or seconds).
    pub time: TimeCoords,

    /// Names of the tracked individuals, in axis order.
    pub individuals: Vec<String>,

    /// Names of the keypoints, in axis order.
    pub keypoints: Vec<String>,

    /// Provenance and time metadata.
    pub metadata: Metadata,
}

impl PoseDataset {
    pub fn n_frames(&self) -> usize {
        self.position.shape()[0]
    }

    pub fn n_individuals(&self) -> usize {
        self.position.shape()[1]
    }

    pub fn n_keypoints(&self) -> usize {
        self.position.shape()[2]
    }

    pub fn n_space(&self) -> usize {
        self.position.shape()[3]
    }

    /// Labels of the space axis (`x, y` or `x, y, z`).
    ///
    /// Returns an empty slice for an unsupported extent; validation reports
    /// that case.
    pub fn space_labels(&self) -> &'static [&'static str] {
        space_labels(self.n_space()).unwrap_or(&[])
    }

    /// Position of an individual by name.
    pub fn individual_index(&self, name: &str) -> Option<usize> {
        self.individuals.iter().position(|n| n == name)
    }

    /// Position of a keypoint by name.
    pub fn keypoint_index(&self, name: &str) -> Option<usize> {
        self.keypoints.iter().position(|n| n == name)
    }

    /// Frame index of every time step.
    ///
    /// # Errors
    /// Fails with a `Shape` error if the time axis is in seconds but the
    /// metadata carries no frame rate.
    pub fn frame_indices(&self) -> Result<Vec<i64>, PoseError> {
        self.time
            .frame_indices(self.metadata.fps)
            .ok_or_else(|| {
                let mut report = ValidationReport::new();
                report.add(ValidationIssue::error(
                    IssueCode::TimeUnitMismatch,
                    "time is in seconds but no frame rate is set",
                    IssueContext::Metadata,
                ));
                PoseError::shape(report)
            })
    }

    /// Coordinates of one keypoint of one individual at one time step.
    pub fn point(&self, time: usize, individual: usize, keypoint: usize) -> ArrayView1<'_, f64> {
        self.position
            .slice(ndarray::s![time, individual, keypoint, ..])
    }

    /// Number of (time, individual, keypoint) points whose position is
    /// entirely missing.
    pub fn missing_point_count(&self) -> usize {
        self.position
            .lanes(ndarray::Axis(3))
            .into_iter()
            .filter(|lane| lane.iter().all(|v| v.is_nan()))
            .count()
    }
}

impl fmt::Display for PoseDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<PoseDataset>")?;
        writeln!(
            f,
            "Dimensions: (time: {}, individuals: {}, keypoints: {}, space: {})",
            self.n_frames(),
            self.n_individuals(),
            self.n_keypoints(),
            self.n_space()
        )?;
        writeln!(f, "Coordinates:")?;
        let time = self.time.values();
        match (time.first(), time.last()) {
            (Some(first), Some(last)) => writeln!(
                f,
                "  time         ({}) {} .. {}",
                self.time.unit(),
                first,
                last
            )?,
            _ => writeln!(f, "  time         ({}) <empty>", self.time.unit())?,
        }
        writeln!(f, "  individuals  {}", self.individuals.join(", "))?;
        writeln!(f, "  keypoints    {}", self.keypoints.join(", "))?;
        writeln!(f, "  space        {}", self.space_labels().join(", "))?;
        writeln!(f, "Attributes:")?;
        if let Some(fps) = self.metadata.fps {
            writeln!(f, "  fps:             {}", fps)?;
        }
        writeln!(f, "  time_unit:       {}", self.metadata.time_unit)?;
        if let Some(source) = &self.metadata.source_software {
            writeln!(f, "  source_software: {}", source)?;
        }
        if let Some(path) = &self.metadata.source_file {
            writeln!(f, "  source_file:     {}", path.display())?;
        }
        Ok(())
    }
}
