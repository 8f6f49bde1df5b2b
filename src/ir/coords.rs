//! Coordinate labels for the time and space dimensions.
//!
//! Individuals and keypoints are labelled with plain ordered `Vec<String>`s on
//! the dataset itself; this module covers the two dimensions whose labels
//! carry structure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Space labels for 2D data.
pub const SPACE_2D: [&str; 2] = ["x", "y"];

/// Space labels for 3D data.
pub const SPACE_3D: [&str; 3] = ["x", "y", "z"];

/// Returns the space-axis labels for the given extent, if it is supported.
pub fn space_labels(extent: usize) -> Option<&'static [&'static str]> {
    match extent {
        2 => Some(&SPACE_2D),
        3 => Some(&SPACE_3D),
        _ => None,
    }
}

/// Largest number of frames a gap-filled time axis may span.
pub const MAX_DENSE_FRAMES: usize = 10_000_000;

/// Number of frames from the first to the last of `frames`, inclusive.
///
/// Returns `Some(0)` for no frames and `None` when the span does not fit
/// in a `usize`. Frames are expected in increasing order.
pub fn dense_frame_span(frames: &[i64]) -> Option<usize> {
    let (Some(&first), Some(&last)) = (frames.first(), frames.last()) else {
        return Some(0);
    };
    let span = last.checked_sub(first)?.checked_add(1)?;
    usize::try_from(span).ok()
}

/// Unit of the time coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Frames,
    Seconds,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Frames => write!(f, "frames"),
            TimeUnit::Seconds => write!(f, "seconds"),
        }
    }
}

/// Values of the time coordinate: frame indices or elapsed seconds, never both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "values", rename_all = "lowercase")]
pub enum TimeCoords {
    Frames(Vec<i64>),
    Seconds(Vec<f64>),
}

impl Default for TimeCoords {
    fn default() -> Self {
        TimeCoords::Frames(Vec::new())
    }
}

impl TimeCoords {
    /// Builds time coordinates from frame indices.
    ///
    /// With a frame rate the coordinates are seconds (`frame / fps`),
    /// otherwise they are the frame indices themselves. The caller is
    /// responsible for passing only a finite, positive `fps`.
    pub fn from_frames(frames: Vec<i64>, fps: Option<f64>) -> Self {
        match fps {
            Some(fps) => TimeCoords::Seconds(frames.iter().map(|&f| f as f64 / fps).collect()),
            None => TimeCoords::Frames(frames),
        }
    }

    /// The unit these coordinates are expressed in.
    pub fn unit(&self) -> TimeUnit {
        match self {
            TimeCoords::Frames(_) => TimeUnit::Frames,
            TimeCoords::Seconds(_) => TimeUnit::Seconds,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TimeCoords::Frames(v) => v.len(),
            TimeCoords::Seconds(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinate value at position `i`, as a float in the native unit.
    pub fn value(&self, i: usize) -> Option<f64> {
        match self {
            TimeCoords::Frames(v) => v.get(i).map(|&f| f as f64),
            TimeCoords::Seconds(v) => v.get(i).copied(),
        }
    }

    /// All coordinate values as floats in the native unit.
    pub fn values(&self) -> Vec<f64> {
        match self {
            TimeCoords::Frames(v) => v.iter().map(|&f| f as f64).collect(),
            TimeCoords::Seconds(v) => v.clone(),
        }
    }

    /// Converts back to frame indices.
    ///
    /// Seconds are multiplied by `fps` and rounded to the nearest frame;
    /// returns `None` for seconds without a frame rate.
    pub fn frame_indices(&self, fps: Option<f64>) -> Option<Vec<i64>> {
        match self {
            TimeCoords::Frames(v) => Some(v.clone()),
            TimeCoords::Seconds(v) => {
                let fps = fps?;
                Some(v.iter().map(|&t| (t * fps).round() as i64).collect())
            }
        }
    }

    /// Keeps only the given positions, in the given order.
    pub fn select(&self, indices: &[usize]) -> Self {
        match self {
            TimeCoords::Frames(v) => TimeCoords::Frames(indices.iter().map(|&i| v[i]).collect()),
            TimeCoords::Seconds(v) => {
                TimeCoords::Seconds(indices.iter().map(|&i| v[i]).collect())
            }
        }
    }
}
