//! SLEAP analysis HDF5 format reader and writer.
//!
//! # SLEAP Analysis Format Reference
//!
//! `sleap-convert --format analysis` writes one HDF5 file per video with
//! datasets stored track-major:
//!
//! - `tracks`: (n_tracks, 2, n_nodes, n_frames) coordinates, `NaN` when missing
//! - `point_scores`: (n_tracks, n_nodes, n_frames) per-point scores
//! - `track_occupancy`: (n_frames, n_tracks) whether a track has an instance
//! - `track_names`, `node_names`: byte or UTF-8 strings
//! - `labels_path`, `video_path`: scalar strings naming the sources
//!
//! Frames are the video frames `0..n_frames`. A track that is not occupied
//! in a frame is "not tracked": its positions and scores are `NaN`.
//!
//! # Format Limitations
//!
//! SLEAP analysis files cannot represent:
//! - 3-D poses (writing one is an `UnsupportedShape` error)
//! - Frame rate, time in seconds or a DeepLabCut scorer
//! - Gaps between frames: the written file covers every frame from the
//!   dataset's first to its last, with unoccupied tracks in between, and
//!   starts at frame 0

use std::fs;
use std::path::{Path, PathBuf};

use hdf5::File;
use ndarray::{Array2, Array3, Array4, Ix2, Ix3, Ix4};
use tracing::{debug, info, warn};

use super::h5_util::{
    h5_err, has_member, read_f64, read_string_scalar, read_strings, write_string_scalar,
    write_strings,
};
use super::coords::{dense_frame_span, MAX_DENSE_FRAMES};
use super::metadata::SourceSoftware;
use super::model::PoseDataset;
use super::options::WriteOptions;
use super::{assemble, RawPoses};
use crate::error::PoseError;
use crate::validation::files::{check_file, Access};
use crate::validation::{ensure_valid, ValidateOptions};

const FORMAT: &str = "SLEAP analysis HDF5";

/// Suffixes accepted for SLEAP analysis files.
pub const SLEAP_ANALYSIS_SUFFIXES: &[&str] = &[".h5", ".hdf5"];

// ============================================================================
// SLEAP Schema Type (internal to this module)
// ============================================================================

/// The datasets of an analysis file, in file (track-major) layout.
struct SleapAnalysis {
    tracks: Array4<f64>,
    point_scores: Option<Array3<f64>>,
    track_occupancy: Option<Array2<bool>>,
    track_names: Vec<String>,
    node_names: Vec<String>,
    labels_path: Option<String>,
    video_path: Option<String>,
}

// ============================================================================
// Public API
// ============================================================================

/// Reads a dataset from a SLEAP analysis HDF5 file.
///
/// # Errors
/// Returns an error if the path is not a readable `.h5` file, a required
/// dataset is missing, or the dataset extents disagree.
pub fn read_sleap_analysis(path: &Path, fps: Option<f64>) -> Result<PoseDataset, PoseError> {
    check_file(path, Access::Read, SLEAP_ANALYSIS_SUFFIXES)?;

    let file = File::open(path).map_err(h5_err(path))?;
    let analysis = read_analysis(&file, path)?;
    let raw = analysis_to_raw(analysis, path)?.with_source_file(path);
    let dataset = assemble(raw, fps)?;

    info!(
        path = %path.display(),
        frames = dataset.n_frames(),
        individuals = dataset.n_individuals(),
        keypoints = dataset.n_keypoints(),
        "Loaded pose tracks from SLEAP analysis file"
    );
    Ok(dataset)
}

/// Writes a dataset to a SLEAP analysis HDF5 file.
///
/// # Errors
/// Returns `UnsupportedShape` for 3-D data, plus the usual path, validation
/// and HDF5 errors. A file left incomplete by a failed write is removed.
pub fn write_sleap_analysis(
    path: &Path,
    dataset: &PoseDataset,
    opts: &WriteOptions,
) -> Result<PathBuf, PoseError> {
    ensure_valid(dataset, &ValidateOptions::default())?;
    if dataset.n_space() != 2 {
        return Err(PoseError::UnsupportedShape {
            format: FORMAT,
            message: format!(
                "SLEAP analysis files hold 2-D poses but the dataset has {} spatial dimensions",
                dataset.n_space()
            ),
        });
    }
    check_file(
        path,
        Access::Write {
            overwrite: opts.overwrite,
        },
        SLEAP_ANALYSIS_SUFFIXES,
    )?;

    let analysis = dataset_to_analysis(dataset)?;

    let result = File::create(path)
        .map_err(h5_err(path))
        .and_then(|file| write_analysis(&file, &analysis, path));
    if let Err(e) = result {
        if path.exists() {
            if let Err(remove_err) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %remove_err, "Could not remove incomplete file");
            }
        }
        return Err(e);
    }

    info!(
        path = %path.display(),
        frames = analysis.tracks.dim().3,
        tracks = analysis.track_names.len(),
        "Wrote SLEAP analysis file"
    );
    Ok(path.to_path_buf())
}

// ============================================================================
// Reading
// ============================================================================

fn read_analysis(file: &File, path: &Path) -> Result<SleapAnalysis, PoseError> {
    let err = |message: String| PoseError::format(path, FORMAT, message);

    for required in ["tracks", "node_names"] {
        if !has_member(file, required) {
            return Err(err(format!("missing required dataset '{}'", required)));
        }
    }

    let tracks = read_f64(file, "tracks", path)?
        .into_dimensionality::<Ix4>()
        .map_err(|_| err("'tracks' must be 4-D (tracks, 2, nodes, frames)".to_string()))?;
    let (n_tracks, _, _, n_frames) = tracks.dim();

    let point_scores = if has_member(file, "point_scores") {
        let scores = read_f64(file, "point_scores", path)?
            .into_dimensionality::<Ix3>()
            .map_err(|_| err("'point_scores' must be 3-D (tracks, nodes, frames)".to_string()))?;
        Some(scores)
    } else {
        None
    };

    let track_occupancy = if has_member(file, "track_occupancy") {
        let occupancy = read_f64(file, "track_occupancy", path)?
            .into_dimensionality::<Ix2>()
            .map_err(|_| err("'track_occupancy' must be 2-D".to_string()))?;
        let occupancy = match occupancy.dim() {
            (f, t) if f == n_frames && t == n_tracks => occupancy,
            (t, f) if f == n_frames && t == n_tracks => occupancy.reversed_axes(),
            other => {
                return Err(err(format!(
                    "'track_occupancy' has shape {:?} for {} frame(s) and {} track(s)",
                    other, n_frames, n_tracks
                )))
            }
        };
        Some(occupancy.mapv(|v| v != 0.0))
    } else {
        None
    };

    let track_names = if has_member(file, "track_names") {
        read_strings(file, "track_names", path)?
    } else {
        Vec::new()
    };

    Ok(SleapAnalysis {
        tracks,
        point_scores,
        track_occupancy,
        track_names,
        node_names: read_strings(file, "node_names", path)?,
        labels_path: read_string_scalar(file, "labels_path"),
        video_path: read_string_scalar(file, "video_path"),
    })
}

fn analysis_to_raw(analysis: SleapAnalysis, path: &Path) -> Result<RawPoses, PoseError> {
    let err = |message: String| PoseError::format(path, FORMAT, message);

    let (n_tracks, n_xy, n_nodes, n_frames) = analysis.tracks.dim();
    if n_xy != 2 {
        return Err(err(format!(
            "'tracks' has {} coordinate(s) per point, expected 2",
            n_xy
        )));
    }
    if analysis.node_names.len() != n_nodes {
        return Err(err(format!(
            "{} node name(s) for {} node(s) in 'tracks'",
            analysis.node_names.len(),
            n_nodes
        )));
    }
    if !analysis.track_names.is_empty() && analysis.track_names.len() != n_tracks {
        return Err(err(format!(
            "{} track name(s) for {} track(s) in 'tracks'",
            analysis.track_names.len(),
            n_tracks
        )));
    }

    // (tracks, space, nodes, frames) -> (frames, tracks, nodes, space)
    let mut position = analysis
        .tracks
        .permuted_axes([3, 0, 2, 1])
        .as_standard_layout()
        .into_owned();

    let mut confidence = match analysis.point_scores {
        Some(scores) => {
            if scores.dim() != (n_tracks, n_nodes, n_frames) {
                return Err(err(format!(
                    "'point_scores' has shape {:?} but 'tracks' implies {:?}",
                    scores.dim(),
                    (n_tracks, n_nodes, n_frames)
                )));
            }
            scores.permuted_axes([2, 0, 1]).as_standard_layout().into_owned()
        }
        None => Array3::from_elem((n_frames, n_tracks, n_nodes), f64::NAN),
    };

    if let Some(occupancy) = &analysis.track_occupancy {
        let mut cleared = 0usize;
        for ((t, i), occupied) in occupancy.indexed_iter() {
            if !occupied {
                position
                    .slice_mut(ndarray::s![t, i, .., ..])
                    .fill(f64::NAN);
                confidence.slice_mut(ndarray::s![t, i, ..]).fill(f64::NAN);
                cleared += 1;
            }
        }
        debug!(cleared, "Cleared unoccupied track frames");
    }

    let mut raw = RawPoses::new(position)
        .with_confidence(confidence)
        .with_keypoints(analysis.node_names)
        .with_source_software(SourceSoftware::Sleap {
            labels_path: analysis.labels_path,
            video_path: analysis.video_path,
        });
    if !analysis.track_names.is_empty() {
        raw = raw.with_individuals(analysis.track_names);
    }
    Ok(raw)
}

// ============================================================================
// Writing
// ============================================================================

fn dataset_to_analysis(dataset: &PoseDataset) -> Result<SleapAnalysis, PoseError> {
    let frames = dataset.frame_indices()?;
    let first = frames.first().copied().unwrap_or(0);
    let n_out = dense_frame_span(&frames)
        .filter(|&span| span <= MAX_DENSE_FRAMES)
        .ok_or_else(|| PoseError::UnsupportedShape {
            format: FORMAT,
            message: format!(
                "frames {} to {} cannot be filled into one analysis file (at most {} frames)",
                first,
                frames.last().copied().unwrap_or(first),
                MAX_DENSE_FRAMES
            ),
        })?;

    let n_tracks = dataset.n_individuals();
    let n_nodes = dataset.n_keypoints();

    let mut tracks = Array4::<f64>::from_elem((n_tracks, 2, n_nodes, n_out), f64::NAN);
    let mut scores = Array3::<f64>::from_elem((n_tracks, n_nodes, n_out), f64::NAN);
    let mut occupancy = Array2::<bool>::from_elem((n_out, n_tracks), false);

    for (t, frame) in frames.iter().enumerate() {
        let slot = (frame - first) as usize;
        for i in 0..n_tracks {
            for k in 0..n_nodes {
                for s in 0..2 {
                    let value = dataset.position[[t, i, k, s]];
                    tracks[[i, s, k, slot]] = value;
                    if !value.is_nan() {
                        occupancy[[slot, i]] = true;
                    }
                }
                scores[[i, k, slot]] = dataset.confidence[[t, i, k]];
            }
        }
    }

    let (labels_path, video_path) = match &dataset.metadata.source_software {
        Some(SourceSoftware::Sleap {
            labels_path,
            video_path,
        }) => (labels_path.clone(), video_path.clone()),
        _ => (None, None),
    };

    Ok(SleapAnalysis {
        tracks,
        point_scores: Some(scores),
        track_occupancy: Some(occupancy),
        track_names: dataset.individuals.clone(),
        node_names: dataset.keypoints.clone(),
        labels_path,
        video_path,
    })
}

fn write_analysis(file: &File, analysis: &SleapAnalysis, path: &Path) -> Result<(), PoseError> {
    let to_err = h5_err(path);
    let (n_tracks, _, _, n_frames) = analysis.tracks.dim();

    file.new_dataset_builder()
        .with_data(&analysis.tracks)
        .create("tracks")
        .map_err(&to_err)?;

    if let Some(scores) = &analysis.point_scores {
        file.new_dataset_builder()
            .with_data(scores)
            .create("point_scores")
            .map_err(&to_err)?;
    }

    if let Some(occupancy) = &analysis.track_occupancy {
        let occupancy = occupancy.mapv(u8::from);
        file.new_dataset_builder()
            .with_data(&occupancy)
            .create("track_occupancy")
            .map_err(&to_err)?;
    }

    // Per-instance scores are not part of the pose model.
    let unscored = Array2::<f64>::from_elem((n_tracks, n_frames), f64::NAN);
    for name in ["instance_scores", "tracking_scores"] {
        file.new_dataset_builder()
            .with_data(&unscored)
            .create(name)
            .map_err(&to_err)?;
    }

    write_strings(file, "track_names", &analysis.track_names, path)?;
    write_strings(file, "node_names", &analysis.node_names, path)?;
    write_string_scalar(
        file,
        "labels_path",
        analysis.labels_path.as_deref().unwrap_or(""),
        path,
    )?;
    write_string_scalar(
        file,
        "video_path",
        analysis.video_path.as_deref().unwrap_or(""),
        path,
    )?;
    write_string_scalar(file, "provenance", "{}", path)?;
    file.new_dataset_builder()
        .with_data(&ndarray::arr0(0i64))
        .create("video_ind")
        .map_err(&to_err)?;

    Ok(())
}
