//! JSON serialization for the posetracks IR format.
//!
//! This provides a lossless on-disk form of a [`PoseDataset`], useful for:
//! - Debugging conversions by inspecting the intermediate representation
//! - Fixtures and exchange between tools that do not link HDF5
//!
//! Tensors are stored flattened in row-major order next to their shape.
//! `NaN` is not valid JSON, so missing values are written as `null`.
//! Infinite values fail validation before anything is written, so `null`
//! always reads back as `NaN`.

use std::fs;
use std::path::Path;

use ndarray::{Array3, Array4};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::coords::{space_labels, TimeCoords};
use super::metadata::Metadata;
use super::model::PoseDataset;
use super::options::WriteOptions;
use crate::error::PoseError;
use crate::validation::files::{check_file, Access};
use crate::validation::{ensure_valid, ValidateOptions};

const FORMAT: &str = "pose JSON";

// ============================================================================
// JSON Schema Type (internal to this module)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct PoseJson {
    /// (time, individuals, keypoints, space)
    shape: [usize; 4],
    time: TimeCoords,
    individuals: Vec<String>,
    keypoints: Vec<String>,
    space: Vec<String>,
    position: Vec<Option<f64>>,
    confidence: Vec<Option<f64>>,
    #[serde(default)]
    metadata: Metadata,
}

fn to_json_values<'a>(values: impl Iterator<Item = &'a f64>) -> Vec<Option<f64>> {
    values.map(|v| (!v.is_nan()).then_some(*v)).collect()
}

fn from_json_values(values: Vec<Option<f64>>) -> Vec<f64> {
    values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()
}

impl From<&PoseDataset> for PoseJson {
    fn from(dataset: &PoseDataset) -> Self {
        let (t, i, k, s) = dataset.position.dim();
        PoseJson {
            shape: [t, i, k, s],
            time: dataset.time.clone(),
            individuals: dataset.individuals.clone(),
            keypoints: dataset.keypoints.clone(),
            space: dataset.space_labels().iter().map(|s| s.to_string()).collect(),
            position: to_json_values(dataset.position.iter()),
            confidence: to_json_values(dataset.confidence.iter()),
            metadata: dataset.metadata.clone(),
        }
    }
}

fn json_to_dataset(json: PoseJson, path: &Path) -> Result<PoseDataset, PoseError> {
    let err = |message: String| PoseError::format(path, FORMAT, message);
    let [t, i, k, s] = json.shape;

    let expected_space = space_labels(s).unwrap_or(&[]);
    if json.space.iter().map(String::as_str).ne(expected_space.iter().copied()) {
        return Err(err(format!(
            "space labels {:?} do not match a space extent of {}",
            json.space, s
        )));
    }

    let position = Array4::from_shape_vec((t, i, k, s), from_json_values(json.position))
        .map_err(|e| err(format!("position does not match shape {:?}: {}", json.shape, e)))?;
    let confidence = Array3::from_shape_vec((t, i, k), from_json_values(json.confidence))
        .map_err(|e| err(format!("confidence does not match shape {:?}: {}", json.shape, e)))?;

    let dataset = PoseDataset {
        position,
        confidence,
        time: json.time,
        individuals: json.individuals,
        keypoints: json.keypoints,
        metadata: json.metadata,
    };
    ensure_valid(&dataset, &ValidateOptions::default())?;
    Ok(dataset)
}

// ============================================================================
// Public API
// ============================================================================

/// Reads a dataset from a JSON file in the posetracks IR format.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or the stored
/// tensors do not satisfy the IR invariants.
pub fn read_pose_json(path: &Path) -> Result<PoseDataset, PoseError> {
    check_file(path, Access::Read, &[".json"])?;
    let bytes = fs::read(path)?;

    let json: PoseJson = serde_json::from_slice(&bytes).map_err(|source| PoseError::JsonParse {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = json_to_dataset(json, path)?;

    info!(
        path = %path.display(),
        frames = dataset.n_frames(),
        individuals = dataset.n_individuals(),
        "Loaded pose tracks from JSON"
    );
    Ok(dataset)
}

/// Writes a dataset to a JSON file in the posetracks IR format.
///
/// # Errors
/// Returns an error if the dataset is invalid, the path exists (without
/// `overwrite`), or the file cannot be written.
pub fn write_pose_json(
    path: &Path,
    dataset: &PoseDataset,
    opts: &WriteOptions,
) -> Result<(), PoseError> {
    ensure_valid(dataset, &ValidateOptions::default())?;
    check_file(
        path,
        Access::Write {
            overwrite: opts.overwrite,
        },
        &[".json"],
    )?;

    let json = serde_json::to_vec_pretty(&PoseJson::from(dataset)).map_err(|source| {
        PoseError::JsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, json)?;

    info!(path = %path.display(), "Wrote pose tracks as JSON");
    Ok(())
}

/// Reads a dataset from a JSON string in the posetracks IR format.
///
/// Useful for testing without file I/O.
pub fn from_pose_json_str(json: &str) -> Result<PoseDataset, PoseError> {
    from_pose_json_slice(json.as_bytes())
}

/// Reads a dataset from JSON bytes in the posetracks IR format.
pub fn from_pose_json_slice(bytes: &[u8]) -> Result<PoseDataset, PoseError> {
    let path = Path::new("<bytes>");
    let json: PoseJson = serde_json::from_slice(bytes).map_err(|source| PoseError::JsonParse {
        path: path.to_path_buf(),
        source,
    })?;
    json_to_dataset(json, path)
}

/// Writes a dataset to a JSON string in the posetracks IR format.
///
/// Useful for testing without file I/O. Returns `Shape` if the dataset fails
/// validation.
pub fn to_pose_json_string(dataset: &PoseDataset) -> Result<String, PoseError> {
    ensure_valid(dataset, &ValidateOptions::default())?;
    serde_json::to_string_pretty(&PoseJson::from(dataset)).map_err(|source| PoseError::JsonWrite {
        path: "<string>".into(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{SourceSoftware, TimeUnit};

    fn sample_dataset() -> PoseDataset {
        let mut position = Array4::from_shape_fn((3, 1, 2, 2), |(t, _, k, s)| (t * 10 + k * 2 + s) as f64);
        position[[1, 0, 1, 0]] = f64::NAN;
        position[[1, 0, 1, 1]] = f64::NAN;
        let mut confidence = Array3::from_elem((3, 1, 2), 0.9);
        confidence[[1, 0, 1]] = f64::NAN;

        PoseDataset {
            position,
            confidence,
            time: TimeCoords::Seconds(vec![0.0, 0.5, 1.0]),
            individuals: vec!["mouse".into()],
            keypoints: vec!["snout".into(), "tail".into()],
            metadata: Metadata {
                fps: Some(2.0),
                time_unit: TimeUnit::Seconds,
                source_software: Some(SourceSoftware::DeepLabCut {
                    scorer: Some("DLC_resnet50".into()),
                }),
                source_file: Some("video1.csv".into()),
            },
        }
    }

    fn same(a: &PoseDataset, b: &PoseDataset) -> bool {
        let eq = |x: &f64, y: &f64| (x.is_nan() && y.is_nan()) || x == y;
        a.position.iter().zip(b.position.iter()).all(|(x, y)| eq(x, y))
            && a.confidence.iter().zip(b.confidence.iter()).all(|(x, y)| eq(x, y))
            && a.position.dim() == b.position.dim()
            && a.time == b.time
            && a.individuals == b.individuals
            && a.keypoints == b.keypoints
            && a.metadata == b.metadata
    }

    #[test]
    fn json_roundtrip_is_lossless() {
        let original = sample_dataset();
        let json = to_pose_json_string(&original).expect("serialize");
        let restored = from_pose_json_str(&json).expect("deserialize");
        assert!(same(&original, &restored));
    }

    #[test]
    fn nan_is_written_as_null() {
        let json = to_pose_json_string(&sample_dataset()).expect("serialize");
        assert!(json.contains("null"));
        assert!(!json.contains("NaN"));
    }

    #[test]
    fn infinite_values_are_refused_not_nulled() {
        let mut ds = sample_dataset();
        ds.position[[2, 0, 0, 1]] = f64::INFINITY;
        let err = to_pose_json_string(&ds).unwrap_err();
        assert!(matches!(err, PoseError::Shape { .. }), "{:?}", err);

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("poses.json");
        let err = write_pose_json(&path, &ds, &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, PoseError::Shape { .. }), "{:?}", err);
        assert!(!path.exists());
    }

    #[test]
    fn rejects_wrong_tensor_length() {
        let mut value: serde_json::Value =
            serde_json::from_str(&to_pose_json_string(&sample_dataset()).expect("serialize"))
                .expect("parse");
        value["shape"][0] = serde_json::json!(4);
        let err = from_pose_json_str(&value.to_string()).unwrap_err();
        assert!(matches!(err, PoseError::Format { .. }), "{:?}", err);
    }
}
