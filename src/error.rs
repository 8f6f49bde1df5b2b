use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for posetracks operations.
#[derive(Debug, Error)]
pub enum PoseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file {path}: {message}")]
    InvalidFile { path: PathBuf, message: String },

    #[error("Malformed {format} file {path}: {message}")]
    Format {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("Failed to parse DeepLabCut CSV from {path}: {source}")]
    DlcCsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write DeepLabCut CSV to {path}: {source}")]
    DlcCsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error in {path}: {source}")]
    Hdf5 {
        path: PathBuf,
        #[source]
        source: hdf5::Error,
    },

    #[error("Failed to parse pose JSON from {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write pose JSON to {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid pose dataset: {error_count} error(s)\n{report}")]
    Shape {
        error_count: usize,
        report: ValidationReport,
    },

    #[error("Cannot write {format}: {message}")]
    UnsupportedShape {
        format: &'static str,
        message: String,
    },

    #[error("No {dim} labelled '{label}' in dataset")]
    UnknownLabel { dim: &'static str, label: String },

    #[error("Invalid selection: {message}")]
    InvalidSelection { message: String },

    #[error("Invalid confidence threshold {threshold} (must be a number)")]
    InvalidThreshold { threshold: f64 },

    #[error("Reading or writing {format} requires the '{feature}' feature")]
    FeatureDisabled {
        format: &'static str,
        feature: &'static str,
    },

    #[error("Failed to fetch sample data '{name}': {message}")]
    Download { name: String, message: String },

    #[error("Failed to parse sample registry {path}: {source}")]
    RegistryParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl PoseError {
    /// Builds a `Format` error for the given vendor format.
    pub(crate) fn format(
        path: impl Into<PathBuf>,
        format: &'static str,
        message: impl Into<String>,
    ) -> Self {
        PoseError::Format {
            path: path.into(),
            format,
            message: message.into(),
        }
    }

    /// Wraps a failed validation report.
    pub(crate) fn shape(report: ValidationReport) -> Self {
        PoseError::Shape {
            error_count: report.error_count(),
            report,
        }
    }
}
