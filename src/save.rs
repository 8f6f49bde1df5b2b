//! Saving pose tracks to any supported file.
//!
//! Every writer validates the dataset first and refuses to replace an
//! existing file unless [`WriteOptions::overwrite`] is set. Use
//! [`crate::conversion::build_conversion_report`] to see what a target will
//! drop before writing.

use std::path::{Path, PathBuf};

use crate::conversion::Format;
use crate::error::PoseError;
use crate::ir::{io_dlc_csv, io_json, io_lp_csv, PoseDataset, Vendor, WriteOptions};

/// Writes `dataset` as `format` and returns the files written.
///
/// DeepLabCut and LightningPose writes may produce one file per individual
/// (see [`SplitIndividuals`](crate::ir::SplitIndividuals)); the other
/// formats always write exactly `path`.
pub fn to_file(
    dataset: &PoseDataset,
    path: &Path,
    format: Format,
    opts: &WriteOptions,
) -> Result<Vec<PathBuf>, PoseError> {
    match format {
        Format::DlcCsv => io_dlc_csv::write_dlc_csv(path, dataset, opts),
        Format::LightningPoseCsv => io_lp_csv::write_lp_csv(path, dataset, opts),
        Format::PoseJson => {
            io_json::write_pose_json(path, dataset, opts)?;
            Ok(vec![path.to_path_buf()])
        }
        #[cfg(feature = "hdf5")]
        Format::DlcH5 => crate::ir::io_dlc_h5::write_dlc_h5(path, dataset, opts),
        #[cfg(feature = "hdf5")]
        Format::SleapAnalysisH5 => {
            crate::ir::io_sleap_h5::write_sleap_analysis(path, dataset, opts).map(|p| vec![p])
        }
        #[cfg(not(feature = "hdf5"))]
        Format::DlcH5 | Format::SleapAnalysisH5 => Err(crate::load::feature_disabled(format)),
    }
}

/// Writes a DeepLabCut `.csv` or `.h5` file, chosen by the suffix of `path`.
pub fn to_dlc_file(
    dataset: &PoseDataset,
    path: &Path,
    opts: &WriteOptions,
) -> Result<Vec<PathBuf>, PoseError> {
    let format = Format::detect(Vendor::DeepLabCut, path)?;
    to_file(dataset, path, format, opts)
}

/// Writes a LightningPose `.csv` file.
///
/// # Errors
/// Returns `UnsupportedShape` for more than one individual unless
/// individuals are split into separate files.
pub fn to_lp_file(
    dataset: &PoseDataset,
    path: &Path,
    opts: &WriteOptions,
) -> Result<Vec<PathBuf>, PoseError> {
    let format = Format::detect(Vendor::LightningPose, path)?;
    to_file(dataset, path, format, opts)
}

/// Writes a SLEAP analysis `.h5` file.
///
/// # Errors
/// Returns `UnsupportedShape` for 3-D poses.
pub fn to_sleap_analysis_file(
    dataset: &PoseDataset,
    path: &Path,
    opts: &WriteOptions,
) -> Result<PathBuf, PoseError> {
    let format = Format::detect(Vendor::Sleap, path)?;
    let mut written = to_file(dataset, path, format, opts)?;
    written.pop().ok_or_else(|| PoseError::InvalidFile {
        path: path.to_path_buf(),
        message: "nothing was written".to_string(),
    })
}

/// Writes a posetracks JSON file.
pub fn to_pose_json_file(
    dataset: &PoseDataset,
    path: &Path,
    opts: &WriteOptions,
) -> Result<(), PoseError> {
    io_json::write_pose_json(path, dataset, opts)
}
