//! Loading pose tracks from any supported file.
//!
//! [`from_file`] dispatches on the software that produced the file and the
//! file's suffix; the per-vendor functions are thin wrappers that pick the
//! format for you.

use std::path::Path;

use tracing::debug;

use crate::conversion::Format;
use crate::error::PoseError;
use crate::ir::{io_dlc_csv, io_json, io_lp_csv, PoseDataset, Vendor};

/// Loads pose tracks produced by `source_software`.
///
/// With `fps`, time coordinates are in seconds; otherwise they are frame
/// indices.
///
/// # Errors
/// Returns `InvalidFile` if the suffix does not match a format of that
/// software, and whatever the format's reader returns.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use posetracks::{load, Vendor};
///
/// let poses = load::from_file(Path::new("video1.analysis.h5"), Vendor::Sleap, Some(50.0))?;
/// println!("{}", poses);
/// # Ok::<(), posetracks::PoseError>(())
/// ```
pub fn from_file(
    path: &Path,
    source_software: Vendor,
    fps: Option<f64>,
) -> Result<PoseDataset, PoseError> {
    let format = Format::detect(source_software, path)?;
    debug!(path = %path.display(), %format, "Detected pose file format");
    read_format(path, format, fps)
}

/// Loads a DeepLabCut `.csv` or `.h5` file.
pub fn from_dlc_file(path: &Path, fps: Option<f64>) -> Result<PoseDataset, PoseError> {
    from_file(path, Vendor::DeepLabCut, fps)
}

/// Loads a SLEAP analysis `.h5` file. SLEAP `.slp` files are rejected.
pub fn from_sleap_file(path: &Path, fps: Option<f64>) -> Result<PoseDataset, PoseError> {
    from_file(path, Vendor::Sleap, fps)
}

/// Loads a LightningPose `.csv` file.
pub fn from_lp_file(path: &Path, fps: Option<f64>) -> Result<PoseDataset, PoseError> {
    from_file(path, Vendor::LightningPose, fps)
}

/// Loads a posetracks JSON file.
pub fn from_pose_json_file(path: &Path) -> Result<PoseDataset, PoseError> {
    io_json::read_pose_json(path)
}

/// Reads `path` as `format`.
///
/// The JSON format stores its own time coordinates, so `fps` is ignored
/// for it.
pub fn read_format(path: &Path, format: Format, fps: Option<f64>) -> Result<PoseDataset, PoseError> {
    match format {
        Format::DlcCsv => io_dlc_csv::read_dlc_csv(path, fps),
        Format::LightningPoseCsv => io_lp_csv::read_lp_csv(path, fps),
        Format::PoseJson => {
            if fps.is_some() {
                debug!("Ignoring fps for a JSON file; it stores its own time coordinates");
            }
            io_json::read_pose_json(path)
        }
        #[cfg(feature = "hdf5")]
        Format::DlcH5 => crate::ir::io_dlc_h5::read_dlc_h5(path, fps),
        #[cfg(feature = "hdf5")]
        Format::SleapAnalysisH5 => crate::ir::io_sleap_h5::read_sleap_analysis(path, fps),
        #[cfg(not(feature = "hdf5"))]
        Format::DlcH5 | Format::SleapAnalysisH5 => Err(feature_disabled(format)),
    }
}

#[cfg(not(feature = "hdf5"))]
pub(crate) fn feature_disabled(format: Format) -> PoseError {
    PoseError::FeatureDisabled {
        format: format.name(),
        feature: format.required_feature().unwrap_or("hdf5"),
    }
}
