//! LightningPose CSV format reader and writer.
//!
//! LightningPose writes predictions as a single-animal DeepLabCut CSV
//! (`scorer`, `bodyparts`, `coords` header rows). A file with an
//! `individuals` row is rejected rather than silently read as several
//! animals.
//!
//! # Format Limitations
//!
//! LightningPose CSV cannot represent:
//! - More than one individual per file
//! - Frame rate or time in seconds
//!
//! Writing a multi-individual dataset fails unless it is split into one
//! file per individual.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::dlc_table::{table_to_raw, DlcTable, OutputLayout};
use super::io_dlc_csv::{parse_dlc_csv, table_string, write_tables};
use super::metadata::SourceSoftware;
use super::model::PoseDataset;
use super::options::{SplitIndividuals, WriteOptions};
use super::{assemble, RawPoses};
use crate::error::PoseError;
use crate::validation::files::{check_file, Access};

const FORMAT: &str = "LightningPose CSV";

/// Reads a dataset from a LightningPose CSV file.
///
/// # Errors
/// Returns an error if the path is not a readable `.csv` file or the table
/// is not a single-animal DeepLabCut-style table.
pub fn read_lp_csv(path: &Path, fps: Option<f64>) -> Result<PoseDataset, PoseError> {
    check_file(path, Access::Read, &[".csv"])?;
    let bytes = fs::read(path)?;

    let table = parse_dlc_csv(&bytes, path, FORMAT)?;
    let raw = lp_raw(table, path)?.with_source_file(path);
    let dataset = assemble(raw, fps)?;

    info!(
        path = %path.display(),
        frames = dataset.n_frames(),
        keypoints = dataset.n_keypoints(),
        "Loaded pose tracks from LightningPose CSV"
    );
    Ok(dataset)
}

/// Reads a dataset from a LightningPose CSV string.
pub fn from_lp_csv_str(csv: &str, fps: Option<f64>) -> Result<PoseDataset, PoseError> {
    let path = Path::new("<string>");
    let table = parse_dlc_csv(csv.as_bytes(), path, FORMAT)?;
    assemble(lp_raw(table, path)?, fps)
}

/// Writes a dataset to LightningPose CSV.
///
/// A single-individual dataset is written to `path`. With
/// [`SplitIndividuals::Yes`] each individual goes to its own
/// `<stem>_<individual>.csv`.
///
/// # Errors
/// Returns `UnsupportedShape` for more than one individual without
/// splitting, plus the usual path and validation errors.
pub fn write_lp_csv(
    path: &Path,
    dataset: &PoseDataset,
    opts: &WriteOptions,
) -> Result<Vec<PathBuf>, PoseError> {
    let layout = lp_layout(dataset, opts.split_individuals)?;
    write_tables(path, dataset, layout, opts, FORMAT)
}

/// Writes a single-individual dataset to a LightningPose CSV string.
pub fn to_lp_csv_string(dataset: &PoseDataset) -> Result<String, PoseError> {
    let layout = lp_layout(dataset, SplitIndividuals::Auto)?;
    table_string(dataset, layout, FORMAT)
}

fn lp_layout(dataset: &PoseDataset, split: SplitIndividuals) -> Result<OutputLayout, PoseError> {
    match (split, dataset.n_individuals()) {
        (SplitIndividuals::Yes, _) => Ok(OutputLayout::PerIndividual),
        (_, 1) => Ok(OutputLayout::SingleAnimal),
        (_, n) => Err(PoseError::UnsupportedShape {
            format: FORMAT,
            message: format!(
                "LightningPose files hold one individual but the dataset has {}; \
                 split individuals into separate files",
                n
            ),
        }),
    }
}

fn lp_raw(table: DlcTable, path: &Path) -> Result<RawPoses, PoseError> {
    if table.is_multi_animal() {
        return Err(PoseError::format(
            path,
            FORMAT,
            "LightningPose files are single-animal but this one has an 'individuals' row",
        ));
    }

    let scorer = table.scorer();
    let raw = table_to_raw(table, path, FORMAT)?;
    Ok(raw.with_source_software(SourceSoftware::LightningPose { scorer }))
}
