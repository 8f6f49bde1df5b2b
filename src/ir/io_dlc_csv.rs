//! DeepLabCut CSV format reader and writer.
//!
//! # DeepLabCut CSV Format Reference
//!
//! A DeepLabCut `.csv` is a pandas DataFrame written with a multi-level
//! column header. The first cell of every header row names the level:
//!
//! ```text
//! scorer,DLC_resnet50,DLC_resnet50,DLC_resnet50,...
//! individuals,mouse1,mouse1,mouse1,...          (multi-animal files only)
//! bodyparts,snout,snout,snout,...
//! coords,x,y,likelihood,...
//! 0,431.2,212.7,0.98,...
//! ```
//!
//! Data rows start with a row label (a frame number or an image path) and
//! hold one value per column. Empty cells are missing values.
//!
//! # Format Limitations
//!
//! DeepLabCut CSV cannot represent:
//! - Frame rate or time in seconds (rows are frame indices)
//! - SLEAP provenance (labels and video paths)
//!
//! Converting from IR to DeepLabCut CSV drops these.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use tracing::info;

use super::dlc_table::{
    plan_outputs, table_to_raw, DlcColumn, DlcTable, OutputLayout, MULTI_ANIMAL_LEVELS,
    SINGLE_ANIMAL_LEVELS,
};
use super::metadata::SourceSoftware;
use super::model::PoseDataset;
use super::options::WriteOptions;
use super::{assemble, RawPoses};
use crate::error::PoseError;
use crate::validation::files::{check_file, Access};

const FORMAT: &str = "DeepLabCut CSV";

// ============================================================================
// Public API
// ============================================================================

/// Reads a dataset from a DeepLabCut CSV file.
///
/// With `fps`, time coordinates are in seconds; otherwise they are frame
/// indices.
///
/// # Errors
/// Returns an error if the path is not a readable `.csv` file, the header
/// rows are not DeepLabCut's, or the values do not form a complete
/// (individual, keypoint, coord) grid.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use posetracks::ir::io_dlc_csv::read_dlc_csv;
///
/// let dataset = read_dlc_csv(Path::new("video1DLC_resnet50.csv"), Some(30.0))?;
/// # Ok::<(), posetracks::PoseError>(())
/// ```
pub fn read_dlc_csv(path: &Path, fps: Option<f64>) -> Result<PoseDataset, PoseError> {
    check_file(path, Access::Read, &[".csv"])?;
    let bytes = fs::read(path)?;

    let table = parse_dlc_csv(&bytes, path, FORMAT)?;
    let raw = dlc_raw(table, path)?.with_source_file(path);
    let dataset = assemble(raw, fps)?;

    info!(
        path = %path.display(),
        frames = dataset.n_frames(),
        individuals = dataset.n_individuals(),
        keypoints = dataset.n_keypoints(),
        "Loaded pose tracks from DeepLabCut CSV"
    );
    Ok(dataset)
}

/// Reads a dataset from a DeepLabCut CSV string.
pub fn from_dlc_csv_str(csv: &str, fps: Option<f64>) -> Result<PoseDataset, PoseError> {
    from_dlc_csv_slice(csv.as_bytes(), fps)
}

/// Reads a dataset from DeepLabCut CSV bytes.
pub fn from_dlc_csv_slice(bytes: &[u8], fps: Option<f64>) -> Result<PoseDataset, PoseError> {
    let path = Path::new("<bytes>");
    let table = parse_dlc_csv(bytes, path, FORMAT)?;
    assemble(dlc_raw(table, path)?, fps)
}

/// Writes a dataset to DeepLabCut CSV.
///
/// Returns the paths written: one, or one per individual when
/// `split_individuals` is [`SplitIndividuals::Yes`](super::SplitIndividuals::Yes).
/// Every output path is checked and every table rendered before the first
/// file is created.
///
/// # Errors
/// Returns an error if the dataset is invalid, an output path already exists
/// (without `overwrite`) or has the wrong suffix, or a write fails.
pub fn write_dlc_csv(
    path: &Path,
    dataset: &PoseDataset,
    opts: &WriteOptions,
) -> Result<Vec<PathBuf>, PoseError> {
    let layout = OutputLayout::for_dlc(dataset, opts.split_individuals);
    write_tables(path, dataset, layout, opts, FORMAT)
}

/// Writes a dataset to a DeepLabCut CSV string.
///
/// Uses the single-animal layout for one individual and the multi-animal
/// layout otherwise.
pub fn to_dlc_csv_string(dataset: &PoseDataset) -> Result<String, PoseError> {
    let layout = OutputLayout::for_dlc(dataset, Default::default());
    table_string(dataset, layout, FORMAT)
}

// ============================================================================
// Shared with the LightningPose CSV module
// ============================================================================

/// Renders the tables for `layout` and writes them as CSV files.
pub(crate) fn write_tables(
    path: &Path,
    dataset: &PoseDataset,
    layout: OutputLayout,
    opts: &WriteOptions,
    format: &'static str,
) -> Result<Vec<PathBuf>, PoseError> {
    let outputs = plan_outputs(dataset, path, layout)?;

    let mut rendered = Vec::with_capacity(outputs.len());
    for (out, table) in &outputs {
        check_file(
            out,
            Access::Write {
                overwrite: opts.overwrite,
            },
            &[".csv"],
        )?;
        rendered.push((out.clone(), render_dlc_csv(table, out)?));
    }

    let mut written = Vec::with_capacity(rendered.len());
    for (out, bytes) in rendered {
        fs::write(&out, bytes)?;
        info!(path = %out.display(), format, "Wrote pose tracks");
        written.push(out);
    }
    Ok(written)
}

/// Renders a dataset that fits in one table as a CSV string.
pub(crate) fn table_string(
    dataset: &PoseDataset,
    layout: OutputLayout,
    format: &'static str,
) -> Result<String, PoseError> {
    let path = Path::new("<string>");
    let outputs = plan_outputs(dataset, path, layout)?;
    let (_, table) = outputs
        .into_iter()
        .next()
        .ok_or_else(|| PoseError::format(path, format, "no table to render"))?;

    let bytes = render_dlc_csv(&table, path)?;
    String::from_utf8(bytes)
        .map_err(|e| PoseError::format(path, format, format!("output is not UTF-8: {}", e)))
}

/// Parses the header rows and values of a DeepLabCut-style CSV.
pub(crate) fn parse_dlc_csv(
    bytes: &[u8],
    path: &Path,
    format: &'static str,
) -> Result<DlcTable, PoseError> {
    let err = |message: String| PoseError::format(path, format, message);

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|source| PoseError::DlcCsvParse {
            path: path.to_path_buf(),
            source,
        })?;
        records.push(record);
    }

    let first_cell = |row: usize| records.get(row).and_then(|r| r.get(0)).unwrap_or("");
    let levels: &[&str] = if first_cell(1) == "individuals" {
        &MULTI_ANIMAL_LEVELS
    } else {
        &SINGLE_ANIMAL_LEVELS
    };
    let header_matches = levels
        .iter()
        .enumerate()
        .all(|(row, level)| first_cell(row) == *level);
    if !header_matches {
        return Err(err(format!(
            "header rows do not match the DeepLabCut layout (expected first cells {:?})",
            levels
        )));
    }

    let width = records[0].len();
    if let Some(row) = records[..levels.len()].iter().position(|r| r.len() != width) {
        return Err(err(format!(
            "header row {} has {} cell(s), expected {}",
            row + 1,
            records[row].len(),
            width
        )));
    }

    let multi = levels.len() == MULTI_ANIMAL_LEVELS.len();
    let coord_row = levels.len() - 1;
    let columns: Vec<DlcColumn> = (1..width)
        .map(|j| DlcColumn {
            scorer: records[0][j].to_string(),
            individual: multi.then(|| records[1][j].to_string()),
            bodypart: records[coord_row - 1][j].to_string(),
            coord: records[coord_row][j].to_string(),
        })
        .collect();

    let data = &records[levels.len()..];
    let mut index = Vec::with_capacity(data.len());
    let mut values = Vec::with_capacity(data.len() * columns.len());
    for (r, record) in data.iter().enumerate() {
        let line = levels.len() + r + 1;
        if record.len() != width {
            return Err(err(format!(
                "line {} has {} cell(s), expected {}",
                line,
                record.len(),
                width
            )));
        }

        index.push(record[0].to_string());
        for (j, cell) in record.iter().enumerate().skip(1) {
            values.push(parse_value(cell).ok_or_else(|| {
                err(format!(
                    "line {}, column {}: '{}' is not a number",
                    line,
                    j + 1,
                    cell
                ))
            })?);
        }
    }

    let values = Array2::from_shape_vec((index.len(), columns.len()), values)
        .map_err(|e| err(e.to_string()))?;

    Ok(DlcTable {
        columns,
        index,
        values,
    })
}

/// Renders a table as CSV bytes, header rows first.
pub(crate) fn render_dlc_csv(table: &DlcTable, path: &Path) -> Result<Vec<u8>, PoseError> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(Vec::new());
    let write_err = |source: csv::Error| PoseError::DlcCsvWrite {
        path: path.to_path_buf(),
        source,
    };

    for level in table.levels() {
        let mut row = Vec::with_capacity(table.columns.len() + 1);
        row.push(level.to_string());
        row.extend(table.columns.iter().map(|c| match *level {
            "scorer" => c.scorer.clone(),
            "individuals" => c.individual.clone().unwrap_or_default(),
            "bodyparts" => c.bodypart.clone(),
            _ => c.coord.clone(),
        }));
        csv_writer.write_record(&row).map_err(write_err)?;
    }

    for (label, values) in table.index.iter().zip(table.values.rows()) {
        let mut row = Vec::with_capacity(values.len() + 1);
        row.push(label.clone());
        row.extend(values.iter().map(|v| format_value(*v)));
        csv_writer.write_record(&row).map_err(write_err)?;
    }

    csv_writer
        .into_inner()
        .map_err(|e| PoseError::Io(e.into_error()))
}

/// Resolves row labels to frame indices, exposed for fuzzing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_frame_indices(labels: &[String]) -> Vec<i64> {
    super::dlc_table::frame_indices_from_labels(labels)
}

fn parse_value(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        Some(f64::NAN)
    } else {
        cell.parse().ok()
    }
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{:?}", value)
    }
}

fn dlc_raw(table: DlcTable, path: &Path) -> Result<RawPoses, PoseError> {
    let scorer = table.scorer();
    let raw = table_to_raw(table, path, FORMAT)?;
    Ok(raw.with_source_software(SourceSoftware::DeepLabCut { scorer }))
}
