//! DeepLabCut HDF5 format reader and writer.
//!
//! DeepLabCut saves its predictions with `DataFrame.to_hdf(path,
//! "df_with_missing", format="fixed")`, which stores the frame as plain
//! arrays in one group:
//!
//! - `axis0_level{i}` / `axis0_label{i}`: the unique values of column level
//!   `i` and, per column, the index into them
//! - `axis1` (or `axis1_level{i}` / `axis1_label{i}`): the row index
//! - `block0_values`: the (rows, columns) value matrix
//!
//! The decoded table is the same one the CSV formats use, so both share
//! their conversion rules. Three column levels mean a single-animal file,
//! four a multi-animal one.

use std::fs;
use std::path::{Path, PathBuf};

use hdf5::{File, Group};
use ndarray::{Array1, Ix2};
use tracing::{info, warn};

use super::dlc_table::{plan_outputs, table_to_raw, DlcColumn, DlcTable, OutputLayout};
use super::h5_util::{
    h5_err, has_member, read_f64, read_strings, write_attr_int, write_attr_str, write_strings,
};
use super::metadata::SourceSoftware;
use super::model::PoseDataset;
use super::options::WriteOptions;
use super::assemble;
use crate::error::PoseError;
use crate::validation::files::{check_file, Access};

const FORMAT: &str = "DeepLabCut HDF5";

/// The pandas key DeepLabCut stores its frame under.
pub const DLC_H5_KEY: &str = "df_with_missing";

/// Suffixes accepted for DeepLabCut HDF5 files.
pub const DLC_H5_SUFFIXES: &[&str] = &[".h5", ".hdf5"];

/// Reads a dataset from a DeepLabCut HDF5 file.
///
/// # Errors
/// Returns an error if the path is not a readable `.h5` file, the pandas
/// layout is not recognised, or the columns do not form a complete
/// (individual, keypoint, coord) grid.
pub fn read_dlc_h5(path: &Path, fps: Option<f64>) -> Result<PoseDataset, PoseError> {
    check_file(path, Access::Read, DLC_H5_SUFFIXES)?;

    let file = File::open(path).map_err(h5_err(path))?;
    let table = read_table(&file, path)?;
    let scorer = table.scorer();
    let raw = table_to_raw(table, path, FORMAT)?
        .with_source_software(SourceSoftware::DeepLabCut { scorer })
        .with_source_file(path);
    let dataset = assemble(raw, fps)?;

    info!(
        path = %path.display(),
        frames = dataset.n_frames(),
        individuals = dataset.n_individuals(),
        keypoints = dataset.n_keypoints(),
        "Loaded pose tracks from DeepLabCut HDF5"
    );
    Ok(dataset)
}

/// Writes a dataset to DeepLabCut HDF5.
///
/// Layout and file naming follow [`write_dlc_csv`](super::io_dlc_csv::write_dlc_csv).
/// A file left incomplete by a failed write is removed.
pub fn write_dlc_h5(
    path: &Path,
    dataset: &PoseDataset,
    opts: &WriteOptions,
) -> Result<Vec<PathBuf>, PoseError> {
    let layout = OutputLayout::for_dlc(dataset, opts.split_individuals);
    let outputs = plan_outputs(dataset, path, layout)?;
    for (out, _) in &outputs {
        check_file(
            out,
            Access::Write {
                overwrite: opts.overwrite,
            },
            DLC_H5_SUFFIXES,
        )?;
    }

    let mut written = Vec::with_capacity(outputs.len());
    for (out, table) in outputs {
        let result = File::create(&out)
            .map_err(h5_err(&out))
            .and_then(|file| write_table(&file, &table, &out));
        if let Err(e) = result {
            if out.exists() {
                if let Err(remove_err) = fs::remove_file(&out) {
                    warn!(path = %out.display(), error = %remove_err, "Could not remove incomplete file");
                }
            }
            return Err(e);
        }

        info!(path = %out.display(), format = FORMAT, "Wrote pose tracks");
        written.push(out);
    }
    Ok(written)
}

// ============================================================================
// Reading
// ============================================================================

fn read_table(file: &File, path: &Path) -> Result<DlcTable, PoseError> {
    let err = |message: String| PoseError::format(path, FORMAT, message);

    let group = if has_member(file, DLC_H5_KEY) {
        file.group(DLC_H5_KEY).map_err(h5_err(path))?
    } else {
        // Older exports used other keys; accept a lone top-level group.
        let members = file.member_names().map_err(h5_err(path))?;
        match members.as_slice() {
            [only] => file.group(only).map_err(h5_err(path))?,
            _ => {
                return Err(err(format!(
                    "no '{}' group and {} top-level member(s)",
                    DLC_H5_KEY,
                    members.len()
                )))
            }
        }
    };

    let column_levels = read_multi_index(&group, "axis0", path)?;
    let (multi, n_levels) = match column_levels.len() {
        3 => (false, 3),
        4 => (true, 4),
        n => {
            return Err(err(format!(
                "{} column level(s), expected 3 (single-animal) or 4 (multi-animal)",
                n
            )))
        }
    };
    let n_cols = column_levels[0].len();
    let columns: Vec<DlcColumn> = (0..n_cols)
        .map(|j| DlcColumn {
            scorer: column_levels[0][j].clone(),
            individual: multi.then(|| column_levels[1][j].clone()),
            bodypart: column_levels[n_levels - 2][j].clone(),
            coord: column_levels[n_levels - 1][j].clone(),
        })
        .collect();

    if has_member(&group, "block1_values") {
        return Err(err(
            "expected a single block of numeric values".to_string(),
        ));
    }

    let index = read_row_index(&group, path)?;
    let values = read_f64(&group, "block0_values", path)?
        .into_dimensionality::<Ix2>()
        .map_err(|_| err("'block0_values' must be 2-D".to_string()))?;
    let values = match values.dim() {
        (rows, cols) if rows == index.len() && cols == n_cols => values,
        (cols, rows) if rows == index.len() && cols == n_cols => values.reversed_axes(),
        other => {
            return Err(err(format!(
                "'block0_values' has shape {:?} for {} row(s) and {} column(s)",
                other,
                index.len(),
                n_cols
            )))
        }
    };

    Ok(DlcTable {
        columns,
        index,
        values: values.as_standard_layout().into_owned(),
    })
}

/// Decodes `{key}_level{i}` / `{key}_label{i}` pairs into per-level labels.
fn read_multi_index(group: &Group, key: &str, path: &Path) -> Result<Vec<Vec<String>>, PoseError> {
    let err = |message: String| PoseError::format(path, FORMAT, message);

    let mut levels: Vec<Vec<String>> = Vec::new();
    while has_member(group, &format!("{}_level{}", key, levels.len())) {
        let i = levels.len();
        let names = read_strings(group, &format!("{}_level{}", key, i), path)?;
        let codes = group
            .dataset(&format!("{}_label{}", key, i))
            .and_then(|ds| ds.read_1d::<i64>())
            .map_err(h5_err(path))?;

        if let Some(first) = levels.first() {
            if codes.len() != first.len() {
                return Err(err(format!(
                    "{} level {} has {} entries, level 0 has {}",
                    key,
                    i,
                    codes.len(),
                    first.len()
                )));
            }
        }

        let labels = codes
            .iter()
            .map(|&code| {
                usize::try_from(code)
                    .ok()
                    .and_then(|c| names.get(c))
                    .cloned()
                    .ok_or_else(|| err(format!("{} level {} has invalid code {}", key, i, code)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        levels.push(labels);
    }
    Ok(levels)
}

/// Reads the row labels: a plain `axis1` index or a multi-level one (as in
/// labelled-data files), whose levels are joined with `/`.
fn read_row_index(group: &Group, path: &Path) -> Result<Vec<String>, PoseError> {
    if has_member(group, "axis1") {
        let ds = group.dataset("axis1").map_err(h5_err(path))?;
        if let Ok(frames) = ds.read_1d::<i64>() {
            return Ok(frames.iter().map(|f| f.to_string()).collect());
        }
        return read_strings(group, "axis1", path);
    }

    let levels = read_multi_index(group, "axis1", path)?;
    let Some(first) = levels.first() else {
        return Err(PoseError::format(path, FORMAT, "missing row index 'axis1'"));
    };
    Ok((0..first.len())
        .map(|r| {
            levels
                .iter()
                .map(|level| level[r].as_str())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect())
}

// ============================================================================
// Writing
// ============================================================================

fn write_table(file: &File, table: &DlcTable, path: &Path) -> Result<(), PoseError> {
    let to_err = h5_err(path);
    let group = file.create_group(DLC_H5_KEY).map_err(&to_err)?;

    let levels = table.levels();
    let n_levels = levels.len() as i64;
    for (name, value) in [
        ("pandas_type", "frame"),
        ("pandas_version", "0.15.2"),
        ("encoding", "UTF-8"),
        ("errors", "strict"),
        ("axis0_variety", "multi"),
        ("axis1_variety", "regular"),
        ("block0_items_variety", "multi"),
    ] {
        write_attr_str(&group, name, value, path)?;
    }
    write_attr_int(&group, "ndim", 2, path)?;
    write_attr_int(&group, "nblocks", 1, path)?;
    write_attr_int(&group, "axis0_nlevels", n_levels, path)?;
    write_attr_int(&group, "block0_items_nlevels", n_levels, path)?;

    for (i, level) in levels.iter().enumerate() {
        let values: Vec<&str> = table
            .columns
            .iter()
            .map(|c| match *level {
                "scorer" => c.scorer.as_str(),
                "individuals" => c.individual.as_deref().unwrap_or(""),
                "bodyparts" => c.bodypart.as_str(),
                _ => c.coord.as_str(),
            })
            .collect();
        let (names, codes) = factorize(&values);

        for key in ["axis0", "block0_items"] {
            let level_ds = write_strings(&group, &format!("{}_level{}", key, i), &names, path)?;
            write_attr_str(&level_ds, "kind", "string", path)?;
            write_attr_str(&level_ds, "name", level, path)?;
            group
                .new_dataset_builder()
                .with_data(&codes)
                .create(format!("{}_label{}", key, i).as_str())
                .map_err(&to_err)?;
        }
    }

    let frames: Option<Vec<i64>> = table.index.iter().map(|l| l.parse().ok()).collect();
    let (index_ds, kind) = match frames {
        Some(frames) => (
            group
                .new_dataset_builder()
                .with_data(&Array1::from(frames))
                .create("axis1")
                .map_err(&to_err)?,
            "integer",
        ),
        None => (write_strings(&group, "axis1", &table.index, path)?, "string"),
    };
    write_attr_str(&index_ds, "kind", kind, path)?;

    let values_ds = group
        .new_dataset_builder()
        .with_data(&table.values)
        .create("block0_values")
        .map_err(&to_err)?;
    write_attr_int(&values_ds, "transposed", 1, path)?;

    Ok(())
}

/// Unique values in first-seen order, and each value's index into them.
fn factorize(values: &[&str]) -> (Vec<String>, Array1<i64>) {
    let mut names: Vec<String> = Vec::new();
    let codes = values
        .iter()
        .map(|value| match names.iter().position(|n| n == value) {
            Some(code) => code as i64,
            None => {
                names.push(value.to_string());
                (names.len() - 1) as i64
            }
        })
        .collect();
    (names, codes)
}
