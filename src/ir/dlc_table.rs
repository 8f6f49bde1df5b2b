//! The column table shared by the DeepLabCut-style formats.
//!
//! DeepLabCut CSV, DeepLabCut HDF5 and LightningPose CSV all store a pandas
//! DataFrame whose columns form a multi-level index
//! (`scorer`, [`individuals`], `bodyparts`, `coords`) over rows indexed by
//! frame. Each reader decodes its container into a [`DlcTable`], and the
//! conversion to and from the IR happens once, here.
//!
//! # Conversion rules
//!
//! - Individuals and keypoints keep the order in which they first appear in
//!   the columns.
//! - Every (individual, keypoint) pair must have exactly one column for each
//!   spatial coordinate (`x`, `y`, optionally `z`) and one `likelihood`
//!   column.
//! - Without an `individuals` level the table is single-animal and gets one
//!   individual.
//! - Row labels become frame indices when every label is an integer or a
//!   file name ending in a frame number (`img0042.png`); otherwise rows are
//!   numbered from zero.

use ndarray::{Array2, Array3, Array4};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::assemble::RawPoses;
use super::coords::space_labels;
use super::model::PoseDataset;
use super::options::SplitIndividuals;
use crate::error::PoseError;
use crate::validation::{ensure_valid, ValidateOptions};

/// Name of the confidence column in the `coords` level.
pub const LIKELIHOOD: &str = "likelihood";

/// Scorer written when the dataset carries none of its own.
pub const DEFAULT_SCORER: &str = "posetracks";

/// Column levels of a single-animal table.
pub(crate) const SINGLE_ANIMAL_LEVELS: [&str; 3] = ["scorer", "bodyparts", "coords"];

/// Column levels of a multi-animal table.
pub(crate) const MULTI_ANIMAL_LEVELS: [&str; 4] = ["scorer", "individuals", "bodyparts", "coords"];

/// One column of a DeepLabCut table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DlcColumn {
    pub scorer: String,
    pub individual: Option<String>,
    pub bodypart: String,
    pub coord: String,
}

/// A decoded DeepLabCut table: column headers, row labels and values.
#[derive(Clone, Debug)]
pub(crate) struct DlcTable {
    pub columns: Vec<DlcColumn>,
    pub index: Vec<String>,
    pub values: Array2<f64>,
}

impl DlcTable {
    /// True if the columns carry an `individuals` level.
    pub fn is_multi_animal(&self) -> bool {
        self.columns.iter().any(|c| c.individual.is_some())
    }

    /// The scorer named by the first column.
    pub fn scorer(&self) -> Option<String> {
        self.columns.first().map(|c| c.scorer.clone())
    }

    /// Column levels in header order.
    pub fn levels(&self) -> &'static [&'static str] {
        if self.is_multi_animal() {
            &MULTI_ANIMAL_LEVELS
        } else {
            &SINGLE_ANIMAL_LEVELS
        }
    }
}

/// How a dataset is laid out across DeepLabCut-style output files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputLayout {
    /// One file without an `individuals` level (exactly one individual).
    SingleAnimal,
    /// One file with an `individuals` level.
    MultiAnimal,
    /// One single-animal file per individual.
    PerIndividual,
}

impl OutputLayout {
    /// Layout for a DeepLabCut write under the given split policy.
    pub fn for_dlc(dataset: &PoseDataset, split: SplitIndividuals) -> Self {
        match split {
            SplitIndividuals::Auto if dataset.n_individuals() == 1 => OutputLayout::SingleAnimal,
            SplitIndividuals::Auto | SplitIndividuals::No => OutputLayout::MultiAnimal,
            SplitIndividuals::Yes => OutputLayout::PerIndividual,
        }
    }
}

// ============================================================================
// Table -> IR
// ============================================================================

/// Converts a decoded table into raw pose data.
///
/// The caller attaches the source software and file.
pub(crate) fn table_to_raw(
    table: DlcTable,
    path: &Path,
    format: &'static str,
) -> Result<RawPoses, PoseError> {
    let err = |message: String| PoseError::format(path, format, message);

    let (n_rows, n_cols) = table.values.dim();
    if n_cols != table.columns.len() {
        return Err(err(format!(
            "{} value column(s) but {} column header(s)",
            n_cols,
            table.columns.len()
        )));
    }
    if n_rows != table.index.len() {
        return Err(err(format!(
            "{} value row(s) but {} row label(s)",
            n_rows,
            table.index.len()
        )));
    }

    let multi = table.is_multi_animal();
    if multi && table.columns.iter().any(|c| c.individual.is_none()) {
        return Err(err(
            "some columns name an individual and others do not".to_string(),
        ));
    }

    let individuals = unique_in_order(
        table
            .columns
            .iter()
            .filter_map(|c| c.individual.as_deref()),
    );
    let keypoints = unique_in_order(table.columns.iter().map(|c| c.bodypart.as_str()));
    let coords = unique_in_order(
        table
            .columns
            .iter()
            .map(|c| c.coord.as_str())
            .filter(|c| *c != LIKELIHOOD),
    );

    let space = space_labels(coords.len())
        .filter(|labels| labels.iter().zip(&coords).all(|(a, b)| a == b))
        .ok_or_else(|| {
            err(format!(
                "unsupported coords {:?} (expected x, y[, z] and likelihood)",
                coords
            ))
        })?;
    let n_space = space.len();
    let n_individuals = if multi { individuals.len() } else { 1 };
    let n_keypoints = keypoints.len();

    let individual_pos: HashMap<&str, usize> = individuals
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    let keypoint_pos: HashMap<&str, usize> = keypoints
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    // One slot per (individual, keypoint, coord); the last coord is likelihood.
    let stride = n_space + 1;
    let mut slots: Vec<Option<usize>> = vec![None; n_individuals * n_keypoints * stride];

    for (col_idx, col) in table.columns.iter().enumerate() {
        let i = match &col.individual {
            Some(name) => individual_pos[name.as_str()],
            None => 0,
        };
        let k = keypoint_pos[col.bodypart.as_str()];
        let c = if col.coord == LIKELIHOOD {
            n_space
        } else {
            space
                .iter()
                .position(|s| *s == col.coord)
                .ok_or_else(|| err(format!("unknown coord '{}'", col.coord)))?
        };

        let slot = (i * n_keypoints + k) * stride + c;
        if slots[slot].is_some() {
            return Err(err(format!(
                "duplicate '{}' column for keypoint '{}'{}",
                col.coord,
                col.bodypart,
                describe_individual(&col.individual)
            )));
        }
        slots[slot] = Some(col_idx);
    }

    let mut columns = Vec::with_capacity(slots.len());
    for (slot, col) in slots.iter().enumerate() {
        match col {
            Some(col) => columns.push(*col),
            None => {
                let c = slot % stride;
                let k = (slot / stride) % n_keypoints;
                let i = slot / stride / n_keypoints;
                let coord = if c == n_space { LIKELIHOOD } else { space[c] };
                let individual = multi.then(|| individuals[i].clone());
                return Err(err(format!(
                    "missing '{}' column for keypoint '{}'{}",
                    coord,
                    keypoints[k],
                    describe_individual(&individual)
                )));
            }
        }
    }

    let mut position = Array4::<f64>::from_elem((n_rows, n_individuals, n_keypoints, n_space), f64::NAN);
    let mut confidence = Array3::<f64>::from_elem((n_rows, n_individuals, n_keypoints), f64::NAN);
    for t in 0..n_rows {
        for i in 0..n_individuals {
            for k in 0..n_keypoints {
                let base = (i * n_keypoints + k) * stride;
                for s in 0..n_space {
                    position[[t, i, k, s]] = table.values[[t, columns[base + s]]];
                }
                confidence[[t, i, k]] = table.values[[t, columns[base + n_space]]];
            }
        }
    }

    let mut raw = RawPoses::new(position)
        .with_confidence(confidence)
        .with_keypoints(keypoints)
        .with_frame_indices(frame_indices_from_labels(&table.index));
    if multi {
        raw = raw.with_individuals(individuals);
    }

    Ok(raw)
}

fn describe_individual(individual: &Option<String>) -> String {
    individual
        .as_ref()
        .map(|name| format!(" of individual '{}'", name))
        .unwrap_or_default()
}

fn unique_in_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.iter().any(|seen| seen == item) {
            out.push(item.to_string());
        }
    }
    out
}

/// Frame indices from row labels, falling back to row positions.
pub(crate) fn frame_indices_from_labels(labels: &[String]) -> Vec<i64> {
    let parsed: Option<Vec<i64>> = labels.iter().map(|l| parse_frame_label(l)).collect();
    match parsed {
        Some(frames) if frames.windows(2).all(|w| w[0] < w[1]) => frames,
        _ => (0..labels.len() as i64).collect(),
    }
}

/// Parses `"42"` or a path such as `"labeled-data/session/img0042.png"`.
fn parse_frame_label(label: &str) -> Option<i64> {
    let label = label.trim();
    if let Ok(frame) = label.parse::<i64>() {
        return Some(frame);
    }

    let name = label.rsplit(['/', '\\']).next()?;
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let digits_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    stem[digits_start..].parse().ok()
}

// ============================================================================
// IR -> Table
// ============================================================================

/// The scorer to write: the dataset's own for DeepLabCut-style sources,
/// otherwise [`DEFAULT_SCORER`].
pub(crate) fn scorer_for(dataset: &PoseDataset) -> String {
    dataset
        .metadata
        .source_software
        .as_ref()
        .and_then(|s| s.scorer())
        .unwrap_or(DEFAULT_SCORER)
        .to_string()
}

/// Builds the table for a subset of individuals.
fn dataset_to_table(
    dataset: &PoseDataset,
    individuals: &[usize],
    with_individual_level: bool,
    scorer: &str,
    frames: &[i64],
) -> DlcTable {
    let space = dataset.space_labels();
    let n_keypoints = dataset.n_keypoints();

    let mut columns = Vec::with_capacity(individuals.len() * n_keypoints * (space.len() + 1));
    for &i in individuals {
        for keypoint in &dataset.keypoints {
            for coord in space.iter().copied().chain([LIKELIHOOD]) {
                columns.push(DlcColumn {
                    scorer: scorer.to_string(),
                    individual: with_individual_level.then(|| dataset.individuals[i].clone()),
                    bodypart: keypoint.clone(),
                    coord: coord.to_string(),
                });
            }
        }
    }

    let n_frames = dataset.n_frames();
    let mut values = Array2::<f64>::from_elem((n_frames, columns.len()), f64::NAN);
    for t in 0..n_frames {
        let mut c = 0;
        for &i in individuals {
            for k in 0..n_keypoints {
                for s in 0..space.len() {
                    values[[t, c]] = dataset.position[[t, i, k, s]];
                    c += 1;
                }
                values[[t, c]] = dataset.confidence[[t, i, k]];
                c += 1;
            }
        }
    }

    DlcTable {
        columns,
        index: frames.iter().map(|f| f.to_string()).collect(),
        values,
    }
}

/// Plans the output files of a DeepLabCut-style write.
///
/// Validates the dataset first, so no file is touched for an invalid one.
pub(crate) fn plan_outputs(
    dataset: &PoseDataset,
    path: &Path,
    layout: OutputLayout,
) -> Result<Vec<(PathBuf, DlcTable)>, PoseError> {
    ensure_valid(dataset, &ValidateOptions::default())?;

    let frames = dataset.frame_indices()?;
    let scorer = scorer_for(dataset);
    let all: Vec<usize> = (0..dataset.n_individuals()).collect();

    let outputs = match layout {
        OutputLayout::SingleAnimal => {
            vec![(
                path.to_path_buf(),
                dataset_to_table(dataset, &all, false, &scorer, &frames),
            )]
        }
        OutputLayout::MultiAnimal => {
            vec![(
                path.to_path_buf(),
                dataset_to_table(dataset, &all, true, &scorer, &frames),
            )]
        }
        OutputLayout::PerIndividual => all
            .iter()
            .map(|&i| {
                (
                    split_path(path, &dataset.individuals[i]),
                    dataset_to_table(dataset, &[i], false, &scorer, &frames),
                )
            })
            .collect(),
    };

    for (i, (output, _)) in outputs.iter().enumerate() {
        if outputs[..i].iter().any(|(earlier, _)| earlier == output) {
            return Err(PoseError::InvalidFile {
                path: output.clone(),
                message: "two individuals map to the same output file".to_string(),
            });
        }
    }

    Ok(outputs)
}

/// `dir/poses.csv` + `mouse1` -> `dir/poses_mouse1.csv`.
///
/// Path separators in `individual` become `_`, so the file always lands next
/// to `path`.
pub(crate) fn split_path(path: &Path, individual: &str) -> PathBuf {
    let individual: String = individual
        .chars()
        .map(|c| if c == '/' || c == '\\' || c == '\0' { '_' } else { c })
        .collect();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, individual, ext.to_string_lossy()),
        None => format!("{}_{}", stem, individual),
    };
    path.with_file_name(name)
}
