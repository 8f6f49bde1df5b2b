//! Conversion module for format transformation reporting.
//!
//! This module names the on-disk formats posetracks reads and writes, and
//! describes up front what writing a dataset to each of them preserves,
//! drops, splits or fills, according to deterministic policies.

pub mod report;

pub use report::{
    ConversionCounts, ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity,
};

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::PoseError;
use crate::ir::{
    dense_frame_span, PoseDataset, SourceSoftware, SplitIndividuals, Vendor, WriteOptions,
    DEFAULT_SCORER, MAX_DENSE_FRAMES,
};
use crate::validation::files::file_suffix;

/// An on-disk pose format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    DlcCsv,
    DlcH5,
    LightningPoseCsv,
    SleapAnalysisH5,
    PoseJson,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::DlcCsv,
        Format::DlcH5,
        Format::LightningPoseCsv,
        Format::SleapAnalysisH5,
        Format::PoseJson,
    ];

    /// Short, stable name for the format.
    pub fn name(&self) -> &'static str {
        match self {
            Format::DlcCsv => "dlc-csv",
            Format::DlcH5 => "dlc-h5",
            Format::LightningPoseCsv => "lp-csv",
            Format::SleapAnalysisH5 => "sleap-analysis-h5",
            Format::PoseJson => "pose-json",
        }
    }

    /// The tool whose files this format describes, if any.
    pub fn vendor(&self) -> Option<Vendor> {
        match self {
            Format::DlcCsv | Format::DlcH5 => Some(Vendor::DeepLabCut),
            Format::LightningPoseCsv => Some(Vendor::LightningPose),
            Format::SleapAnalysisH5 => Some(Vendor::Sleap),
            Format::PoseJson => None,
        }
    }

    /// File suffixes the format is read from and written to.
    pub fn suffixes(&self) -> &'static [&'static str] {
        match self {
            Format::DlcCsv | Format::LightningPoseCsv => &[".csv"],
            Format::DlcH5 | Format::SleapAnalysisH5 => &[".h5", ".hdf5"],
            Format::PoseJson => &[".json"],
        }
    }

    /// The cargo feature the format needs, if any.
    pub fn required_feature(&self) -> Option<&'static str> {
        match self {
            Format::DlcH5 | Format::SleapAnalysisH5 => Some("hdf5"),
            _ => None,
        }
    }

    /// Picks the format for a vendor's file from its suffix.
    ///
    /// # Errors
    /// Returns `InvalidFile` for a suffix the vendor does not write, with a
    /// hint for SLEAP `.slp` label files, which are not analysis files.
    pub fn detect(vendor: Vendor, path: &Path) -> Result<Format, PoseError> {
        let suffix = file_suffix(path).to_ascii_lowercase();
        let candidates: &[Format] = match vendor {
            Vendor::DeepLabCut => &[Format::DlcCsv, Format::DlcH5],
            Vendor::LightningPose => &[Format::LightningPoseCsv],
            Vendor::Sleap => &[Format::SleapAnalysisH5],
        };

        if let Some(format) = candidates
            .iter()
            .find(|f| f.suffixes().contains(&suffix.as_str()))
        {
            return Ok(*format);
        }

        let message = if vendor == Vendor::Sleap && suffix == ".slp" {
            "SLEAP .slp label files are not supported; export an analysis file \
             (sleap-convert --format analysis) and load the .h5"
                .to_string()
        } else {
            let expected: Vec<&str> = candidates.iter().flat_map(|f| f.suffixes()).copied().collect();
            format!(
                "{} files must have suffix {:?}, got '{}'",
                vendor, expected, suffix
            )
        };
        Err(PoseError::InvalidFile {
            path: path.to_path_buf(),
            message,
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| {
                let names: Vec<&str> = Format::ALL.iter().map(|f| f.name()).collect();
                format!("unknown format '{}' (supported: {})", s, names.join(", "))
            })
    }
}

/// Build a conversion report analyzing what writing `dataset` to `to` with
/// `opts` will do.
///
/// This function examines the dataset and target format to determine:
/// - Input/output counts
/// - What would make the writer refuse the dataset (errors)
/// - What information will be lost (warnings)
/// - What policy decisions apply (info notes)
pub fn build_conversion_report(
    dataset: &PoseDataset,
    to: Format,
    opts: &WriteOptions,
) -> ConversionReport {
    let from = dataset
        .metadata
        .source_software
        .as_ref()
        .map_or("posetracks", |s| s.vendor().name());
    let mut report = ConversionReport::new(from, to.name());

    report.input = ConversionCounts {
        files: 1,
        frames: dataset.n_frames(),
        individuals: dataset.n_individuals(),
        keypoints: dataset.n_keypoints(),
    };
    report.output = report.input.clone();

    match to {
        Format::DlcCsv | Format::DlcH5 => analyze_to_dlc(dataset, opts, &mut report),
        Format::LightningPoseCsv => analyze_to_lp(dataset, opts, &mut report),
        Format::SleapAnalysisH5 => analyze_to_sleap(dataset, &mut report),
        Format::PoseJson => {}
    }

    report
}

/// Analyze conversion to DeepLabCut CSV or HDF5.
fn analyze_to_dlc(dataset: &PoseDataset, opts: &WriteOptions, report: &mut ConversionReport) {
    add_table_losses(dataset, report);

    match opts.split_individuals {
        SplitIndividuals::Yes => add_split_note(dataset, report),
        SplitIndividuals::Auto if dataset.n_individuals() == 1 => {
            report.add(ConversionIssue::info(
                ConversionIssueCode::SingleAnimalLayout,
                "one individual is written in the single-animal layout (no 'individuals' row)",
            ));
        }
        SplitIndividuals::Auto | SplitIndividuals::No => {}
    }
}

/// Analyze conversion to LightningPose CSV.
fn analyze_to_lp(dataset: &PoseDataset, opts: &WriteOptions, report: &mut ConversionReport) {
    add_table_losses(dataset, report);

    if opts.split_individuals == SplitIndividuals::Yes {
        add_split_note(dataset, report);
    } else if dataset.n_individuals() != 1 {
        report.add(ConversionIssue::error(
            ConversionIssueCode::TooManyIndividuals,
            format!(
                "LightningPose files hold one individual but the dataset has {}; \
                 enable split_individuals to write one file per individual",
                dataset.n_individuals()
            ),
        ));
    }
}

/// Losses shared by the DeepLabCut-style table formats.
fn add_table_losses(dataset: &PoseDataset, report: &mut ConversionReport) {
    add_time_policy(dataset, report);
    add_source_file_note(dataset, report);

    match &dataset.metadata.source_software {
        Some(SourceSoftware::Sleap {
            labels_path,
            video_path,
        }) if labels_path.is_some() || video_path.is_some() => {
            report.add(ConversionIssue::warning(
                ConversionIssueCode::DropSleapPaths,
                "SLEAP labels/video paths have no DeepLabCut equivalent and will be dropped",
            ));
        }
        _ => {}
    }

    let has_scorer = dataset
        .metadata
        .source_software
        .as_ref()
        .and_then(|s| s.scorer())
        .is_some();
    if !has_scorer {
        report.add(ConversionIssue::info(
            ConversionIssueCode::DefaultScorer,
            format!("no scorer is known; '{}' is written instead", DEFAULT_SCORER),
        ));
    }
}

/// Analyze conversion to a SLEAP analysis file.
fn analyze_to_sleap(dataset: &PoseDataset, report: &mut ConversionReport) {
    if dataset.n_space() != 2 {
        report.add(ConversionIssue::error(
            ConversionIssueCode::UnsupportedSpace,
            format!(
                "SLEAP analysis files hold 2-D poses but the dataset has {} spatial dimensions",
                dataset.n_space()
            ),
        ));
    }

    add_time_policy(dataset, report);
    add_source_file_note(dataset, report);

    if let Some(scorer) = dataset
        .metadata
        .source_software
        .as_ref()
        .and_then(|s| s.scorer())
    {
        report.add(ConversionIssue::warning(
            ConversionIssueCode::DropScorer,
            format!("scorer '{}' has no SLEAP equivalent and will be dropped", scorer),
        ));
    }

    let Ok(frames) = dataset.frame_indices() else {
        return;
    };
    let (Some(&first), Some(&last)) = (frames.first(), frames.last()) else {
        return;
    };

    let span = match dense_frame_span(&frames) {
        Some(span) if span <= MAX_DENSE_FRAMES => span,
        _ => {
            report.add(ConversionIssue::error(
                ConversionIssueCode::FrameSpanTooLarge,
                format!(
                    "frames {} to {} cannot be filled into a SLEAP analysis file \
                     (at most {} frames)",
                    first, last, MAX_DENSE_FRAMES
                ),
            ));
            return;
        }
    };
    report.output.frames = span;
    if span > frames.len() {
        report.add(ConversionIssue::info(
            ConversionIssueCode::FillFrameGaps,
            format!(
                "{} missing frame(s) between {} and {} are written as unoccupied",
                span - frames.len(),
                first,
                last
            ),
        ));
    }
    if first != 0 {
        report.add(ConversionIssue::warning(
            ConversionIssueCode::DropFrameOffset,
            format!(
                "frames start at {}; the analysis file numbers them from 0",
                first
            ),
        ));
    }
}

/// Frame rate loss and seconds-to-frames conversion.
fn add_time_policy(dataset: &PoseDataset, report: &mut ConversionReport) {
    if dataset.frame_indices().is_err() {
        report.add(ConversionIssue::error(
            ConversionIssueCode::NoFrameIndices,
            "time is in seconds but no frame rate is set, so frame indices cannot be recovered",
        ));
        return;
    }

    if let Some(fps) = dataset.metadata.fps {
        report.add(ConversionIssue::warning(
            ConversionIssueCode::DropFrameRate,
            format!(
                "frame rate {} will be dropped; reload with fps to restore time in seconds",
                fps
            ),
        ));
        report.add(ConversionIssue::info(
            ConversionIssueCode::TimeToFrameIndices,
            "time in seconds is written as frame indices, round(t * fps)",
        ));
    }
}

fn add_source_file_note(dataset: &PoseDataset, report: &mut ConversionReport) {
    if let Some(path) = &dataset.metadata.source_file {
        report.add(ConversionIssue::info(
            ConversionIssueCode::DropSourceFile,
            format!("source file path {} is not stored", path.display()),
        ));
    }
}

fn add_split_note(dataset: &PoseDataset, report: &mut ConversionReport) {
    report.output.files = dataset.n_individuals();
    report.output.individuals = 1;
    report.add(ConversionIssue::info(
        ConversionIssueCode::SplitIndividuals,
        format!(
            "{} individual(s) are written to separate files named <stem>_<individual>",
            dataset.n_individuals()
        ),
    ));
}
