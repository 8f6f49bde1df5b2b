//! Conversion report types for tracking lossiness and policy decisions.
//!
//! This module provides structured reporting for writes to vendor formats,
//! similar to how `validation::ValidationReport` tracks dataset issues.

use serde::Serialize;
use std::fmt;

/// A report describing what writing a dataset to a target format will do.
///
/// Tracks input/output counts, blockers, lossiness warnings and policy
/// decisions, so the lossy-write policy is visible before any file is
/// written.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Source format or software name.
    pub from: String,
    /// Target format name.
    pub to: String,
    /// Counts from the input dataset.
    pub input: ConversionCounts,
    /// Counts in the output (files and frames may differ).
    pub output: ConversionCounts,
    /// Issues discovered during conversion analysis.
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    /// Create a new empty report for a conversion between formats.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    fn count(&self, severity: ConversionSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Count of error-level issues (the write would fail).
    pub fn error_count(&self) -> usize {
        self.count(ConversionSeverity::Error)
    }

    /// Count of warning-level issues (true lossiness).
    pub fn warning_count(&self) -> usize {
        self.count(ConversionSeverity::Warning)
    }

    /// Count of info-level issues (policy decisions, notes).
    pub fn info_count(&self) -> usize {
        self.count(ConversionSeverity::Info)
    }

    /// Returns true if the write cannot proceed with these options.
    pub fn is_blocked(&self) -> bool {
        self.error_count() > 0
    }

    /// Returns true if this conversion would lose information.
    ///
    /// A conversion is lossy if it has any warning-level issues.
    pub fn is_lossy(&self) -> bool {
        self.warning_count() > 0
    }

    /// True if an issue with `code` was reported.
    pub fn has(&self, code: ConversionIssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    /// Iterate over warning messages.
    pub fn lossy_messages(&self) -> impl Iterator<Item = &str> {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .map(|i| i.message.as_str())
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} -> {}", self.from, self.to)?;
        writeln!(
            f,
            "  {} frames, {} individuals, {} keypoints",
            self.input.frames, self.input.individuals, self.input.keypoints
        )?;

        // Show output counts if they differ from input
        if self.output != self.input {
            writeln!(
                f,
                "  output: {} file(s), {} frames, {} individuals, {} keypoints",
                self.output.files,
                self.output.frames,
                self.output.individuals,
                self.output.keypoints
            )?;
        }

        for (severity, title) in [
            (ConversionSeverity::Error, "Errors"),
            (ConversionSeverity::Warning, "Warnings"),
            (ConversionSeverity::Info, "Notes"),
        ] {
            let count = self.count(severity);
            if count == 0 {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{} ({}):", title, count)?;
            for issue in self.issues.iter().filter(|i| i.severity == severity) {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// Counts of dataset elements.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionCounts {
    pub files: usize,
    pub frames: usize,
    pub individuals: usize,
    pub keypoints: usize,
}

/// A single issue discovered during conversion analysis.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    /// Create an error-level issue (the write will fail).
    pub fn error(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Error,
            code,
            message: message.into(),
        }
    }

    /// Create a warning-level issue (indicates lossiness).
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Create an info-level issue (policy note, does not block).
    pub fn info(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

/// Severity level for conversion issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    /// The writer will refuse the dataset with these options.
    Error,
    /// Information will be lost.
    Warning,
    /// A policy decision; nothing is lost.
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON schema and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    // Blockers
    /// The target holds one individual per file and splitting is off.
    TooManyIndividuals,
    /// The target cannot hold this many spatial dimensions.
    UnsupportedSpace,
    /// Time is in seconds but no frame rate converts it back to frames.
    NoFrameIndices,
    /// Filling the gaps between the first and last frame needs too many frames.
    FrameSpanTooLarge,

    // Lossiness
    /// Frame rate and second-based time coordinates will be dropped.
    DropFrameRate,
    /// SLEAP labels and video paths will be dropped.
    DropSleapPaths,
    /// The DeepLabCut/LightningPose scorer will be dropped.
    DropScorer,
    /// Frame indices will be renumbered from zero.
    DropFrameOffset,

    // Policy decisions (Info level)
    /// The source file path is not stored in the output.
    DropSourceFile,
    /// Seconds are converted back to frame indices with `round(t * fps)`.
    TimeToFrameIndices,
    /// No scorer is known, so the default one is written.
    DefaultScorer,
    /// Each individual is written to its own file.
    SplitIndividuals,
    /// Missing frames between the first and last are written as unoccupied.
    FillFrameGaps,
    /// A single individual is written without an `individuals` level.
    SingleAnimalLayout,
}
