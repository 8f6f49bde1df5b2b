//! Typed provenance metadata attached to every pose dataset.
//!
//! Each vendor variant of [`SourceSoftware`] carries only the provenance that
//! vendor's files can express, so which fields survive a write is decided by
//! a `match` rather than by probing a free-form map.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::coords::TimeUnit;

/// Descriptive metadata about a dataset.
///
/// Nothing here is needed to interpret the tensors, except that `fps`
/// converts second-based time coordinates back to frame indices on write.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Frames per second of the source video, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,

    /// Unit of the time coordinate.
    #[serde(default)]
    pub time_unit: TimeUnit,

    /// The software that produced the source file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_software: Option<SourceSoftware>,

    /// Path of the file the dataset was loaded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<PathBuf>,
}

/// A supported pose-estimation tool, without provenance details.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vendor {
    DeepLabCut,
    Sleap,
    LightningPose,
}

impl Vendor {
    /// The tool's conventional name.
    pub fn name(&self) -> &'static str {
        match self {
            Vendor::DeepLabCut => "DeepLabCut",
            Vendor::Sleap => "SLEAP",
            Vendor::LightningPose => "LightningPose",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deeplabcut" | "dlc" => Ok(Vendor::DeepLabCut),
            "sleap" => Ok(Vendor::Sleap),
            "lightningpose" | "lightning-pose" | "lp" => Ok(Vendor::LightningPose),
            other => Err(format!(
                "unknown source software '{}' (supported: DeepLabCut, SLEAP, LightningPose)",
                other
            )),
        }
    }
}

/// The software that produced a dataset, with the provenance its files carry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum SourceSoftware {
    /// DeepLabCut: the network name is stored in the `scorer` header row.
    DeepLabCut {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scorer: Option<String>,
    },

    /// SLEAP analysis file: paths to the originating labels and video.
    #[serde(rename = "SLEAP")]
    Sleap {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        labels_path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        video_path: Option<String>,
    },

    /// LightningPose: a single-animal DeepLabCut-style table.
    LightningPose {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scorer: Option<String>,
    },
}

impl SourceSoftware {
    pub fn vendor(&self) -> Vendor {
        match self {
            SourceSoftware::DeepLabCut { .. } => Vendor::DeepLabCut,
            SourceSoftware::Sleap { .. } => Vendor::Sleap,
            SourceSoftware::LightningPose { .. } => Vendor::LightningPose,
        }
    }

    /// The scorer name, for the DeepLabCut-style table formats.
    pub fn scorer(&self) -> Option<&str> {
        match self {
            SourceSoftware::DeepLabCut { scorer } | SourceSoftware::LightningPose { scorer } => {
                scorer.as_deref()
            }
            SourceSoftware::Sleap { .. } => None,
        }
    }
}

impl fmt::Display for SourceSoftware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.vendor().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_parses_common_spellings() {
        assert_eq!("DeepLabCut".parse::<Vendor>(), Ok(Vendor::DeepLabCut));
        assert_eq!("SLEAP".parse::<Vendor>(), Ok(Vendor::Sleap));
        assert_eq!("lightning-pose".parse::<Vendor>(), Ok(Vendor::LightningPose));
        assert!("napari".parse::<Vendor>().is_err());
    }

    #[test]
    fn scorer_only_for_table_formats() {
        let dlc = SourceSoftware::DeepLabCut {
            scorer: Some("DLC_resnet50".into()),
        };
        let sleap = SourceSoftware::Sleap {
            labels_path: Some("labels.slp".into()),
            video_path: None,
        };
        assert_eq!(dlc.scorer(), Some("DLC_resnet50"));
        assert_eq!(sleap.scorer(), None);
    }

    #[test]
    fn metadata_serializes_with_tagged_source() {
        let meta = Metadata {
            fps: Some(50.0),
            time_unit: TimeUnit::Seconds,
            source_software: Some(SourceSoftware::Sleap {
                labels_path: None,
                video_path: None,
            }),
            source_file: None,
        };
        let json = serde_json::to_string(&meta).expect("serialize");
        assert!(json.contains("\"name\":\"SLEAP\""));
        assert!(json.contains("\"time_unit\":\"seconds\""));

        let back: Metadata = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, meta);
    }
}
