//! The sample-data registry (`metadata.yaml`).
//!
//! The remote repository describes each sample file in one YAML mapping
//! keyed by file name:
//!
//! ```yaml
//! DLC_single-wasp.predictions.h5:
//!   file_name: DLC_single-wasp.predictions.h5
//!   sha256sum: 31719e4ac3ea4ba...
//!   source_software: DeepLabCut
//!   type: poses
//!   fps: 40
//!   species: wasp
//!   number_of_individuals: 1
//!   shared_by:
//!     name: ...
//!     affiliation: ...
//!   frame:
//!     file_name: single-wasp_frame-10sec.png
//!     sha256sum: ...
//!   video: ...
//!   note: ...
//! ```
//!
//! Older registries list the same entries as a sequence; both are accepted.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PoseError;
use crate::ir::Vendor;

/// One sample file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleEntry {
    pub file_name: String,
    pub sha256sum: String,
    pub source_software: String,
    /// `poses` for pose tracks; other kinds are listed but not loadable.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_individuals: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_by: Option<Contributor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<Companion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Companion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SampleEntry {
    /// True for pose-track files.
    pub fn is_poses(&self) -> bool {
        self.kind.as_deref().map_or(true, |kind| kind == "poses")
    }

    /// The software that produced the file.
    pub fn vendor(&self) -> Result<Vendor, PoseError> {
        self.source_software
            .parse()
            .map_err(|message| PoseError::Download {
                name: self.file_name.clone(),
                message,
            })
    }
}

/// Who contributed a sample file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub affiliation: Option<String>,
}

/// A frame or video that accompanies a sample file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Companion {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub sha256sum: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    Map(BTreeMap<String, SampleEntry>),
    List(Vec<SampleEntry>),
}

/// All known sample files, keyed by file name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleRegistry {
    entries: BTreeMap<String, SampleEntry>,
}

impl SampleRegistry {
    /// Parses a registry; `path` is only used in error messages.
    pub fn from_yaml_str(yaml: &str, path: &Path) -> Result<Self, PoseError> {
        let file: RegistryFile =
            serde_yaml::from_str(yaml).map_err(|source| PoseError::RegistryParse {
                path: path.to_path_buf(),
                source,
            })?;

        let entries = match file {
            RegistryFile::Map(map) => map.into_values().collect::<Vec<_>>(),
            RegistryFile::List(list) => list,
        };
        Ok(Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.file_name.clone(), entry))
                .collect(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&SampleEntry> {
        self.entries.get(name)
    }

    /// Names of the pose-track files, sorted.
    pub fn pose_names(&self) -> Vec<String> {
        self.entries
            .values()
            .filter(|entry| entry.is_poses())
            .map(|entry| entry.file_name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleEntry> {
        self.entries.values()
    }
}
