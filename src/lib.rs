//! Posetracks: load, select and convert animal pose-tracking outputs.
//!
//! Posetracks reads the prediction files written by pose-estimation tools
//! (DeepLabCut, SLEAP and LightningPose) into one normalized representation,
//! and writes that representation back out in any of the supported formats.
//! Every conversion goes through the intermediate representation (IR), so
//! N formats need only 2N converters.
//!
//! # Modules
//!
//! - [`ir`]: the [`PoseDataset`] IR, its assembler, selection and the
//!   per-format readers and writers
//! - [`load`] and [`save`]: path-based entry points that pick the format
//! - [`conversion`]: format identifiers and the report of what a write drops
//! - [`filtering`]: confidence thresholding
//! - [`validation`]: dataset and file checks
//! - [`sample_data`]: downloading verified sample files
//! - [`error`]: error types for posetracks operations
//!
//! # Features
//!
//! - `hdf5`: DeepLabCut `.h5` and SLEAP analysis `.h5` support (needs the
//!   HDF5 C library).
//! - `remote`: an HTTP transport for [`sample_data`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use posetracks::{filtering, load, save, Selection, WriteOptions};
//!
//! let poses = load::from_dlc_file(Path::new("video1DLC_resnet50.csv"), Some(30.0))?;
//! let nose = poses.sel(&Selection::new().keypoints(["nose"]))?;
//! let (clean, report) = filtering::filter_by_confidence(&nose, 0.9)?;
//! println!("{}", report);
//! save::to_pose_json_file(&clean, Path::new("nose.json"), &WriteOptions::default())?;
//! # Ok::<(), posetracks::PoseError>(())
//! ```

pub mod conversion;
pub mod error;
pub mod filtering;
pub mod ir;
pub mod load;
pub mod sample_data;
pub mod save;
pub mod validation;

pub use conversion::{build_conversion_report, ConversionReport, Format};
pub use error::PoseError;
pub use ir::{
    IndexSelection, Metadata, PoseDataset, Selection, SourceSoftware, SplitIndividuals, TimeRange,
    TimeUnit, Vendor, WriteOptions,
};
