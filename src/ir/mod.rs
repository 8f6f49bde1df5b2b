//! Intermediate Representation (IR) for posetracks.
//!
//! This module defines the canonical, vendor-agnostic representation of pose
//! tracks. It is the hub every conversion passes through: readers turn a
//! vendor file into a [`PoseDataset`] and writers turn a [`PoseDataset`]
//! back into a vendor file.
//!
//! # Design Principles
//!
//! 1. **Labelled tensors**: positions are a 4-D array indexed
//!    (time, individuals, keypoints, space) and confidence a 3-D array over
//!    the first three axes, with names carried alongside.
//!
//! 2. **Typed metadata**: provenance is a tagged [`SourceSoftware`] variant,
//!    so which fields survive a write is decided by a `match`.
//!
//! 3. **Permissive Construction**: fields are public and may hold
//!    inconsistent values; [`crate::validation`] reports them instead of
//!    anything panicking.
//!
//! # Example
//!
//! ```
//! use ndarray::{Array3, Array4};
//! use posetracks::ir::{assemble, RawPoses};
//!
//! let raw = RawPoses::new(Array4::zeros((100, 1, 2, 2)))
//!     .with_confidence(Array3::from_elem((100, 1, 2), 0.9))
//!     .with_keypoints(["snout", "tail"]);
//! let dataset = assemble(raw, Some(30.0))?;
//! assert_eq!(dataset.time.value(90), Some(3.0));
//! # Ok::<(), posetracks::PoseError>(())
//! ```

mod assemble;
mod coords;
pub(crate) mod dlc_table;
mod metadata;
mod model;
mod options;
mod select;

#[cfg(feature = "hdf5")]
mod h5_util;

pub mod io_dlc_csv;
#[cfg(feature = "hdf5")]
pub mod io_dlc_h5;
pub mod io_json;
pub mod io_lp_csv;
#[cfg(feature = "hdf5")]
pub mod io_sleap_h5;

// Re-export core types for convenient access
pub use assemble::{assemble, default_names, RawPoses};
pub use coords::{
    dense_frame_span, space_labels, TimeCoords, TimeUnit, MAX_DENSE_FRAMES, SPACE_2D, SPACE_3D,
};
pub use dlc_table::{DEFAULT_SCORER, LIKELIHOOD};
pub use metadata::{Metadata, SourceSoftware, Vendor};
pub use model::PoseDataset;
pub use options::{SplitIndividuals, WriteOptions};
pub use select::{IndexSelection, Selection, TimeRange};
