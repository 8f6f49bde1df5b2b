//! Small helpers over the `hdf5` crate shared by the HDF5 formats.

use std::path::Path;
use std::str::FromStr;

use hdf5::types::{FixedAscii, FixedUnicode, VarLenAscii, VarLenUnicode};
use hdf5::{Dataset, Group, Location};
use ndarray::{Array1, ArrayD};

use crate::error::PoseError;

/// Maps `hdf5` errors onto [`PoseError::Hdf5`] for `path`.
pub(crate) fn h5_err(path: &Path) -> impl Fn(hdf5::Error) -> PoseError + '_ {
    move |source| PoseError::Hdf5 {
        path: path.to_path_buf(),
        source,
    }
}

/// True if `group` has a direct member called `name`.
pub(crate) fn has_member(group: &Group, name: &str) -> bool {
    group.link_exists(name)
}

/// Reads a numeric dataset of any float or integer type as `f64`.
pub(crate) fn read_f64(group: &Group, name: &str, path: &Path) -> Result<ArrayD<f64>, PoseError> {
    group
        .dataset(name)
        .and_then(|ds| ds.read_dyn::<f64>())
        .map_err(h5_err(path))
}

/// Reads a 1-D dataset of strings.
///
/// Python writers store names as fixed-length byte strings (`numpy` `S`
/// dtype) or as variable-length UTF-8, depending on the tool and version, so
/// each representation is tried in turn.
pub(crate) fn read_strings(group: &Group, name: &str, path: &Path) -> Result<Vec<String>, PoseError> {
    let ds = group.dataset(name).map_err(h5_err(path))?;

    if let Ok(values) = ds.read_1d::<VarLenUnicode>() {
        return Ok(values.iter().map(|s| s.as_str().to_string()).collect());
    }
    if let Ok(values) = ds.read_1d::<VarLenAscii>() {
        return Ok(values.iter().map(|s| s.as_str().to_string()).collect());
    }
    if let Ok(values) = ds.read_1d::<FixedUnicode<256>>() {
        return Ok(values.iter().map(|s| s.as_str().to_string()).collect());
    }
    ds.read_1d::<FixedAscii<256>>()
        .map(|values| values.iter().map(|s| s.as_str().to_string()).collect())
        .map_err(h5_err(path))
}

/// Reads a scalar string dataset, if present and readable.
pub(crate) fn read_string_scalar(group: &Group, name: &str) -> Option<String> {
    let ds = group.dataset(name).ok()?;
    scalar_string(&ds).filter(|s| !s.is_empty())
}

fn scalar_string(ds: &Dataset) -> Option<String> {
    if let Ok(value) = ds.read_scalar::<VarLenUnicode>() {
        return Some(value.as_str().to_string());
    }
    if let Ok(value) = ds.read_scalar::<VarLenAscii>() {
        return Some(value.as_str().to_string());
    }
    ds.read_scalar::<FixedAscii<1024>>()
        .ok()
        .map(|value| value.as_str().to_string())
}

fn to_h5_string(value: &str, path: &Path) -> Result<VarLenUnicode, PoseError> {
    VarLenUnicode::from_str(value).map_err(|e| {
        PoseError::format(
            path,
            "HDF5",
            format!("cannot store string {:?}: {}", value, e),
        )
    })
}

/// Longest name, in bytes, that [`write_strings`] can store.
pub(crate) const MAX_NAME_BYTES: usize = 256;

/// Writes a 1-D dataset of fixed-length byte strings (`numpy` `S` dtype).
///
/// pandas and PyTables expect index and level names in this layout. The
/// element size is the smallest of 16, 64 or 256 bytes that fits the longest
/// value. Names that are not pure ASCII are stored as fixed-length UTF-8.
pub(crate) fn write_strings(
    group: &Group,
    name: &str,
    values: &[String],
    path: &Path,
) -> Result<Dataset, PoseError> {
    let longest = values.iter().map(String::len).max().unwrap_or(0);
    let ascii = values.iter().all(|v| v.is_ascii());
    match longest {
        0..=16 if ascii => write_fixed_ascii::<16>(group, name, values, path),
        0..=16 => write_fixed_utf8::<16>(group, name, values, path),
        17..=64 if ascii => write_fixed_ascii::<64>(group, name, values, path),
        17..=64 => write_fixed_utf8::<64>(group, name, values, path),
        65..=MAX_NAME_BYTES if ascii => write_fixed_ascii::<MAX_NAME_BYTES>(group, name, values, path),
        65..=MAX_NAME_BYTES => write_fixed_utf8::<MAX_NAME_BYTES>(group, name, values, path),
        _ => Err(PoseError::format(
            path,
            "HDF5",
            format!(
                "{}: a name is {} bytes long, longer than the {} byte limit",
                name, longest, MAX_NAME_BYTES
            ),
        )),
    }
}

fn write_fixed_ascii<const N: usize>(
    group: &Group,
    name: &str,
    values: &[String],
    path: &Path,
) -> Result<Dataset, PoseError> {
    let data = values
        .iter()
        .map(|v| {
            FixedAscii::<N>::from_ascii(v.as_bytes()).map_err(|e| {
                PoseError::format(path, "HDF5", format!("cannot store string {:?}: {}", v, e))
            })
        })
        .collect::<Result<Array1<_>, _>>()?;
    group
        .new_dataset_builder()
        .with_data(&data)
        .create(name)
        .map_err(h5_err(path))
}

fn write_fixed_utf8<const N: usize>(
    group: &Group,
    name: &str,
    values: &[String],
    path: &Path,
) -> Result<Dataset, PoseError> {
    let data = values
        .iter()
        .map(|v| {
            FixedUnicode::<N>::from_str(v).map_err(|e| {
                PoseError::format(path, "HDF5", format!("cannot store string {:?}: {}", v, e))
            })
        })
        .collect::<Result<Array1<_>, _>>()?;
    group
        .new_dataset_builder()
        .with_data(&data)
        .create(name)
        .map_err(h5_err(path))
}

/// Writes a scalar variable-length UTF-8 string dataset.
pub(crate) fn write_string_scalar(
    group: &Group,
    name: &str,
    value: &str,
    path: &Path,
) -> Result<(), PoseError> {
    let value = ndarray::arr0(to_h5_string(value, path)?);
    group
        .new_dataset_builder()
        .with_data(&value)
        .create(name)
        .map_err(h5_err(path))?;
    Ok(())
}

/// Writes a scalar string attribute.
pub(crate) fn write_attr_str(
    location: &Location,
    name: &str,
    value: &str,
    path: &Path,
) -> Result<(), PoseError> {
    let value = ndarray::arr0(to_h5_string(value, path)?);
    location
        .new_attr_builder()
        .with_data(&value)
        .create(name)
        .map_err(h5_err(path))?;
    Ok(())
}

/// Writes a scalar integer attribute.
pub(crate) fn write_attr_int(
    location: &Location,
    name: &str,
    value: i64,
    path: &Path,
) -> Result<(), PoseError> {
    location
        .new_attr_builder()
        .with_data(&ndarray::arr0(value))
        .create(name)
        .map_err(h5_err(path))?;
    Ok(())
}
