//! Path checks performed before a reader or writer touches a file.

use std::path::Path;

use crate::error::PoseError;

/// How a file is about to be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// The file must exist and be readable.
    Read,
    /// The file will be created; an existing file is only replaced when
    /// `overwrite` is set.
    Write { overwrite: bool },
}

/// Checks that `path` is usable for `access` and carries one of the
/// expected suffixes (e.g. `".csv"`, compared ignoring ASCII case). An
/// empty suffix list skips that check.
///
/// # Errors
/// Returns `InvalidFile` if the path is a directory, a file to read does not
/// exist, a file to write already exists (without `overwrite`) or its parent
/// directory is missing or read-only, or the suffix is not expected.
pub fn check_file(path: &Path, access: Access, expected_suffixes: &[&str]) -> Result<(), PoseError> {
    let invalid = |message: String| PoseError::InvalidFile {
        path: path.to_path_buf(),
        message,
    };

    if path.is_dir() {
        return Err(invalid(
            "expected a file path but got a directory".to_string(),
        ));
    }

    match access {
        Access::Read => {
            if !path.exists() {
                return Err(invalid("file does not exist".to_string()));
            }
        }
        Access::Write { overwrite } => {
            if path.exists() && !overwrite {
                return Err(invalid(
                    "file already exists (set overwrite to replace it)".to_string(),
                ));
            }

            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            let parent_meta = parent.metadata().map_err(|_| {
                invalid(format!(
                    "parent directory {} does not exist",
                    parent.display()
                ))
            })?;
            if parent_meta.permissions().readonly() {
                return Err(invalid(format!(
                    "unable to write to {}; check write permissions",
                    parent.display()
                )));
            }
        }
    }

    if !expected_suffixes.is_empty() {
        let suffix = file_suffix(path);
        if !expected_suffixes
            .iter()
            .any(|expected| expected.eq_ignore_ascii_case(&suffix))
        {
            return Err(invalid(format!(
                "expected file with suffix(es) {:?} but got suffix '{}'",
                expected_suffixes, suffix
            )));
        }
    }

    Ok(())
}

/// The final extension of `path` including the leading dot, or an empty
/// string when there is none.
pub fn file_suffix(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
