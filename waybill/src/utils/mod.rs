//! Utilities for path collection and output naming.

use crate::{Result, error::WaybillError};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};

const CASE_INSENSITIVE: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// List every `*.pdf` file directly inside `dir`, sorted by path.
///
/// The extension match is case-insensitive. A missing directory yields an
/// empty list; callers decide whether that is an error.
pub fn collect_pdf_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    collect_matching(dir, "*.pdf")
}

/// List the files directly inside `dir` whose names match `file_pattern`.
///
/// `file_pattern` is a glob applied to the file name only, matched without
/// regard to case. Results are sorted by path; directories are skipped.
///
/// Errors:
/// - `dir` is not valid UTF-8 or `file_pattern` is not a valid glob.
/// - A directory entry could not be read.
pub fn collect_matching(dir: &Path, file_pattern: &str) -> Result<Vec<PathBuf>> {
    let dir_str = dir.to_str().ok_or_else(|| {
        WaybillError::other(format!("Directory path is not valid UTF-8: {}", dir.display()))
    })?;

    let pattern = format!("{}/{file_pattern}", Pattern::escape(dir_str));
    let paths = glob::glob_with(&pattern, CASE_INSENSITIVE).map_err(|err| WaybillError::Other {
        message: err.to_string(),
    })?;

    let mut resolved_paths = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| WaybillError::Other {
            message: err.to_string(),
        })?;
        if path.is_file() {
            resolved_paths.push(path);
        }
    }

    resolved_paths.sort();
    Ok(resolved_paths)
}

/// File name of `path` as UTF-8, lossily converted.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
