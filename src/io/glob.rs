//! Glob expansion for batch timeseries loading.
//!
//! Scenario archives typically land as one CSV per model/scenario pair
//! (`ar6_scenarios__*__emissions.csv`). These helpers expand such patterns
//! into a deterministic, sorted file list for the batch loader.

use anyhow::{Context, Result, bail};
use glob::glob;
use std::path::PathBuf;

/// Expand a glob pattern into a sorted vector of matching file paths.
///
/// Standard glob syntax: `*` within a path component, `?` for a single
/// character, `**` across directories, `[abc]` character sets. Only files are
/// returned, never directories, and the result is sorted lexicographically so
/// downstream concatenation order is deterministic.
///
/// Zero matches is not an error here; use [`expand_glob_required`] when at
/// least one file is expected.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or a filesystem entry cannot
/// be read.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }
    result.sort();

    Ok(result)
}

/// Expand a glob pattern, erroring when nothing matches.
///
/// The strict variant of [`expand_glob`], for callers that treat a missing
/// input set as a configuration mistake rather than an empty batch.
///
/// # Errors
///
/// As [`expand_glob`], plus an error when the pattern matches no files.
pub fn expand_glob_required(pattern: &str) -> Result<Vec<PathBuf>> {
    let files = expand_glob(pattern)?;
    if files.is_empty() {
        bail!("no files found matching pattern: {pattern}");
    }
    Ok(files)
}
