//! Process-wide memoization of timeseries CSV loads.
//!
//! Pipelines touch the same archive files over and over, once per fan-out
//! batch, and the loads dominate setup time. [`FrameCache`] memoizes
//! [`read_timeseries_csv`] results keyed by the call arguments (canonical
//! path plus index columns), with no eviction, and hands out `Arc` clones so
//! repeated loads share one frame in memory.
//!
//! The cache never holds runner outputs, only loaded inputs. Failed loads
//! are not cached; a later call retries from disk.

use crate::frame::TimeseriesFrame;
use crate::io::csv::read_timeseries_csv;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

/// Memoization table for timeseries CSV loads.
///
/// Keys are the canonicalized file path and the index-column list, so the
/// same file loaded with different dimension sets gets distinct entries.
#[derive(Default)]
pub struct FrameCache {
    entries: Mutex<HashMap<(PathBuf, Vec<String>), Arc<TimeseriesFrame>>>,
}

impl FrameCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a timeseries CSV through the cache.
    ///
    /// A hit returns a clone of the cached `Arc` without touching the disk.
    /// A miss loads the file, stores the frame, and returns it; if the load
    /// fails nothing is stored and the error propagates.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be canonicalized or the load
    /// fails (see [`read_timeseries_csv`]).
    pub fn load(
        &self,
        path: impl AsRef<Path>,
        index_columns: &[&str],
    ) -> Result<Arc<TimeseriesFrame>> {
        let path = path.as_ref();
        let canonical = path
            .canonicalize()
            .with_context(|| format!("canonicalize {}", path.display()))?;
        let key = (
            canonical,
            index_columns.iter().map(|c| (*c).to_string()).collect(),
        );

        if let Some(hit) = self.entries.lock().unwrap().get(&key) {
            return Ok(Arc::clone(hit));
        }

        // Load outside the lock; concurrent misses may load twice, the
        // first insert wins and both callers get the same entry.
        let frame = Arc::new(read_timeseries_csv(&key.0, index_columns)?);
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(key).or_insert(frame);
        Ok(Arc::clone(entry))
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

/// The process-wide frame cache.
pub fn frame_cache() -> &'static FrameCache {
    static CACHE: OnceLock<FrameCache> = OnceLock::new();
    CACHE.get_or_init(FrameCache::new)
}
