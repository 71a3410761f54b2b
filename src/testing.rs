//! Testing support for fan-out pipelines.
//!
//! Shipped as part of the crate so downstream pipelines can write tests
//! against the same helpers this crate uses:
//!
//! - **Frame assertions**: [`assert_frames_equal`] with relative tolerance
//!   and per-dimension difference reporting, [`assert_same_elements`] for
//!   completion-order runner output
//! - **Builders**: [`FrameBuilder`] for fluent frame construction
//! - **Fixtures**: the AR6 illustrative pathway model/scenario pairs and
//!   per-frame test-case derivation
//! - **Progress recording**: [`RecordingProgress`] captures the event stream
//!   the runner emits, so dispatch behavior is assertable without a console
//!
//! # Quick start
//!
//! ```
//! use fanout::run_parallel;
//! use fanout::testing::{FrameBuilder, assert_frames_equal};
//! use fanout::validation::assert_single_group;
//!
//! # fn main() -> anyhow::Result<()> {
//! let frame = FrameBuilder::new(&["model", "scenario", "variable", "unit"], &[2030])
//!     .row(&["AIM", "SSP2", "Emissions|CO2", "Mt CO2/yr"], &[40.0])
//!     .build();
//!
//! let out = run_parallel(
//!     |group: fanout::TimeseriesFrame| {
//!         assert_single_group(&group)?;
//!         Ok(group)
//!     },
//!     frame.split_groups(),
//!     "identity",
//!     1,
//! )?;
//! assert_frames_equal(&out[0], &frame, 1e-8);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

use crate::progress::{Phase, Progress};
use std::sync::Mutex;

/// One progress callback, as recorded by [`RecordingProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Begin(Phase, String, usize),
    Advance(Phase),
    Finish(Phase),
}

/// Progress observer that records every callback for later assertions.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far, in callback order.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Number of [`ProgressEvent::Advance`] events seen for a phase.
    #[must_use]
    pub fn advances(&self, phase: Phase) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Advance(p) if *p == phase))
            .count()
    }
}

impl Progress for RecordingProgress {
    fn begin(&self, phase: Phase, desc: &str, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push(ProgressEvent::Begin(phase, desc.to_string(), total));
    }

    fn advance(&self, phase: Phase) {
        self.events.lock().unwrap().push(ProgressEvent::Advance(phase));
    }

    fn finish(&self, phase: Phase) {
        self.events.lock().unwrap().push(ProgressEvent::Finish(phase));
    }
}

/// Write a frame to a fresh temporary directory and return both.
///
/// The returned [`tempfile::TempDir`] keeps the file alive; dropping it
/// removes the file.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created.
#[cfg(feature = "io-csv")]
pub fn temp_frame_csv(
    frame: &crate::frame::TimeseriesFrame,
) -> anyhow::Result<(tempfile::TempDir, std::path::PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("frame.csv");
    crate::io::csv::write_timeseries_csv(frame, &path)?;
    Ok((dir, path))
}
