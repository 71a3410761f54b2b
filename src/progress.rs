//! Progress reporting for the three phases of a run.
//!
//! The runner reports progress through the [`Progress`] trait so its
//! correctness stays testable without any console output. The console
//! implementation renders one indicatif bar per phase; library embedders can
//! pass [`NoProgress`] to stay silent.
//!
//! Progress is purely observational. Nothing an implementation does can
//! change what the runner computes or returns.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;

/// One phase of a run, as seen by a progress observer.
///
/// Serial runs go through [`Phase::Serial`] only; pool runs go through
/// [`Phase::Submit`] and then [`Phase::Retrieve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The sequential item loop (concurrency degree 1).
    Serial,
    /// Queuing work items to the pool.
    Submit,
    /// Receiving outcomes from the pool, in completion order.
    Retrieve,
}

impl Phase {
    /// Stable label for the phase.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Phase::Serial => "serial",
            Phase::Submit => "submit",
            Phase::Retrieve => "retrieve",
        }
    }
}

/// Observer for run progress.
///
/// All calls arrive from the orchestrating thread. `begin` and `finish` come
/// in pairs per phase, with zero or more `advance` calls in between (one per
/// item). Implementations carry their own interior mutability.
pub trait Progress: Send + Sync {
    /// A phase is starting. `desc` is the caller's description of the input;
    /// `total` is the number of items the phase will advance through.
    fn begin(&self, phase: Phase, desc: &str, total: usize);

    /// One item was processed in the phase.
    fn advance(&self, phase: Phase);

    /// The phase is complete.
    fn finish(&self, phase: Phase);
}

/// Progress observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn begin(&self, _phase: Phase, _desc: &str, _total: usize) {}
    fn advance(&self, _phase: Phase) {}
    fn finish(&self, _phase: Phase) {}
}

/// Console progress bars, one per phase.
#[derive(Default)]
pub struct ConsoleProgress {
    bars: Mutex<HashMap<Phase, ProgressBar>>,
}

impl ConsoleProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn message_for(phase: Phase, desc: &str) -> String {
        match phase {
            Phase::Serial => desc.to_string(),
            Phase::Submit => format!("Submitting {desc} to queue"),
            Phase::Retrieve => "Retrieving parallel results".to_string(),
        }
    }
}

impl Progress for ConsoleProgress {
    fn begin(&self, phase: Phase, desc: &str, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap()
            .progress_chars("#>-"),
        );
        bar.set_message(Self::message_for(phase, desc));
        self.bars.lock().unwrap().insert(phase, bar);
    }

    fn advance(&self, phase: Phase) {
        if let Some(bar) = self.bars.lock().unwrap().get(&phase) {
            bar.inc(1);
        }
    }

    fn finish(&self, phase: Phase) {
        if let Some(bar) = self.bars.lock().unwrap().remove(&phase) {
            bar.finish();
        }
    }
}
