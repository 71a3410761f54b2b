//! Fan a fallible callable out over independent work items.
//!
//! The runner has two paths selected by the concurrency degree:
//!
//! - **degree 1** — a plain sequential loop, recommended for debugging: the
//!   callable runs on the calling thread, failures surface at the point of
//!   invocation, and panics are left uncaught so backtraces point straight at
//!   the offending item.
//! - **degree > 1** — a call-scoped pool of that many worker threads. Every
//!   item is submitted, then outcomes are collected as workers finish them.
//!
//! # Ordering hazard
//!
//! The two paths make different ordering promises. Serial runs return
//! `out[i] == func(items[i])` positionally. Pool runs return outcomes in
//! **completion order**, which need not match submission order; callers that
//! need to know which output belongs to which input must embed an identifying
//! key in each result themselves.
//!
//! # Example
//!
//! ```
//! use fanout::run_parallel;
//!
//! # fn main() -> anyhow::Result<()> {
//! let doubled = run_parallel(|x: i32| Ok(x * 2), vec![1, 2, 3], "double", 1)?;
//! assert_eq!(doubled, vec![2, 4, 6]);
//! # Ok(())
//! # }
//! ```

use crate::context::StartMethod;
use crate::pool::run_pool;
use crate::progress::{ConsoleProgress, NoProgress, Phase, Progress};
use anyhow::{Result, bail};
use std::sync::Arc;
use tracing::{debug, info};

/// Configured dispatcher for fan-out runs.
///
/// Carries the concurrency degree, an optional explicit [`StartMethod`], and
/// the progress observer. Build one when you need to pin the start method or
/// inject progress; otherwise [`run_parallel`] covers the common case.
pub struct Runner {
    degree: usize,
    start_method: Option<StartMethod>,
    progress: Arc<dyn Progress>,
}

impl Runner {
    /// Create a runner with the given concurrency degree and no progress
    /// output.
    ///
    /// Degree 1 selects the serial path; larger degrees set the pool size
    /// exactly. Degree 0 is rejected when the runner runs.
    #[must_use]
    pub fn new(degree: usize) -> Self {
        Self {
            degree,
            start_method: None,
            progress: Arc::new(NoProgress),
        }
    }

    /// Pin the worker start method, bypassing preferred/default resolution.
    #[must_use]
    pub fn with_start_method(mut self, method: StartMethod) -> Self {
        self.start_method = Some(method);
        self
    }

    /// Install a progress observer.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Run `func` over every item and collect the results.
    ///
    /// `desc` labels the progress output only; it never affects computation.
    /// See the module docs for the ordering contract of each path.
    ///
    /// # Errors
    ///
    /// Returns an error if the degree is 0, or propagates the first `Err` the
    /// callable produces: at the point of invocation on the serial path, at
    /// its retrieval point (completion order) on the pool path. The error
    /// value passes through unmodified either way, and no partial result
    /// collection is ever returned. Already-running siblings of a failed task
    /// are not cancelled; pool teardown reclaims them before the call
    /// returns.
    pub fn run<T, R, F>(&self, func: F, items: Vec<T>, desc: &str) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R> + Send + Sync,
    {
        if self.degree == 0 {
            bail!("concurrency degree must be at least 1, got 0");
        }

        let total = items.len();
        if self.degree == 1 {
            debug!("Running serially");
            self.progress.begin(Phase::Serial, desc, total);
            let mut out = Vec::with_capacity(total);
            for item in items {
                out.push(func(item)?);
                self.progress.advance(Phase::Serial);
            }
            self.progress.finish(Phase::Serial);
            return Ok(out);
        }

        let method = StartMethod::resolve(self.start_method);
        info!("Submitting {desc} to {} parallel workers", self.degree);

        if total == 0 {
            // Observers rely on paired begin/finish even when no pool spins up.
            for phase in [Phase::Submit, Phase::Retrieve] {
                self.progress.begin(phase, desc, 0);
                self.progress.finish(phase);
            }
            return Ok(Vec::new());
        }

        run_pool(&func, items, self.degree, method, self.progress.as_ref(), desc)
    }
}

/// Run `func` over every item with console progress bars.
///
/// The primary entry point: resolves the start method automatically
/// (preferred where offered, platform default otherwise) and reports progress
/// to the terminal. `degree == 1` runs serially in input order; larger
/// degrees fan out over a call-scoped pool and return results in completion
/// order (see the module docs for the ordering hazard).
///
/// # Errors
///
/// Propagates the first failure the callable produces, unmodified; rejects
/// degree 0.
pub fn run_parallel<T, R, F>(func: F, items: Vec<T>, desc: &str, degree: usize) -> Result<Vec<R>>
where
    T: Send,
    R: Send,
    F: Fn(T) -> Result<R> + Send + Sync,
{
    Runner::new(degree)
        .with_progress(Arc::new(ConsoleProgress::new()))
        .run(func, items, desc)
}

/// Suggest a concurrency degree for a batch.
///
/// Uses the number of logical CPUs, capped at the work count so no worker
/// sits idle from the start; at least 1.
#[must_use]
pub fn suggest_degree(work_count: usize) -> usize {
    num_cpus::get().min(work_count.max(1)).max(1)
}
