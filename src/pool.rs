//! Call-scoped worker pool.
//!
//! The pool exists only for the duration of one [`run_pool`] call: workers are
//! spawned under `std::thread::scope`, so every worker is joined before the
//! call returns or errors. Work items flow to workers over a channel sized to
//! the whole batch, which lets the submission phase complete without blocking
//! before retrieval starts.

use crate::context::StartMethod;
use crate::progress::{Phase, Progress};
use anyhow::{Context, Result, anyhow};
use crossbeam::channel::bounded;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Fan a callable out over `degree` worker threads and collect the outcomes.
///
/// Submits every item, then retrieves one outcome per item in completion
/// order. The first `Err` outcome retrieved is returned to the caller as-is;
/// workers still running finish their current item and wind down when the
/// channels disconnect, and items still queued at that point are dropped.
///
/// A panic inside the callable is caught on the worker and surfaced as an
/// error at its retrieval point, so a panicking task cannot take the pool
/// down with it.
pub(crate) fn run_pool<T, R, F>(
    func: &F,
    items: Vec<T>,
    degree: usize,
    method: StartMethod,
    progress: &dyn Progress,
    desc: &str,
) -> Result<Vec<R>>
where
    T: Send,
    R: Send,
    F: Fn(T) -> Result<R> + Send + Sync,
{
    let total = items.len();
    let (work_tx, work_rx) = bounded::<T>(total);
    let (outcome_tx, outcome_rx) = bounded::<Result<R>>(total);

    std::thread::scope(|scope| {
        for worker_id in 0..degree {
            let work_rx = work_rx.clone();
            let outcome_tx = outcome_tx.clone();
            method
                .spawn_scoped(scope, worker_id, move || {
                    while let Ok(item) = work_rx.recv() {
                        let outcome = match catch_unwind(AssertUnwindSafe(|| func(item))) {
                            Ok(res) => res,
                            Err(payload) => {
                                Err(anyhow!("worker task panicked: {}", panic_message(payload.as_ref())))
                            }
                        };
                        // Retrieval side hung up: nobody wants outcomes anymore.
                        if outcome_tx.send(outcome).is_err() {
                            break;
                        }
                    }
                })
                .with_context(|| format!("spawn worker {worker_id} of {degree}"))?;
        }
        drop(work_rx);
        drop(outcome_tx);

        progress.begin(Phase::Submit, desc, total);
        for item in items {
            // Capacity covers the whole batch, so this never blocks while
            // workers are alive.
            if work_tx.send(item).is_err() {
                break;
            }
            progress.advance(Phase::Submit);
        }
        progress.finish(Phase::Submit);
        drop(work_tx);

        progress.begin(Phase::Retrieve, desc, total);
        let mut results = Vec::with_capacity(total);
        for _ in 0..total {
            let outcome = outcome_rx
                .recv()
                .context("worker pool disconnected before delivering every outcome")?;
            results.push(outcome?);
            progress.advance(Phase::Retrieve);
        }
        progress.finish(Phase::Retrieve);

        Ok(results)
    })
}

/// Best-effort rendering of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
