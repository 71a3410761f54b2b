//! # Fanout
//!
//! Call-scoped parallel fan-out for grouped timeseries transforms.
//!
//! Fanout dispatches independent per-group transform functions across either
//! a single thread of control (serial, for debugging) or a fixed-size pool of
//! worker threads (parallel, for throughput), and ships the precondition
//! guard those transforms rely on: that one unit of work varies only in its
//! `variable` and `unit` dimensions.
//!
//! ## Key pieces
//!
//! - **[`run_parallel`]** / **[`Runner`]** - the dispatcher: degree 1 runs
//!   serially in input order, larger degrees fan out over a call-scoped pool
//!   and return results in completion order
//! - **[`assert_single_group`]** - the grouping invariant guard, invoked
//!   inside each per-group callable
//! - **[`TimeseriesFrame`]** - the dimensioned table callers partition with
//!   [`TimeseriesFrame::split_groups`] and reassemble with
//!   [`TimeseriesFrame::concat`]
//! - **I/O** - wide timeseries CSV and typed record CSV with transparent
//!   gzip, plus glob batch loading (features `io-csv`, `compression-gzip`)
//! - **[`FrameCache`]** - process-wide memoization of CSV loads
//! - **[`testing`]** - shipped assertions, builders, and fixtures for
//!   downstream pipeline tests
//!
//! ## Quick start
//!
//! ```
//! use fanout::{TimeseriesFrame, run_parallel};
//! use fanout::testing::FrameBuilder;
//! use fanout::validation::assert_single_group;
//!
//! # fn main() -> anyhow::Result<()> {
//! let frame = FrameBuilder::new(&["model", "scenario", "variable", "unit"], &[2030, 2050])
//!     .row(&["AIM", "SSP1", "Emissions|CO2", "Mt CO2/yr"], &[40.0, 20.0])
//!     .row(&["AIM", "SSP2", "Emissions|CO2", "Mt CO2/yr"], &[42.0, 35.0])
//!     .build();
//!
//! let transformed = run_parallel(
//!     |group: TimeseriesFrame| {
//!         // Each group is one model/scenario; the guard makes that assumption explicit.
//!         assert_single_group(&group)?;
//!         Ok(group)
//!     },
//!     frame.split_groups(),
//!     "scenario groups",
//!     2,
//! )?;
//! assert_eq!(transformed.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Ordering contract
//!
//! The serial path returns `out[i] == func(items[i])` positionally. The pool
//! path returns outcomes in **completion order**, which need not match input
//! order - embed an identifying key in each result when position matters.
//! See the [`runner`] module docs.
//!
//! ## Module overview
//!
//! - [`runner`] - serial/pool dispatch and the [`Runner`] configuration
//! - [`context`] - worker start-method policy and fallback
//! - [`progress`] - the phase observer trait and console bars
//! - [`validation`] - the grouping invariant guard
//! - [`frame`] - the timeseries table and group partitioning
//! - [`io`] - CSV, compression, and glob loading
//! - [`cache`] - memoized frame loading
//! - [`testing`] - shipped test support

pub mod context;
pub mod frame;
pub mod io;
pub mod progress;
pub mod runner;
pub mod testing;
pub mod validation;

mod pool;

#[cfg(feature = "io-csv")]
pub mod cache;

// General re-exports
pub use context::StartMethod;
pub use frame::{DIM_UNIT, DIM_VARIABLE, Row, TimeseriesFrame};
pub use progress::{ConsoleProgress, NoProgress, Phase, Progress};
pub use runner::{Runner, run_parallel, suggest_degree};
pub use validation::{GroupingViolation, assert_single_group};

pub use io::glob::{expand_glob, expand_glob_required};

// Gated re-exports
#[cfg(feature = "io-csv")]
pub use cache::{FrameCache, frame_cache};

#[cfg(feature = "io-csv")]
pub use io::csv::{
    read_records, read_timeseries_csv, read_timeseries_glob, write_records, write_timeseries_csv,
};

#[cfg(all(feature = "io-csv", feature = "parallel-io"))]
pub use io::csv::write_timeseries_csv_par;
