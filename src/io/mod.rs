//! File I/O: timeseries and record CSV, transparent compression, glob
//! expansion for batch loading.

pub mod compression;
pub mod glob;

#[cfg(feature = "io-csv")]
pub mod csv;
