//! CSV I/O for timeseries frames and typed record tables.
//!
//! Two shapes of CSV move through this crate:
//!
//! - **Wide timeseries CSV** — dimension columns followed by integer year
//!   columns, one timeseries per row ([`read_timeseries_csv`],
//!   [`write_timeseries_csv`]). This is the shape scenario archives ship in.
//! - **Typed record CSV** — Serde-backed rows for metadata tables such as
//!   model/scenario listings ([`read_records`], [`write_records`]).
//!
//! All paths are transparently compressed: `.csv.gz` reads and writes work
//! without any caller involvement (feature `compression-gzip`).
//!
//! # Design notes
//!
//! - Empty numeric cells read as `NaN` and `NaN` writes back as an empty
//!   cell, round-tripping the archives' missing-value convention.
//! - The parallel writer keeps deterministic output order by serializing
//!   shards in parallel and concatenating the buffers in shard order.

use crate::frame::TimeseriesFrame;
use crate::io::compression::{auto_detect_reader, auto_detect_writer};
use crate::io::glob::expand_glob_required;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{File, create_dir_all};
#[cfg(feature = "parallel-io")]
use std::io::Write;
use std::path::Path;

/// Read a wide timeseries CSV into a [`TimeseriesFrame`].
///
/// The header is split into the named `index_columns` (the frame's
/// dimensions, in the order given here) and year columns; every header field
/// not named in `index_columns` must parse as an integer year. Empty numeric
/// cells become `NaN`.
///
/// Gzipped files are detected and decompressed transparently.
///
/// # Errors
///
/// Returns an error naming the offender if an index column is missing from
/// the header, a non-index header field is not an integer year, or a cell
/// fails to parse; parse errors carry the row number.
pub fn read_timeseries_csv(
    path: impl AsRef<Path>,
    index_columns: &[&str],
) -> Result<TimeseriesFrame> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(rdr);

    let headers = rdr
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .clone();

    let mut index_positions = Vec::with_capacity(index_columns.len());
    for col in index_columns {
        let pos = headers
            .iter()
            .position(|h| h == *col)
            .with_context(|| format!("index column {col:?} missing from {}", path.display()))?;
        index_positions.push(pos);
    }

    let mut years = Vec::new();
    let mut year_positions = Vec::new();
    for (pos, header) in headers.iter().enumerate() {
        if index_positions.contains(&pos) {
            continue;
        }
        let year: i32 = header.trim().parse().with_context(|| {
            format!(
                "column {header:?} of {} is neither an index column nor an integer year",
                path.display()
            )
        })?;
        years.push(year);
        year_positions.push(pos);
    }

    let mut frame = TimeseriesFrame::new(
        index_columns.iter().map(|c| (*c).to_string()).collect(),
        years,
    )?;

    for (i, record) in rdr.records().enumerate() {
        let record = record
            .with_context(|| format!("read CSV record #{} of {}", i + 1, path.display()))?;
        let key: Vec<String> = index_positions
            .iter()
            .map(|&pos| record[pos].to_string())
            .collect();
        let mut values = Vec::with_capacity(year_positions.len());
        for &pos in &year_positions {
            let cell = record[pos].trim();
            let value = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse().with_context(|| {
                    format!(
                        "parse {cell:?} in row #{}, column {:?} of {}",
                        i + 1,
                        &headers[pos],
                        path.display()
                    )
                })?
            };
            values.push(value);
        }
        frame
            .push_row(key, values)
            .with_context(|| format!("row #{} of {}", i + 1, path.display()))?;
    }

    Ok(frame)
}

/// Write a [`TimeseriesFrame`] as a wide timeseries CSV.
///
/// Dimension columns come first, then year columns. Parent directories are
/// created; `NaN` cells write as empty fields; a `.gz` extension compresses
/// the output transparently.
///
/// # Errors
///
/// Returns an error if the file or its directories cannot be created, or a
/// row fails to serialize or flush.
pub fn write_timeseries_csv(frame: &TimeseriesFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let w = auto_detect_writer(f, path)
        .with_context(|| format!("setup compression for {}", path.display()))?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(w);

    wtr.write_record(header_fields(frame))
        .with_context(|| format!("write header of {}", path.display()))?;
    for (i, row) in frame.rows().iter().enumerate() {
        wtr.write_record(row_fields(row))
            .with_context(|| format!("write CSV row #{} of {}", i + 1, path.display()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a [`TimeseriesFrame`] as CSV with rayon-parallel serialization.
///
/// Rows are split into `shards` contiguous ranges (defaulting to twice the
/// CPU count), each serialized to its own buffer on a worker, and the buffers
/// concatenated in shard order, so output is byte-identical to
/// [`write_timeseries_csv`] regardless of scheduling.
///
/// # Errors
///
/// As [`write_timeseries_csv`].
#[cfg(feature = "parallel-io")]
pub fn write_timeseries_csv_par(
    frame: &TimeseriesFrame,
    path: impl AsRef<Path>,
    shards: Option<usize>,
) -> Result<()> {
    use rayon::iter::{IntoParallelIterator, ParallelIterator};

    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }

    let n = frame.len();
    if n == 0 {
        return write_timeseries_csv(frame, path);
    }

    let shard_count = shards
        .unwrap_or_else(|| 2 * num_cpus::get().max(2))
        .clamp(1, n);
    let ranges = split_ranges(n, shard_count);

    let mut buffers: Vec<(usize, Vec<u8>)> = ranges
        .into_par_iter()
        .map(|(idx, start, end)| {
            let mut buf: Vec<u8> = Vec::with_capacity((end - start).saturating_mul(64));
            {
                let mut wtr = WriterBuilder::new().has_headers(false).from_writer(&mut buf);
                if idx == 0 {
                    wtr.write_record(header_fields(frame))?;
                }
                for row in &frame.rows()[start..end] {
                    wtr.write_record(row_fields(row))?;
                }
                wtr.flush()?;
            }
            Ok::<_, anyhow::Error>((idx, buf))
        })
        .collect::<Result<Vec<_>>>()?;

    buffers.sort_by_key(|(idx, _)| *idx);

    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = auto_detect_writer(f, path)
        .with_context(|| format!("setup compression for {}", path.display()))?;
    for (_, buf) in buffers {
        w.write_all(&buf)?;
    }
    w.flush()?;
    Ok(())
}

fn header_fields(frame: &TimeseriesFrame) -> Vec<String> {
    frame
        .dimensions()
        .iter()
        .cloned()
        .chain(frame.years().iter().map(ToString::to_string))
        .collect()
}

fn row_fields(row: &crate::frame::Row) -> Vec<String> {
    row.key
        .iter()
        .cloned()
        .chain(row.values.iter().map(|v| {
            if v.is_nan() {
                String::new()
            } else {
                v.to_string()
            }
        }))
        .collect()
}

/// Split `[0, len)` into `parts` contiguous ranges as `(shard_idx, start, end)`.
///
/// Ranges are non-empty, cover the whole domain, and distribute the
/// remainder fairly.
#[cfg(feature = "parallel-io")]
fn split_ranges(len: usize, parts: usize) -> Vec<(usize, usize, usize)> {
    let parts = parts.max(1).min(len.max(1));
    let base = len / parts;
    let rem = len % parts;

    let mut out = Vec::with_capacity(parts);
    let mut start = 0usize;
    for idx in 0..parts {
        let extra = usize::from(idx < rem);
        let end = start + base + extra;
        if start < end {
            out.push((idx, start, end));
        }
        start = end;
    }
    out
}

/// Read a CSV file into a typed `Vec<T>` with Serde.
///
/// The first row is treated as a header. Errors are annotated with row
/// numbers; gzipped files are decompressed transparently.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or any row fails to
/// deserialize into `T`.
pub fn read_records<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(rdr);

    let mut out = Vec::<T>::new();
    for (i, rec) in rdr.deserialize::<T>().enumerate() {
        let v = rec.with_context(|| format!("parse CSV record #{} of {}", i + 1, path.display()))?;
        out.push(v);
    }
    Ok(out)
}

/// Write a typed slice as CSV with Serde, header row included.
///
/// Creates parent directories; a `.gz` extension compresses transparently.
///
/// # Returns
///
/// The number of rows written.
///
/// # Errors
///
/// Returns an error if the file or directories cannot be created or a row
/// fails to serialize or flush.
pub fn write_records<T: Serialize>(path: impl AsRef<Path>, data: &[T]) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let w = auto_detect_writer(f, path)
        .with_context(|| format!("setup compression for {}", path.display()))?;
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(w);
    for (i, row) in data.iter().enumerate() {
        wtr.serialize(row)
            .with_context(|| format!("serialize CSV row #{} of {}", i + 1, path.display()))?;
    }
    wtr.flush()?;
    Ok(data.len())
}

/// Load and concatenate every timeseries CSV matching a glob pattern.
///
/// Files are loaded in sorted path order and concatenated in that order, so
/// the result is deterministic. Zero matches is an error: a batch loader
/// pointed at nothing is a configuration mistake.
///
/// # Errors
///
/// As [`read_timeseries_csv`] per file, plus pattern and concatenation
/// failures (every file must agree on dimensions and year columns).
pub fn read_timeseries_glob(pattern: &str, index_columns: &[&str]) -> Result<TimeseriesFrame> {
    let files = expand_glob_required(pattern)?;
    let mut frames = Vec::with_capacity(files.len());
    for file in files {
        frames.push(read_timeseries_csv(&file, index_columns)?);
    }
    TimeseriesFrame::concat(&frames)
}
