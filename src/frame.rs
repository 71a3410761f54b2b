//! The dimensioned timeseries table that fan-out groups are cut from.
//!
//! A [`TimeseriesFrame`] is a wide table: each row is keyed by one string value
//! per named categorical dimension (e.g. `model`, `scenario`, `region`,
//! `variable`, `unit`) and carries one `f64` per year column. Missing cells are
//! `NaN`.
//!
//! The frame is the collaborator surface of the runner: callers partition a
//! frame into fan-out groups with [`TimeseriesFrame::split_groups`], dispatch
//! one group per work item, and reassemble outputs with
//! [`TimeseriesFrame::concat`].
//!
//! # Example
//!
//! ```
//! use fanout::TimeseriesFrame;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut frame = TimeseriesFrame::new(
//!     vec!["model".into(), "scenario".into(), "variable".into(), "unit".into()],
//!     vec![2020, 2030],
//! )?;
//! frame.push_row(
//!     vec!["AIM".into(), "SSP2".into(), "Emissions|CO2".into(), "Mt CO2/yr".into()],
//!     vec![38.0, 41.5],
//! )?;
//!
//! let groups = frame.split_groups();
//! assert_eq!(groups.len(), 1);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result, bail};
use regex::Regex;
use std::collections::HashSet;

/// The dimension that names what a row measures.
pub const DIM_VARIABLE: &str = "variable";

/// The dimension that names the unit a row is reported in.
pub const DIM_UNIT: &str = "unit";

/// One keyed row of a [`TimeseriesFrame`].
///
/// `key` holds one value per frame dimension, in the frame's dimension order.
/// `values` holds one `f64` per frame year, in the frame's year order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: Vec<String>,
    pub values: Vec<f64>,
}

/// A wide timeseries table keyed by named categorical dimensions.
///
/// Row keys and values are validated on insertion: every row must carry
/// exactly one key value per dimension and one numeric value per year.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesFrame {
    dimensions: Vec<String>,
    years: Vec<i32>,
    rows: Vec<Row>,
}

impl TimeseriesFrame {
    /// Create an empty frame with the given dimension names and year columns.
    ///
    /// # Errors
    ///
    /// Returns an error if `dimensions` is empty or contains a duplicate name.
    pub fn new(dimensions: Vec<String>, years: Vec<i32>) -> Result<Self> {
        if dimensions.is_empty() {
            bail!("a timeseries frame needs at least one dimension");
        }
        let mut seen = HashSet::new();
        for dim in &dimensions {
            if !seen.insert(dim.as_str()) {
                bail!("duplicate dimension name: {dim}");
            }
        }
        Ok(Self {
            dimensions,
            years,
            rows: Vec::new(),
        })
    }

    /// Append a row, validating key and value arity against the frame shape.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` does not have one value per dimension or
    /// `values` does not have one value per year.
    pub fn push_row(&mut self, key: Vec<String>, values: Vec<f64>) -> Result<()> {
        if key.len() != self.dimensions.len() {
            bail!(
                "row key has {} values but the frame has {} dimensions ({})",
                key.len(),
                self.dimensions.len(),
                self.dimensions.join(", ")
            );
        }
        if values.len() != self.years.len() {
            bail!(
                "row has {} values but the frame has {} year columns",
                values.len(),
                self.years.len()
            );
        }
        self.rows.push(Row { key, values });
        Ok(())
    }

    /// Dimension names, in column order.
    #[must_use]
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Year columns, in column order.
    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// All rows, in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the frame has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a dimension in the key, or `None` if the frame does not
    /// carry it.
    #[must_use]
    pub fn dimension_index(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d == name)
    }

    /// Dimension names other than `variable` and `unit`, in column order.
    ///
    /// These are the dimensions a fan-out group must be constant over.
    #[must_use]
    pub fn group_dimensions(&self) -> Vec<&str> {
        self.dimensions
            .iter()
            .map(String::as_str)
            .filter(|d| *d != DIM_VARIABLE && *d != DIM_UNIT)
            .collect()
    }

    /// Distinct joint value combinations over the named dimensions, in
    /// first-encounter order.
    ///
    /// Dimension names the frame does not carry are ignored; projecting onto
    /// an empty dimension set yields at most one (empty) combination.
    #[must_use]
    pub fn unique_joint(&self, dimensions: &[&str]) -> Vec<Vec<String>> {
        let idxs: Vec<usize> = dimensions
            .iter()
            .filter_map(|d| self.dimension_index(d))
            .collect();

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            let combo: Vec<String> = idxs.iter().map(|&i| row.key[i].clone()).collect();
            if seen.insert(combo.clone()) {
                out.push(combo);
            }
        }
        out
    }

    /// Partition the frame into fan-out groups.
    ///
    /// Rows are grouped by their joint value over every dimension except
    /// `variable` and `unit`. Groups come back in first-seen order and each
    /// group carries the full dimension and year layout of the source frame,
    /// so every group satisfies the single-group invariant by construction.
    #[must_use]
    pub fn split_groups(&self) -> Vec<TimeseriesFrame> {
        let idxs: Vec<usize> = self
            .group_dimensions()
            .iter()
            .filter_map(|d| self.dimension_index(d))
            .collect();

        let mut order: Vec<Vec<String>> = Vec::new();
        let mut groups: Vec<TimeseriesFrame> = Vec::new();
        for row in &self.rows {
            let combo: Vec<String> = idxs.iter().map(|&i| row.key[i].clone()).collect();
            let slot = match order.iter().position(|c| *c == combo) {
                Some(pos) => pos,
                None => {
                    order.push(combo);
                    groups.push(Self {
                        dimensions: self.dimensions.clone(),
                        years: self.years.clone(),
                        rows: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            groups[slot].rows.push(row.clone());
        }
        groups
    }

    /// Keep only rows whose `variable` matches a shell-style pattern.
    ///
    /// Variables are `|`-separated hierarchies (`Emissions|CO2|Energy`).
    /// In the pattern, `*` matches within a single segment and `**` matches
    /// across segment boundaries, so `Emissions|*` matches `Emissions|CO2`
    /// but not `Emissions|CO2|Energy`, while `Emissions**` matches both.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame has no `variable` dimension.
    pub fn filter_variable(&self, pattern: &str) -> Result<TimeseriesFrame> {
        let var_idx = self
            .dimension_index(DIM_VARIABLE)
            .with_context(|| format!("frame has no {DIM_VARIABLE} dimension"))?;
        let re = variable_pattern_to_regex(pattern)
            .with_context(|| format!("compile variable pattern {pattern:?}"))?;

        let rows = self
            .rows
            .iter()
            .filter(|row| re.is_match(&row.key[var_idx]))
            .cloned()
            .collect();
        Ok(Self {
            dimensions: self.dimensions.clone(),
            years: self.years.clone(),
            rows,
        })
    }

    /// Concatenate frames row-wise, in argument order.
    ///
    /// # Errors
    ///
    /// Returns an error if `frames` is empty or any frame disagrees with the
    /// first on dimensions or year columns.
    pub fn concat(frames: &[TimeseriesFrame]) -> Result<TimeseriesFrame> {
        let Some(first) = frames.first() else {
            bail!("cannot concatenate zero frames");
        };
        let mut out = Self {
            dimensions: first.dimensions.clone(),
            years: first.years.clone(),
            rows: Vec::with_capacity(frames.iter().map(TimeseriesFrame::len).sum()),
        };
        for (i, frame) in frames.iter().enumerate() {
            if frame.dimensions != out.dimensions {
                bail!(
                    "frame #{i} has dimensions ({}) but frame #0 has ({})",
                    frame.dimensions.join(", "),
                    out.dimensions.join(", ")
                );
            }
            if frame.years != out.years {
                bail!("frame #{i} disagrees with frame #0 on year columns");
            }
            out.rows.extend(frame.rows.iter().cloned());
        }
        Ok(out)
    }
}

/// Compile a shell-style variable pattern to an anchored regex.
///
/// `**` becomes `.*` (crosses `|` boundaries), a single `*` becomes `[^|]*`
/// (confined to one segment), everything else is matched literally.
fn variable_pattern_to_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '*' {
            if chars.peek() == Some(&'*') {
                chars.next();
                re.push_str(".*");
            } else {
                re.push_str("[^|]*");
            }
        } else {
            re.push_str(&regex::escape(&c.to_string()));
        }
    }
    re.push('$');
    Ok(Regex::new(&re)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_star_stays_within_a_segment() -> Result<()> {
        let re = variable_pattern_to_regex("Emissions|*")?;
        assert!(re.is_match("Emissions|CO2"));
        assert!(!re.is_match("Emissions|CO2|Energy"));
        Ok(())
    }

    #[test]
    fn double_star_crosses_segments() -> Result<()> {
        let re = variable_pattern_to_regex("Emissions**")?;
        assert!(re.is_match("Emissions|CO2"));
        assert!(re.is_match("Emissions|CO2|Energy"));
        assert!(!re.is_match("Harmonized|Emissions|CO2"));
        Ok(())
    }

    #[test]
    fn literal_regex_metacharacters_are_escaped() -> Result<()> {
        let re = variable_pattern_to_regex("Emissions|CO2 (total)")?;
        assert!(re.is_match("Emissions|CO2 (total)"));
        assert!(!re.is_match("Emissions|CO2 Xtotal)"));
        Ok(())
    }
}
