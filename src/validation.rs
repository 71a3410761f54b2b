//! The grouping invariant that per-group transforms rely on.
//!
//! Transform callables dispatched through the runner are written against a
//! single fan-out group: one joint combination of every dimension other than
//! `variable` and `unit` (one model, one scenario, one region). This module
//! provides the precondition guard those callables invoke before assuming that
//! scoping.
//!
//! # Example
//!
//! ```
//! use fanout::testing::FrameBuilder;
//! use fanout::validation::assert_single_group;
//!
//! let frame = FrameBuilder::new(&["model", "scenario", "variable", "unit"], &[2020])
//!     .row(&["AIM", "SSP2", "Emissions|CO2", "Mt CO2/yr"], &[38.0])
//!     .row(&["AIM", "SSP2", "Emissions|CH4", "Mt CH4/yr"], &[350.0])
//!     .build();
//!
//! // Varies only in variable/unit, so the guard passes.
//! assert_single_group(&frame).unwrap();
//! ```

use crate::frame::TimeseriesFrame;
use std::fmt;

/// Error raised when a frame spans more than one fan-out group.
///
/// Carries the dimensions that were checked and every joint value combination
/// observed over them, in first-encounter order, so the caller can see exactly
/// which groups leaked into one unit of work.
#[derive(Debug, Clone)]
pub struct GroupingViolation {
    dimensions: Vec<String>,
    combinations: Vec<Vec<String>>,
}

impl GroupingViolation {
    /// The dimension names the invariant was checked over (everything except
    /// `variable` and `unit`).
    #[must_use]
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Every distinct joint value combination observed, in first-encounter
    /// order. Always has at least two entries.
    #[must_use]
    pub fn combinations(&self) -> &[Vec<String>] {
        &self.combinations
    }
}

impl fmt::Display for GroupingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected variations only in variable and unit, but found {} combinations of ({}): ",
            self.combinations.len(),
            self.dimensions.join(", ")
        )?;
        for (i, combo) in self.combinations.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "({})", combo.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for GroupingViolation {}

/// Assert that a frame varies only in `variable` and `unit`.
///
/// Projects the frame's row keys onto every other dimension and fails if more
/// than one distinct joint combination is observed. A frame whose only
/// dimensions are `variable`/`unit` passes trivially, as does an empty frame.
///
/// # Errors
///
/// Returns a [`GroupingViolation`] naming the checked dimensions and every
/// observed combination when the frame spans more than one group.
pub fn assert_single_group(frame: &TimeseriesFrame) -> Result<(), GroupingViolation> {
    let dimensions = frame.group_dimensions();
    let combinations = frame.unique_joint(&dimensions);

    if combinations.len() > 1 {
        return Err(GroupingViolation {
            dimensions: dimensions.iter().map(|d| (*d).to_string()).collect(),
            combinations,
        });
    }
    Ok(())
}
