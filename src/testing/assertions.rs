//! Assertion helpers for frames and runner output.

use crate::frame::TimeseriesFrame;
use std::collections::HashSet;
use std::fmt::Debug;

/// Assert that two frames hold the same data, keyed rather than positional.
///
/// Comparison proceeds in two stages for clearer failures:
///
/// 1. For each dimension, the unique values of `res` and `exp` are compared
///    as sets; any symmetric difference fails immediately, naming the
///    dimension and the differing values. This surfaces "whole group
///    missing" mistakes before any cell-level noise.
/// 2. Rows are matched by full key (order-insensitive, so completion-order
///    runner output compares cleanly) and values compared per year with
///    relative tolerance `rtol`. `NaN` is equal to `NaN`.
///
/// # Panics
///
/// Panics with a descriptive message on any difference.
pub fn assert_frames_equal(res: &TimeseriesFrame, exp: &TimeseriesFrame, rtol: f64) {
    assert_eq!(
        res.dimensions(),
        exp.dimensions(),
        "frames disagree on dimensions"
    );
    assert_eq!(res.years(), exp.years(), "frames disagree on year columns");

    for dim in res.dimensions() {
        let res_vals: HashSet<Vec<String>> = res.unique_joint(&[dim.as_str()]).into_iter().collect();
        let exp_vals: HashSet<Vec<String>> = exp.unique_joint(&[dim.as_str()]).into_iter().collect();
        let diffs: Vec<_> = res_vals.symmetric_difference(&exp_vals).collect();
        assert!(
            diffs.is_empty(),
            "Differences in the {dim} (res on the left): {diffs:?}"
        );
    }

    assert_eq!(
        res.len(),
        exp.len(),
        "frames disagree on row count: {} vs {}",
        res.len(),
        exp.len()
    );

    for row in res.rows() {
        let exp_row = exp
            .rows()
            .iter()
            .find(|r| r.key == row.key)
            .unwrap_or_else(|| panic!("no expected row with key {:?}", row.key));
        for (year, (a, b)) in res.years().iter().zip(row.values.iter().zip(&exp_row.values)) {
            assert!(
                approx_eq(*a, *b, rtol),
                "value mismatch at key {:?}, year {year}: {a} vs {b} (rtol={rtol})",
                row.key
            );
        }
    }
}

fn approx_eq(a: f64, b: f64, rtol: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    (a - b).abs() <= rtol * b.abs().max(a.abs())
}

/// Assert that two collections hold the same elements as multisets.
///
/// The comparison sorts both sides, so it is the right check for pool-path
/// runner output, which arrives in completion order.
///
/// # Panics
///
/// Panics if the sorted collections differ.
pub fn assert_same_elements<T: Ord + Debug>(mut actual: Vec<T>, mut expected: Vec<T>) {
    actual.sort();
    expected.sort();
    assert_eq!(
        actual, expected,
        "collections differ as multisets (both shown sorted)"
    );
}
