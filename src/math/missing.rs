//! Missing-value detection.
//!
//! A missing response is encoded as NaN. Every row-wise fit works on the
//! *valid subset* of a row: the ascending column indices whose values are not
//! missing.

use std::borrow::Borrow;

/// The "not available" marker used for missing inputs and for outputs that were
/// never computed.
pub const NA: f64 = f64::NAN;

#[inline]
pub fn is_na(value: f64) -> bool {
    value.is_nan()
}

#[inline]
fn value_of<B: Borrow<f64>>(v: B) -> f64 {
    *v.borrow()
}

/// Flag each entry that is missing.
pub fn is_missing<I>(values: I) -> Vec<bool>
where
    I: IntoIterator,
    I::Item: Borrow<f64>,
{
    values.into_iter().map(|v| is_na(value_of(v))).collect()
}

/// Indices of the non-missing entries of `row`, in ascending order.
///
/// Accepts slices as well as nalgebra row views (`y.row(i).iter()`).
pub fn valid_column_indices<I>(row: I) -> Vec<usize>
where
    I: IntoIterator,
    I::Item: Borrow<f64>,
{
    row.into_iter()
        .enumerate()
        .filter_map(|(j, v)| if is_na(value_of(v)) { None } else { Some(j) })
        .collect()
}

pub fn count_missing<I>(values: I) -> usize
where
    I: IntoIterator,
    I::Item: Borrow<f64>,
{
    values
        .into_iter()
        .map(value_of)
        .filter(|&v| is_na(v))
        .count()
}
