use serde::Serialize;

use super::criteria::Bounds;
use crate::constants::analysis::{SUGGESTED_LOWER_QUANTILE, SUGGESTED_UPPER_QUANTILE};
use crate::data::model::Table;

/// Observed numeric span of one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Numeric responses for one measurement across a set of products, in row
/// order.  Non-numeric responses are dropped.
pub fn numeric_responses<S: AsRef<str>>(table: &Table, items: &[S], result_name: &str) -> Vec<f64> {
    table
        .records
        .iter()
        .filter(|r| {
            r.result_name.as_deref() == Some(result_name)
                && r
                    .item_number
                    .as_deref()
                    .is_some_and(|item| items.iter().any(|s| s.as_ref() == item))
        })
        .filter_map(|r| r.numeric_response())
        .collect()
}

/// Min / max of the numeric responses of one product's measurement.
///
/// `None` when no response coerces to a number.
pub fn value_range(table: &Table, item_number: &str, result_name: &str) -> Option<ValueRange> {
    span(&numeric_responses(table, &[item_number], result_name))
}

/// Overall span across a product selection: smallest minimum, largest maximum.
pub fn combined_range<S: AsRef<str>>(table: &Table, items: &[S], result_name: &str) -> Option<ValueRange> {
    items
        .iter()
        .filter_map(|item| value_range(table, item.as_ref(), result_name))
        .reduce(|acc, r| ValueRange {
            min: acc.min.min(r.min),
            max: acc.max.max(r.max),
        })
}

fn span(values: &[f64]) -> Option<ValueRange> {
    let (first, rest) = values.split_first()?;
    let init = ValueRange {
        min: *first,
        max: *first,
    };
    Some(rest.iter().fold(init, |acc, &v| ValueRange {
        min: acc.min.min(v),
        max: acc.max.max(v),
    }))
}

/// Linear-interpolation quantile of already sorted values.
///
/// Rank is `p * (n - 1)`; the result interpolates between the two
/// neighbouring order statistics (NumPy's default, Hyndman–Fan type 7).
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    let (a, b) = (sorted[lo], sorted[hi]);
    // Exact ranks and equal neighbours skip the lerp, which is NaN for infinities.
    if frac == 0.0 || a == b {
        return Some(a);
    }
    Some(a + (b - a) * frac)
}

/// Q1 / Q3 of every numeric response for `result_name` across `items`.
///
/// This is the default suggestion for a new or retargeted filter; it is not
/// enforced anywhere.
pub fn quartile_bounds<S: AsRef<str>>(table: &Table, items: &[S], result_name: &str) -> Option<Bounds> {
    let mut values = numeric_responses(table, items, result_name);
    values.sort_by(f64::total_cmp);
    Some(Bounds {
        lower: quantile(&values, SUGGESTED_LOWER_QUANTILE)?,
        upper: quantile(&values, SUGGESTED_UPPER_QUANTILE)?,
    })
}
