use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Inclusive acceptance range for one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// `true` when `value` lies strictly below `lower` or strictly above `upper`.
    pub fn excludes(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// A named bound: which measurement, and its acceptable range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub result_name: String,
    pub bounds: Bounds,
}

impl Criterion {
    pub fn new(result_name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            result_name: result_name.into(),
            bounds: Bounds::new(lower, upper),
        }
    }
}

/// Bounds keyed by measurement name, as handed to the classifier.
pub type CriteriaMap = BTreeMap<String, Bounds>;

/// Collapse an ordered criterion list into a [`CriteriaMap`].
///
/// When the same measurement appears more than once, the last entry wins.
pub fn criteria_map<'a, I>(criteria: I) -> CriteriaMap
where
    I: IntoIterator<Item = &'a Criterion>,
{
    let mut map = CriteriaMap::new();
    for criterion in criteria {
        if let Some(previous) = map.insert(criterion.result_name.clone(), criterion.bounds) {
            log::warn!(
                "criterion for '{}' overrides earlier bounds {} to {}",
                criterion.result_name,
                previous.lower,
                previous.upper
            );
        }
    }
    map
}
