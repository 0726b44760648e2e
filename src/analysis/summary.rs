use std::collections::BTreeMap;

use serde::Serialize;

use super::classify::ClassifiedRecord;
use crate::constants::analysis::RESULT_NAME_SEPARATOR;
use crate::data::model::CellValue;

/// Headline counts for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_analyzed: usize,
    pub normal_count: usize,
    pub abnormal_count: usize,
    /// `abnormal_count / total_analyzed * 100`, or `0` for an empty run.
    pub percent_abnormal: f64,
}

/// A test session with at least one abnormal measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffectedSession {
    pub test_number: CellValue,
    pub anomaly_count: usize,
    /// Distinct abnormal measurement names, in first-seen order.
    pub affected_result_names: Vec<String>,
}

impl AffectedSession {
    pub fn result_names_label(&self) -> String {
        self.affected_result_names.join(RESULT_NAME_SEPARATOR)
    }
}

/// Abnormal count for one measurement name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownEntry {
    pub result_name: String,
    pub anomaly_count: usize,
}

pub fn summary_stats(classified: &[ClassifiedRecord]) -> SummaryStats {
    let total_analyzed = classified.len();
    let abnormal_count = classified.iter().filter(|c| c.is_abnormal()).count();
    let percent_abnormal = if total_analyzed > 0 {
        abnormal_count as f64 / total_analyzed as f64 * 100.0
    } else {
        0.0
    };
    SummaryStats {
        total_analyzed,
        normal_count: total_analyzed - abnormal_count,
        abnormal_count,
        percent_abnormal,
    }
}

/// The abnormal subset, in run order.
pub fn abnormal_records(classified: &[ClassifiedRecord]) -> Vec<&ClassifiedRecord> {
    classified.iter().filter(|c| c.is_abnormal()).collect()
}

/// Abnormal rows rolled up per test session, most anomalies first.
///
/// Rows without a test number are left out. Sessions with equal counts keep
/// ascending test-number order.
pub fn affected_sessions(classified: &[ClassifiedRecord]) -> Vec<AffectedSession> {
    let mut groups: BTreeMap<&CellValue, (usize, Vec<String>)> = BTreeMap::new();
    for row in classified.iter().filter(|c| c.is_abnormal()) {
        let test_number = &row.record.test_number;
        if test_number.is_null() {
            continue;
        }
        let (count, names) = groups.entry(test_number).or_default();
        *count += 1;
        if let Some(name) = &row.record.result_name {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }

    let mut sessions: Vec<AffectedSession> = groups
        .into_iter()
        .map(|(test_number, (anomaly_count, affected_result_names))| AffectedSession {
            test_number: test_number.clone(),
            anomaly_count,
            affected_result_names,
        })
        .collect();
    sessions.sort_by(|a, b| b.anomaly_count.cmp(&a.anomaly_count));
    sessions
}

/// Abnormal rows counted per measurement name, most anomalies first.
///
/// Names with equal counts keep ascending name order.
pub fn anomaly_breakdown(classified: &[ClassifiedRecord]) -> Vec<BreakdownEntry> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in classified.iter().filter(|c| c.is_abnormal()) {
        if let Some(name) = row.record.result_name.as_deref() {
            *counts.entry(name).or_default() += 1;
        }
    }

    let mut breakdown: Vec<BreakdownEntry> = counts
        .into_iter()
        .map(|(name, anomaly_count)| BreakdownEntry {
            result_name: name.to_string(),
            anomaly_count,
        })
        .collect();
    breakdown.sort_by(|a, b| b.anomaly_count.cmp(&a.anomaly_count));
    breakdown
}

/// Everything the results view reports, in one serializable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSnapshot {
    pub summary: SummaryStats,
    pub affected_sessions: Vec<AffectedSession>,
    pub anomaly_breakdown: Vec<BreakdownEntry>,
}

impl ReportSnapshot {
    pub fn from_classified(classified: &[ClassifiedRecord]) -> Self {
        Self {
            summary: summary_stats(classified),
            affected_sessions: affected_sessions(classified),
            anomaly_breakdown: anomaly_breakdown(classified),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
