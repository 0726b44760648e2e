/// Analysis layer: bound suggestion, classification, and result rollups.
///
/// ```text
///   Table ──► range     min / max, Q1–Q3 suggested bounds
///     │
///     ▼
///   classify  (Table, products, CriteriaMap) → Vec<ClassifiedRecord>
///     │
///     ▼
///   summary   counts, affected sessions, per-measurement breakdown
/// ```

pub mod classify;
pub mod criteria;
pub mod range;
pub mod summary;
