/// Data layer: core types, loading, and table catalog queries.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable → validated Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  Vec<Record>, source column order
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ catalog   │  products, measurement names, session counts
///   └──────────┘
/// ```

pub mod catalog;
pub mod loader;
pub mod model;
