/// Data layer: core types, loading, and statistics.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (dtype inference)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  typed columns, shape, head
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  value counts, histogram + KDE, correlation
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod stats;
