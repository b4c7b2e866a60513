/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → CaseDataset
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ CaseDataset  │  Vec<CaseRecord>, option indices
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterCriteria → FilteredTable
///   └──────────┘
///        │
///        ▼
///   ┌─────────────────────┐
///   │ aggregate / metrics  │  GeoAggregate, WeeklyAggregate, SummaryMetrics
///   └─────────────────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;
