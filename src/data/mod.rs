/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → MunicipalDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ MunicipalDataset  │  Vec<MunicipalRecord>, sorted states
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  state → region → UF cascade → FilteredView
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
