/// Data layer: core types, loading, alignment, and filtering.
///
/// Architecture:
/// ```text
///  Thrust.csv  Chamber.csv  t0.csv
///        │                     │
///        ▼                     ▼
///   ┌──────────┐         ┌──────────┐
///   │  loader   │         │    t0     │  marker table → batch offset
///   └──────────┘         └──────────┘
///        │  RawMatrix            │ t0
///        ▼                       ▼
///   ┌────────────────────────────────┐
///   │ model::Series  (x - t0, y)      │
///   └────────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  zero-phase low-pass / moving average → derived Series
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod t0;
