/// Data layer: sources, loading, validation and missing-value filtering.
///
/// Architecture:
/// ```text
///  path / table / mapping / array
///        │
///        ▼
///   ┌──────────┐
///   │  source   │  DataSource: one variant per accepted shape
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse → validate vp1/vp2/vp3 → partial rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop rows with a missing value
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<[f64; 3]>
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod source;

pub use loader::load;
pub use model::{validate_columns, Channel, Dataset, Row, CHANNEL_COUNT};
pub use source::DataSource;
