/// Data layer: core types, parsing, axis construction, alignment and merging.
///
/// Architecture:
/// ```text
///  file_1.csv … file_n.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → metadata + (x, y)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   axis    │  union of rounded x values → unified axis
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  align    │  exact-match lookup per axis point → aligned column
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  merge    │  data table + enriched metadata table
///   └──────────┘
/// ```

pub mod align;
pub mod axis;
pub mod loader;
pub mod merge;
pub mod model;
