use std::fmt;

// ---------------------------------------------------------------------------
// MetadataRecord – free-form key/value pairs scraped from one file
// ---------------------------------------------------------------------------

/// Key under which the file stem is stored in every record.
pub const FILENAME_KEY: &str = "Filename";

/// Key whose (non-empty) value is appended to the column name.
pub const TITLE_KEY: &str = "TITLE";

/// Insertion-ordered metadata for one spectral file.
///
/// Keys are unique; the first value stored for a key is kept and later
/// duplicates are ignored. `Filename` is always the first entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    entries: Vec<(String, String)>,
}

impl MetadataRecord {
    /// Start a record for the file with the given stem.
    pub fn new(filename: &str) -> Self {
        Self {
            entries: vec![(FILENAME_KEY.to_string(), filename.to_string())],
        }
    }

    /// Store `value` under `key` unless the key is already present.
    /// Returns `true` when the pair was stored.
    pub fn insert_if_absent(&mut self, key: String, value: String) -> bool {
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, value));
        true
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The file stem this record was created for.
    pub fn filename(&self) -> &str {
        self.get(FILENAME_KEY).unwrap_or_default()
    }

    /// The `TITLE` field, if present and non-empty.
    pub fn title(&self) -> Option<&str> {
        self.get(TITLE_KEY).filter(|t| !t.is_empty())
    }

    /// Column identity of this file in the merged table:
    /// `filename` or `filename_TITLE`.
    pub fn column_key(&self) -> String {
        match self.title() {
            Some(title) => format!("{}_{title}", self.filename()),
            None => self.filename().to_string(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalise a raw metadata key: trim, then map spaces and `/` to `_`.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().replace(' ', "_").replace('/', "_")
}

// ---------------------------------------------------------------------------
// RawSeries – the (x, y) pairs of one file, in file order
// ---------------------------------------------------------------------------

/// Wavelength/intensity pairs as they appear in the file.
/// Duplicate x values are kept; alignment picks the first one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl RawSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from two vectors. Returns `None` if their lengths differ.
    pub fn from_vecs(x: Vec<f64>, y: Vec<f64>) -> Option<Self> {
        (x.len() == y.len()).then_some(Self { x, y })
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    /// Wavelength axis (x).
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Intensity axis (y) – same length as `x`.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Min/max/count of the x values, or `None` for an empty series.
    pub fn range(&self) -> Option<SeriesRange> {
        let first = *self.x.first()?;
        let (min, max) = self
            .x
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(SeriesRange {
            min,
            max,
            points: self.x.len(),
        })
    }
}

/// Extent of one original series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesRange {
    pub min: f64,
    pub max: f64,
    pub points: usize,
}

// ---------------------------------------------------------------------------
// ParsedFile – result of parsing one spectral file
// ---------------------------------------------------------------------------

/// Why a line was not used as metadata or data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Blank line.
    Empty,
    /// Starts with `#` or `[`.
    Comment,
    /// Contains no `;`.
    NoSeparator,
    /// x or y field is empty.
    EmptyField,
    /// x or y field is not a number.
    BadNumber,
    /// x or y parsed to NaN or infinity.
    NonFinite,
    /// Header line that is not a `Key;value` pair.
    NotMetadata,
    /// Metadata key already present.
    DuplicateKey,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::Empty => "empty line",
            SkipReason::Comment => "comment line",
            SkipReason::NoSeparator => "no ';' separator",
            SkipReason::EmptyField => "empty x or y field",
            SkipReason::BadNumber => "x or y is not a number",
            SkipReason::NonFinite => "x or y is not finite",
            SkipReason::NotMetadata => "not a metadata line",
            SkipReason::DuplicateKey => "metadata key already set",
        };
        f.write_str(text)
    }
}

/// A line that was looked at and dropped. `line_no` is one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedLine {
    pub line_no: usize,
    pub reason: SkipReason,
}

/// Everything extracted from one spectral file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub metadata: MetadataRecord,
    pub series: RawSeries,
    /// Header lines that are not metadata, lines after the `XYDATA`
    /// marker that did not yield a data row, and duplicate metadata keys.
    pub skipped: Vec<SkippedLine>,
}

// ---------------------------------------------------------------------------
// Cell / Column / Table – in-memory output tables
// ---------------------------------------------------------------------------

/// A single cell of an output table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Integer(i64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    fn is_numeric_or_missing(&self) -> bool {
        matches!(self, Cell::Number(_) | Cell::Integer(_) | Cell::Missing)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Missing, Cell::Number)
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// A column is numeric when it holds at least one number and nothing
    /// but numbers or gaps.
    pub fn is_numeric(&self) -> bool {
        self.cells.iter().all(Cell::is_numeric_or_missing)
            && self.cells.iter().any(|c| !c.is_missing())
    }

    /// Number of non-missing cells.
    pub fn valid_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_missing()).count()
    }
}

/// Column-oriented table. All columns have the same number of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_column(&mut self, column: Column) {
        debug_assert!(
            self.columns.is_empty() || column.cells.len() == self.n_rows(),
            "column '{}' has {} rows, table has {}",
            column.name,
            column.cells.len(),
            self.n_rows()
        );
        self.columns.push(column);
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.cells.len())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}
