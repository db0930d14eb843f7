use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use super::align::{align, AlignedSeries};
use super::axis::{build_axis, UnifiedAxis};
use super::loader::load_file;
use super::model::{Cell, Column, MetadataRecord, ParsedFile, SeriesRange, Table};
use crate::error::{FileFailure, FileFailureReason, MergeError, ParseError};
use crate::output::{write_table_file, FormatOptions};

/// Name of the merged spectra table written into the output directory.
pub const DATA_FILE_NAME: &str = "unified_spectra_data.csv";
/// Name of the per-file metadata table written next to it.
pub const METADATA_FILE_NAME: &str = "spectra_metadata.csv";
/// Header of the axis column in the merged table.
pub const WAVELENGTH_COLUMN: &str = "Wavelength_nm";

// ---------------------------------------------------------------------------
// Request / stages
// ---------------------------------------------------------------------------

/// Everything a front-end decides before starting a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRequest {
    /// Input files, in the order their columns should appear.
    pub files: Vec<PathBuf>,
    pub format: FormatOptions,
    /// Where to write the two tables. Defaults to the first file's directory.
    pub output_dir: Option<PathBuf>,
}

impl MergeRequest {
    pub fn new(files: Vec<PathBuf>, format: FormatOptions) -> Self {
        Self {
            files,
            format,
            output_dir: None,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// The directory outputs go to.
    pub fn resolved_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        self.files
            .first()
            .and_then(|f| f.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }
}

/// Pipeline position of a run. `Failed` is reachable from every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStage {
    Parsing,
    AxisBuild,
    Aligning,
    Assembling,
    Formatting,
    Done,
    Failed,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Coverage statistics of one merged file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCoverage {
    pub column: String,
    pub path: PathBuf,
    pub range_min: f64,
    pub range_max: f64,
    pub original_points: usize,
    pub valid_points: usize,
    pub coverage_percent: f64,
}

/// In-memory result of a merge, before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSpectra {
    pub axis: UnifiedAxis,
    /// `Wavelength_nm` followed by one column per merged file.
    pub data: Table,
    /// One row per merged file: its metadata plus coverage fields.
    pub metadata: Table,
    pub coverage: Vec<FileCoverage>,
    pub excluded: Vec<FileFailure>,
}

/// What a front-end shows after a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeSummary {
    pub data_file: PathBuf,
    pub metadata_file: PathBuf,
    pub format: FormatOptions,
    pub rows: usize,
    /// Including the wavelength column.
    pub columns: usize,
    pub axis_min: f64,
    pub axis_max: f64,
    pub files: Vec<FileCoverage>,
    pub excluded: Vec<FileFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub merged: MergedSpectra,
    pub summary: MergeSummary,
}

/// A parsed file that made it past the parsing stage.
struct Accepted {
    path: PathBuf,
    key: String,
    parsed: ParsedFile,
}

// ---------------------------------------------------------------------------
// MergeEngine
// ---------------------------------------------------------------------------

/// Runs parse → axis → align → assemble → write over a set of files.
///
/// Parsing and alignment are independent per file and fan out over the
/// rayon pool unless the engine is built with [`MergeEngine::sequential`];
/// column order always follows the request's file order.
#[derive(Debug, Clone, Copy)]
pub struct MergeEngine {
    parallel: bool,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl MergeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that processes files one after another on the calling thread.
    pub fn sequential() -> Self {
        Self { parallel: false }
    }

    /// Merge the requested files and write both tables.
    ///
    /// Blocks until done. On error nothing is returned; if the failure
    /// happened while writing, files already written stay on disk.
    pub fn run(&self, request: &MergeRequest) -> Result<MergeOutcome, MergeError> {
        info!("Starting conversion of {} files...", request.files.len());
        let result = self
            .assemble(&request.files)
            .and_then(|merged| self.write_outputs(request, merged));
        match &result {
            Ok(_) => log_stage(MergeStage::Done),
            Err(e) => {
                log_stage(MergeStage::Failed);
                error!("Conversion failed during {:?}: {e}", e.stage());
            }
        }
        result
    }

    /// Build the merged and metadata tables in memory, without writing.
    pub fn assemble(&self, files: &[PathBuf]) -> Result<MergedSpectra, MergeError> {
        log_stage(MergeStage::Parsing);
        let (accepted, excluded) = self.parse_all(files);
        if accepted.is_empty() {
            error!("No data extracted from any file");
            return Err(MergeError::NoData {
                selected: files.len(),
                excluded,
            });
        }

        log_stage(MergeStage::AxisBuild);
        let (axis, ranges) = build_axis(
            accepted
                .iter()
                .map(|a| (a.key.as_str(), &a.parsed.series)),
        )?;

        log_stage(MergeStage::Aligning);
        let aligned: Vec<AlignedSeries> = if self.parallel {
            accepted
                .par_iter()
                .map(|a| align(&a.parsed.series, &axis))
                .collect()
        } else {
            accepted
                .iter()
                .map(|a| align(&a.parsed.series, &axis))
                .collect()
        };
        for (a, al) in accepted.iter().zip(&aligned) {
            info!(
                "  {}: {} exact matches, {}/{} points ({:.1}% coverage)",
                a.key,
                al.matches,
                al.matches,
                al.len(),
                al.coverage_percent()
            );
        }

        log_stage(MergeStage::Assembling);
        let coverage: Vec<FileCoverage> = accepted
            .iter()
            .zip(&ranges)
            .zip(&aligned)
            .map(|((a, (_, range)), al)| file_coverage(a, range, al))
            .collect();
        let data = data_table(&axis, &accepted, aligned);
        let metadata = metadata_table(&accepted, &coverage);
        info!(
            "Unified table: {} rows x {} columns",
            data.n_rows(),
            data.n_columns()
        );

        Ok(MergedSpectra {
            axis,
            data,
            metadata,
            coverage,
            excluded,
        })
    }

    fn parse_all(&self, files: &[PathBuf]) -> (Vec<Accepted>, Vec<FileFailure>) {
        let results: Vec<Result<ParsedFile, ParseError>> = if self.parallel {
            files.par_iter().map(|p| load_file(p)).collect()
        } else {
            files.iter().map(|p| load_file(p)).collect()
        };

        let mut accepted = Vec::new();
        let mut excluded = Vec::new();
        let mut used_keys = HashSet::new();

        for (path, result) in files.iter().zip(results) {
            let name = display_name(path);
            let parsed = match result {
                Ok(parsed) if parsed.series.is_empty() => {
                    warn!("  No spectral data found in {name}");
                    excluded.push(FileFailure {
                        path: path.clone(),
                        reason: FileFailureReason::EmptyData,
                        message: ParseError::EmptyData { path: path.clone() }.to_string(),
                    });
                    continue;
                }
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("  Error processing {name}: {e}");
                    excluded.push(FileFailure::from(&e));
                    continue;
                }
            };

            let key = unique_key(parsed.metadata.column_key(), &mut used_keys);
            if let Some(r) = parsed.series.range() {
                info!(
                    "  {key}: {} points, range {:.1}-{:.1} nm",
                    r.points, r.min, r.max
                );
            }
            debug!("  {name}: {} lines skipped", parsed.skipped.len());
            accepted.push(Accepted {
                path: path.clone(),
                key,
                parsed,
            });
        }

        (accepted, excluded)
    }

    fn write_outputs(
        &self,
        request: &MergeRequest,
        merged: MergedSpectra,
    ) -> Result<MergeOutcome, MergeError> {
        log_stage(MergeStage::Formatting);
        let dir = request.resolved_output_dir();
        let data_file = dir.join(DATA_FILE_NAME);
        let metadata_file = dir.join(METADATA_FILE_NAME);
        info!("Using {}", request.format);

        for (table, path) in [(&merged.data, &data_file), (&merged.metadata, &metadata_file)] {
            write_table_file(table, request.format, path).map_err(|source| MergeError::Io {
                path: path.clone(),
                source,
            })?;
            info!("Saved {}", path.display());
        }

        let summary = MergeSummary {
            data_file,
            metadata_file,
            format: request.format,
            rows: merged.data.n_rows(),
            columns: merged.data.n_columns(),
            axis_min: merged.axis.min().unwrap_or_default(),
            axis_max: merged.axis.max().unwrap_or_default(),
            files: merged.coverage.clone(),
            excluded: merged.excluded.clone(),
        };
        info!(
            "Conversion completed: {} rows x {} columns, X range {:.1} - {:.1} nm",
            summary.rows, summary.columns, summary.axis_min, summary.axis_max
        );
        Ok(MergeOutcome { merged, summary })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn log_stage(stage: MergeStage) {
    debug!("merge stage: {stage:?}");
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Return `base`, or `base_2`, `base_3`, … if already taken, and reserve it.
fn unique_key(base: String, used: &mut HashSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let key = (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_default();
    warn!("Column name '{base}' already used, renamed to '{key}'");
    used.insert(key.clone());
    key
}

fn file_coverage(accepted: &Accepted, range: &SeriesRange, aligned: &AlignedSeries) -> FileCoverage {
    FileCoverage {
        column: accepted.key.clone(),
        path: accepted.path.clone(),
        range_min: range.min,
        range_max: range.max,
        original_points: range.points,
        valid_points: aligned.matches,
        coverage_percent: aligned.coverage_percent(),
    }
}

fn data_table(axis: &UnifiedAxis, accepted: &[Accepted], aligned: Vec<AlignedSeries>) -> Table {
    let mut table = Table::new();
    table.push_column(Column::new(
        WAVELENGTH_COLUMN,
        axis.points().iter().map(|&v| Cell::Number(v)).collect(),
    ));
    for (a, al) in accepted.iter().zip(aligned) {
        table.push_column(Column::new(
            a.key.clone(),
            al.values.into_iter().map(Cell::from).collect(),
        ));
    }
    table
}

/// One row per file: raw metadata as text, then the injected coverage fields.
/// Columns appear in first-seen order across rows; absent fields are missing.
fn metadata_table(accepted: &[Accepted], coverage: &[FileCoverage]) -> Table {
    let rows: Vec<Vec<(String, Cell)>> = accepted
        .iter()
        .zip(coverage)
        .map(|(a, cov)| metadata_row(&a.parsed.metadata, cov))
        .collect();

    let mut names: Vec<&str> = Vec::new();
    for row in &rows {
        for (name, _) in row {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
    }

    let mut table = Table::new();
    for name in names {
        let cells = rows
            .iter()
            .map(|row| {
                row.iter()
                    .find(|(k, _)| k == name)
                    .map_or(Cell::Missing, |(_, c)| c.clone())
            })
            .collect();
        table.push_column(Column::new(name, cells));
    }
    table
}

fn metadata_row(metadata: &MetadataRecord, cov: &FileCoverage) -> Vec<(String, Cell)> {
    let mut row: Vec<(String, Cell)> = metadata
        .iter()
        .map(|(k, v)| (k.to_string(), Cell::Text(v.to_string())))
        .collect();

    let injected = [
        ("Column_Name", Cell::Text(cov.column.clone())),
        ("Original_Range_Min", Cell::Number(cov.range_min)),
        ("Original_Range_Max", Cell::Number(cov.range_max)),
        ("Original_Points", Cell::Integer(cov.original_points as i64)),
        ("Unified_Valid_Points", Cell::Integer(cov.valid_points as i64)),
        ("Unified_Coverage_Percent", Cell::Number(cov.coverage_percent)),
    ];
    for (name, cell) in injected {
        match row.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = cell,
            None => row.push((name.to_string(), cell)),
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(name: &str, content: &str) -> Accepted {
        let path = PathBuf::from(format!("{name}.csv"));
        let parsed = crate::data::loader::parse_content(content, &path).unwrap();
        Accepted {
            key: parsed.metadata.column_key(),
            path,
            parsed,
        }
    }

    #[test]
    fn test_unique_key_suffixes() {
        let mut used = HashSet::new();
        assert_eq!(unique_key("a".into(), &mut used), "a");
        assert_eq!(unique_key("a".into(), &mut used), "a_2");
        assert_eq!(unique_key("a".into(), &mut used), "a_3");
        assert_eq!(unique_key("a_2".into(), &mut used), "a_2_2");
    }

    #[test]
    fn test_resolved_output_dir() {
        let req = MergeRequest::new(vec![PathBuf::from("/data/run/a.csv")], FormatOptions::default());
        assert_eq!(req.resolved_output_dir(), PathBuf::from("/data/run"));

        let bare = MergeRequest::new(vec![PathBuf::from("a.csv")], FormatOptions::default());
        assert_eq!(bare.resolved_output_dir(), PathBuf::from("."));

        let explicit = bare.with_output_dir("/tmp/out");
        assert_eq!(explicit.resolved_output_dir(), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_metadata_table_columns() {
        let files = vec![
            accepted("a", "TITLE;Dark\nLamp;D2\nXYDATA\n400;1\n401;2\n"),
            accepted("b", "Operator;Ann\nXYDATA\n401;3\n"),
        ];
        let coverage = vec![
            FileCoverage {
                column: "a_Dark".into(),
                path: "a.csv".into(),
                range_min: 400.0,
                range_max: 401.0,
                original_points: 2,
                valid_points: 2,
                coverage_percent: 100.0,
            },
            FileCoverage {
                column: "b".into(),
                path: "b.csv".into(),
                range_min: 401.0,
                range_max: 401.0,
                original_points: 1,
                valid_points: 1,
                coverage_percent: 50.0,
            },
        ];
        let table = metadata_table(&files, &coverage);
        let headers: Vec<&str> = table.headers().collect();
        assert_eq!(
            headers,
            vec![
                "Filename",
                "TITLE",
                "Lamp",
                "Column_Name",
                "Original_Range_Min",
                "Original_Range_Max",
                "Original_Points",
                "Unified_Valid_Points",
                "Unified_Coverage_Percent",
                "Operator",
            ]
        );
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column("Operator").unwrap().cells[0], Cell::Missing);
        assert_eq!(table.column("Lamp").unwrap().cells[1], Cell::Missing);
        assert_eq!(
            table.column("Column_Name").unwrap().cells[0],
            Cell::Text("a_Dark".into())
        );
        assert!(table.column("Unified_Coverage_Percent").unwrap().is_numeric());
        assert!(!table.column("Filename").unwrap().is_numeric());
    }

    #[test]
    fn test_injected_fields_replace_raw_metadata() {
        let files = vec![accepted("a", "Column_Name;custom\nXYDATA\n1;2\n")];
        let coverage = vec![FileCoverage {
            column: "a".into(),
            path: "a.csv".into(),
            range_min: 1.0,
            range_max: 1.0,
            original_points: 1,
            valid_points: 1,
            coverage_percent: 100.0,
        }];
        let table = metadata_table(&files, &coverage);
        assert_eq!(table.headers().nth(1), Some("Column_Name"));
        assert_eq!(
            table.column("Column_Name").unwrap().cells[0],
            Cell::Text("a".into())
        );
    }
}
