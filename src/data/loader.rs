use std::path::Path;

use log::debug;

use super::model::{normalize_key, MetadataRecord, ParsedFile, RawSeries, SkipReason, SkippedLine};
use crate::error::ParseError;

/// Line that separates the metadata header from the data block.
pub const DATA_MARKER: &str = "XYDATA";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Parse one spectral text file.
///
/// Layout, in order:
/// ```text
/// Key;value            metadata, any number of lines
/// XYDATA               or "XYDATA;"
/// 400,5;0,123          x;y[;...], comma or dot decimals
/// Key;value value      optional trailing metadata
/// ```
///
/// Only a missing marker is an error. A file whose data block yields no
/// valid row comes back with an empty series; the caller decides what that
/// means.
pub fn load_file(path: &Path) -> Result<ParsedFile, ParseError> {
    let bytes = std::fs::read(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_content(&decode_permissive(&bytes), path)
}

/// Parse already-decoded file content. `path` supplies the `Filename`
/// (file stem) and is used in errors.
pub fn parse_content(content: &str, path: &Path) -> Result<ParsedFile, ParseError> {
    let filename = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    // `\r\n`, `\r` and `\n` all end a line.
    let normalized = content
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    let lines: Vec<&str> = normalized.trim().split('\n').map(str::trim).collect();

    let marker = lines
        .iter()
        .position(|l| is_data_marker(l))
        .ok_or_else(|| ParseError::Format {
            path: path.to_path_buf(),
        })?;
    let data_start = marker + 1;

    let mut metadata = MetadataRecord::new(&filename);
    let mut skipped = Vec::new();

    // -- Header metadata --
    for (i, line) in lines[..marker].iter().enumerate() {
        let parsed = if line.starts_with(DATA_MARKER) {
            None
        } else {
            parse_metadata_line(line)
        };
        let reason = match parsed {
            Some((key, value)) if metadata.insert_if_absent(key.clone(), value.clone()) => continue,
            Some(_) => SkipReason::DuplicateKey,
            None if line.is_empty() => SkipReason::Empty,
            None => SkipReason::NotMetadata,
        };
        skipped.push(SkippedLine {
            line_no: i + 1,
            reason,
        });
    }

    // -- Trailing metadata, scanned upward from the end of the file --
    // The first line after the marker is never treated as trailing metadata.
    for i in (data_start + 1..lines.len()).rev() {
        let line = lines[i];
        if !is_trailing_metadata(line) {
            continue;
        }
        if let Some((key, value)) = parse_metadata_line(line) {
            if !metadata.insert_if_absent(key, value) {
                skipped.push(SkippedLine {
                    line_no: i + 1,
                    reason: SkipReason::DuplicateKey,
                });
            }
        }
    }

    // -- Data block --
    let mut series = RawSeries::new();
    for (i, line) in lines.iter().enumerate().skip(data_start) {
        match classify_data_line(line) {
            LineOutcome::Data { x, y } => series.push(x, y),
            LineOutcome::Skipped(reason) => {
                debug!("{filename}: line {} skipped ({reason})", i + 1);
                skipped.push(SkippedLine {
                    line_no: i + 1,
                    reason,
                });
            }
        }
    }
    skipped.sort_by_key(|s| s.line_no);

    Ok(ParsedFile {
        metadata,
        series,
        skipped,
    })
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

/// What a single line of the data block turned into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineOutcome {
    Data { x: f64, y: f64 },
    Skipped(SkipReason),
}

/// `true` for a (trimmed) line that is exactly `XYDATA` or `XYDATA;`.
pub fn is_data_marker(line: &str) -> bool {
    line == DATA_MARKER || line.strip_suffix(';') == Some(DATA_MARKER)
}

/// Split a `Key;value` line on its first `;`.
/// Returns `None` when the line has no separator.
pub fn parse_metadata_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(';')?;
    Some((normalize_key(key), value.trim().to_string()))
}

/// Decide whether a line below the data block carries metadata.
///
/// With every `;` turned into a space and the ends trimmed, a line holding
/// exactly one space looks like an `x;y` pair and is left to the data
/// parser. Any other count (none, or two or more) is read as `Key;value`.
/// Commas play no part in the count, so decimal style does not matter.
pub fn is_trailing_metadata(line: &str) -> bool {
    if !line.contains(';') {
        return false;
    }
    let squashed = line.replace(';', " ");
    squashed.trim().matches(' ').count() != 1
}

/// Parse a data-block line into an `(x, y)` pair or a skip reason.
pub fn classify_data_line(line: &str) -> LineOutcome {
    let line = line.trim();
    if line.is_empty() {
        return LineOutcome::Skipped(SkipReason::Empty);
    }
    if line.starts_with('#') || line.starts_with('[') {
        return LineOutcome::Skipped(SkipReason::Comment);
    }
    let mut parts = line.split(';');
    let (Some(x_raw), Some(y_raw)) = (parts.next(), parts.next()) else {
        return LineOutcome::Skipped(SkipReason::NoSeparator);
    };

    let x_str = x_raw.trim().replace(',', ".");
    let y_str = y_raw.trim().replace(',', ".");
    if x_str.is_empty() || y_str.is_empty() {
        return LineOutcome::Skipped(SkipReason::EmptyField);
    }

    match (x_str.parse::<f64>(), y_str.parse::<f64>()) {
        (Ok(x), Ok(y)) if x.is_finite() && y.is_finite() => LineOutcome::Data { x, y },
        (Ok(_), Ok(_)) => LineOutcome::Skipped(SkipReason::NonFinite),
        _ => LineOutcome::Skipped(SkipReason::BadNumber),
    }
}

/// Decode bytes as UTF-8, dropping invalid sequences instead of failing.
pub fn decode_permissive(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}
