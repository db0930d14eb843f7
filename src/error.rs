use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::data::merge::MergeStage;

// ---------------------------------------------------------------------------
// Per-file errors (never abort a run on their own)
// ---------------------------------------------------------------------------

/// Failure to turn one file into a series.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The file has no line equal to `XYDATA` or `XYDATA;`.
    #[error("{}: XYDATA section not found in file", path.display())]
    Format { path: PathBuf },

    /// The marker is present but no data row could be parsed.
    #[error("{}: no valid data rows after XYDATA", path.display())]
    EmptyData { path: PathBuf },

    /// The file could not be read at all.
    #[error("{}: cannot read file: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ParseError::Format { path }
            | ParseError::EmptyData { path }
            | ParseError::Read { path, .. } => path,
        }
    }

    pub fn reason(&self) -> FileFailureReason {
        match self {
            ParseError::Format { .. } => FileFailureReason::Format,
            ParseError::EmptyData { .. } => FileFailureReason::EmptyData,
            ParseError::Read { .. } => FileFailureReason::Read,
        }
    }
}

/// Category of a per-file failure, as reported in the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileFailureReason {
    Format,
    EmptyData,
    Read,
}

/// A file that was excluded from the run, with the cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: FileFailureReason,
    pub message: String,
}

impl From<&ParseError> for FileFailure {
    fn from(err: &ParseError) -> Self {
        Self {
            path: err.path().to_path_buf(),
            reason: err.reason(),
            message: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Axis construction
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AxisError {
    #[error("no series contributed any wavelength point")]
    EmptyInput,
}

// ---------------------------------------------------------------------------
// Run-fatal errors
// ---------------------------------------------------------------------------

/// Coarse classification of a failed run, for front-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoData,
    EmptyInput,
    Io,
}

/// A run that did not complete. No merged table is returned with it.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Every selected file failed to contribute a series (or none were given).
    #[error("no data could be extracted from the {selected} selected file(s)")]
    NoData {
        selected: usize,
        excluded: Vec<FileFailure>,
    },

    #[error(transparent)]
    Axis(#[from] AxisError),

    /// An output file could not be written. Files written earlier in the
    /// same run are left in place.
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MergeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MergeError::NoData { .. } => ErrorKind::NoData,
            MergeError::Axis(AxisError::EmptyInput) => ErrorKind::EmptyInput,
            MergeError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Pipeline stage the run was in when it failed.
    pub fn stage(&self) -> MergeStage {
        match self {
            MergeError::NoData { .. } => MergeStage::Parsing,
            MergeError::Axis(_) => MergeStage::AxisBuild,
            MergeError::Io { .. } => MergeStage::Formatting,
        }
    }
}
