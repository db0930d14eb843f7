//! Merge semicolon-delimited spectral text files onto one wavelength axis.
//!
//! The entry point for front-ends is [`data::merge::MergeEngine::run`]: give it
//! a [`data::merge::MergeRequest`] and it parses every file, builds the unified
//! axis, aligns each spectrum by exact match and writes the two output tables.

pub mod data;
pub mod error;
pub mod locale;
pub mod output;

pub use data::merge::{MergeEngine, MergeOutcome, MergeRequest, MergeSummary};
pub use error::{MergeError, ParseError};
pub use output::{DecimalSeparator, FieldSeparator, FormatOptions, FormatPreset};
