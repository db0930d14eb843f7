/// Output layer: delimiter/decimal conventions and table serialisation.
pub mod writer;

use std::fmt;

use serde::Serialize;

pub use writer::{format_cell, format_table, write_table, write_table_file};

// ---------------------------------------------------------------------------
// Format options
// ---------------------------------------------------------------------------

/// Character placed between fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FieldSeparator {
    Comma,
    Semicolon,
    Tab,
}

impl FieldSeparator {
    pub fn as_byte(self) -> u8 {
        match self {
            FieldSeparator::Comma => b',',
            FieldSeparator::Semicolon => b';',
            FieldSeparator::Tab => b'\t',
        }
    }
}

/// Character used as the decimal point in numeric cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecimalSeparator {
    Dot,
    Comma,
}

/// How both output tables are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatOptions {
    pub field_separator: FieldSeparator,
    pub decimal_separator: DecimalSeparator,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatPreset::Us.options()
    }
}

impl fmt::Display for FormatOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field_separator {
            FieldSeparator::Comma => "comma",
            FieldSeparator::Semicolon => "semicolon",
            FieldSeparator::Tab => "tab",
        };
        let decimal = match self.decimal_separator {
            DecimalSeparator::Dot => "dot",
            DecimalSeparator::Comma => "comma",
        };
        write!(f, "{field} field separator, {decimal} decimal separator")
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// Named combinations of separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormatPreset {
    /// `,` between fields, `.` decimals.
    Us,
    /// `;` between fields, `,` decimals.
    European,
    /// Tab between fields, `.` decimals.
    Excel,
}

impl FormatPreset {
    pub fn options(self) -> FormatOptions {
        let (field_separator, decimal_separator) = match self {
            FormatPreset::Us => (FieldSeparator::Comma, DecimalSeparator::Dot),
            FormatPreset::European => (FieldSeparator::Semicolon, DecimalSeparator::Comma),
            FormatPreset::Excel => (FieldSeparator::Tab, DecimalSeparator::Dot),
        };
        FormatOptions {
            field_separator,
            decimal_separator,
        }
    }
}
