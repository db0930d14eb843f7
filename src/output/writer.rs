use std::io;
use std::path::Path;

use csv::{QuoteStyle, WriterBuilder};

use super::{DecimalSeparator, FormatOptions};
use crate::data::model::{Cell, Table};

/// Render one cell.
///
/// Numbers use their shortest round-trip form (`400.0`, `12.3`, `1e-5`);
/// with [`DecimalSeparator::Comma`] every `.` in that form becomes `,`.
/// Text is returned unchanged and a missing value is an empty string.
pub fn format_cell(cell: &Cell, numeric_column: bool, decimal: DecimalSeparator) -> String {
    let text = match cell {
        Cell::Number(v) => format!("{v:?}"),
        Cell::Integer(i) => i.to_string(),
        Cell::Text(s) => return s.clone(),
        Cell::Missing => return String::new(),
    };
    match (decimal, numeric_column) {
        (DecimalSeparator::Comma, true) => text.replace('.', ","),
        _ => text,
    }
}

/// Serialise `table` (header row first) into `out`.
///
/// Decimal substitution only touches columns whose cells are all numeric
/// or missing; quoting follows the usual CSV rules for the chosen delimiter.
pub fn write_table<W: io::Write>(table: &Table, options: FormatOptions, out: W) -> csv::Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(options.field_separator.as_byte())
        .quote_style(QuoteStyle::Necessary)
        .from_writer(out);

    wtr.write_record(table.headers())?;

    let numeric: Vec<bool> = table.columns.iter().map(|c| c.is_numeric()).collect();
    let mut record = Vec::with_capacity(table.n_columns());
    for row in 0..table.n_rows() {
        record.clear();
        for (col, &is_numeric) in table.columns.iter().zip(&numeric) {
            record.push(format_cell(&col.cells[row], is_numeric, options.decimal_separator));
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Serialise `table` to a string.
pub fn format_table(table: &Table, options: FormatOptions) -> csv::Result<String> {
    let mut buf = Vec::new();
    write_table(table, options, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

/// Serialise `table` into a new file at `path`, replacing any existing one.
pub fn write_table_file(table: &Table, options: FormatOptions, path: &Path) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    write_table(table, options, io::BufWriter::new(file)).map_err(io::Error::from)
}
