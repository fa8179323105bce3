//! Delimited export: one header row, one record per row, no index column

use crate::db::QueryResult;
use crate::error::Result;
use std::io::Write;
use std::path::Path;

#[derive(Clone, Copy, Debug)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub include_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            include_headers: true,
        }
    }
}

/// Write `result` as comma-separated values to `path`
pub fn write_csv(result: &QueryResult, path: impl AsRef<Path>) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_csv_to(result, std::io::BufWriter::new(file), CsvOptions::default())?;
    tracing::debug!(path = %path.as_ref().display(), rows = result.row_count(), "wrote csv");
    Ok(())
}

pub fn write_csv_to<W: Write>(result: &QueryResult, writer: W, options: CsvOptions) -> Result<()> {
    let mut wtr = ::csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    if options.include_headers && !result.columns.is_empty() {
        wtr.write_record(result.column_names())?;
    }
    for row in &result.rows {
        wtr.write_record(row.iter().map(|c| c.to_export_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
