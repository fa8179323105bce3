//! Writing query results to files

mod csv;
mod json;

pub use self::csv::{write_csv, write_csv_to, CsvOptions};
pub use self::json::{to_json, write_json};

/// Output format for exported results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// Pick a format from a file extension, CSV unless it ends in `.json`
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}
