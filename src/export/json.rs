//! JSON export as an array of row objects

use crate::db::QueryResult;
use crate::error::Result;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

/// Rows as `[{column: value, ...}, ...]`.
///
/// Object keys must be unique, so when several columns share a name only the
/// rightmost one's value is kept. Alias columns in the SQL to keep them all.
pub fn to_json(result: &QueryResult) -> Value {
    let mut seen = HashSet::new();
    let duplicates: Vec<&str> = result
        .column_names()
        .filter(|name| !seen.insert(*name))
        .collect();
    if !duplicates.is_empty() {
        tracing::warn!(
            columns = ?duplicates,
            "duplicate column names, JSON keeps the last value for each"
        );
    }

    let rows = result
        .records()
        .map(|record| {
            let obj: Map<String, Value> = record
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.to_json()))
                .collect();
            Value::Object(obj)
        })
        .collect();
    Value::Array(rows)
}

pub fn write_json(result: &QueryResult, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(&to_json(result))?;
    std::fs::write(path.as_ref(), json)?;
    Ok(())
}
