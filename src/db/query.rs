//! Query results and SQL Server value extraction

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::time::Duration;
use tiberius::xml::XmlData;
use tiberius::{Column, ColumnType, Row};

/// Represents a cell value in the result set
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Guid(tiberius::Uuid),
    Binary(Vec<u8>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Render for delimited export: NULL becomes an empty field
    pub fn to_export_string(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            other => other.to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(v) => Value::Bool(*v),
            CellValue::Int(v) => Value::from(*v),
            CellValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            other => Value::String(other.to_string()),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Bool(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Decimal(v) => write!(f, "{}", v),
            CellValue::String(v) => write!(f, "{}", v),
            CellValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            CellValue::Time(v) => write!(f, "{}", v),
            CellValue::DateTime(v) => write!(f, "{}", v),
            CellValue::DateTimeOffset(v) => write!(f, "{}", v),
            CellValue::Guid(v) => write!(f, "{}", v),
            CellValue::Binary(v) => write!(f, "0x{}", hex::encode(v)),
        }
    }
}

/// Column metadata
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    pub(crate) fn from_column(col: &Column) -> Self {
        Self::new(col.name(), format_column_type(col))
    }
}

/// Rows of a single result set, columns in query order
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<CellValue>>,
    pub execution_time: Duration,
}

impl QueryResult {
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            columns,
            rows,
            execution_time: Duration::ZERO,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Value of column `name` in row `row`
    pub fn get(&self, row: usize, name: &str) -> Option<&CellValue> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)
    }

    /// Each row as (column name, value) pairs in column order
    pub fn records(&self) -> impl Iterator<Item = Vec<(&str, &CellValue)>> {
        self.rows
            .iter()
            .map(|row| self.column_names().zip(row.iter()).collect())
    }

    /// The only value of a one-row, one-column result
    pub fn scalar(&self) -> Option<&CellValue> {
        match (self.columns.len(), self.rows.as_slice()) {
            (1, [row]) => row.first(),
            _ => None,
        }
    }
}

pub(crate) fn format_column_type(col: &Column) -> String {
    match col.column_type() {
        ColumnType::Null => "NULL".to_string(),
        ColumnType::Bit | ColumnType::Bitn => "BIT".to_string(),
        ColumnType::Int1 => "TINYINT".to_string(),
        ColumnType::Int2 => "SMALLINT".to_string(),
        ColumnType::Int4 => "INT".to_string(),
        ColumnType::Int8 => "BIGINT".to_string(),
        ColumnType::Intn => "INT".to_string(),
        ColumnType::Float4 => "REAL".to_string(),
        ColumnType::Float8 | ColumnType::Floatn => "FLOAT".to_string(),
        ColumnType::Datetime | ColumnType::Datetimen => "DATETIME".to_string(),
        ColumnType::Datetime4 => "SMALLDATETIME".to_string(),
        ColumnType::Datetime2 => "DATETIME2".to_string(),
        ColumnType::DatetimeOffsetn => "DATETIMEOFFSET".to_string(),
        ColumnType::Daten => "DATE".to_string(),
        ColumnType::Timen => "TIME".to_string(),
        ColumnType::Decimaln => "DECIMAL".to_string(),
        ColumnType::Numericn => "NUMERIC".to_string(),
        ColumnType::Money => "MONEY".to_string(),
        ColumnType::Money4 => "SMALLMONEY".to_string(),
        ColumnType::Guid => "UNIQUEIDENTIFIER".to_string(),
        ColumnType::BigVarChar => "VARCHAR".to_string(),
        ColumnType::BigChar => "CHAR".to_string(),
        ColumnType::NVarchar => "NVARCHAR".to_string(),
        ColumnType::NChar => "NCHAR".to_string(),
        ColumnType::Text => "TEXT".to_string(),
        ColumnType::NText => "NTEXT".to_string(),
        ColumnType::BigVarBin => "VARBINARY".to_string(),
        ColumnType::BigBinary => "BINARY".to_string(),
        ColumnType::Image => "IMAGE".to_string(),
        ColumnType::Xml => "XML".to_string(),
        _ => "UNKNOWN".to_string(),
    }
}

pub(crate) fn extract_cell_value(row: &Row, index: usize, col: &Column) -> CellValue {
    match col.column_type() {
        ColumnType::Null => CellValue::Null,
        ColumnType::Bit | ColumnType::Bitn => row
            .try_get::<bool, _>(index)
            .ok()
            .flatten()
            .map(CellValue::Bool)
            .unwrap_or(CellValue::Null),
        ColumnType::Int1 | ColumnType::Int2 | ColumnType::Int4 | ColumnType::Int8 | ColumnType::Intn => {
            extract_int(row, index).unwrap_or(CellValue::Null)
        }
        ColumnType::Float4 | ColumnType::Float8 | ColumnType::Floatn => {
            if let Some(v) = row.try_get::<f64, _>(index).ok().flatten() {
                return CellValue::Float(v);
            }
            row.try_get::<f32, _>(index)
                .ok()
                .flatten()
                .map(|v| CellValue::Float(v as f64))
                .unwrap_or(CellValue::Null)
        }
        ColumnType::Decimaln | ColumnType::Numericn => row
            .try_get::<Decimal, _>(index)
            .ok()
            .flatten()
            .map(CellValue::Decimal)
            .unwrap_or(CellValue::Null),
        ColumnType::Money | ColumnType::Money4 => row
            .try_get::<f64, _>(index)
            .ok()
            .flatten()
            .map(CellValue::Float)
            .unwrap_or(CellValue::Null),
        ColumnType::Datetime
        | ColumnType::Datetime4
        | ColumnType::Datetimen
        | ColumnType::Datetime2 => row
            .try_get::<NaiveDateTime, _>(index)
            .ok()
            .flatten()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Null),
        ColumnType::DatetimeOffsetn => row
            .try_get::<DateTime<FixedOffset>, _>(index)
            .ok()
            .flatten()
            .map(CellValue::DateTimeOffset)
            .unwrap_or(CellValue::Null),
        ColumnType::Daten => row
            .try_get::<NaiveDate, _>(index)
            .ok()
            .flatten()
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null),
        ColumnType::Timen => row
            .try_get::<NaiveTime, _>(index)
            .ok()
            .flatten()
            .map(CellValue::Time)
            .unwrap_or(CellValue::Null),
        ColumnType::BigVarChar
        | ColumnType::BigChar
        | ColumnType::NVarchar
        | ColumnType::NChar
        | ColumnType::Text
        | ColumnType::NText => row
            .try_get::<&str, _>(index)
            .ok()
            .flatten()
            .map(|v| CellValue::String(v.to_string()))
            .unwrap_or(CellValue::Null),
        // XML only converts to XmlData, never to &str
        ColumnType::Xml => row
            .try_get::<&XmlData, _>(index)
            .ok()
            .flatten()
            .map(|v| CellValue::String(v.clone().into_string()))
            .unwrap_or(CellValue::Null),
        ColumnType::Guid => row
            .try_get::<tiberius::Uuid, _>(index)
            .ok()
            .flatten()
            .map(CellValue::Guid)
            .unwrap_or(CellValue::Null),
        ColumnType::BigVarBin | ColumnType::BigBinary | ColumnType::Image => row
            .try_get::<&[u8], _>(index)
            .ok()
            .flatten()
            .map(|v| CellValue::Binary(v.to_vec()))
            .unwrap_or(CellValue::Null),
        // Fallback: try various types in order of likelihood
        _ => {
            if let Some(v) = row.try_get::<&str, _>(index).ok().flatten() {
                return CellValue::String(v.to_string());
            }
            if let Some(v) = row.try_get::<NaiveDateTime, _>(index).ok().flatten() {
                return CellValue::DateTime(v);
            }
            if let Some(v) = extract_int(row, index) {
                return v;
            }
            if let Some(v) = row.try_get::<f64, _>(index).ok().flatten() {
                return CellValue::Float(v);
            }
            if let Some(v) = row.try_get::<Decimal, _>(index).ok().flatten() {
                return CellValue::Decimal(v);
            }
            CellValue::String(format!("<{:?}>", col.column_type()))
        }
    }
}

// Nullable INT columns arrive with whatever width the server picked
fn extract_int(row: &Row, index: usize) -> Option<CellValue> {
    if let Some(v) = row.try_get::<i32, _>(index).ok().flatten() {
        return Some(CellValue::Int(v as i64));
    }
    if let Some(v) = row.try_get::<i64, _>(index).ok().flatten() {
        return Some(CellValue::Int(v));
    }
    if let Some(v) = row.try_get::<i16, _>(index).ok().flatten() {
        return Some(CellValue::Int(v as i64));
    }
    row.try_get::<u8, _>(index)
        .ok()
        .flatten()
        .map(|v| CellValue::Int(v as i64))
}

// Helper for hex encoding binary data
mod hex {
    pub fn encode(data: &[u8]) -> String {
        data.iter().map(|b| format!("{:02X}", b)).collect()
    }
}
