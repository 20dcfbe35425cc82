use serde::{Deserialize, Serialize};

/// Grid of cell texts as found in the page. Every row has `header.len()`
/// cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn width(&self) -> usize {
        self.header.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// A column is either entirely numeric or entirely text; `Null` may appear
/// in both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

/// One output row: column name -> value, in column order.
pub type Record = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableResult {
    pub records: Vec<Record>,
    pub features: Vec<String>,
    pub numeric_features: Vec<String>,
}

/// Every table of a page, in page order.
pub type DatasetResult = Vec<TableResult>;

/// Which located tables a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Single(TableResult),
    Tables(DatasetResult),
}
