use regex::Regex;
use tracing::debug;

use super::table::{Cell, Column, ColumnKind, RawTable, TypedTable};
use crate::error::TypeError;
use crate::settings::Settings;

/// Locale-specific number reader. With `,` as decimal and `.` as thousands
/// separator, `1.234,5` is 1234.5 and `2.5` is not a number.
#[derive(Debug, Clone)]
pub struct NumberFormat {
    decimal: char,
    thousands: char,
    pattern: Regex,
}

impl NumberFormat {
    pub fn new(decimal: char, thousands: char) -> Result<Self, regex::Error> {
        let d = regex::escape(&decimal.to_string());
        let t = regex::escape(&thousands.to_string());
        let pattern = Regex::new(&format!(r"^[+-]?(?:\d{{1,3}}(?:{t}\d{{3}})+|\d+)(?:{d}\d+)?$"))?;
        Ok(NumberFormat {
            decimal,
            thousands,
            pattern,
        })
    }

    pub fn parse(&self, text: &str) -> Option<f64> {
        if !self.pattern.is_match(text) {
            return None;
        }
        let canonical: String = text
            .chars()
            .filter(|c| *c != self.thousands)
            .map(|c| if c == self.decimal { '.' } else { c })
            .collect();
        canonical.parse::<f64>().ok()
    }
}

/// Classifies each column as numeric or text and converts its cells.
#[derive(Debug, Clone)]
pub struct ColumnTyper {
    format: NumberFormat,
    null_markers: Vec<String>,
    label_columns: Vec<String>,
}

impl ColumnTyper {
    pub fn new(format: NumberFormat, null_markers: Vec<String>, label_columns: Vec<String>) -> Self {
        ColumnTyper {
            format,
            null_markers,
            label_columns,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, regex::Error> {
        let format = NumberFormat::new(settings.decimal_separator, settings.thousands_separator)?;
        Ok(Self::new(
            format,
            settings.null_markers.clone(),
            settings.label_columns.clone(),
        ))
    }

    pub fn type_table(&self, table: RawTable) -> Result<TypedTable, TypeError> {
        let width = table.width();
        if let Some((row, cells)) = table.rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(TypeError::Shape {
                row,
                expected: width,
                found: cells.len(),
            });
        }

        let kinds: Vec<ColumnKind> = (0..width)
            .map(|col| self.classify(&table.header[col], table.rows.iter().map(|r| r[col].as_str())))
            .collect();
        debug!("Column kinds: {:?}", table.header.iter().zip(&kinds).collect::<Vec<_>>());

        let mut rows = Vec::with_capacity(table.rows.len());
        for raw in &table.rows {
            let mut row = Vec::with_capacity(width);
            for (col, text) in raw.iter().enumerate() {
                row.push(self.convert(&table.header[col], kinds[col], text)?);
            }
            rows.push(row);
        }

        let columns = table
            .header
            .into_iter()
            .zip(kinds)
            .map(|(name, kind)| Column { name, kind })
            .collect();
        Ok(TypedTable { columns, rows })
    }

    fn classify<'a>(&self, name: &str, cells: impl Iterator<Item = &'a str>) -> ColumnKind {
        if self.is_label(name) {
            return ColumnKind::Text;
        }
        let mut present = cells.filter_map(|c| self.non_empty(c));
        if present.all(|c| self.format.parse(c).is_some()) {
            ColumnKind::Numeric
        } else {
            ColumnKind::Text
        }
    }

    fn convert(&self, column: &str, kind: ColumnKind, text: &str) -> Result<Cell, TypeError> {
        let Some(text) = self.non_empty(text) else {
            return Ok(Cell::Null);
        };
        match kind {
            ColumnKind::Text => Ok(Cell::Text(text.to_string())),
            ColumnKind::Numeric => self.format.parse(text).map(Cell::Number).ok_or_else(|| TypeError::Cast {
                column: column.to_string(),
                value: text.to_string(),
            }),
        }
    }

    fn is_label(&self, name: &str) -> bool {
        self.label_columns.iter().any(|l| l.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// Trimmed text, or `None` for blanks and null markers.
    fn non_empty<'a>(&self, text: &'a str) -> Option<&'a str> {
        let text = text.trim();
        if text.is_empty() || self.null_markers.iter().any(|m| m.eq_ignore_ascii_case(text)) {
            None
        } else {
            Some(text)
        }
    }
}
