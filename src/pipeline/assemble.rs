use std::collections::HashSet;

use serde_json::{Number, Value};

use super::table::{Cell, ColumnKind, Record, TableResult, TypedTable};

/// Turn a sanitized table into records plus feature metadata.
pub fn assemble(table: TypedTable) -> TableResult {
    let features = unique_names(table.columns.iter().map(|c| c.name.as_str()));
    let numeric_features = features
        .iter()
        .zip(&table.columns)
        .filter(|(_, c)| c.kind == ColumnKind::Numeric)
        .map(|(name, _)| name.clone())
        .collect();

    let records = table
        .rows
        .into_iter()
        .map(|row| {
            features
                .iter()
                .cloned()
                .zip(row.into_iter().map(to_json))
                .collect::<Record>()
        })
        .collect();

    TableResult {
        records,
        features,
        numeric_features,
    }
}

fn to_json(cell: Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Number(n) => Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
        Cell::Text(s) => Value::String(s),
    }
}

/// Blank names become `Unnamed: <index>`; repeats get `.1`, `.2`, ...
/// skipping any suffix that is already taken.
fn unique_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let names: Vec<String> = names
        .enumerate()
        .map(|(i, n)| {
            if n.trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                n.to_string()
            }
        })
        .collect();

    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(names.len());

    for name in &names {
        if seen.insert(name) {
            out.push(name.clone());
            continue;
        }
        let mut n = 1;
        let renamed = loop {
            let candidate = format!("{}.{}", name, n);
            if !taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        taken.insert(renamed.clone());
        out.push(renamed);
    }
    out
}
