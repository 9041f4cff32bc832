//! Result rows and the column-uniform table they are merged into.

use std::{fmt, path::Path};

use serde::Serialize;

use crate::error::{Error, Result};

/// A single cell.
///
/// Variant order doubles as the sort order across variants: missing cells
/// sort first, then integers, then text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Integer(u64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Integer(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Option<String>> for Value {
    fn from(s: Option<String>) -> Self {
        s.map_or(Value::Missing, Value::Text)
    }
}

/// One document's result: an ordered mapping of column name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column`, keeping its position if it is already present.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| name == column) {
            Some((_, cell)) => *cell = value,
            None => self.cells.push((column.to_string(), value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// How a table is rendered for display or written to disk.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum,
)]
pub enum TableBackend {
    /// Fixed-width columns joined by commas.
    #[default]
    Aligned,
    Csv,
    Json,
}

/// Rows sharing one column schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn from_row(row: Row) -> Self {
        let (columns, values): (Vec<String>, Vec<Value>) =
            row.cells.into_iter().unzip();
        Self {
            columns,
            rows: vec![values],
        }
    }

    /// Build a table from named columns of equal length.
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self> {
        let height = columns.first().map_or(0, |(_, v)| v.len());
        if let Some((name, values)) =
            columns.iter().find(|(_, v)| v.len() != height)
        {
            return Err(Error::Table(format!(
                "column '{name}' has {} values, expected {height}",
                values.len()
            )));
        }

        let mut rows = vec![Vec::with_capacity(columns.len()); height];
        let mut names = Vec::with_capacity(columns.len());
        for (name, values) in columns {
            names.push(name);
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
        }
        Ok(Self {
            columns: names,
            rows,
        })
    }

    /// Stack tables vertically. All tables must share the same columns in
    /// the same order.
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Result<Self> {
        let mut tables = tables.into_iter();
        let Some(mut out) = tables.next() else {
            return Ok(Self::default());
        };
        for table in tables {
            if table.columns != out.columns {
                return Err(Error::Table(format!(
                    "column mismatch: [{}] vs [{}]",
                    out.columns.join(", "),
                    table.columns.join(", ")
                )));
            }
            out.rows.extend(table.rows);
        }
        Ok(out)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// Every value of `column`, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[col]).collect())
    }

    /// Stable ascending sort on the given columns. Names that are not
    /// columns of this table are ignored; returns the keys actually used.
    pub fn sort_by(&mut self, columns: &[String]) -> Vec<String> {
        let keys: Vec<(usize, &String)> = columns
            .iter()
            .filter_map(|c| self.column_index(c).map(|i| (i, c)))
            .collect();
        let used = keys.iter().map(|(_, c)| (*c).clone()).collect();
        let indices: Vec<usize> = keys.into_iter().map(|(i, _)| i).collect();

        if !indices.is_empty() {
            self.rows.sort_by(|a, b| {
                indices
                    .iter()
                    .map(|&i| a[i].cmp(&b[i]))
                    .find(|ord| ord.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        used
    }

    pub fn render(&self, backend: TableBackend) -> Result<String> {
        match backend {
            TableBackend::Aligned => Ok(self.render_aligned(",", false)),
            TableBackend::Csv => Ok(self.render_csv()),
            TableBackend::Json => self.render_json(),
        }
    }

    pub fn write(&self, path: &Path, backend: TableBackend) -> Result<()> {
        std::fs::write(path, self.render(backend)?)?;
        Ok(())
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                self.rows
                    .iter()
                    .map(|r| r[i].to_string().chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn render_aligned(&self, delimiter: &str, rule: bool) -> String {
        let widths = self.widths();
        let line = |cells: Vec<String>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &w)| format!("{cell:>w$}"))
                .collect::<Vec<_>>()
                .join(delimiter)
                .trim_end()
                .to_string()
        };

        let mut out = line(self.columns.clone());
        out.push('\n');
        if rule {
            let dashes =
                widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
            out.push_str(&dashes.join(delimiter));
            out.push('\n');
        }
        for row in &self.rows {
            out.push_str(&line(row.iter().map(Value::to_string).collect()));
            out.push('\n');
        }
        out
    }

    fn render_csv(&self) -> String {
        let mut out = String::new();
        let mut push_line = |cells: Vec<String>| {
            let line = cells
                .iter()
                .map(|c| csv_field(c))
                .collect::<Vec<_>>()
                .join(",");
            out.push_str(&line);
            out.push('\n');
        };
        push_line(self.columns.clone());
        for row in &self.rows {
            push_line(row.iter().map(Value::to_string).collect());
        }
        out
    }

    fn render_json(&self) -> Result<String> {
        let mut records = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut record = serde_json::Map::new();
            for (name, value) in self.columns.iter().zip(row) {
                let value = serde_json::to_value(value)
                    .map_err(|e| Error::Table(e.to_string()))?;
                record.insert(name.clone(), value);
            }
            records.push(serde_json::Value::Object(record));
        }
        let mut out = serde_json::to_string_pretty(&records)
            .map_err(|e| Error::Table(e.to_string()))?;
        out.push('\n');
        Ok(out)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_aligned("  ", true))
    }
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
