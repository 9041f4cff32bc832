//! Columns derived from a document's file name.

use std::{path::Path, sync::LazyLock};

use regex::Regex;

use crate::error::{Error, Result};

static YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}").expect("year pattern is valid")
});

/// The file name shown in the `file` column.
pub fn display_name(path: &Path, keep_extension: bool) -> String {
    let name = if keep_extension {
        path.file_name()
    } else {
        path.file_stem()
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Return the first run of four digits in the base name of `filename`, or
/// `default` when there is none.
pub fn extract_year(filename: &str, default: Option<&str>) -> Option<String> {
    let base = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_else(|| filename.into());
    YEAR.find(&base)
        .map(|m| m.as_str().to_string())
        .or_else(|| default.map(str::to_string))
}

/// Columns extracted from a file name by splitting it on separators.
///
/// Each rule names a separator and the columns to take from the split
/// parts, by index. Negative indices count from the last part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Separators {
    rules: Vec<SeparatorRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SeparatorRule {
    separator: String,
    columns: Vec<(String, i64)>,
}

impl Separators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column taken from part `index` after splitting on
    /// `separator`.
    pub fn with(
        mut self,
        separator: &str,
        column: &str,
        index: i64,
    ) -> Result<Self> {
        if separator.is_empty() {
            return Err(Error::Separators("empty separator".into()));
        }
        let column = (column.to_string(), index);
        match self.rules.iter_mut().find(|r| r.separator == separator) {
            Some(rule) => rule.columns.push(column),
            None => self.rules.push(SeparatorRule {
                separator: separator.to_string(),
                columns: vec![column],
            }),
        }
        Ok(self)
    }

    /// Parse a JSON object such as `{"_": {"category": 0}, ".": {"ext": -1}}`.
    /// Key order is preserved.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| Error::Separators(e.to_string()))?;
        let serde_json::Value::Object(outer) = value else {
            return Err(Error::Separators("expected a JSON object".into()));
        };

        let mut separators = Self::new();
        for (separator, columns) in outer {
            let serde_json::Value::Object(columns) = columns else {
                return Err(Error::Separators(format!(
                    "columns for separator '{separator}' must be an object"
                )));
            };
            for (column, index) in columns {
                let index = index.as_i64().ok_or_else(|| {
                    Error::Separators(format!(
                        "index for column '{column}' must be an integer"
                    ))
                })?;
                separators = separators.with(&separator, &column, index)?;
            }
        }
        Ok(separators)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every configured column name, in rule order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .flat_map(|r| r.columns.iter().map(|(c, _)| c.as_str()))
    }
}

/// Split `filename` on each separator and pick out the configured parts.
///
/// Columns whose index is out of range for a given name are left out of
/// the result instead of being set to an empty value.
pub fn apply_separators(
    filename: &str,
    separators: &Separators,
) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for rule in &separators.rules {
        let parts: Vec<&str> = filename.split(rule.separator.as_str()).collect();
        for (column, index) in &rule.columns {
            if let Some(part) = part_at(&parts, *index) {
                out.push((column.clone(), part.trim().to_string()));
            }
        }
    }
    out
}

fn part_at<'a>(parts: &[&'a str], index: i64) -> Option<&'a str> {
    let len = i64::try_from(parts.len()).ok()?;
    let index = if index < 0 { len + index } else { index };
    if (0..len).contains(&index) {
        Some(parts[index as usize])
    } else {
        None
    }
}
