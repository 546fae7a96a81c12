use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single cell in a tabular dataset. Nullable by construction: failed
/// coercions produce `Null`, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Str(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(x: f64) -> Self {
        CellValue::Float(x)
    }
}

/// A named column of cell values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }
}

/// An in-memory table: an ordered list of named columns.
///
/// All mutating-looking operations (`rename_columns`, column replacement via
/// `with_column`) return or build a new frame; an input frame handed to the
/// schema pipeline is never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    columns: Vec<Column>,
}

impl DataFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, replacing any existing column with the same name in place
    /// (preserving column order).
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<CellValue>) -> Self {
        let name = name.into();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column::new(name, values)),
        }
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows, taken from the longest column.
    pub fn num_rows(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    /// Cell lookup by column name and row index.
    pub fn cell(&self, name: &str, row: usize) -> Option<&CellValue> {
        self.column(name).and_then(|c| c.values.get(row))
    }

    /// Return a new frame with columns renamed per `mapping`. Columns not
    /// present in the mapping keep their name; column order is preserved.
    pub fn rename_columns(&self, mapping: &HashMap<String, String>) -> DataFrame {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let name = mapping.get(&c.name).cloned().unwrap_or_else(|| c.name.clone());
                Column::new(name, c.values.clone())
            })
            .collect();
        DataFrame { columns }
    }
}
