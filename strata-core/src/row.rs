use crate::{Result, Value};
use std::sync::Arc;

/// What the engine reports about a result column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    /// Declared SQL type of the source column, when the engine knows it.
    pub declared_type: Option<String>,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
        }
    }
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values()[i])
    }
    /// Moves the value out, leaving NULL behind. Missing columns read as NULL.
    pub fn take_column(&mut self, name: &str) -> Value {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| std::mem::take(&mut self.values[i]))
            .unwrap_or_default()
    }
    pub fn into_values(self) -> Row {
        self.values
    }
}

/// Target shape of hydration.
pub trait FromRow: Sized {
    /// Declared type of a column, used as conversion hint.
    fn declared_type(_column: &str) -> Option<&'static Value> {
        None
    }
    fn from_row(row: RowLabeled) -> Result<Self>;
    /// Called once the row has been fully hydrated, before the caller sees it.
    fn hydrated(&mut self) {}
}

impl FromRow for RowLabeled {
    fn from_row(row: RowLabeled) -> Result<Self> {
        Ok(row)
    }
}

impl FromRow for Row {
    fn from_row(row: RowLabeled) -> Result<Self> {
        Ok(row.values)
    }
}

impl FromRow for Value {
    /// First column of the row.
    fn from_row(row: RowLabeled) -> Result<Self> {
        Ok(row.values.into_vec().into_iter().next().unwrap_or_default())
    }
}
