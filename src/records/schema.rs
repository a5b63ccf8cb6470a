//! # Schema Definition
//!
//! `Schema` is the ordered list of columns of a table or operator output.
//!
//! ## Column Resolution
//!
//! Operators refer to columns by name. Names of base tables are fully
//! qualified (`users.id`), so `resolve` accepts either form:
//!
//! 1. An exact match on the stored name wins, if it is the only one.
//! 2. Otherwise an unqualified name matches the part after the last `.` of
//!    each stored name; exactly one column must match.
//!
//! A missing or ambiguous name is a `QueryError::Schema`.

use eyre::Result;

use crate::query::QueryError;
use crate::types::{ColumnDef, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnDef>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&ColumnDef> {
        self.columns.get(idx)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    /// Bytes one record of this schema occupies on a page.
    pub fn record_size(&self) -> usize {
        self.columns.iter().map(ColumnDef::width).sum()
    }

    /// Schema of a join output: this schema's columns followed by `right`'s.
    pub fn concat(&self, right: &Schema) -> Schema {
        let mut columns = self.columns.clone();
        columns.extend(right.columns.iter().cloned());
        Schema { columns }
    }

    /// Prefixes every unqualified column name with `table`.
    pub fn qualified(&self, table: &str) -> Schema {
        let columns = self
            .columns
            .iter()
            .map(|col| {
                if col.name().contains('.') {
                    col.clone()
                } else {
                    col.renamed(format!("{}.{}", table, col.name()))
                }
            })
            .collect();
        Schema { columns }
    }

    /// Resolves a column name to its offset in this schema.
    pub fn resolve(&self, name: &str) -> Result<usize> {
        let mut exact = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, col)| col.name() == name);
        let mut suffix = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, col)| unqualified(col.name()) == name);

        let candidates = match exact.next() {
            Some(found) => (Some(found), exact.next()),
            None => (suffix.next(), suffix.next()),
        };

        match candidates {
            (Some((idx, _)), None) => Ok(idx),
            (Some(_), Some(_)) => Err(QueryError::Schema {
                message: format!("column '{}' is ambiguous", name),
            }
            .into()),
            (None, _) => Err(QueryError::Schema {
                message: format!(
                    "column '{}' not found among [{}]",
                    name,
                    self.names().collect::<Vec<_>>().join(", ")
                ),
            }
            .into()),
        }
    }

    /// Checks arity, per-column types and text widths of a record about to
    /// be stored.
    pub fn validate(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(QueryError::Schema {
                message: format!(
                    "expected {} values, got {}",
                    self.columns.len(),
                    values.len()
                ),
            }
            .into());
        }

        for (value, col) in values.iter().zip(&self.columns) {
            if let Value::Text(text) = value {
                if text.len() > col.width() {
                    return Err(QueryError::Schema {
                        message: format!(
                            "text of {} bytes exceeds column {} width of {}",
                            text.len(),
                            col.name(),
                            col.width()
                        ),
                    }
                    .into());
                }
            }
            if !value.fits(col.data_type()) {
                return Err(QueryError::Schema {
                    message: format!(
                        "value {} does not fit column {} of type {}",
                        value,
                        col.name(),
                        col.data_type()
                    ),
                }
                .into());
            }
        }

        Ok(())
    }
}

fn unqualified(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
