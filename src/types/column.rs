//! # Column Definitions
//!
//! A `ColumnDef` pairs a name with a `DataType` and, for text columns, the
//! declared length that determines the column's on-page width.
//!
//! ```ignore
//! use spillway::types::{ColumnDef, DataType};
//!
//! let id = ColumnDef::new("id", DataType::Int);
//! let name = ColumnDef::text("name", 16);
//! assert_eq!(name.width(), 16);
//! ```

use super::DataType;
use crate::config::DEFAULT_TEXT_WIDTH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    name: String,
    data_type: DataType,
    char_length: Option<u32>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            char_length: None,
        }
    }

    /// Creates a text column holding at most `length` bytes.
    pub fn text(name: impl Into<String>, length: u32) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Text,
            char_length: Some(length),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn char_length(&self) -> Option<u32> {
        self.char_length
    }

    /// Bytes this column occupies in a stored record.
    pub fn width(&self) -> usize {
        self.data_type.fixed_size().unwrap_or_else(|| {
            self.char_length
                .map(|len| len as usize)
                .unwrap_or(DEFAULT_TEXT_WIDTH)
        })
    }

    /// Returns a copy of this column under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(ColumnDef::new("a", DataType::Int).width(), 8);
        assert_eq!(ColumnDef::new("b", DataType::Bool).width(), 1);
        assert_eq!(ColumnDef::text("c", 5).width(), 5);
        assert_eq!(ColumnDef::new("d", DataType::Text).width(), DEFAULT_TEXT_WIDTH);
    }

    #[test]
    fn renamed_keeps_type() {
        let col = ColumnDef::text("name", 12).renamed("users.name");
        assert_eq!(col.name(), "users.name");
        assert_eq!(col.data_type(), DataType::Text);
        assert_eq!(col.char_length(), Some(12));
    }
}
