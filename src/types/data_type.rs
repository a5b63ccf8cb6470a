//! # Column Data Types
//!
//! `DataType` is the storage-level discriminant of a column. It is
//! metadata-free: the declared width of a text column lives on `ColumnDef`.
//!
//! ## Storage Widths
//!
//! | Type | Width |
//! |------|-------|
//! | Bool | 1 byte |
//! | Int | 8 bytes |
//! | Float | 8 bytes |
//! | Text | declared length (default 32 bytes) |
//!
//! Widths feed the page capacity computation in `storage::entries_per_page`.

use std::fmt;

use crate::config::{BOOL_WIDTH, NUMERIC_WIDTH};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool = 0,
    Int = 1,
    Float = 2,
    Text = 3,
}

impl DataType {
    /// Width in bytes for fixed-size types, `None` for text.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            DataType::Bool => Some(BOOL_WIDTH),
            DataType::Int | DataType::Float => Some(NUMERIC_WIDTH),
            DataType::Text => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Bool => "BOOL",
            DataType::Int => "INT",
            DataType::Float => "FLOAT",
            DataType::Text => "TEXT",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
