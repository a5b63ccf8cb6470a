//! # Type System
//!
//! Column types and the runtime scalar used by every record.
//!
//! ## Module Structure
//!
//! - `data_type`: `DataType` discriminant and storage widths
//! - `column`: `ColumnDef` pairing a name with a type
//! - `value`: `Value`, the totally ordered scalar
//!
//! ## Usage
//!
//! ```ignore
//! use spillway::types::{ColumnDef, DataType, Value};
//!
//! let col = ColumnDef::new("id", DataType::Int);
//! let val = Value::Int(42);
//! assert!(val.fits(col.data_type()));
//! ```

mod column;
mod data_type;
mod value;

pub use column::ColumnDef;
pub use data_type::DataType;
pub use value::Value;
