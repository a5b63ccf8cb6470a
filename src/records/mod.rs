//! # Records and Schemas
//!
//! This module provides the row representation that flows between operators.
//!
//! ## Record
//!
//! A `Record` is an immutable, ordered tuple of `Value`s. The values live
//! behind an `Arc<[Value]>`, so replaying a block or re-emitting a record in a
//! join group clones a pointer, not the data. Join outputs are built with
//! `Record::concat`, which allocates a new tuple holding the left values
//! followed by the right values.
//!
//! ## Schema
//!
//! A `Schema` is an ordered list of `ColumnDef`s. It is only used to create
//! tables and to resolve join column names to offsets; it is never mutated
//! after creation.
//!
//! ```text
//! users (id INT, name TEXT(8))      orders (uid INT, item TEXT(8))
//!            │                                  │
//!            └──────────── concat ──────────────┘
//!                              │
//!     users.id, users.name, orders.uid, orders.item
//! ```
//!
//! ## Module Structure
//!
//! - `record`: `Record`
//! - `schema`: `Schema`, column resolution and record validation

mod record;
mod schema;

pub use record::Record;
pub use schema::Schema;
