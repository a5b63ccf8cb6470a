//! # Spillway - Bounded-Memory Sort and Join Execution
//!
//! Spillway is the query-execution core of a page-oriented relational
//! engine: an external merge sort and three equi-join algorithms that never
//! hold more than a fixed number of buffer pages of records in memory.
//!
//! ## Quick Start
//!
//! ```
//! use spillway::{ExecutionContext, JoinOperator, QueryOperator, SequentialScan};
//! use spillway::records::Schema;
//! use spillway::types::{ColumnDef, DataType, Value};
//!
//! # fn main() -> eyre::Result<()> {
//! let ctx = ExecutionContext::with_config(Default::default());
//! let schema = Schema::new(vec![ColumnDef::new("id", DataType::Int)]);
//! ctx.store().create_table("l", schema.clone())?;
//! ctx.store().create_table("r", schema)?;
//! for i in 0..10 {
//!     ctx.add_record("l", vec![Value::Int(i)])?;
//!     ctx.add_record("r", vec![Value::Int(i * 2)])?;
//! }
//!
//! let mut join = JoinOperator::sort_merge(
//!     &ctx,
//!     Box::new(SequentialScan::new(&ctx, "l")?),
//!     Box::new(SequentialScan::new(&ctx, "r")?),
//!     "l.id",
//!     "r.id",
//! )?;
//! assert_eq!(join.iterator()?.count(), 5);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Operators (scan, sort, joins)     │
//! ├─────────────────────────────────────┤
//! │  ExecutionContext (buffer budget B) │
//! ├─────────────────────────────────────┤
//! │  TableStore: tables, pages, cursors │
//! ├─────────────────────────────────────┤
//! │      Records, Schemas, Values       │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: page size, buffer budget and derived constants
//! - [`types`]: `Value`, `DataType`, `ColumnDef`
//! - [`records`]: `Record` and `Schema`
//! - [`storage`]: in-memory paged tables and checkpointed cursors
//! - [`query`]: execution context, sort and join operators

pub mod config;
pub mod query;
pub mod records;
pub mod storage;
pub mod types;

pub use config::ExecutionConfig;
pub use query::{
    ExecutionContext, JoinIterator, JoinOperator, JoinType, QueryError, QueryOperator,
    SequentialScan, SortOperator,
};
pub use records::{Record, Schema};
pub use storage::{BacktrackingIterator, TableStore};
pub use types::Value;
