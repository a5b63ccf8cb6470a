//! # Query Execution
//!
//! Pull-based operators that run under a fixed buffer budget of B pages.
//!
//! ## Operators
//!
//! | Operator | Memory use | Output order |
//! |----------|------------|--------------|
//! | `SequentialScan` | 1 page | Storage order |
//! | `SortOperator` | B pages per run, B - 1 inputs + 1 output per merge | Comparator order |
//! | `JoinOperator` (page nested loop) | 1 outer + 1 inner page | Outer page, inner page |
//! | `JoinOperator` (block nested loop) | B - 2 outer + 1 inner page | Outer block, inner page |
//! | `JoinOperator` (sort-merge) | see `SortOperator` | Join key |
//!
//! B is not enforced by a tracker; block sizes and merge fan-in are derived
//! from it so that no operator holds more than B pages of records.
//!
//! ## Execution Model
//!
//! Everything is synchronous and single-threaded per operator. Results are
//! produced only as the consumer pulls them. An operator owns its cursors
//! and is not shared between threads; the underlying `TableStore` is.
//!
//! ## Module Structure
//!
//! - `context`: `ExecutionContext`, the storage facade operators use
//! - `error`: `QueryError`
//! - `operator`: `QueryOperator` trait and `SequentialScan`
//! - `sort`: external merge sort
//! - `join`: nested-loop and sort-merge equi-joins

mod context;
mod error;
mod operator;

pub mod join;
pub mod sort;

pub use context::ExecutionContext;
pub use error::QueryError;
pub use join::{JoinColumns, JoinIterator, JoinOperator, JoinType};
pub use operator::{QueryOperator, RecordIter, SequentialScan};
pub use sort::{by_all_columns, by_column, RecordComparator, Run, SortOperator};
