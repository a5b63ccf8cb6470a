//! # Storage Module
//!
//! This module provides the page-oriented table storage that the execution
//! core reads from and writes temporary results to. It is deliberately small:
//! tables live in memory, there is no durability, no transaction isolation and
//! no indexing. What it does model faithfully is the *page* as the unit of
//! access, because every operator sizes its working set in pages.
//!
//! ## Architecture Overview
//!
//! ```text
//! TableStore (RwLock<HashMap<name, Table>>)
//!     │
//!     └── Table (schema, entries_per_page, Vec<Arc<Page>>)
//!             │
//!             └── Page (fixed-capacity slot array of Records)
//!
//! PageCursor    ── iterates Arc<Page> handles        ─┐
//! RecordCursor  ── iterates records across pages      ├─ BacktrackingIterator
//!                                                     ─┘  (peek / mark / reset)
//! ```
//!
//! ## Snapshots
//!
//! `TableStore::pages` returns the table's current page handles. Cursors built
//! from a snapshot never observe later appends, which lets an operator write a
//! temporary table while another cursor is still reading an older version.
//!
//! ## Module Organization
//!
//! - `page`: `Page` and the page capacity formula
//! - `table`: `Table` and `TableStats`
//! - `cursor`: `BacktrackingIterator`, `PageCursor`, `RecordCursor`
//! - `store`: `TableStore`

mod cursor;
mod page;
mod store;
mod table;

pub use cursor::{BacktrackingIterator, PageCursor, RecordCursor};
pub use page::{entries_per_page, Page};
pub use store::TableStore;
pub use table::{Table, TableStats};
