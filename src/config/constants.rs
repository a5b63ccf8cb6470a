//! # Execution Constants
//!
//! This module centralizes the constants that size pages, blocks and merge
//! fan-in. Interdependent values are co-located and their relationships are
//! checked at compile time.
//!
//! ## Dependency Graph
//!
//! ```text
//! PAGE_SIZE (4096 bytes)
//!       │
//!       └─> MIN_PAGE_SIZE (must be <=)
//!
//! DEFAULT_MEMORY_PAGES (8)
//!       │
//!       └─> MIN_MEMORY_PAGES (3, must be <=)
//!             Block join:  1 inner page + 1 output page + >= 1 outer page
//!             Merge pass:  1 output page + >= 2 input runs
//! ```
//!
//! ## Critical Invariants
//!
//! 1. `MIN_MEMORY_PAGES <= DEFAULT_MEMORY_PAGES`
//! 2. `MIN_MEMORY_PAGES - BLOCK_JOIN_RESERVED_PAGES >= 1` (outer block never empty)
//! 3. `MIN_MEMORY_PAGES - MERGE_OUTPUT_PAGES >= 2` (a merge pass always reduces runs)

// ============================================================================
// PAGE LAYOUT
// ============================================================================

/// Default size of a table page in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Smallest page size accepted by `ExecutionConfig`.
pub const MIN_PAGE_SIZE: usize = 16;

/// Width of a boolean column in bytes.
pub const BOOL_WIDTH: usize = 1;

/// Width of an integer or float column in bytes.
pub const NUMERIC_WIDTH: usize = 8;

/// Width of a text column declared without a length.
pub const DEFAULT_TEXT_WIDTH: usize = 32;

const _: () = assert!(MIN_PAGE_SIZE <= PAGE_SIZE, "MIN_PAGE_SIZE exceeds PAGE_SIZE");

// ============================================================================
// BUFFER BUDGET
// ============================================================================

/// Default number of buffer pages (B) per operator.
pub const DEFAULT_MEMORY_PAGES: usize = 8;

/// Smallest buffer budget any operator can run with.
pub const MIN_MEMORY_PAGES: usize = 3;

/// Pages the block join keeps for the inner page and the output page.
pub const BLOCK_JOIN_RESERVED_PAGES: usize = 2;

/// Pages a merge pass keeps for the output run.
pub const MERGE_OUTPUT_PAGES: usize = 1;

/// Pages per outer block in the page nested-loop join.
pub const PAGE_JOIN_BLOCK_PAGES: usize = 1;

/// Pages per inner scan step in both nested-loop joins.
pub const INNER_SCAN_PAGES: usize = 1;

const _: () = assert!(
    MIN_MEMORY_PAGES <= DEFAULT_MEMORY_PAGES,
    "MIN_MEMORY_PAGES must be <= DEFAULT_MEMORY_PAGES"
);

const _: () = assert!(
    MIN_MEMORY_PAGES - BLOCK_JOIN_RESERVED_PAGES >= 1,
    "block join needs at least one outer page"
);

const _: () = assert!(
    MIN_MEMORY_PAGES - MERGE_OUTPUT_PAGES >= 2,
    "merge fan-in must be at least two runs"
);

// ============================================================================
// COST MODEL
// ============================================================================

/// Cost reported by operators whose I/O is not modeled.
pub const PLACEHOLDER_IO_COST: u64 = 0;

/// Prefix of generated temporary table names.
pub const TEMP_TABLE_PREFIX: &str = "temp";
