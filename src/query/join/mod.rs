//! # Equi-Joins
//!
//! `JoinOperator` joins the outputs of two child operators on equality of
//! one column from each side. Three strategies are available:
//!
//! | Strategy | Outer block | I/O cost estimate |
//! |----------|-------------|-------------------|
//! | `PageNestedLoop` | 1 page | placeholder |
//! | `BlockNestedLoop` | B - 2 pages | `ceil(L / (B - 2)) * R + L` |
//! | `SortMerge` | n/a | placeholder |
//!
//! All three return the same multiset of records,
//! `{ l ++ r : l in L, r in R, l[cL] == r[cR] }`, and differ only in the
//! order they produce it.
//!
//! ## Iterator Protocol
//!
//! Every strategy is a `JoinCursor` variant with a `next_match` step. The
//! `JoinIterator` wrapping it keeps one result of lookahead, computed when
//! the iterator is created and again after each `next_record`, so
//! `has_next` never does any work.
//!
//! ```text
//! JoinIterator { lookahead: Some(r1) }  --next_record-->  r1
//!        │                                   │
//!        └── cursor.next_match() ────────────┘  refills lookahead
//! ```
//!
//! ## Column Resolution
//!
//! The left column name is resolved against the left child's schema and
//! the right name against the right child's, once, when the operator is
//! built. An unknown or ambiguous name is a `QueryError::Schema`.
//!
//! ## Key Equality
//!
//! Keys are compared with `Value`'s total order, which treats NULL as equal
//! to NULL. NULL keys therefore join with each other under every strategy.

mod nested_loop;
mod sort_merge;

pub use nested_loop::NestedLoopState;
pub use sort_merge::{sort_input, MergeState, SortMergeState};

use std::fmt;

use eyre::{Result, WrapErr};
use tracing::{debug, debug_span};

use super::operator::{explain_line, QueryOperator, RecordIter};
use super::{ExecutionContext, QueryError};
use crate::config::{BLOCK_JOIN_RESERVED_PAGES, PAGE_JOIN_BLOCK_PAGES, PLACEHOLDER_IO_COST};
use crate::records::{Record, Schema};
use crate::storage::{entries_per_page, TableStats};
use crate::types::Value;

static NULL_KEY: Value = Value::Null;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    PageNestedLoop,
    BlockNestedLoop,
    SortMerge,
}

impl JoinType {
    pub fn name(&self) -> &'static str {
        match self {
            JoinType::PageNestedLoop => "PageNestedLoopJoin",
            JoinType::BlockNestedLoop => "BlockNestedLoopJoin",
            JoinType::SortMerge => "SortMergeJoin",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Join column offsets, resolved once per operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinColumns {
    left_index: usize,
    right_index: usize,
    left_name: String,
    right_name: String,
}

impl JoinColumns {
    pub fn new(left_index: usize, right_index: usize) -> Self {
        Self {
            left_index,
            right_index,
            left_name: left_index.to_string(),
            right_name: right_index.to_string(),
        }
    }

    pub fn resolve(
        left: &Schema,
        right: &Schema,
        left_column: &str,
        right_column: &str,
    ) -> Result<Self> {
        let left_index = left
            .resolve(left_column)
            .wrap_err_with(|| format!("cannot resolve left join column '{}'", left_column))?;
        let right_index = right
            .resolve(right_column)
            .wrap_err_with(|| format!("cannot resolve right join column '{}'", right_column))?;
        Ok(Self {
            left_index,
            right_index,
            left_name: left_column.to_string(),
            right_name: right_column.to_string(),
        })
    }

    pub fn left_index(&self) -> usize {
        self.left_index
    }

    pub fn right_index(&self) -> usize {
        self.right_index
    }

    pub fn left_key<'r>(&self, record: &'r Record) -> &'r Value {
        record.get(self.left_index).unwrap_or(&NULL_KEY)
    }

    pub fn right_key<'r>(&self, record: &'r Record) -> &'r Value {
        record.get(self.right_index).unwrap_or(&NULL_KEY)
    }

    pub fn matches(&self, left: &Record, right: &Record) -> bool {
        self.left_key(left) == self.right_key(right)
    }
}

/// Outcome of one advance step of a join strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Emit(Record),
    Continue,
    Done,
}

#[derive(Debug)]
pub enum JoinCursor {
    NestedLoop(NestedLoopState),
    SortMerge(SortMergeState),
}

impl JoinCursor {
    /// Advances until the next output record, or `None` once finished.
    pub fn next_match(&mut self) -> Option<Record> {
        loop {
            let step = match self {
                JoinCursor::NestedLoop(state) => state.step(),
                JoinCursor::SortMerge(state) => state.step(),
            };
            match step {
                Step::Emit(record) => return Some(record),
                Step::Continue => continue,
                Step::Done => return None,
            }
        }
    }
}

/// Single-use forward iterator over join results with one-ahead lookahead.
#[derive(Debug)]
pub struct JoinIterator {
    cursor: JoinCursor,
    lookahead: Option<Record>,
}

impl JoinIterator {
    pub fn new(mut cursor: JoinCursor) -> Self {
        let lookahead = cursor.next_match();
        Self { cursor, lookahead }
    }

    pub fn has_next(&self) -> bool {
        self.lookahead.is_some()
    }

    /// Returns the pending result; fails with `IteratorExhausted` if there
    /// is none.
    pub fn next_record(&mut self) -> Result<Record> {
        self.next().ok_or_else(|| QueryError::IteratorExhausted.into())
    }

    /// Pages loaded so far by a nested-loop strategy.
    pub fn pages_read(&self) -> Option<u64> {
        match &self.cursor {
            JoinCursor::NestedLoop(state) => Some(state.pages_read()),
            JoinCursor::SortMerge(_) => None,
        }
    }
}

impl Iterator for JoinIterator {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.lookahead.take()?;
        self.lookahead = self.cursor.next_match();
        Some(record)
    }
}

pub struct JoinOperator {
    ctx: ExecutionContext,
    left: Box<dyn QueryOperator>,
    right: Box<dyn QueryOperator>,
    join_type: JoinType,
    columns: JoinColumns,
    schema: Schema,
    materialized: Option<String>,
    sorted_inputs: Option<(String, String)>,
}

impl JoinOperator {
    pub fn new(
        ctx: &ExecutionContext,
        left: Box<dyn QueryOperator>,
        right: Box<dyn QueryOperator>,
        left_column: &str,
        right_column: &str,
        join_type: JoinType,
    ) -> Result<Self> {
        let columns = JoinColumns::resolve(
            left.output_schema(),
            right.output_schema(),
            left_column,
            right_column,
        )?;
        let schema = left.output_schema().concat(right.output_schema());
        Ok(Self {
            ctx: ctx.clone(),
            left,
            right,
            join_type,
            columns,
            schema,
            materialized: None,
            sorted_inputs: None,
        })
    }

    pub fn page_nested_loop(
        ctx: &ExecutionContext,
        left: Box<dyn QueryOperator>,
        right: Box<dyn QueryOperator>,
        left_column: &str,
        right_column: &str,
    ) -> Result<Self> {
        Self::new(ctx, left, right, left_column, right_column, JoinType::PageNestedLoop)
    }

    pub fn block_nested_loop(
        ctx: &ExecutionContext,
        left: Box<dyn QueryOperator>,
        right: Box<dyn QueryOperator>,
        left_column: &str,
        right_column: &str,
    ) -> Result<Self> {
        Self::new(ctx, left, right, left_column, right_column, JoinType::BlockNestedLoop)
    }

    pub fn sort_merge(
        ctx: &ExecutionContext,
        left: Box<dyn QueryOperator>,
        right: Box<dyn QueryOperator>,
        left_column: &str,
        right_column: &str,
    ) -> Result<Self> {
        Self::new(ctx, left, right, left_column, right_column, JoinType::SortMerge)
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn columns(&self) -> &JoinColumns {
        &self.columns
    }

    /// Pages of the left input held in memory per outer block.
    pub fn outer_block_pages(&self) -> usize {
        match self.join_type {
            JoinType::BlockNestedLoop => {
                self.ctx.num_memory_pages() - BLOCK_JOIN_RESERVED_PAGES
            }
            JoinType::PageNestedLoop | JoinType::SortMerge => PAGE_JOIN_BLOCK_PAGES,
        }
    }

    /// Starts a fresh pass over the join result.
    pub fn join_iterator(&mut self) -> Result<JoinIterator> {
        let left_table = self.left.source_table()?;
        let right_table = self.right.source_table()?;

        let span = debug_span!(
            "join",
            strategy = %self.join_type,
            left = %left_table,
            right = %right_table
        );
        let _guard = span.enter();

        let cursor = match self.join_type {
            JoinType::PageNestedLoop | JoinType::BlockNestedLoop => {
                let block_pages = self.outer_block_pages();
                debug!(block_pages, "opening nested-loop join");
                JoinCursor::NestedLoop(NestedLoopState::open(
                    &self.ctx,
                    self.columns.clone(),
                    &left_table,
                    &right_table,
                    block_pages,
                )?)
            }
            JoinType::SortMerge => {
                debug!(buffers = self.ctx.num_memory_pages(), "opening sort-merge join");
                let (left_sorted, right_sorted) = self.sorted_inputs(&left_table, &right_table)?;
                JoinCursor::SortMerge(SortMergeState::open(
                    &self.ctx,
                    self.columns.clone(),
                    &left_sorted,
                    &right_sorted,
                )?)
            }
        };

        Ok(JoinIterator::new(cursor))
    }

    /// Sorts both inputs on their join columns the first time and reuses
    /// the sorted tables afterwards.
    fn sorted_inputs(&mut self, left_table: &str, right_table: &str) -> Result<(String, String)> {
        if let Some(sorted) = &self.sorted_inputs {
            return Ok(sorted.clone());
        }
        let left = sort_input(&self.ctx, left_table, self.columns.left_index())?;
        let right = sort_input(&self.ctx, right_table, self.columns.right_index())?;
        debug!(left = %left, right = %right, "sorted join inputs");
        self.sorted_inputs = Some((left.clone(), right.clone()));
        Ok((left, right))
    }
}

impl QueryOperator for JoinOperator {
    fn output_schema(&self) -> &Schema {
        &self.schema
    }

    fn iterator(&mut self) -> Result<RecordIter> {
        Ok(Box::new(self.join_iterator()?))
    }

    fn source_table(&mut self) -> Result<String> {
        if let Some(table) = &self.materialized {
            return Ok(table.clone());
        }
        let records = self.join_iterator()?;
        let table = self.ctx.materialize(self.schema.clone(), records)?;
        debug!(table = %table, strategy = %self.join_type, "materialized join output");
        self.materialized = Some(table.clone());
        Ok(table)
    }

    fn estimate_stats(&self) -> Result<TableStats> {
        let left = self.left.estimate_stats()?.num_records;
        let right = self.right.estimate_stats()?.num_records;
        let num_records = left * right / left.max(right).max(1);
        let per_page = entries_per_page(&self.schema, self.ctx.page_size());
        Ok(TableStats {
            num_records,
            num_pages: num_records.div_ceil(per_page),
        })
    }

    fn estimate_io_cost(&self) -> Result<u64> {
        match self.join_type {
            JoinType::BlockNestedLoop => {
                let left_pages = self.left.estimate_stats()?.num_pages as u64;
                let right_pages = self.right.estimate_stats()?.num_pages as u64;
                let usable = self.outer_block_pages() as u64;
                Ok(left_pages.div_ceil(usable) * right_pages + left_pages)
            }
            JoinType::PageNestedLoop | JoinType::SortMerge => Ok(PLACEHOLDER_IO_COST),
        }
    }

    fn explain_into(&self, out: &mut String, depth: usize) {
        explain_line(
            out,
            depth,
            &format!(
                "{}(on {} = {}, buffers={})",
                self.join_type,
                self.columns.left_name,
                self.columns.right_name,
                self.ctx.num_memory_pages()
            ),
        );
        self.left.explain_into(out, depth + 1);
        self.right.explain_into(out, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionConfig;
    use crate::query::SequentialScan;
    use crate::types::{ColumnDef, DataType};

    fn context() -> ExecutionContext {
        let ctx = ExecutionContext::with_config(
            ExecutionConfig::builder()
                .memory_pages(4)
                .page_size(64)
                .build()
                .unwrap(),
        );
        for (name, rows) in [("l", 0..20), ("r", 10..40)] {
            ctx.store()
                .create_table(
                    name,
                    Schema::new(vec![
                        ColumnDef::new("id", DataType::Int),
                        ColumnDef::new("v", DataType::Int),
                    ]),
                )
                .unwrap();
            for i in rows {
                ctx.add_record(name, vec![Value::Int(i), Value::Int(i * 10)])
                    .unwrap();
            }
        }
        ctx
    }

    fn scan(ctx: &ExecutionContext, table: &str) -> Box<dyn QueryOperator> {
        Box::new(SequentialScan::new(ctx, table).unwrap())
    }

    fn join(ctx: &ExecutionContext, join_type: JoinType) -> JoinOperator {
        JoinOperator::new(ctx, scan(ctx, "l"), scan(ctx, "r"), "id", "r.id", join_type).unwrap()
    }

    #[test]
    fn join_columns_resolve_per_side() {
        let ctx = context();
        let op = join(&ctx, JoinType::SortMerge);
        assert_eq!(op.columns().left_index(), 0);
        assert_eq!(op.columns().right_index(), 0);
        assert_eq!(op.output_schema().column_count(), 4);
        assert_eq!(op.output_schema().column(2).unwrap().name(), "r.id");
    }

    #[test]
    fn unknown_join_column_is_schema_error() {
        let ctx = context();
        let err = JoinOperator::block_nested_loop(&ctx, scan(&ctx, "l"), scan(&ctx, "r"), "nope", "id")
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<QueryError>(),
            Some(QueryError::Schema { .. })
        ));
    }

    #[test]
    fn join_columns_null_keys_match() {
        let columns = JoinColumns::new(0, 1);
        let left = Record::new(vec![Value::Null]);
        let right = Record::new(vec![Value::Int(1), Value::Null]);
        assert!(columns.matches(&left, &right));
        assert!(!columns.matches(&Record::new(vec![Value::Int(1)]), &right));
    }

    #[test]
    fn strategies_agree() {
        let ctx = context();
        let mut results = Vec::new();
        for join_type in [
            JoinType::PageNestedLoop,
            JoinType::BlockNestedLoop,
            JoinType::SortMerge,
        ] {
            let mut rows: Vec<Record> = join(&ctx, join_type).iterator().unwrap().collect();
            rows.sort();
            results.push(rows);
        }
        assert_eq!(results[0].len(), 10);
        assert_eq!(results[0], results[1]);
        assert_eq!(results[1], results[2]);
    }

    #[test]
    fn next_record_after_end_fails() {
        let ctx = context();
        let mut iter = join(&ctx, JoinType::BlockNestedLoop).join_iterator().unwrap();
        while iter.has_next() {
            iter.next_record().unwrap();
        }
        let err = iter.next_record().unwrap_err();
        assert_eq!(
            err.downcast_ref::<QueryError>(),
            Some(&QueryError::IteratorExhausted)
        );
        assert!(iter.next().is_none());
    }

    #[test]
    fn block_join_cost_formula() {
        // l: 20 records of 16 bytes, 3 per page -> 7 pages; r: 30 -> 10 pages
        let ctx = context();
        let op = join(&ctx, JoinType::BlockNestedLoop);
        assert_eq!(op.outer_block_pages(), 2);
        assert_eq!(op.estimate_io_cost().unwrap(), 4 * 10 + 7);

        let mut iter = join(&ctx, JoinType::BlockNestedLoop).join_iterator().unwrap();
        iter.by_ref().for_each(drop);
        assert_eq!(iter.pages_read(), Some(47));
    }

    #[test]
    fn placeholder_costs() {
        let ctx = context();
        assert_eq!(
            join(&ctx, JoinType::PageNestedLoop).estimate_io_cost().unwrap(),
            PLACEHOLDER_IO_COST
        );
        assert_eq!(
            join(&ctx, JoinType::SortMerge).estimate_io_cost().unwrap(),
            PLACEHOLDER_IO_COST
        );
    }

    #[test]
    fn estimate_stats_assumes_key_join() {
        let ctx = context();
        let stats = join(&ctx, JoinType::SortMerge).estimate_stats().unwrap();
        // 20 * 30 / 30; output records are 32 bytes, 1 per 64-byte page
        assert_eq!(stats.num_records, 20);
        assert_eq!(stats.num_pages, 20);
    }

    #[test]
    fn source_table_materializes_once() {
        let ctx = context();
        let mut op = join(&ctx, JoinType::PageNestedLoop);
        let first = op.source_table().unwrap();
        let second = op.source_table().unwrap();
        assert_eq!(first, second);
        assert_eq!(ctx.stats(&first).unwrap().num_records, 10);
    }

    #[test]
    fn sort_merge_sorts_inputs_once() {
        let ctx = context();
        let mut op = join(&ctx, JoinType::SortMerge);

        let first: Vec<Record> = op.iterator().unwrap().collect();
        let temp_after_first = ctx.store().temp_table_names();
        let second: Vec<Record> = op.iterator().unwrap().collect();

        assert_eq!(first.len(), 10);
        assert_eq!(first, second);
        assert_eq!(temp_after_first.len(), 2);
        assert_eq!(ctx.store().temp_table_names(), temp_after_first);
    }

    #[test]
    fn explain_nests_children() {
        let ctx = context();
        let op = join(&ctx, JoinType::SortMerge);
        assert_eq!(
            op.explain(),
            "SortMergeJoin(on id = r.id, buffers=4)\n  SequentialScan(table=l)\n  SequentialScan(table=r)\n"
        );
    }
}
