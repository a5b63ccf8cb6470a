//! # External Merge Sort
//!
//! `SortOperator` sorts a table of any size while holding at most B pages of
//! records in memory, where B is the context's buffer budget.
//!
//! ## Algorithm
//!
//! ```text
//! Pass 0 (run generation)
//!   source pages: [p0 p1 p2 | p3 p4 p5 | p6 p7]      B = 3
//!                  └─ sort ─┘ └─ sort ─┘ └ sort ┘
//!   runs:          r0         r1         r2
//!
//! Pass 1..n (merge)
//!   fan-in = B - 1 (one page is reserved for the output run)
//!   [r0 r1] [r2]  ->  r3, r2        groups are clamped to the runs left
//!   [r3 r2]       ->  r4            repeat until one run remains
//! ```
//!
//! Each merge pass leaves at most `ceil(runs / (B - 1))` runs. A merge group
//! is a k-way merge: one cursor per run and a binary heap keyed by the
//! comparator over each cursor's head record, tagged with its run index.
//!
//! ## Runs
//!
//! A `Run` is an append-only temporary table. Runs consumed by a merge are
//! dropped from the store once the merged run is written; the source table
//! is never modified or dropped.
//!
//! ## Ordering Guarantees
//!
//! The output is non-decreasing under the comparator. Records that compare
//! equal may appear in any relative order.
//!
//! ## Caching
//!
//! `sorted_table` (and therefore `iterator`) sorts at most once per operator
//! and reuses the resulting table on later calls.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use eyre::{Result, WrapErr};
use smallvec::SmallVec;
use tracing::{debug, debug_span, trace};

use super::operator::{explain_line, QueryOperator, RecordIter};
use super::ExecutionContext;
use crate::config::{MERGE_OUTPUT_PAGES, PLACEHOLDER_IO_COST};
use crate::records::{Record, Schema};
use crate::storage::{RecordCursor, TableStats};
use crate::types::Value;

/// Total order over records used by the sorter.
pub type RecordComparator = Arc<dyn Fn(&Record, &Record) -> Ordering + Send + Sync>;

static NULL_VALUE: Value = Value::Null;

/// Orders records by the value in column `idx`.
pub fn by_column(idx: usize) -> RecordComparator {
    Arc::new(move |a: &Record, b: &Record| {
        let left = a.get(idx).unwrap_or(&NULL_VALUE);
        let right = b.get(idx).unwrap_or(&NULL_VALUE);
        left.cmp(right)
    })
}

/// Orders records by all their values, left to right.
pub fn by_all_columns() -> RecordComparator {
    Arc::new(|a: &Record, b: &Record| a.cmp(b))
}

/// Append-only sequence of records backed by a temporary table.
#[derive(Debug, Clone)]
pub struct Run {
    ctx: ExecutionContext,
    table: String,
}

impl Run {
    pub fn new(ctx: &ExecutionContext, schema: Schema) -> Self {
        Self {
            ctx: ctx.clone(),
            table: ctx.create_temp_table(schema),
        }
    }

    pub fn add_record(&self, values: Vec<Value>) -> Result<()> {
        self.ctx.add_record(&self.table, values)
    }

    pub fn add_records<I>(&self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Record>,
    {
        self.ctx.append_records(&self.table, records)
    }

    /// Reads the run from the start; repeatable.
    pub fn iterator(&self) -> Result<RecordCursor> {
        self.ctx.record_iterator(&self.table)
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn stats(&self) -> Result<TableStats> {
        self.ctx.stats(&self.table)
    }

    fn discard(self) -> Result<()> {
        self.ctx.drop_table(&self.table)
    }
}

/// Heap entry for the k-way merge; the heap pops the smallest record first.
struct MergeHead<'c> {
    record: Record,
    run: usize,
    cmp: &'c (dyn Fn(&Record, &Record) -> Ordering + Send + Sync),
}

impl Ord for MergeHead<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.cmp)(&other.record, &self.record).then_with(|| other.run.cmp(&self.run))
    }
}

impl PartialOrd for MergeHead<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MergeHead<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeHead<'_> {}

pub struct SortOperator {
    ctx: ExecutionContext,
    table: String,
    comparator: RecordComparator,
    schema: Schema,
    num_buffers: usize,
    sorted_table: Option<String>,
}

impl SortOperator {
    pub fn new(ctx: &ExecutionContext, table: &str, comparator: RecordComparator) -> Result<Self> {
        let schema = ctx
            .fully_qualified_schema(table)
            .wrap_err_with(|| format!("cannot sort '{}'", table))?;
        Ok(Self {
            ctx: ctx.clone(),
            table: table.to_string(),
            comparator,
            schema,
            num_buffers: ctx.num_memory_pages(),
            sorted_table: None,
        })
    }

    pub fn create_run(&self) -> Run {
        Run::new(&self.ctx, self.schema.clone())
    }

    /// Returns a new run holding `run`'s records in sorted order.
    ///
    /// The whole run is read into memory, so it must fit the buffer budget.
    pub fn sort_run(&self, run: &Run) -> Result<Run> {
        self.write_sorted(run.iterator()?.collect())
    }

    /// Merges individually sorted runs into one sorted run.
    ///
    /// Output is buffered one page at a time and appended to the new run
    /// as each page fills.
    pub fn merge_sorted_runs(&self, runs: &[Run]) -> Result<Run> {
        let cmp: &(dyn Fn(&Record, &Record) -> Ordering + Send + Sync) = &*self.comparator;

        let mut cursors: SmallVec<[RecordCursor; 8]> = SmallVec::with_capacity(runs.len());
        for run in runs {
            cursors.push(run.iterator()?);
        }

        let mut heap = BinaryHeap::with_capacity(cursors.len());
        for (run, cursor) in cursors.iter_mut().enumerate() {
            if let Some(record) = cursor.next() {
                heap.push(MergeHead { record, run, cmp });
            }
        }

        let output = self.create_run();
        let page_capacity = self.ctx.num_entries_per_page(output.table_name())?;
        let mut page: Vec<Record> = Vec::with_capacity(page_capacity);
        while let Some(MergeHead { record, run, .. }) = heap.pop() {
            page.push(record);
            if page.len() == page_capacity {
                output.add_records(page.drain(..))?;
            }
            if let Some(next) = cursors[run].next() {
                heap.push(MergeHead {
                    record: next,
                    run,
                    cmp,
                });
            }
        }
        output.add_records(page)?;

        trace!(
            inputs = runs.len(),
            output = output.table_name(),
            "merged sorted runs"
        );
        Ok(output)
    }

    /// Merges groups of up to B - 1 runs, returning one run per group.
    ///
    /// The last group takes whatever runs remain. A group of one run is
    /// passed through unchanged.
    pub fn merge_pass(&self, runs: Vec<Run>) -> Result<Vec<Run>> {
        let fan_in = self.fan_in();
        let mut merged = Vec::with_capacity(runs.len().div_ceil(fan_in));

        for group in runs.chunks(fan_in) {
            if let [single] = group {
                merged.push(single.clone());
                continue;
            }
            merged.push(self.merge_sorted_runs(group)?);
            for run in group {
                run.clone().discard()?;
            }
        }

        Ok(merged)
    }

    /// Sorts the source table and returns the name of the sorted table.
    pub fn sort(&self) -> Result<String> {
        let span = debug_span!("external_sort", table = %self.table, buffers = self.num_buffers);
        let _guard = span.enter();

        let mut runs = self.generate_runs()?;
        debug!(runs = runs.len(), "generated sorted runs");

        let mut pass = 0;
        while runs.len() > 1 {
            pass += 1;
            runs = self.merge_pass(runs)?;
            debug!(pass, runs = runs.len(), fan_in = self.fan_in(), "completed merge pass");
        }

        let sorted = match runs.pop() {
            Some(run) => run,
            None => self.create_run(),
        };
        Ok(sorted.table_name().to_string())
    }

    /// Sorts on first use and returns the cached sorted table afterwards.
    pub fn sorted_table(&mut self) -> Result<String> {
        if let Some(table) = &self.sorted_table {
            return Ok(table.clone());
        }
        let table = self.sort()?;
        self.sorted_table = Some(table.clone());
        Ok(table)
    }

    pub fn num_buffers(&self) -> usize {
        self.num_buffers
    }

    fn fan_in(&self) -> usize {
        self.num_buffers - MERGE_OUTPUT_PAGES
    }

    fn generate_runs(&self) -> Result<Vec<Run>> {
        let mut pages = self.ctx.page_iterator(&self.table)?;
        let mut runs = Vec::new();
        while pages.has_next() {
            let block = self.ctx.block_iterator(&mut pages, self.num_buffers);
            runs.push(self.write_sorted(block.collect())?);
        }
        Ok(runs)
    }

    fn write_sorted(&self, mut records: Vec<Record>) -> Result<Run> {
        records.sort_by(|a, b| (self.comparator)(a, b));
        let run = self.create_run();
        run.add_records(records)?;
        Ok(run)
    }
}

impl QueryOperator for SortOperator {
    fn output_schema(&self) -> &Schema {
        &self.schema
    }

    fn iterator(&mut self) -> Result<RecordIter> {
        let table = self.sorted_table()?;
        Ok(Box::new(self.ctx.record_iterator(&table)?))
    }

    fn source_table(&mut self) -> Result<String> {
        self.sorted_table()
    }

    fn estimate_stats(&self) -> Result<TableStats> {
        self.ctx.stats(&self.table)
    }

    fn estimate_io_cost(&self) -> Result<u64> {
        Ok(PLACEHOLDER_IO_COST)
    }

    fn explain_into(&self, out: &mut String, depth: usize) {
        explain_line(
            out,
            depth,
            &format!("Sort(table={}, buffers={})", self.table, self.num_buffers),
        );
    }
}
