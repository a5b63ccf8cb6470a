//! # Sort-Merge Join
//!
//! Both inputs are sorted on their join column with the external sorter
//! (`sort_input`), then merged with two record cursors. `JoinOperator`
//! sorts once and keeps the sorted tables for later iterators.
//!
//! ## States
//!
//! | State | Action |
//! |-------|--------|
//! | `Aligning` | Advance the side with the smaller key until keys are equal; mark the right cursor |
//! | `EmittingGroup` | Pair the current left record with each right record of the marked key group |
//! | `Exhausted` | No further pairs |
//!
//! When the right group ends, the right cursor is reset to the mark and the
//! left cursor advances. A left duplicate of the same key replays the group
//! from the mark, which yields the full cross product of left and right
//! duplicates for every key.

use eyre::{Result, WrapErr};

use super::{JoinColumns, Step};
use crate::query::sort::{by_column, SortOperator};
use crate::query::ExecutionContext;
use crate::storage::{BacktrackingIterator, RecordCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    Aligning,
    EmittingGroup,
    Exhausted,
}

#[derive(Debug)]
pub struct SortMergeState {
    columns: JoinColumns,
    left: RecordCursor,
    right: RecordCursor,
    state: MergeState,
}

impl SortMergeState {
    /// Opens the merge over two tables already sorted on their join columns.
    pub fn open(
        ctx: &ExecutionContext,
        columns: JoinColumns,
        left_sorted: &str,
        right_sorted: &str,
    ) -> Result<Self> {
        let left = ctx.record_iterator(left_sorted)?;
        let right = ctx.record_iterator(right_sorted)?;
        Ok(Self::from_sorted(columns, left, right))
    }

    /// Merges two cursors that are already sorted on their join columns.
    pub fn from_sorted(columns: JoinColumns, left: RecordCursor, right: RecordCursor) -> Self {
        Self {
            columns,
            left,
            right,
            state: MergeState::Aligning,
        }
    }

    pub fn state(&self) -> MergeState {
        self.state
    }

    pub fn step(&mut self) -> Step {
        let Self {
            columns,
            left,
            right,
            state,
        } = self;

        match *state {
            MergeState::Exhausted => Step::Done,
            MergeState::Aligning => {
                let (Some(l), Some(r)) = (left.peek(), right.peek()) else {
                    *state = MergeState::Exhausted;
                    return Step::Done;
                };
                match columns.left_key(l).cmp(columns.right_key(r)) {
                    std::cmp::Ordering::Less => {
                        left.next();
                    }
                    std::cmp::Ordering::Greater => {
                        right.next();
                    }
                    std::cmp::Ordering::Equal => {
                        right.mark();
                        *state = MergeState::EmittingGroup;
                    }
                }
                Step::Continue
            }
            MergeState::EmittingGroup => {
                let Some(l) = left.peek() else {
                    *state = MergeState::Exhausted;
                    return Step::Done;
                };
                if let Some(r) = right.peek() {
                    if columns.matches(l, r) {
                        let out = l.concat(r);
                        right.next();
                        return Step::Emit(out);
                    }
                }

                left.next();
                right.reset();
                let same_group = match (left.peek(), right.peek()) {
                    (Some(l), Some(r)) => columns.matches(l, r),
                    _ => false,
                };
                if !same_group {
                    *state = MergeState::Aligning;
                }
                Step::Continue
            }
        }
    }
}

/// Sorts `table` on `column` and returns the sorted table's name.
pub fn sort_input(ctx: &ExecutionContext, table: &str, column: usize) -> Result<String> {
    SortOperator::new(ctx, table, by_column(column))?
        .sort()
        .wrap_err_with(|| format!("failed to sort join input '{}'", table))
}
