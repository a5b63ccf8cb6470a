//! # Page and Block Nested-Loop Join
//!
//! One state machine covers both nested-loop joins. The outer (left) input
//! is read a block of `block_pages` pages at a time; the inner (right)
//! input one page at a time. A page join is the case `block_pages == 1`.
//!
//! ```text
//! for each outer block b:              left pages read once
//!     for each inner page p:           right pages read once per block
//!         for each l in b:
//!             for each r in p:         inner page replayed per l
//!                 if l[cL] == r[cR]: emit l ++ r
//! ```
//!
//! Both record cursors are marked at position 0 when loaded. Replaying the
//! inner page for the next outer record is a `reset` of the inner cursor;
//! moving to the next inner page resets the outer block. Pages are counted
//! as they are loaded, so a full pass reads
//! `L + ceil(L / block_pages) * R` pages.

use eyre::Result;

use super::{JoinColumns, Step};
use crate::config::INNER_SCAN_PAGES;
use crate::query::ExecutionContext;
use crate::records::Record;
use crate::storage::{BacktrackingIterator, PageCursor, RecordCursor};

#[derive(Debug)]
pub struct NestedLoopState {
    columns: JoinColumns,
    block_pages: usize,
    left_pages: PageCursor,
    right_pages: PageCursor,
    left_block: RecordCursor,
    right_page: RecordCursor,
    left_record: Option<Record>,
    pages_read: u64,
    done: bool,
}

impl NestedLoopState {
    pub fn open(
        ctx: &ExecutionContext,
        columns: JoinColumns,
        left_table: &str,
        right_table: &str,
        block_pages: usize,
    ) -> Result<Self> {
        let left_pages = ctx.page_iterator(left_table)?;
        let right_pages = ctx.page_iterator(right_table)?;
        Ok(Self::from_cursors(columns, left_pages, right_pages, block_pages))
    }

    /// Builds the state directly over two page cursors.
    pub fn from_cursors(
        columns: JoinColumns,
        left_pages: PageCursor,
        right_pages: PageCursor,
        block_pages: usize,
    ) -> Self {
        let mut state = Self {
            columns,
            block_pages: block_pages.max(1),
            left_pages,
            right_pages,
            left_block: RecordCursor::empty(),
            right_page: RecordCursor::empty(),
            left_record: None,
            pages_read: 0,
            done: false,
        };

        if state.left_pages.num_pages() == 0 || state.right_pages.num_pages() == 0 {
            state.done = true;
            return state;
        }

        state.load_left_block();
        state.load_right_page();
        state.left_record = state.left_block.next();
        state
    }

    pub fn pages_read(&self) -> u64 {
        self.pages_read
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Performs one unit of work: one (outer, inner) record comparison or
    /// one cursor transition.
    pub fn step(&mut self) -> Step {
        if self.done {
            return Step::Done;
        }

        let Some(left) = &self.left_record else {
            return self.finish_block_against_page();
        };

        match self.right_page.next() {
            Some(right) => {
                if self.columns.matches(left, &right) {
                    Step::Emit(left.concat(&right))
                } else {
                    Step::Continue
                }
            }
            None => {
                self.left_record = self.left_block.next();
                self.right_page.reset();
                Step::Continue
            }
        }
    }

    /// The current outer block has been compared with the current inner
    /// page: move to the next inner page, or the next outer block.
    fn finish_block_against_page(&mut self) -> Step {
        if self.right_pages.has_next() {
            self.load_right_page();
            self.left_block.reset();
        } else if self.left_pages.has_next() {
            self.right_pages.reset();
            self.load_right_page();
            self.load_left_block();
        } else {
            self.done = true;
            return Step::Done;
        }

        self.left_record = self.left_block.next();
        Step::Continue
    }

    fn load_left_block(&mut self) {
        let pages = self.left_pages.take_pages(self.block_pages);
        self.pages_read += pages.len() as u64;
        self.left_block = RecordCursor::new(pages);
    }

    fn load_right_page(&mut self) {
        let pages = self.right_pages.take_pages(INNER_SCAN_PAGES);
        self.pages_read += pages.len() as u64;
        self.right_page = RecordCursor::new(pages);
    }
}
