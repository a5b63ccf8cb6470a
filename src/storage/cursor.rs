//! # Checkpointed Cursors
//!
//! Nested-loop and merge joins replay the same sub-sequence of pages or records
//! many times. The cursors in this module support that with a single saved
//! checkpoint.
//!
//! ## Contract
//!
//! - `mark()` saves the cursor's current position, replacing any earlier mark
//! - `reset()` returns to the saved position; the following `next()` calls
//!   yield exactly what they yielded after the `mark()`
//! - Every cursor is marked at position 0 when constructed, so `reset()` is
//!   always defined
//! - `peek()` returns the element the next `next()` call would yield
//!
//! ## Cursor Kinds
//!
//! | Cursor | Item | Source |
//! |--------|------|--------|
//! | `PageCursor` | `Arc<Page>` | Every page of a table |
//! | `RecordCursor` | `Record` | A whole table, or a block of N pages |
//!
//! Both cursors hold their own page handles, so they are unaffected by
//! records appended to the table after they were created.

use std::sync::Arc;

use super::page::Page;
use crate::records::Record;

/// An iterator with a single replay checkpoint.
pub trait BacktrackingIterator: Iterator {
    /// The element the next call to `next()` will return.
    fn peek(&self) -> Option<&Self::Item>;

    /// Saves the current position.
    fn mark(&mut self);

    /// Returns to the most recently marked position.
    fn reset(&mut self);
}

#[derive(Debug, Clone)]
pub struct PageCursor {
    pages: Arc<[Arc<Page>]>,
    pos: usize,
    mark: usize,
}

impl PageCursor {
    pub fn new(pages: Arc<[Arc<Page>]>) -> Self {
        Self {
            pages,
            pos: 0,
            mark: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.pos < self.pages.len()
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    /// Takes up to `n` pages starting at the current position.
    pub fn take_pages(&mut self, n: usize) -> Vec<Arc<Page>> {
        let end = (self.pos + n).min(self.pages.len());
        let taken = self.pages[self.pos..end].to_vec();
        self.pos = end;
        taken
    }
}

impl Iterator for PageCursor {
    type Item = Arc<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        let page = self.pages.get(self.pos).cloned()?;
        self.pos += 1;
        Some(page)
    }
}

impl BacktrackingIterator for PageCursor {
    fn peek(&self) -> Option<&Self::Item> {
        self.pages.get(self.pos)
    }

    fn mark(&mut self) {
        self.mark = self.pos;
    }

    fn reset(&mut self) {
        self.pos = self.mark;
    }
}

/// Cursor over the records of a list of pages.
///
/// The position is always settled on a readable slot or past the last page,
/// which keeps `peek` free of side effects.
#[derive(Debug, Clone)]
pub struct RecordCursor {
    pages: Vec<Arc<Page>>,
    page: usize,
    slot: usize,
    mark: (usize, usize),
}

impl RecordCursor {
    pub fn new(pages: Vec<Arc<Page>>) -> Self {
        let mut cursor = Self {
            pages,
            page: 0,
            slot: 0,
            mark: (0, 0),
        };
        cursor.settle();
        cursor.mark = (cursor.page, cursor.slot);
        cursor
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn has_next(&self) -> bool {
        self.peek().is_some()
    }

    /// Number of pages this cursor holds in memory.
    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    fn settle(&mut self) {
        while self.page < self.pages.len() && self.slot >= self.pages[self.page].len() {
            self.page += 1;
            self.slot = 0;
        }
    }
}

impl Iterator for RecordCursor {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.pages.get(self.page)?.get(self.slot)?.clone();
        self.slot += 1;
        self.settle();
        Some(record)
    }
}

impl BacktrackingIterator for RecordCursor {
    fn peek(&self) -> Option<&Self::Item> {
        self.pages.get(self.page)?.get(self.slot)
    }

    fn mark(&mut self) {
        self.mark = (self.page, self.slot);
    }

    fn reset(&mut self) {
        (self.page, self.slot) = self.mark;
    }
}
