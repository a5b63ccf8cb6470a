//! # Table Pages
//!
//! A `Page` is the unit of I/O the operators budget for: a fixed-capacity
//! slot array of records belonging to one table.
//!
//! ## Capacity
//!
//! Each slot costs the record's byte width plus one presence bit in the page
//! bitmap, so a page of `page_size` bytes holds
//!
//! ```text
//! entries = floor(page_size * 8 / (record_size * 8 + 1))
//! ```
//!
//! records, and never fewer than one.
//!
//! ## Sharing
//!
//! Pages are handed out as `Arc<Page>`. Cursors keep their own handles, and
//! appends go through `Arc::make_mut`, so a page seen by a live cursor is
//! copied before it changes.

use crate::records::{Record, Schema};

#[derive(Debug, Clone)]
pub struct Page {
    page_no: u32,
    capacity: usize,
    records: Vec<Record>,
}

impl Page {
    pub fn new(page_no: u32, capacity: usize) -> Self {
        Self {
            page_no,
            capacity,
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn page_no(&self) -> u32 {
        self.page_no
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn get(&self, slot: usize) -> Option<&Record> {
        self.records.get(slot)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub(crate) fn push(&mut self, record: Record) {
        debug_assert!(!self.is_full(), "page {} is full", self.page_no);
        self.records.push(record);
    }
}

/// Number of records of `schema` that fit on a page of `page_size` bytes.
pub fn entries_per_page(schema: &Schema, page_size: usize) -> usize {
    let record_bits = schema.record_size() * 8 + 1;
    ((page_size * 8) / record_bits).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnDef, DataType, Value};

    #[test]
    fn capacity_accounts_for_bitmap() {
        let schema = Schema::new(vec![ColumnDef::new("a", DataType::Int)]);
        // 64 bytes = 512 bits, 65 bits per slot
        assert_eq!(entries_per_page(&schema, 64), 7);
        assert_eq!(entries_per_page(&schema, 4096), 504);
    }

    #[test]
    fn wide_records_still_get_one_slot() {
        let schema = Schema::new(vec![ColumnDef::text("blob", 1000)]);
        assert_eq!(entries_per_page(&schema, 64), 1);
    }

    #[test]
    fn push_until_full() {
        let mut page = Page::new(0, 2);
        assert!(page.is_empty());
        page.push(Record::new(vec![Value::Int(1)]));
        assert!(!page.is_full());
        page.push(Record::new(vec![Value::Int(2)]));
        assert!(page.is_full());
        assert_eq!(page.get(1).unwrap().get(0), Some(&Value::Int(2)));
    }
}
