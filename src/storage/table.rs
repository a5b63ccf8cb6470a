//! # Heap Tables
//!
//! A `Table` is an append-only list of pages plus the schema its records must
//! satisfy. Base tables and the temporary tables backing sort runs are the
//! same type; temporary tables only differ in how they are named and when
//! they are dropped.

use std::sync::Arc;

use eyre::Result;

use super::page::{entries_per_page, Page};
use crate::records::{Record, Schema};
use crate::types::Value;

/// Page and row counts of a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub num_records: usize,
    pub num_pages: usize,
}

#[derive(Debug)]
pub struct Table {
    name: String,
    schema: Schema,
    entries_per_page: usize,
    pages: Vec<Arc<Page>>,
    num_records: usize,
    temporary: bool,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Schema, page_size: usize, temporary: bool) -> Self {
        let entries_per_page = entries_per_page(&schema, page_size);
        Self {
            name: name.into(),
            schema,
            entries_per_page,
            pages: Vec::new(),
            num_records: 0,
            temporary,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn entries_per_page(&self) -> usize {
        self.entries_per_page
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            num_records: self.num_records,
            num_pages: self.pages.len(),
        }
    }

    /// Handles to every page, in physical order.
    pub fn pages(&self) -> Arc<[Arc<Page>]> {
        self.pages.iter().cloned().collect()
    }

    /// Validates `values` against the schema and appends them as a record.
    pub fn append(&mut self, values: Vec<Value>) -> Result<()> {
        self.append_record(Record::new(values))
    }

    /// Appends an existing record, sharing its values.
    pub fn append_record(&mut self, record: Record) -> Result<()> {
        self.schema.validate(record.values())?;
        self.push(record);
        Ok(())
    }

    fn push(&mut self, record: Record) {
        let needs_page = self.pages.last().map_or(true, |page| page.is_full());
        if needs_page {
            let page_no = self.pages.len() as u32;
            self.pages
                .push(Arc::new(Page::new(page_no, self.entries_per_page)));
        }

        if let Some(last) = self.pages.last_mut() {
            Arc::make_mut(last).push(record);
            self.num_records += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnDef, DataType};

    fn int_table(page_size: usize) -> Table {
        Table::new(
            "t",
            Schema::new(vec![ColumnDef::new("a", DataType::Int)]),
            page_size,
            false,
        )
    }

    #[test]
    fn append_opens_pages_as_they_fill() {
        let mut table = int_table(64);
        assert_eq!(table.entries_per_page(), 7);

        for i in 0..15 {
            table.append(vec![Value::Int(i)]).unwrap();
        }

        let stats = table.stats();
        assert_eq!(stats.num_records, 15);
        assert_eq!(stats.num_pages, 3);
        let pages = table.pages();
        assert_eq!(pages[0].len(), 7);
        assert_eq!(pages[2].len(), 1);
        assert_eq!(pages[2].page_no(), 2);
    }

    #[test]
    fn append_rejects_mismatched_records() {
        let mut table = int_table(64);
        assert!(table.append(vec![Value::from("x")]).is_err());
        assert_eq!(table.stats(), TableStats::default());
    }

    #[test]
    fn snapshot_is_isolated_from_later_appends() {
        let mut table = int_table(64);
        table.append(vec![Value::Int(1)]).unwrap();
        let snapshot = table.pages();

        table.append(vec![Value::Int(2)]).unwrap();

        assert_eq!(snapshot[0].len(), 1);
        assert_eq!(table.pages()[0].len(), 2);
    }
}
