//! # Execution Context
//!
//! `ExecutionContext` is the handle every operator uses to reach storage. It
//! bundles the shared `TableStore` with the buffer budget (B) the operator
//! runs under and exposes the storage services in the vocabulary of the
//! algorithms: page iterators, block iterators, temporary tables, statistics.
//!
//! Cloning a context is cheap (an `Arc` and an integer). Each operator keeps
//! its own clone; the budget of a context never changes after construction,
//! use `with_memory_pages` to derive a context with a different budget.

use std::sync::Arc;

use eyre::{Result, WrapErr};

use super::QueryError;
use crate::config::{ExecutionConfig, MIN_MEMORY_PAGES};
use crate::records::{Record, Schema};
use crate::storage::{PageCursor, RecordCursor, TableStats, TableStore};
use crate::types::Value;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    store: Arc<TableStore>,
    memory_pages: usize,
}

impl ExecutionContext {
    /// Creates a context using the store's configured buffer budget.
    pub fn new(store: Arc<TableStore>) -> Self {
        let memory_pages = store.config().memory_pages();
        Self {
            store,
            memory_pages,
        }
    }

    /// Creates a fresh store from `config` and a context over it.
    pub fn with_config(config: ExecutionConfig) -> Self {
        Self::new(Arc::new(TableStore::new(config)))
    }

    /// Derives a context over the same store with another buffer budget.
    pub fn with_memory_pages(&self, memory_pages: usize) -> Result<Self> {
        if memory_pages < MIN_MEMORY_PAGES {
            return Err(QueryError::InvalidConfig {
                message: format!(
                    "buffer budget of {} pages is below the minimum of {}",
                    memory_pages, MIN_MEMORY_PAGES
                ),
            }
            .into());
        }
        Ok(Self {
            store: Arc::clone(&self.store),
            memory_pages,
        })
    }

    pub fn store(&self) -> &Arc<TableStore> {
        &self.store
    }

    /// Buffer budget (B) in pages.
    pub fn num_memory_pages(&self) -> usize {
        self.memory_pages
    }

    pub fn page_size(&self) -> usize {
        self.store.config().page_size()
    }

    pub fn page_iterator(&self, table: &str) -> Result<PageCursor> {
        let pages = self
            .store
            .pages(table)
            .wrap_err_with(|| format!("failed to open page iterator on '{}'", table))?;
        Ok(PageCursor::new(pages))
    }

    /// Materializes up to `num_pages` pages starting at the page cursor's
    /// position as a replayable record sequence, advancing the page cursor.
    pub fn block_iterator(&self, pages: &mut PageCursor, num_pages: usize) -> RecordCursor {
        RecordCursor::new(pages.take_pages(num_pages))
    }

    pub fn record_iterator(&self, table: &str) -> Result<RecordCursor> {
        let pages = self
            .store
            .pages(table)
            .wrap_err_with(|| format!("failed to open record iterator on '{}'", table))?;
        Ok(RecordCursor::new(pages.to_vec()))
    }

    pub fn create_temp_table(&self, schema: Schema) -> String {
        self.store.create_temp_table(schema)
    }

    pub fn add_record(&self, table: &str, values: Vec<Value>) -> Result<()> {
        self.store.add_record(table, values)
    }

    pub fn append_records<I>(&self, table: &str, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Record>,
    {
        self.store.append_records(table, records)
    }

    pub fn drop_table(&self, table: &str) -> Result<()> {
        self.store.drop_table(table)
    }

    pub fn num_entries_per_page(&self, table: &str) -> Result<usize> {
        self.store.entries_per_page(table)
    }

    pub fn fully_qualified_schema(&self, table: &str) -> Result<Schema> {
        self.store.schema(table)
    }

    pub fn stats(&self, table: &str) -> Result<TableStats> {
        self.store.stats(table)
    }

    /// Writes `records` to a new temporary table with `schema`.
    pub fn materialize<I>(&self, schema: Schema, records: I) -> Result<String>
    where
        I: IntoIterator<Item = Record>,
    {
        let table = self.create_temp_table(schema);
        self.append_records(&table, records)
            .wrap_err_with(|| format!("failed to materialize into '{}'", table))?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnDef, DataType};

    fn context() -> ExecutionContext {
        let config = ExecutionConfig::builder()
            .memory_pages(4)
            .page_size(64)
            .build()
            .unwrap();
        let ctx = ExecutionContext::with_config(config);
        ctx.store()
            .create_table("t", Schema::new(vec![ColumnDef::new("a", DataType::Int)]))
            .unwrap();
        for i in 0..20 {
            ctx.add_record("t", vec![Value::Int(i)]).unwrap();
        }
        ctx
    }

    #[test]
    fn block_iterator_takes_requested_pages() {
        let ctx = context();
        let mut pages = ctx.page_iterator("t").unwrap();
        assert_eq!(pages.num_pages(), 3);

        let block = ctx.block_iterator(&mut pages, 2);
        assert_eq!(block.num_pages(), 2);
        assert_eq!(block.count(), 14);

        let tail = ctx.block_iterator(&mut pages, 2);
        assert_eq!(tail.num_pages(), 1);
        assert_eq!(tail.count(), 6);
        assert!(!pages.has_next());
    }

    #[test]
    fn record_iterator_reads_everything() {
        let ctx = context();
        let values: Vec<i64> = ctx
            .record_iterator("t")
            .unwrap()
            .map(|r| r.get(0).and_then(Value::as_int).unwrap())
            .collect();
        assert_eq!(values, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn memory_pages_override() {
        let ctx = context();
        assert_eq!(ctx.num_memory_pages(), 4);
        assert_eq!(ctx.with_memory_pages(10).unwrap().num_memory_pages(), 10);
        assert!(ctx.with_memory_pages(2).is_err());
    }

    #[test]
    fn materialize_creates_temp_table() {
        let ctx = context();
        let schema = ctx.fully_qualified_schema("t").unwrap();
        let records: Vec<Record> = ctx.record_iterator("t").unwrap().take(5).collect();

        let table = ctx.materialize(schema.clone(), records).unwrap();

        assert_eq!(ctx.stats(&table).unwrap().num_records, 5);
        assert_eq!(ctx.fully_qualified_schema(&table).unwrap(), schema);
    }

    #[test]
    fn missing_table_error_keeps_kind() {
        let ctx = context();
        let err = ctx.page_iterator("nope").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<QueryError>(),
            Some(QueryError::TableNotFound { .. })
        ));
    }
}
