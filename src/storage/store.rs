//! # Table Store
//!
//! `TableStore` is the in-process registry of tables that the operators read
//! from and write temporary results to. It provides exactly the services the
//! execution core consumes: table creation, record appends, page snapshots,
//! schemas and statistics.
//!
//! ## Naming
//!
//! Base tables are created under a caller-chosen name and their schema is
//! qualified with that name (`users.id`). Temporary tables get generated
//! names (`temp.0`, `temp.1`, ...) and keep the schema they were given.
//!
//! ## Thread Safety
//!
//! The registry is guarded by a `parking_lot::RwLock`. Readers take page
//! snapshots and release the lock immediately; no lock is held while an
//! operator iterates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use eyre::Result;
use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use super::page::Page;
use super::table::{Table, TableStats};
use crate::config::{ExecutionConfig, TEMP_TABLE_PREFIX};
use crate::query::QueryError;
use crate::records::{Record, Schema};
use crate::types::Value;

#[derive(Debug)]
pub struct TableStore {
    config: ExecutionConfig,
    tables: RwLock<HashMap<String, Table>>,
    next_temp_id: AtomicU64,
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new(ExecutionConfig::default())
    }
}

impl TableStore {
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            config,
            tables: RwLock::new(HashMap::new()),
            next_temp_id: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Creates a base table; its columns are qualified with `name`.
    pub fn create_table(&self, name: &str, schema: Schema) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(QueryError::TableExists {
                name: name.to_string(),
            }
            .into());
        }
        let table = Table::new(name, schema.qualified(name), self.config.page_size(), false);
        debug!(
            table = name,
            entries_per_page = table.entries_per_page(),
            "created table"
        );
        tables.insert(name.to_string(), table);
        Ok(())
    }

    /// Creates an empty temporary table and returns its generated name.
    ///
    /// Generated names already taken by another table are skipped.
    pub fn create_temp_table(&self, schema: Schema) -> String {
        let mut tables = self.tables.write();
        let name = loop {
            let id = self.next_temp_id.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{}.{}", TEMP_TABLE_PREFIX, id);
            if !tables.contains_key(&candidate) {
                break candidate;
            }
        };
        let table = Table::new(name.clone(), schema, self.config.page_size(), true);
        trace!(table = %name, "created temp table");
        tables.insert(name.clone(), table);
        name
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        match self.tables.write().remove(name) {
            Some(table) => {
                trace!(
                    table = name,
                    temporary = table.is_temporary(),
                    pages = table.stats().num_pages,
                    "dropped table"
                );
                Ok(())
            }
            None => Err(not_found(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    pub fn add_record(&self, name: &str, values: Vec<Value>) -> Result<()> {
        let mut tables = self.tables.write();
        let table = tables.get_mut(name).ok_or_else(|| not_found(name))?;
        table.append(values)
    }

    pub fn add_records<I>(&self, name: &str, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        self.append_records(name, rows.into_iter().map(Record::new))
    }

    /// Appends records one page at a time.
    ///
    /// The source iterator is advanced without the registry lock held, so it
    /// may itself read from or write to this store.
    pub fn append_records<I>(&self, name: &str, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Record>,
    {
        let page_capacity = self.entries_per_page(name)?;
        let mut records = records.into_iter();
        loop {
            let page: Vec<Record> = records.by_ref().take(page_capacity).collect();
            if page.is_empty() {
                return Ok(());
            }

            let mut tables = self.tables.write();
            let table = tables.get_mut(name).ok_or_else(|| not_found(name))?;
            for record in page {
                table.append_record(record)?;
            }
        }
    }

    pub fn schema(&self, name: &str) -> Result<Schema> {
        self.with_table(name, |t| t.schema().clone())
    }

    pub fn stats(&self, name: &str) -> Result<TableStats> {
        self.with_table(name, Table::stats)
    }

    pub fn entries_per_page(&self, name: &str) -> Result<usize> {
        self.with_table(name, Table::entries_per_page)
    }

    /// Snapshot of the table's page handles.
    pub fn pages(&self, name: &str) -> Result<Arc<[Arc<Page>]>> {
        self.with_table(name, Table::pages)
    }

    /// Names of all tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Names of the temporary tables currently alive.
    pub fn temp_table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .read()
            .values()
            .filter(|t| t.is_temporary())
            .map(|t| t.name().to_string())
            .collect();
        names.sort();
        names
    }

    fn with_table<T>(&self, name: &str, f: impl FnOnce(&Table) -> T) -> Result<T> {
        let tables = self.tables.read();
        let table = tables.get(name).ok_or_else(|| not_found(name))?;
        Ok(f(table))
    }
}

fn not_found(name: &str) -> eyre::Report {
    QueryError::TableNotFound {
        name: name.to_string(),
    }
    .into()
}
