//! # Query Operators
//!
//! Operators form a tree whose leaves are sequential scans. Every operator
//! can produce its output lazily (`iterator`) and report estimates that a
//! planner may use to compare alternatives (`estimate_stats`,
//! `estimate_io_cost`). Estimates never influence results.
//!
//! ## Table-Backed Inputs
//!
//! The sort and join algorithms work on *tables*: they need page-level
//! access with checkpoints. `source_table` gives them one. A scan returns
//! its base table; any other operator materializes its output into a
//! temporary table the first time it is asked and reuses it afterwards.

use eyre::Result;

use super::ExecutionContext;
use crate::records::{Record, Schema};
use crate::storage::TableStats;

/// Lazily produced operator output.
pub type RecordIter = Box<dyn Iterator<Item = Record>>;

pub trait QueryOperator {
    /// Schema of the records this operator produces.
    fn output_schema(&self) -> &Schema;

    /// Starts a fresh pass over the output.
    fn iterator(&mut self) -> Result<RecordIter>;

    /// Name of a table holding exactly this operator's output.
    fn source_table(&mut self) -> Result<String>;

    fn estimate_stats(&self) -> Result<TableStats>;

    fn estimate_io_cost(&self) -> Result<u64>;

    /// Appends this operator's plan line and its children's, indented.
    fn explain_into(&self, out: &mut String, depth: usize);

    fn explain(&self) -> String {
        let mut out = String::new();
        self.explain_into(&mut out, 0);
        out
    }
}

pub(crate) fn explain_line(out: &mut String, depth: usize, line: &str) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(line);
    out.push('\n');
}

/// Full scan of a stored table.
#[derive(Debug, Clone)]
pub struct SequentialScan {
    ctx: ExecutionContext,
    table: String,
    schema: Schema,
}

impl SequentialScan {
    pub fn new(ctx: &ExecutionContext, table: &str) -> Result<Self> {
        let schema = ctx.fully_qualified_schema(table)?;
        Ok(Self {
            ctx: ctx.clone(),
            table: table.to_string(),
            schema,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl QueryOperator for SequentialScan {
    fn output_schema(&self) -> &Schema {
        &self.schema
    }

    fn iterator(&mut self) -> Result<RecordIter> {
        Ok(Box::new(self.ctx.record_iterator(&self.table)?))
    }

    fn source_table(&mut self) -> Result<String> {
        Ok(self.table.clone())
    }

    fn estimate_stats(&self) -> Result<TableStats> {
        self.ctx.stats(&self.table)
    }

    fn estimate_io_cost(&self) -> Result<u64> {
        Ok(self.ctx.stats(&self.table)?.num_pages as u64)
    }

    fn explain_into(&self, out: &mut String, depth: usize) {
        explain_line(out, depth, &format!("SequentialScan(table={})", self.table));
    }
}
