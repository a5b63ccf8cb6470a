//! # Execution Configuration
//!
//! This module centralizes the numeric configuration of the execution core and
//! the `ExecutionConfig` builder that carries the per-context settings.
//!
//! ## Module Organization
//!
//! - [`constants`]: Page layout and buffer budget constants with their
//!   relationships enforced through compile-time assertions
//! - [`ExecutionConfig`]: Validated runtime settings (buffer budget, page size)
//!
//! ## Usage
//!
//! ```ignore
//! use spillway::config::ExecutionConfig;
//!
//! let config = ExecutionConfig::builder()
//!     .memory_pages(5)
//!     .page_size(256)
//!     .build()?;
//! ```

pub mod constants;
pub use constants::*;

use eyre::Result;

use crate::query::QueryError;

/// Validated settings shared by a table store and every operator run against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionConfig {
    memory_pages: usize,
    page_size: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            memory_pages: DEFAULT_MEMORY_PAGES,
            page_size: PAGE_SIZE,
        }
    }
}

impl ExecutionConfig {
    pub fn builder() -> ExecutionConfigBuilder {
        ExecutionConfigBuilder::default()
    }

    /// Number of pages (B) an operator may hold in memory at once.
    pub fn memory_pages(&self) -> usize {
        self.memory_pages
    }

    /// Size of a table page in bytes.
    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

/// Builder for [`ExecutionConfig`].
///
/// Unset options fall back to [`DEFAULT_MEMORY_PAGES`] and [`PAGE_SIZE`].
#[derive(Debug, Default, Clone)]
pub struct ExecutionConfigBuilder {
    memory_pages: Option<usize>,
    page_size: Option<usize>,
}

impl ExecutionConfigBuilder {
    pub fn memory_pages(mut self, pages: usize) -> Self {
        self.memory_pages = Some(pages);
        self
    }

    pub fn page_size(mut self, bytes: usize) -> Self {
        self.page_size = Some(bytes);
        self
    }

    /// Validates the settings.
    ///
    /// The block join reserves one input page for the inner relation and one
    /// output page, so fewer than [`MIN_MEMORY_PAGES`] leaves no room for the
    /// outer block.
    pub fn build(self) -> Result<ExecutionConfig> {
        let memory_pages = self.memory_pages.unwrap_or(DEFAULT_MEMORY_PAGES);
        let page_size = self.page_size.unwrap_or(PAGE_SIZE);

        if memory_pages < MIN_MEMORY_PAGES {
            return Err(QueryError::InvalidConfig {
                message: format!(
                    "buffer budget of {} pages is below the minimum of {}",
                    memory_pages, MIN_MEMORY_PAGES
                ),
            }
            .into());
        }
        if page_size < MIN_PAGE_SIZE {
            return Err(QueryError::InvalidConfig {
                message: format!(
                    "page size of {} bytes is below the minimum of {}",
                    page_size, MIN_PAGE_SIZE
                ),
            }
            .into());
        }

        Ok(ExecutionConfig {
            memory_pages,
            page_size,
        })
    }
}
