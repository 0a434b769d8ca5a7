//! Storage layer error types.

use crate::storage::page::PageId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Page not found: {page_id:?}")]
    PageNotFound { page_id: PageId },

    #[error("Corrupted table file {path:?}: {len} bytes is shorter than header plus one page")]
    CorruptedTable { path: PathBuf, len: u64 },

    #[error("Invalid page layout: {0}")]
    InvalidPage(String),

    #[error("Unknown data type tag: {0}")]
    UnknownDataType(u8),

    #[error("Value for column '{column}' is {len} bytes long (max: {max})")]
    ValueTooLong {
        column: String,
        len: usize,
        max: usize,
    },

    #[error("Value for column '{column}' contains a NUL byte")]
    NulInString { column: String },

    #[error("Type mismatch for column '{column}': expected {expected}")]
    TypeMismatch { column: String, expected: String },

    #[error("Schema of table '{table}' needs {required} bytes, which does not fit a schema page")]
    SchemaTooLarge { table: String, required: usize },

    #[error("Got {columns} columns but {values} values")]
    ColumnCountMismatch { columns: usize, values: usize },

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Table '{table}' has no key column")]
    MissingKey { table: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
