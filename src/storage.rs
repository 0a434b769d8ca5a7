//! Storage layer implementation for pagedb.
//!
//! This module owns the on-disk formats and all file I/O:
//!
//! - **page**: fixed-size (4KB) schema records and B-tree pages, and the 512-byte
//!   row blocks stored inside them
//! - **disk**: per-call access to a table file (root header + pages)
//! - **BufferManager**: every read and write of schema and table files
//!
//! Each table lives in its own `<name>.db` file; all table definitions live in
//! one append-only schema file.

pub mod buffer;
pub mod disk;
pub mod error;
pub mod page;

pub use buffer::{table_path, BufferManager};
pub use error::{StorageError, StorageResult};
pub use page::{Block, PageId, SchemaPage, TablePage, PAGE_SIZE};
