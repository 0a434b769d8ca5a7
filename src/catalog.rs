//! In-memory directory of table definitions.
//!
//! The catalog itself never touches disk. It is filled from the schema file by
//! [`BufferManager::load_schema`](crate::storage::BufferManager::load_schema)
//! and kept in step with it by the database layer.

pub mod table_schema;

pub use table_schema::{Column, TableSchema};

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SchemaCatalog {
    tables: HashMap<String, TableSchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: TableSchema) {
        self.tables.insert(table.table_name().to_string(), table);
    }

    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn drop_table(&mut self, name: &str) -> Option<TableSchema> {
        self.tables.remove(name)
    }

    /// Table names in ascending order.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
