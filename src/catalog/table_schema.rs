//! Table definitions.

use crate::access::DataType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub is_key: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, is_key: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_key,
        }
    }
}

/// A table name plus its ordered columns. Exactly one column is expected to
/// be the key; that is checked before a schema reaches the storage engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    table_name: String,
    columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_columns(table_name: impl Into<String>, columns: Vec<Column>) -> Self {
        let mut schema = Self::new(table_name);
        for column in columns {
            schema.add_column(column);
        }
        schema
    }

    /// Appends a column. Returns false and leaves the schema untouched if a
    /// column with the same name already exists.
    pub fn add_column(&mut self, column: Column) -> bool {
        if self.column_exists(&column.name) {
            return false;
        }
        self.columns.push(column);
        true
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_exists(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn key_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_key)
    }

    /// Bytes the non-key columns occupy in a block's value area.
    pub fn value_area_width(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| !c.is_key)
            .map(|c| c.data_type.slot_width())
            .sum()
    }
}
