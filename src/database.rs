use crate::access::{decode, encode, BTree, Projection, Row, Value};
use crate::catalog::{Column, SchemaCatalog, TableSchema};
use crate::storage::page::{MAX_COLUMN_LEN, MAX_STRING_LEN, VALUE_SIZE};
use crate::storage::{table_path, BufferManager, SchemaPage, PAGE_SIZE};
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::PathBuf;

/// Where a database keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub data_dir: PathBuf,
}

impl DatabaseConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn schema_path(&self) -> PathBuf {
        self.data_dir.join("schema.db")
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.data_dir.join("tables")
    }

    pub fn table_path(&self, table_name: &str) -> PathBuf {
        table_path(&self.tables_dir(), table_name)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("./pagedb_data")
    }
}

/// High-level database interface: validates each request against the
/// catalog and drives the storage engine.
pub struct Database {
    config: DatabaseConfig,
    catalog: SchemaCatalog,
    buffer_manager: BufferManager,
}

impl Database {
    /// Opens the database in `config.data_dir`, creating its directories if
    /// needed and loading every table definition from the schema file.
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        let tables_dir = config.tables_dir();
        std::fs::create_dir_all(&tables_dir)
            .with_context(|| format!("Failed to create data directory {:?}", tables_dir))?;

        let buffer_manager = BufferManager::new();
        let mut catalog = SchemaCatalog::new();
        let schema_path = config.schema_path();
        for table in buffer_manager
            .load_schema(&schema_path)
            .with_context(|| format!("Failed to load schema from {:?}", schema_path))?
        {
            catalog.add_table(table);
        }
        log::info!(
            "Opened database at {:?} with {} tables",
            config.data_dir,
            catalog.len()
        );

        Ok(Self {
            config,
            catalog,
            buffer_manager,
        })
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.catalog.table_names()
    }

    pub fn table_schema(&self, table_name: &str) -> Result<&TableSchema> {
        match self.catalog.get_table(table_name) {
            Some(schema) => Ok(schema),
            None => bail!("Table '{}' doesn't exist", table_name),
        }
    }

    fn tree(&self, table_name: &str) -> BTree {
        BTree::new(self.buffer_manager, self.config.table_path(table_name))
    }

    pub fn create_table(&mut self, table_name: &str, columns: Vec<Column>) -> Result<()> {
        check_name("table", table_name)?;
        if self.catalog.table_exists(table_name) {
            bail!("Table '{}' already exists", table_name);
        }

        let mut seen = HashSet::new();
        for column in &columns {
            check_name("column", &column.name)?;
            if !seen.insert(column.name.as_str()) {
                bail!("Duplicate column '{}'", column.name);
            }
        }
        match columns.iter().filter(|c| c.is_key).count() {
            0 => bail!("Table '{}' has no key", table_name),
            1 => {}
            _ => bail!("Table '{}' has multiple keys", table_name),
        }

        let schema = TableSchema::with_columns(table_name, columns);
        let required = schema.value_area_width();
        if required > VALUE_SIZE {
            bail!(
                "Maximum row size is {}B, table '{}' requires {}B",
                VALUE_SIZE,
                table_name,
                required
            );
        }
        let required = SchemaPage::required_size(&schema);
        if required > PAGE_SIZE {
            bail!(
                "Definition of table '{}' needs {}B, which exceeds the {}B schema page",
                table_name,
                required,
                PAGE_SIZE
            );
        }

        self.buffer_manager
            .save_schema(
                &self.config.schema_path(),
                &self.config.tables_dir(),
                &schema,
            )
            .with_context(|| format!("Failed to create table '{}'", table_name))?;
        self.catalog.add_table(schema);
        Ok(())
    }

    /// Inserts one row given as parallel column and value lists. The key
    /// column must be among them; absent columns are stored as NULL.
    pub fn insert_row<S: AsRef<str>>(
        &self,
        table_name: &str,
        columns: &[S],
        values: &[Value],
    ) -> Result<()> {
        let schema = self.table_schema(table_name)?;
        if columns.len() != values.len() {
            bail!(
                "Number of provided values ({}) doesn't match the number of provided columns ({})",
                values.len(),
                columns.len()
            );
        }

        let mut seen = HashSet::new();
        let mut key = None;
        for (name, value) in columns.iter().map(AsRef::as_ref).zip(values) {
            let Some(column) = schema.column(name) else {
                bail!("Unknown column '{}'", name);
            };
            if !seen.insert(name) {
                bail!("Duplicate column '{}'", name);
            }
            check_value(column, value)?;
            if column.is_key && *value != Value::Null {
                key = Some(value);
            }
        }
        let Some(key) = key else {
            bail!("Insertion into '{}' failed, no key provided", table_name);
        };

        let tree = self.tree(table_name);
        if tree
            .search(key)
            .with_context(|| format!("Failed to look up key {} in '{}'", key, table_name))?
            .is_some()
        {
            bail!("Duplicate key {} in table '{}'", key, table_name);
        }

        let block = encode(columns, values, schema)?;
        tree.insert(&block)
            .with_context(|| format!("Failed to insert into '{}'", table_name))?;
        log::debug!("Inserted key {} into '{}'", key, table_name);
        Ok(())
    }

    /// Looks up one row by primary key.
    pub fn get_row(&self, table_name: &str, key: &Value) -> Result<Option<Row>> {
        let schema = self.table_schema(table_name)?;
        let Some(key_column) = schema.key_column() else {
            bail!("Table '{}' has no key", table_name);
        };
        if key.data_type() != Some(key_column.data_type) {
            bail!(
                "Type mismatch: key '{}' is {}, got {:?}",
                key_column.name,
                key_column.data_type,
                key
            );
        }

        let Some(block) = self.tree(table_name).search(key)? else {
            return Ok(None);
        };
        let data = decode(&block, schema)?;
        Ok(Some(Row::project(&data, schema, &Projection::All)))
    }

    /// Every row of a table in key order, projected onto `projection`.
    pub fn scan_project(&self, table_name: &str, projection: &Projection) -> Result<Vec<Row>> {
        let schema = self.table_schema(table_name)?;
        if let Projection::Columns(names) = projection {
            let mut seen = HashSet::new();
            for name in names {
                if !schema.column_exists(name) {
                    bail!("Unknown column '{}'", name);
                }
                if !seen.insert(name.as_str()) {
                    bail!("Duplicate column '{}'", name);
                }
            }
        }

        self.tree(table_name)
            .select(schema, projection)
            .with_context(|| format!("Failed to scan '{}'", table_name))
    }

    /// Removes every row of a table, keeping its definition.
    pub fn delete_all(&self, table_name: &str) -> Result<()> {
        self.table_schema(table_name)?;
        self.tree(table_name)
            .delete_all()
            .with_context(|| format!("Failed to delete rows of '{}'", table_name))
    }

    /// Removes a table's definition and its data file.
    pub fn drop_table(&mut self, table_name: &str) -> Result<()> {
        self.table_schema(table_name)?;
        self.buffer_manager
            .delete_schema(
                &self.config.schema_path(),
                &self.config.tables_dir(),
                table_name,
                &mut self.catalog,
            )
            .with_context(|| format!("Failed to drop table '{}'", table_name))?;
        Ok(())
    }

    /// Human-readable dump of every page of a table's tree.
    pub fn dump_table(&self, table_name: &str) -> Result<String> {
        let schema = self.table_schema(table_name)?;
        Ok(self.tree(table_name).traverse(schema)?)
    }

    pub fn table_file(&self, table_name: &str) -> Result<PathBuf> {
        self.table_schema(table_name)?;
        Ok(self.config.table_path(table_name))
    }
}

/// Names become file names and fixed-width schema fields.
fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Empty {} name", kind);
    }
    if name.len() >= MAX_COLUMN_LEN {
        bail!(
            "Maximum length for a {} name is {}, received {}",
            kind,
            MAX_COLUMN_LEN - 1,
            name.len()
        );
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("Invalid {} name '{}'", kind, name);
    }
    Ok(())
}

fn check_value(column: &Column, value: &Value) -> Result<()> {
    if !value.is_compatible_with(column.data_type) {
        bail!(
            "Type mismatch for column '{}': expected {} got {:?}",
            column.name,
            column.data_type,
            value
        );
    }
    match value {
        Value::Number(n) if *n > i32::MAX as u32 => bail!(
            "Maximum value of a number is {}, received {}",
            i32::MAX,
            n
        ),
        Value::String(s) if s.len() >= MAX_STRING_LEN => bail!(
            "Maximum length of varchar is {}, received {}",
            MAX_STRING_LEN - 1,
            s.len()
        ),
        Value::String(s) if s.contains('\0') => {
            bail!("Value for column '{}' contains a NUL byte", column.name)
        }
        _ => Ok(()),
    }
}
