//! The only component that touches persistent storage.
//!
//! `BufferManager` keeps no state between calls: every operation opens the
//! file it needs, does its work and closes it again. There is no page cache,
//! so every page read or write is a round trip to the file system. Callers
//! must not interleave writers on the same table (`new_page_id` derives ids
//! from the current file length without reserving them).

use crate::catalog::{SchemaCatalog, TableSchema};
use crate::storage::disk::TableFile;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{PageId, SchemaPage, TablePage, PAGE_SIZE, TABLE_HEADER_SIZE};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Path of a table's data file inside `tables_dir`.
pub fn table_path(tables_dir: &Path, table_name: &str) -> PathBuf {
    tables_dir.join(format!("{}.db", table_name))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BufferManager;

impl BufferManager {
    pub fn new() -> Self {
        Self
    }

    /// Reads every schema record in the file. A missing file is an empty
    /// schema.
    pub fn load_schema(&self, schema_path: &Path) -> StorageResult<Vec<TableSchema>> {
        let mut file = match File::open(schema_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Schema file {:?} not found, starting empty", schema_path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut tables = Vec::new();
        let mut buf = vec![0u8; PAGE_SIZE];
        loop {
            match file.read_exact(&mut buf) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let schema = SchemaPage::from_bytes(&buf)?.to_schema()?;
            log::debug!(
                "Loaded schema of '{}' ({} columns)",
                schema.table_name(),
                schema.columns().len()
            );
            tables.push(schema);
        }
        Ok(tables)
    }

    /// Appends a schema record and creates the table's data file holding a
    /// single empty root leaf.
    pub fn save_schema(
        &self,
        schema_path: &Path,
        tables_dir: &Path,
        schema: &TableSchema,
    ) -> StorageResult<()> {
        let page = SchemaPage::from_schema(schema)?;
        {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(schema_path)?;
            file.write_all(page.as_bytes())?;
        }

        let path = table_path(tables_dir, schema.table_name());
        self.init_table_file(&path)?;
        log::info!("Created table '{}' at {:?}", schema.table_name(), path);
        Ok(())
    }

    /// Removes a table: its schema record is cut out of the schema file by
    /// shifting every later record one page to the left, the catalog entry
    /// is dropped and the data file is deleted.
    ///
    /// Returns whether a schema record was found.
    pub fn delete_schema(
        &self,
        schema_path: &Path,
        tables_dir: &Path,
        table_name: &str,
        catalog: &mut SchemaCatalog,
    ) -> StorageResult<bool> {
        let found = self.remove_schema_record(schema_path, table_name)?;
        if !found {
            log::warn!("No schema record for table '{}'", table_name);
        }

        catalog.drop_table(table_name);

        let path = table_path(tables_dir, table_name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Data file {:?} was already gone", path);
            }
            Err(e) => return Err(e.into()),
        }
        log::info!("Dropped table '{}'", table_name);
        Ok(found)
    }

    fn remove_schema_record(&self, schema_path: &Path, table_name: &str) -> StorageResult<bool> {
        let mut file = match OpenOptions::new().read(true).write(true).open(schema_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let record_count = file.metadata()?.len() / PAGE_SIZE as u64;
        let mut buf = vec![0u8; PAGE_SIZE];
        let mut target = None;
        for index in 0..record_count {
            file.seek(SeekFrom::Start(index * PAGE_SIZE as u64))?;
            file.read_exact(&mut buf)?;
            if SchemaPage::from_bytes(&buf)?.table_name()? == table_name {
                target = Some(index);
                break;
            }
        }
        let Some(target) = target else {
            return Ok(false);
        };

        for index in target + 1..record_count {
            file.seek(SeekFrom::Start(index * PAGE_SIZE as u64))?;
            file.read_exact(&mut buf)?;
            file.seek(SeekFrom::Start((index - 1) * PAGE_SIZE as u64))?;
            file.write_all(&buf)?;
        }
        file.set_len((record_count - 1) * PAGE_SIZE as u64)?;
        Ok(true)
    }

    /// Reads the page with the given id. `Ok(None)` means the table file is
    /// missing or does not hold the whole page.
    pub fn table_page_at(
        &self,
        table_path: &Path,
        page_id: PageId,
    ) -> StorageResult<Option<TablePage>> {
        let mut file = match open_existing(table_path, TableFile::open_read)? {
            Some(file) => file,
            None => return Ok(None),
        };
        let page = match file.read_page(page_id)? {
            Some(buf) => TablePage::from_bytes(&buf[..])?,
            None => return Ok(None),
        };
        log::debug!("Read page {} of {:?} (n = {})", page_id.0, table_path, page.n);
        Ok(Some(page))
    }

    /// Reads the page the header names as root.
    pub fn root_table_page(&self, table_path: &Path) -> StorageResult<Option<TablePage>> {
        let mut file = match open_existing(table_path, TableFile::open_read)? {
            Some(file) => file,
            None => return Ok(None),
        };
        let root_id = match file.read_root_id()? {
            Some(root_id) => root_id,
            None => return Ok(None),
        };
        match file.read_page(root_id)? {
            Some(buf) => Ok(Some(TablePage::from_bytes(&buf[..])?)),
            None => Ok(None),
        }
    }

    /// Writes a page back at the offset of its own page id.
    pub fn write_page(&self, table_path: &Path, page: &TablePage) -> StorageResult<()> {
        let data = page.to_bytes()?;
        let mut file = TableFile::open(table_path)?;
        file.write_page(page.page_id, &data)?;
        file.flush()?;
        log::debug!(
            "Wrote page {} of {:?} (n = {}, leaf = {})",
            page.page_id.0,
            table_path,
            page.n,
            page.is_leaf
        );
        Ok(())
    }

    /// Next free page id: one past the last page in the file. The caller must
    /// write the page before allocating another one.
    pub fn new_page_id(&self, table_path: &Path) -> StorageResult<PageId> {
        let file = TableFile::open_read(table_path)?;
        let len = file.len()?;
        if len < (TABLE_HEADER_SIZE + PAGE_SIZE) as u64 {
            return Err(StorageError::CorruptedTable {
                path: table_path.to_path_buf(),
                len,
            });
        }
        let page_id = PageId(file.num_pages()?);
        log::debug!("Allocated page {} in {:?}", page_id.0, table_path);
        Ok(page_id)
    }

    pub fn update_root_id(&self, table_path: &Path, root_id: PageId) -> StorageResult<()> {
        let mut file = TableFile::open(table_path)?;
        file.write_root_id(root_id)?;
        file.flush()?;
        log::debug!("Root of {:?} is now page {}", table_path, root_id.0);
        Ok(())
    }

    pub fn get_root_id(&self, table_path: &Path) -> StorageResult<PageId> {
        let mut file = TableFile::open_read(table_path)?;
        let len = file.len()?;
        file.read_root_id()?
            .ok_or_else(|| StorageError::CorruptedTable {
                path: table_path.to_path_buf(),
                len,
            })
    }

    /// Throws away every row by truncating the table file back to a single
    /// empty root leaf.
    pub fn delete_all_data(&self, table_path: &Path) -> StorageResult<()> {
        // Opening first surfaces a missing table instead of silently
        // creating it.
        TableFile::open(table_path)?;
        self.init_table_file(table_path)?;
        log::info!("Truncated {:?}", table_path);
        Ok(())
    }

    fn init_table_file(&self, table_path: &Path) -> StorageResult<()> {
        let root = TablePage::new(PageId(0), true);
        let mut file = TableFile::create(table_path)?;
        let data = root.to_bytes()?;
        file.write_root_id(root.page_id)?;
        file.write_page(root.page_id, &data)?;
        file.flush()
    }
}

fn open_existing(
    path: &Path,
    open: fn(&Path) -> StorageResult<TableFile>,
) -> StorageResult<Option<TableFile>> {
    match open(path) {
        Ok(file) => Ok(Some(file)),
        Err(StorageError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
