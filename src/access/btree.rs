//! Disk-resident B-tree over a table file.
//!
//! The tree is a clustered index of minimum degree `T = 4`: every page holds
//! up to seven full rows ordered by primary key and, when internal, up to
//! eight child page ids. Children are referenced only by page id and are
//! reloaded through the [`BufferManager`] on every visit; every page changed
//! by an operation is written back before the operation returns.
//!
//! Rows are never removed individually. Deleting a table's rows truncates
//! the whole file back to one empty leaf.

pub mod key;

use self::key::BTreeKey;
use crate::access::row::{Projection, Row};
use crate::access::row_codec::{decode, decode_key};
use crate::access::value::Value;
use crate::catalog::TableSchema;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{Block, PageId, TablePage, MIN_DEGREE};
use crate::storage::BufferManager;
use std::path::{Path, PathBuf};

pub struct BTree {
    buffer_manager: BufferManager,
    table_path: PathBuf,
}

impl BTree {
    pub fn new(buffer_manager: BufferManager, table_path: impl Into<PathBuf>) -> Self {
        Self {
            buffer_manager,
            table_path: table_path.into(),
        }
    }

    pub fn table_path(&self) -> &Path {
        &self.table_path
    }

    /// Loads a page that the tree refers to. A page that cannot be read
    /// aborts the operation.
    fn fetch(&self, page_id: PageId) -> StorageResult<TablePage> {
        self.buffer_manager
            .table_page_at(&self.table_path, page_id)?
            .ok_or(StorageError::PageNotFound { page_id })
    }

    /// Finds the row with the given key.
    pub fn search(&self, key: &Value) -> StorageResult<Option<Block>> {
        let Some(key) = BTreeKey::from_value(key) else {
            return Ok(None);
        };
        let Some(mut page) = self.buffer_manager.root_table_page(&self.table_path)? else {
            return Ok(None);
        };

        loop {
            let i = page
                .occupied()
                .iter()
                .position(|b| key <= BTreeKey::of(b))
                .unwrap_or(page.len());
            if i < page.len() && BTreeKey::of(&page.blocks[i]) == key {
                return Ok(Some(page.blocks[i]));
            }
            if page.is_leaf {
                return Ok(None);
            }
            page = self.fetch(page.children[i])?;
        }
    }

    /// Inserts a row. A full root is split first, so the descent below never
    /// meets a full page.
    pub fn insert(&self, block: &Block) -> StorageResult<()> {
        let root_id = self.buffer_manager.get_root_id(&self.table_path)?;
        let mut root = self.fetch(root_id)?;

        if !root.is_full() {
            return self.insert_nonfull(root, block);
        }

        let new_root_id = self.buffer_manager.new_page_id(&self.table_path)?;
        let mut new_root = TablePage::new(new_root_id, false);
        new_root.children[0] = root.page_id;
        self.buffer_manager.write_page(&self.table_path, &new_root)?;
        self.buffer_manager
            .update_root_id(&self.table_path, new_root_id)?;
        log::debug!(
            "Root page {} is full, new root is page {}",
            root.page_id.0,
            new_root_id.0
        );

        self.split(&mut new_root, 0, &mut root)?;
        self.insert_nonfull(new_root, block)
    }

    fn insert_nonfull(&self, mut page: TablePage, block: &Block) -> StorageResult<()> {
        let key = BTreeKey::of(block);
        let mut i = page.len();

        if page.is_leaf {
            while i > 0 && key < BTreeKey::of(&page.blocks[i - 1]) {
                page.blocks[i] = page.blocks[i - 1];
                i -= 1;
            }
            page.blocks[i] = *block;
            page.n += 1;
            return self.buffer_manager.write_page(&self.table_path, &page);
        }

        while i > 0 && key < BTreeKey::of(&page.blocks[i - 1]) {
            i -= 1;
        }
        let mut child = self.fetch(page.children[i])?;
        if child.is_full() {
            self.split(&mut page, i, &mut child)?;
            if key > BTreeKey::of(&page.blocks[i]) {
                i += 1;
                child = self.fetch(page.children[i])?;
            }
        }
        self.insert_nonfull(child, block)
    }

    /// Splits the full `child`, the `i`-th child of `parent`: its upper
    /// `T - 1` rows (and `T` children) move to a new sibling and its median
    /// row moves up into `parent`. All three pages are written.
    fn split(&self, parent: &mut TablePage, i: usize, child: &mut TablePage) -> StorageResult<()> {
        let t = MIN_DEGREE;
        let sibling_id = self.buffer_manager.new_page_id(&self.table_path)?;
        let mut sibling = TablePage::new(sibling_id, child.is_leaf);

        sibling.n = (t - 1) as u8;
        sibling.blocks[..t - 1].copy_from_slice(&child.blocks[t..2 * t - 1]);
        if !child.is_leaf {
            sibling.children[..t].copy_from_slice(&child.children[t..2 * t]);
        }

        let median = child.blocks[t - 1];
        child.n = (t - 1) as u8;
        child.blocks[t - 1..].fill(Block::empty());
        if !child.is_leaf {
            child.children[t..].fill(PageId(0));
        }

        let n = parent.len();
        parent.children.copy_within(i + 1..n + 1, i + 2);
        parent.children[i + 1] = sibling_id;
        parent.blocks.copy_within(i..n, i + 1);
        parent.blocks[i] = median;
        parent.n += 1;

        log::debug!(
            "Split page {} into {} and {} under parent {}",
            child.page_id.0,
            child.page_id.0,
            sibling_id.0,
            parent.page_id.0
        );

        self.buffer_manager.write_page(&self.table_path, parent)?;
        self.buffer_manager.write_page(&self.table_path, child)?;
        self.buffer_manager.write_page(&self.table_path, &sibling)
    }

    /// Pre-order dump of every page and its decoded rows.
    pub fn traverse(&self, schema: &TableSchema) -> StorageResult<String> {
        let root_id = self.buffer_manager.get_root_id(&self.table_path)?;
        let mut out = String::new();
        self.traverse_page(root_id, schema, 0, &mut out)?;
        Ok(out)
    }

    fn traverse_page(
        &self,
        page_id: PageId,
        schema: &TableSchema,
        depth: usize,
        out: &mut String,
    ) -> StorageResult<()> {
        let page = self.fetch(page_id)?;
        let indent = " ".repeat(depth * 4);

        out.push_str(&format!(
            "{}Page ID: {}, n: {}\n",
            indent, page.page_id.0, page.n
        ));
        for block in page.occupied() {
            out.push_str(&format!("{}Key: {}\n", indent, decode_key(block)?));
            let data = decode(block, schema)?;
            for column in schema.columns() {
                let value = data.get(&column.name).cloned().unwrap_or(Value::Null);
                out.push_str(&format!("{}{}: {}\n", indent, column.name, value));
            }
        }
        for &child in page.valid_children() {
            self.traverse_page(child, schema, depth + 1, out)?;
        }
        Ok(())
    }

    /// Every live row in key order, projected.
    pub fn select(&self, schema: &TableSchema, projection: &Projection) -> StorageResult<Vec<Row>> {
        let root_id = self.buffer_manager.get_root_id(&self.table_path)?;
        let mut rows = Vec::new();
        self.select_page(root_id, schema, projection, &mut rows)?;
        Ok(rows)
    }

    fn select_page(
        &self,
        page_id: PageId,
        schema: &TableSchema,
        projection: &Projection,
        rows: &mut Vec<Row>,
    ) -> StorageResult<()> {
        let page = self.fetch(page_id)?;
        for (i, block) in page.occupied().iter().enumerate() {
            if !page.is_leaf {
                self.select_page(page.children[i], schema, projection, rows)?;
            }
            if block.is_deleted {
                continue;
            }
            let data = decode(block, schema)?;
            rows.push(Row::project(&data, schema, projection));
        }
        if !page.is_leaf {
            self.select_page(page.children[page.len()], schema, projection, rows)?;
        }
        Ok(())
    }

    /// Removes every row.
    pub fn delete_all(&self) -> StorageResult<()> {
        self.buffer_manager.delete_all_data(&self.table_path)
    }
}
