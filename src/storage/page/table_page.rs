//! B-tree node layout.
//!
//! ```text
//! +----+---------+-------------------+--------------------+-------------+---------+
//! | n  | is_leaf | blocks (7 * 512)  | children (8 * u32) | page_id u32 | padding |
//! +----+---------+-------------------+--------------------+-------------+---------+
//! ```
//!
//! Child ids and the page id are big-endian on disk.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{Block, PageId, BLOCK_SIZE, MAX_CHILDREN, MAX_KEYS, PAGE_SIZE};
use byteorder::{BigEndian, ByteOrder};

const N_OFFSET: usize = 0;
const IS_LEAF_OFFSET: usize = 1;
const BLOCKS_OFFSET: usize = 2;
const CHILDREN_OFFSET: usize = BLOCKS_OFFSET + MAX_KEYS * BLOCK_SIZE;
const PAGE_ID_OFFSET: usize = CHILDREN_OFFSET + MAX_CHILDREN * 4;
const USED_SIZE: usize = PAGE_ID_OFFSET + 4;

const _: () = assert!(USED_SIZE <= PAGE_SIZE);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePage {
    pub n: u8,
    pub is_leaf: bool,
    pub blocks: [Block; MAX_KEYS],
    pub children: [PageId; MAX_CHILDREN],
    pub page_id: PageId,
}

impl TablePage {
    pub fn new(page_id: PageId, is_leaf: bool) -> Self {
        Self {
            n: 0,
            is_leaf,
            blocks: [Block::empty(); MAX_KEYS],
            children: [PageId(0); MAX_CHILDREN],
            page_id,
        }
    }

    pub fn len(&self) -> usize {
        self.n as usize
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == MAX_KEYS
    }

    /// Occupied slots in key order.
    pub fn occupied(&self) -> &[Block] {
        &self.blocks[..self.len()]
    }

    /// Child pointers that are meaningful for this page (`n + 1` of them).
    pub fn valid_children(&self) -> &[PageId] {
        if self.is_leaf {
            &[]
        } else {
            &self.children[..self.len() + 1]
        }
    }

    pub fn to_bytes(&self) -> StorageResult<Box<[u8; PAGE_SIZE]>> {
        if self.len() > MAX_KEYS {
            return Err(StorageError::InvalidPage(format!(
                "page {} records {} slots (max: {})",
                self.page_id.0, self.n, MAX_KEYS
            )));
        }

        let mut buf = Box::new([0u8; PAGE_SIZE]);
        buf[N_OFFSET] = self.n;
        buf[IS_LEAF_OFFSET] = self.is_leaf as u8;
        for (i, block) in self.blocks.iter().enumerate() {
            let start = BLOCKS_OFFSET + i * BLOCK_SIZE;
            block.write_to(&mut buf[start..start + BLOCK_SIZE]);
        }
        for (i, child) in self.children.iter().enumerate() {
            let start = CHILDREN_OFFSET + i * 4;
            BigEndian::write_u32(&mut buf[start..start + 4], child.0);
        }
        BigEndian::write_u32(&mut buf[PAGE_ID_OFFSET..USED_SIZE], self.page_id.0);
        Ok(buf)
    }

    pub fn from_bytes(buf: &[u8]) -> StorageResult<Self> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::InvalidPage(format!(
                "expected {} bytes, got {}",
                PAGE_SIZE,
                buf.len()
            )));
        }

        let n = buf[N_OFFSET];
        let page_id = PageId(BigEndian::read_u32(&buf[PAGE_ID_OFFSET..USED_SIZE]));
        if n as usize > MAX_KEYS {
            return Err(StorageError::InvalidPage(format!(
                "page {} records {} slots (max: {})",
                page_id.0, n, MAX_KEYS
            )));
        }

        let mut page = Self::new(page_id, buf[IS_LEAF_OFFSET] != 0);
        page.n = n;
        for (i, block) in page.blocks.iter_mut().enumerate() {
            let start = BLOCKS_OFFSET + i * BLOCK_SIZE;
            *block = Block::read_from(&buf[start..start + BLOCK_SIZE]);
        }
        for (i, child) in page.children.iter_mut().enumerate() {
            let start = CHILDREN_OFFSET + i * 4;
            *child = PageId(BigEndian::read_u32(&buf[start..start + 4]));
        }
        Ok(page)
    }
}
