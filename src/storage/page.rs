//! Fixed-size on-disk record formats.
//!
//! Every record is encoded into an explicit byte buffer; nothing relies on
//! native struct layout or host endianness. Multi-byte integers are always
//! big-endian on disk.

pub mod block;
pub mod schema_page;
pub mod table_page;

pub use block::Block;
pub use schema_page::SchemaPage;
pub use table_page::TablePage;

/// Size of every schema record and every table page.
pub const PAGE_SIZE: usize = 4096;

/// Size of one row slot.
pub const BLOCK_SIZE: usize = 512;

/// Minimum degree of the table B-tree.
pub const MIN_DEGREE: usize = 4;

/// Maximum number of occupied slots in a page (`2T - 1`).
pub const MAX_KEYS: usize = 2 * MIN_DEGREE - 1;

/// Maximum number of child pointers in a page (`2T`).
pub const MAX_CHILDREN: usize = 2 * MIN_DEGREE;

/// Width of the key buffer inside a block.
pub const KEY_SIZE: usize = 21;

/// Width of a null-padded VARCHAR value.
pub const MAX_STRING_LEN: usize = 21;

/// Width of a null-padded column name inside a schema record.
pub const MAX_COLUMN_LEN: usize = 21;

/// Width of the value area inside a block.
pub const VALUE_SIZE: usize = BLOCK_SIZE - 2 - KEY_SIZE;

/// Size of the root page-id header at the start of every table file.
pub const TABLE_HEADER_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Byte offset of this page inside a table file.
    pub fn file_offset(self) -> u64 {
        TABLE_HEADER_SIZE as u64 + self.0 as u64 * PAGE_SIZE as u64
    }
}

/// Reads a NUL-padded fixed-width field up to the first NUL byte.
pub(crate) fn read_padded(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

/// Writes `src` into `field` and zero-fills the remainder.
///
/// The caller guarantees `src.len() <= field.len()`.
pub(crate) fn write_padded(field: &mut [u8], src: &[u8]) {
    field.fill(0);
    field[..src.len()].copy_from_slice(src);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(MAX_KEYS, 7);
        assert_eq!(MAX_CHILDREN, 8);
        assert_eq!(VALUE_SIZE, 489);
        assert_eq!(1 + 1 + KEY_SIZE + VALUE_SIZE, BLOCK_SIZE);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(PageId(0).file_offset(), 4);
        assert_eq!(PageId(3).file_offset(), 4 + 3 * 4096);
    }

    #[test]
    fn test_padded_fields() {
        let mut field = [0xffu8; 8];
        write_padded(&mut field, b"abc");
        assert_eq!(&field, b"abc\0\0\0\0\0");
        assert_eq!(read_padded(&field), b"abc");

        let full = *b"abcdefgh";
        assert_eq!(read_padded(&full), b"abcdefgh");
    }
}
