//! Row slot layout.
//!
//! ```text
//! +----------+------------+-----------------+---------------------------+
//! | key_type | is_deleted | key (21 bytes)  | value area (489 bytes)    |
//! |   u8     |    u8      | NUL padded      | (u8 tag, int | string)... |
//! +----------+------------+-----------------+---------------------------+
//! ```

use crate::storage::page::{BLOCK_SIZE, KEY_SIZE, VALUE_SIZE};

const KEY_TYPE_OFFSET: usize = 0;
const DELETED_OFFSET: usize = 1;
const KEY_OFFSET: usize = 2;
const VALUE_OFFSET: usize = KEY_OFFSET + KEY_SIZE;

/// One table row. The key buffer holds the primary-key column; the value
/// area holds every other column in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub key_type: u8,
    pub is_deleted: bool,
    pub key: [u8; KEY_SIZE],
    pub value: [u8; VALUE_SIZE],
}

impl Block {
    pub fn empty() -> Self {
        Self {
            key_type: 0,
            is_deleted: false,
            key: [0; KEY_SIZE],
            value: [0; VALUE_SIZE],
        }
    }

    pub fn write_to(&self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len(), BLOCK_SIZE);
        buf[KEY_TYPE_OFFSET] = self.key_type;
        buf[DELETED_OFFSET] = self.is_deleted as u8;
        buf[KEY_OFFSET..VALUE_OFFSET].copy_from_slice(&self.key);
        buf[VALUE_OFFSET..BLOCK_SIZE].copy_from_slice(&self.value);
    }

    pub fn read_from(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), BLOCK_SIZE);
        let mut block = Self::empty();
        block.key_type = buf[KEY_TYPE_OFFSET];
        block.is_deleted = buf[DELETED_OFFSET] != 0;
        block.key.copy_from_slice(&buf[KEY_OFFSET..VALUE_OFFSET]);
        block.value.copy_from_slice(&buf[VALUE_OFFSET..BLOCK_SIZE]);
        block
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::empty()
    }
}
