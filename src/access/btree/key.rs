use crate::access::value::{DataType, Value};
use crate::storage::page::{read_padded, Block, KEY_SIZE};
use byteorder::{BigEndian, ByteOrder};
use std::cmp::Ordering;

/// The primary key of a block, compared according to its type.
///
/// NUMBER keys order as unsigned integers, VARCHAR keys order by their bytes
/// up to the first NUL.
#[derive(Debug, Clone, Copy)]
pub struct BTreeKey {
    key_type: u8,
    data: [u8; KEY_SIZE],
}

impl BTreeKey {
    pub fn of(block: &Block) -> Self {
        Self {
            key_type: block.key_type,
            data: block.key,
        }
    }

    /// Builds a search key. Returns `None` for values that cannot be keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        let mut data = [0u8; KEY_SIZE];
        let key_type = match value {
            Value::Number(n) => {
                BigEndian::write_u32(&mut data[..4], *n);
                DataType::Number
            }
            Value::String(s) if s.len() <= KEY_SIZE && !s.contains('\0') => {
                data[..s.len()].copy_from_slice(s.as_bytes());
                DataType::Varchar
            }
            _ => return None,
        };
        Some(Self {
            key_type: key_type as u8,
            data,
        })
    }

    fn data_type(&self) -> Option<DataType> {
        DataType::from_u8(self.key_type).ok()
    }
}

impl PartialEq for BTreeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BTreeKey {}

impl PartialOrd for BTreeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BTreeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.data_type(), other.data_type()) {
            (Some(DataType::Number), Some(DataType::Number)) => {
                BigEndian::read_u32(&self.data[..4]).cmp(&BigEndian::read_u32(&other.data[..4]))
            }
            (Some(DataType::Varchar), Some(DataType::Varchar)) => {
                read_padded(&self.data).cmp(read_padded(&other.data))
            }
            // Keys of one table share a type; anything else is ordered by
            // tag and then raw bytes so the order stays total.
            _ => self
                .key_type
                .cmp(&other.key_type)
                .then_with(|| self.data.cmp(&other.data)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: u32) -> BTreeKey {
        BTreeKey::from_value(&Value::Number(n)).unwrap()
    }

    fn text(s: &str) -> BTreeKey {
        BTreeKey::from_value(&Value::String(s.to_string())).unwrap()
    }

    #[test]
    fn test_numeric_keys_compare_as_integers() {
        // 256 encodes with zero bytes, which a C-string comparison gets wrong.
        assert!(num(5) < num(256));
        assert!(num(255) < num(256));
        assert!(num(65536) > num(300));
        assert_eq!(num(42), num(42));
    }

    #[test]
    fn test_string_keys_compare_lexicographically() {
        assert!(text("a1") < text("a2"));
        assert!(text("a") < text("ab"));
        assert!(text("b") > text("abc"));
        assert_eq!(text("same"), text("same"));
    }

    #[test]
    fn test_key_of_block() {
        let mut block = Block::empty();
        block.key_type = DataType::Number as u8;
        block.key[..4].copy_from_slice(&7u32.to_be_bytes());
        assert_eq!(BTreeKey::of(&block), num(7));
    }

    #[test]
    fn test_invalid_search_keys() {
        assert!(BTreeKey::from_value(&Value::Null).is_none());
        assert!(BTreeKey::from_value(&Value::String("x".repeat(KEY_SIZE + 1))).is_none());
        assert!(BTreeKey::from_value(&Value::String("a\0b".to_string())).is_none());
    }

    #[test]
    fn test_equality_agrees_with_ordering() {
        let mut block = Block::empty();
        block.key_type = DataType::Varchar as u8;
        block.key[0] = b'a';
        block.key[2] = b'b';
        let stored = BTreeKey::of(&block);

        assert_eq!(stored.cmp(&text("a")), Ordering::Equal);
        assert_eq!(stored, text("a"));
        assert!(stored < text("ab"));
    }
}
