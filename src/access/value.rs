use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::MAX_STRING_LEN;
use std::fmt;

/// Column types supported by the engine.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Number = 1,
    Varchar = 2,
}

impl DataType {
    pub fn from_u8(value: u8) -> StorageResult<Self> {
        match value {
            1 => Ok(DataType::Number),
            2 => Ok(DataType::Varchar),
            _ => Err(StorageError::UnknownDataType(value)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Number => "NUMBER",
            DataType::Varchar => "VARCHAR",
        }
    }

    /// Parses a type name as written in a table definition.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("NUMBER") {
            Some(DataType::Number)
        } else if name.eq_ignore_ascii_case("VARCHAR") {
            Some(DataType::Varchar)
        } else {
            None
        }
    }

    /// Bytes a column of this type occupies in a block's value area,
    /// including its one-byte type tag.
    pub fn slot_width(self) -> usize {
        1 + match self {
            DataType::Number => 4,
            DataType::Varchar => MAX_STRING_LEN,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Column was not supplied when the row was inserted.
    Null,
    Number(u32),
    String(String),
}

impl Value {
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Number(_) => Some(DataType::Number),
            Value::String(_) => Some(DataType::Varchar),
        }
    }

    pub fn is_compatible_with(&self, data_type: DataType) -> bool {
        match (self, data_type) {
            (Value::Null, _) => true,
            (Value::Number(_), DataType::Number) => true,
            (Value::String(_), DataType::Varchar) => true,
            _ => false,
        }
    }

    /// Parses literal text into a value of the given column type.
    pub fn parse(text: &str, data_type: DataType) -> Option<Self> {
        match data_type {
            DataType::Number => text.trim().parse::<u32>().ok().map(Value::Number),
            DataType::Varchar => Some(Value::String(text.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_conversion() {
        assert_eq!(DataType::from_u8(1).unwrap(), DataType::Number);
        assert_eq!(DataType::from_u8(2).unwrap(), DataType::Varchar);
        assert!(DataType::from_u8(0).is_err());
        assert!(DataType::from_u8(99).is_err());
    }

    #[test]
    fn test_data_type_names() {
        assert_eq!(DataType::from_name("number"), Some(DataType::Number));
        assert_eq!(DataType::from_name("VARCHAR"), Some(DataType::Varchar));
        assert_eq!(DataType::from_name("BOOLEAN"), None);
        assert_eq!(DataType::Varchar.to_string(), "VARCHAR");
    }

    #[test]
    fn test_slot_width() {
        assert_eq!(DataType::Number.slot_width(), 5);
        assert_eq!(DataType::Varchar.slot_width(), 22);
    }

    #[test]
    fn test_value_compatibility() {
        assert!(Value::Null.is_compatible_with(DataType::Number));
        assert!(Value::Number(42).is_compatible_with(DataType::Number));
        assert!(Value::String("x".to_string()).is_compatible_with(DataType::Varchar));
        assert!(!Value::Number(42).is_compatible_with(DataType::Varchar));
        assert!(!Value::String("x".to_string()).is_compatible_with(DataType::Number));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(
            Value::parse("17", DataType::Number),
            Some(Value::Number(17))
        );
        assert_eq!(Value::parse("abc", DataType::Number), None);
        assert_eq!(Value::parse("-1", DataType::Number), None);
        assert_eq!(
            Value::parse("abc", DataType::Varchar),
            Some(Value::String("abc".to_string()))
        );
    }
}
