//! Conversion between named column values and fixed-width blocks.
//!
//! Columns are laid out in schema order. The key column goes into the key
//! buffer; every other column owns a fixed slot in the value area made of a
//! one-byte type tag followed by a 4-byte big-endian integer or a 21-byte
//! NUL-padded string. A slot whose tag is zero was not supplied on insert.

use crate::access::value::{DataType, Value};
use crate::catalog::TableSchema;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{read_padded, write_padded, Block, KEY_SIZE, MAX_STRING_LEN, VALUE_SIZE};
use byteorder::{BigEndian, ByteOrder};
use std::collections::HashMap;

/// Decoded row keyed by column name.
pub type RowData = HashMap<String, Value>;

/// Builds a block from the columns and values of an insert, given in
/// statement order.
pub fn encode<S: AsRef<str>>(
    columns: &[S],
    values: &[Value],
    schema: &TableSchema,
) -> StorageResult<Block> {
    if columns.len() != values.len() {
        return Err(StorageError::ColumnCountMismatch {
            columns: columns.len(),
            values: values.len(),
        });
    }

    let required = schema.value_area_width();
    if required > VALUE_SIZE {
        return Err(StorageError::SchemaTooLarge {
            table: schema.table_name().to_string(),
            required,
        });
    }

    let mut by_name: HashMap<&str, &Value> = HashMap::with_capacity(columns.len());
    for (column, value) in columns.iter().zip(values) {
        let column = column.as_ref();
        if !schema.column_exists(column) {
            return Err(StorageError::UnknownColumn(column.to_string()));
        }
        by_name.insert(column, value);
    }

    let key_column = schema.key_column().ok_or_else(|| StorageError::MissingKey {
        table: schema.table_name().to_string(),
    })?;
    match by_name.get(key_column.name.as_str()) {
        Some(Value::Null) | None => {
            return Err(StorageError::MissingKey {
                table: schema.table_name().to_string(),
            })
        }
        Some(_) => {}
    }

    let mut block = Block::empty();
    let mut offset = 0;
    for column in schema.columns() {
        let value = by_name.get(column.name.as_str()).copied();
        if column.is_key {
            if let Some(value) = value {
                block.key_type = column.data_type as u8;
                write_field(&mut block.key, column.name.as_str(), column.data_type, value)?;
            }
            continue;
        }

        let width = column.data_type.slot_width();
        match value {
            Some(Value::Null) | None => {}
            Some(value) => {
                let slot = &mut block.value[offset..offset + width];
                slot[0] = column.data_type as u8;
                write_field(&mut slot[1..], column.name.as_str(), column.data_type, value)?;
            }
        }
        offset += width;
    }

    Ok(block)
}

/// Reads a block back into named values using the same schema order and
/// offsets as [`encode`].
pub fn decode(block: &Block, schema: &TableSchema) -> StorageResult<RowData> {
    let mut data = RowData::with_capacity(schema.columns().len());
    let mut offset = 0;
    for column in schema.columns() {
        if column.is_key {
            let key_type = DataType::from_u8(block.key_type)?;
            data.insert(column.name.clone(), read_field(&block.key, key_type)?);
            continue;
        }

        let width = column.data_type.slot_width();
        let slot = block.value.get(offset..offset + width).ok_or_else(|| {
            StorageError::SchemaTooLarge {
                table: schema.table_name().to_string(),
                required: schema.value_area_width(),
            }
        })?;
        let value = match slot[0] {
            0 => Value::Null,
            tag => {
                let data_type = DataType::from_u8(tag)?;
                if data_type != column.data_type {
                    return Err(StorageError::TypeMismatch {
                        column: column.name.clone(),
                        expected: column.data_type.to_string(),
                    });
                }
                read_field(&slot[1..], data_type)?
            }
        };
        data.insert(column.name.clone(), value);
        offset += width;
    }
    Ok(data)
}

/// Decodes just the key buffer of a block.
pub fn decode_key(block: &Block) -> StorageResult<Value> {
    read_field(&block.key, DataType::from_u8(block.key_type)?)
}

fn write_field(
    field: &mut [u8],
    column: &str,
    data_type: DataType,
    value: &Value,
) -> StorageResult<()> {
    match (data_type, value) {
        (DataType::Number, Value::Number(n)) => {
            field.fill(0);
            BigEndian::write_u32(&mut field[..4], *n);
        }
        (DataType::Varchar, Value::String(s)) => {
            let max = field.len().min(MAX_STRING_LEN).min(KEY_SIZE);
            if s.len() > max {
                return Err(StorageError::ValueTooLong {
                    column: column.to_string(),
                    len: s.len(),
                    max,
                });
            }
            if s.contains('\0') {
                return Err(StorageError::NulInString {
                    column: column.to_string(),
                });
            }
            write_padded(field, s.as_bytes());
        }
        _ => {
            return Err(StorageError::TypeMismatch {
                column: column.to_string(),
                expected: data_type.to_string(),
            })
        }
    }
    Ok(())
}

fn read_field(field: &[u8], data_type: DataType) -> StorageResult<Value> {
    match data_type {
        DataType::Number => Ok(Value::Number(BigEndian::read_u32(&field[..4]))),
        DataType::Varchar => {
            let text = read_padded(&field[..MAX_STRING_LEN.min(field.len())]);
            String::from_utf8(text.to_vec())
                .map(Value::String)
                .map_err(|e| StorageError::InvalidPage(format!("string value is not UTF-8: {}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Column;

    fn tmp_schema() -> TableSchema {
        TableSchema::with_columns(
            "tmp",
            vec![
                Column::new("a", DataType::Varchar, true),
                Column::new("b", DataType::Number, false),
                Column::new("c", DataType::Varchar, false),
            ],
        )
    }

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    #[test]
    fn test_encode_layout() {
        let block = encode(
            &["a", "b", "c"],
            &[s("a1"), Value::Number(0x0102_0304), s("hello")],
            &tmp_schema(),
        )
        .unwrap();

        assert_eq!(block.key_type, DataType::Varchar as u8);
        assert!(!block.is_deleted);
        assert_eq!(&block.key[..3], b"a1\0");
        // b: tag + big-endian int
        assert_eq!(block.value[0], DataType::Number as u8);
        assert_eq!(&block.value[1..5], &[1, 2, 3, 4]);
        // c: tag + padded string
        assert_eq!(block.value[5], DataType::Varchar as u8);
        assert_eq!(&block.value[6..12], b"hello\0");
        assert!(block.value[27..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_schema_order_not_statement_order() {
        let schema = tmp_schema();
        let forward = encode(
            &["a", "b", "c"],
            &[s("k"), Value::Number(5), s("x")],
            &schema,
        )
        .unwrap();
        let shuffled = encode(
            &["c", "a", "b"],
            &[s("x"), s("k"), Value::Number(5)],
            &schema,
        )
        .unwrap();
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_decode_restores_row() {
        let schema = tmp_schema();
        let block = encode(
            &["a", "b", "c"],
            &[s("a7"), Value::Number(7), s("seven")],
            &schema,
        )
        .unwrap();

        let row = decode(&block, &schema).unwrap();
        assert_eq!(row.len(), 3);
        assert_eq!(row["a"], s("a7"));
        assert_eq!(row["b"], Value::Number(7));
        assert_eq!(row["c"], s("seven"));
    }

    #[test]
    fn test_numeric_key() {
        let schema = TableSchema::with_columns(
            "nums",
            vec![
                Column::new("name", DataType::Varchar, false),
                Column::new("id", DataType::Number, true),
            ],
        );
        let block = encode(&["id", "name"], &[Value::Number(256), s("n")], &schema).unwrap();

        assert_eq!(block.key_type, DataType::Number as u8);
        assert_eq!(&block.key[..4], &[0, 0, 1, 0]);
        assert!(block.key[4..].iter().all(|&b| b == 0));
        assert_eq!(decode_key(&block).unwrap(), Value::Number(256));

        let row = decode(&block, &schema).unwrap();
        assert_eq!(row["id"], Value::Number(256));
        assert_eq!(row["name"], s("n"));
    }

    #[test]
    fn test_absent_column_decodes_as_null() {
        let schema = tmp_schema();
        let block = encode(&["a", "c"], &[s("k"), s("only c")], &schema).unwrap();

        assert!(block.value[..5].iter().all(|&b| b == 0));
        let row = decode(&block, &schema).unwrap();
        assert_eq!(row["b"], Value::Null);
        assert_eq!(row["c"], s("only c"));
    }

    #[test]
    fn test_full_width_string() {
        let schema = tmp_schema();
        let text = "z".repeat(MAX_STRING_LEN);
        let block = encode(&["a", "c"], &[s(&text), s(&text)], &schema).unwrap();
        let row = decode(&block, &schema).unwrap();
        assert_eq!(row["a"], s(&text));
        assert_eq!(row["c"], s(&text));
    }

    #[test]
    fn test_encode_errors() {
        let schema = tmp_schema();

        assert!(matches!(
            encode(&["a", "b"], &[s("k")], &schema),
            Err(StorageError::ColumnCountMismatch { .. })
        ));
        assert!(matches!(
            encode(&["a", "zz"], &[s("k"), Value::Number(1)], &schema),
            Err(StorageError::UnknownColumn(_))
        ));
        assert!(matches!(
            encode(&["b"], &[Value::Number(1)], &schema),
            Err(StorageError::MissingKey { .. })
        ));
        assert!(matches!(
            encode(&["a", "b"], &[s("k"), s("not a number")], &schema),
            Err(StorageError::TypeMismatch { .. })
        ));
        assert!(matches!(
            encode(&["a"], &[s(&"k".repeat(KEY_SIZE + 1))], &schema),
            Err(StorageError::ValueTooLong { .. })
        ));
    }

    #[test]
    fn test_nul_in_string_rejected() {
        let schema = tmp_schema();

        assert!(matches!(
            encode(&["a"], &[s("a\0b")], &schema),
            Err(StorageError::NulInString { .. })
        ));
        assert!(matches!(
            encode(&["a", "c"], &[s("k"), s("x\0y")], &schema),
            Err(StorageError::NulInString { .. })
        ));

        let block = encode(&["a", "c"], &[s("k"), s("xy")], &schema).unwrap();
        assert_eq!(decode(&block, &schema).unwrap()["c"], s("xy"));
    }

    #[test]
    fn test_value_area_overflow() {
        let mut columns = vec![Column::new("id", DataType::Number, true)];
        for i in 0..23 {
            columns.push(Column::new(format!("c{}", i), DataType::Varchar, false));
        }
        let schema = TableSchema::with_columns("wide", columns);
        assert!(schema.value_area_width() > VALUE_SIZE);
        assert!(matches!(
            encode(&["id"], &[Value::Number(1)], &schema),
            Err(StorageError::SchemaTooLarge { .. })
        ));
    }
}
