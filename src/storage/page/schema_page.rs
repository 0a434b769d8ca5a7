//! Schema record layout.
//!
//! ```text
//! +--------------+-----------+------------+------------------------------------------+---------+
//! | name_len u32 | cols u32  | table name | per column: u8 type, u8 is_key, name[21] | padding |
//! +--------------+-----------+------------+------------------------------------------+---------+
//! ```

use crate::access::DataType;
use crate::catalog::{Column, TableSchema};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{read_padded, write_padded, MAX_COLUMN_LEN, PAGE_SIZE};
use byteorder::{BigEndian, ByteOrder};

const NAME_LEN_OFFSET: usize = 0;
const COLUMN_COUNT_OFFSET: usize = 4;
const DATA_OFFSET: usize = 8;
const COLUMN_ENTRY_SIZE: usize = 1 + 1 + MAX_COLUMN_LEN;

/// One table definition, serialized into exactly one page.
pub struct SchemaPage {
    data: Box<[u8; PAGE_SIZE]>,
}

impl SchemaPage {
    /// Bytes needed to store the given schema.
    pub fn required_size(schema: &TableSchema) -> usize {
        DATA_OFFSET + schema.table_name().len() + schema.columns().len() * COLUMN_ENTRY_SIZE
    }

    pub fn from_schema(schema: &TableSchema) -> StorageResult<Self> {
        let required = Self::required_size(schema);
        if required > PAGE_SIZE {
            return Err(StorageError::SchemaTooLarge {
                table: schema.table_name().to_string(),
                required,
            });
        }

        let mut data = Box::new([0u8; PAGE_SIZE]);
        let name = schema.table_name().as_bytes();
        BigEndian::write_u32(
            &mut data[NAME_LEN_OFFSET..COLUMN_COUNT_OFFSET],
            name.len() as u32,
        );
        BigEndian::write_u32(
            &mut data[COLUMN_COUNT_OFFSET..DATA_OFFSET],
            schema.columns().len() as u32,
        );

        let mut offset = DATA_OFFSET;
        data[offset..offset + name.len()].copy_from_slice(name);
        offset += name.len();

        for column in schema.columns() {
            let column_name = column.name.as_bytes();
            if column_name.len() > MAX_COLUMN_LEN {
                return Err(StorageError::ValueTooLong {
                    column: column.name.clone(),
                    len: column_name.len(),
                    max: MAX_COLUMN_LEN,
                });
            }
            data[offset] = column.data_type as u8;
            data[offset + 1] = column.is_key as u8;
            write_padded(
                &mut data[offset + 2..offset + COLUMN_ENTRY_SIZE],
                column_name,
            );
            offset += COLUMN_ENTRY_SIZE;
        }

        Ok(Self { data })
    }

    pub fn from_bytes(buf: &[u8]) -> StorageResult<Self> {
        if buf.len() != PAGE_SIZE {
            return Err(StorageError::InvalidPage(format!(
                "schema record must be {} bytes, got {}",
                PAGE_SIZE,
                buf.len()
            )));
        }
        let mut data = Box::new([0u8; PAGE_SIZE]);
        data.copy_from_slice(buf);
        Ok(Self { data })
    }

    pub fn as_bytes(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    fn name_len(&self) -> usize {
        BigEndian::read_u32(&self.data[NAME_LEN_OFFSET..COLUMN_COUNT_OFFSET]) as usize
    }

    fn column_count(&self) -> usize {
        BigEndian::read_u32(&self.data[COLUMN_COUNT_OFFSET..DATA_OFFSET]) as usize
    }

    pub fn table_name(&self) -> StorageResult<String> {
        let len = self.name_len();
        if DATA_OFFSET + len > PAGE_SIZE {
            return Err(StorageError::InvalidPage(format!(
                "table name length {} overruns schema record",
                len
            )));
        }
        String::from_utf8(self.data[DATA_OFFSET..DATA_OFFSET + len].to_vec())
            .map_err(|e| StorageError::InvalidPage(format!("table name is not UTF-8: {}", e)))
    }

    pub fn to_schema(&self) -> StorageResult<TableSchema> {
        let table_name = self.table_name()?;
        let column_count = self.column_count();
        let mut offset = DATA_OFFSET + table_name.len();
        if offset + column_count * COLUMN_ENTRY_SIZE > PAGE_SIZE {
            return Err(StorageError::InvalidPage(format!(
                "{} columns overrun schema record of table '{}'",
                column_count, table_name
            )));
        }

        let mut schema = TableSchema::new(table_name);
        for _ in 0..column_count {
            let data_type = DataType::from_u8(self.data[offset])?;
            let is_key = self.data[offset + 1] != 0;
            let name = read_padded(&self.data[offset + 2..offset + COLUMN_ENTRY_SIZE]);
            let name = String::from_utf8(name.to_vec()).map_err(|e| {
                StorageError::InvalidPage(format!("column name is not UTF-8: {}", e))
            })?;
            schema.add_column(Column::new(name, data_type, is_key));
            offset += COLUMN_ENTRY_SIZE;
        }
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TableSchema {
        TableSchema::with_columns(
            "tmp",
            vec![
                Column::new("a", DataType::Varchar, true),
                Column::new("b", DataType::Number, false),
                Column::new("c", DataType::Varchar, false),
            ],
        )
    }

    #[test]
    fn test_schema_page_layout() {
        let page = SchemaPage::from_schema(&sample()).unwrap();
        let bytes = page.as_bytes();

        assert_eq!(&bytes[0..4], &[0, 0, 0, 3]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 3]);
        assert_eq!(&bytes[8..11], b"tmp");
        // first column entry
        assert_eq!(bytes[11], DataType::Varchar as u8);
        assert_eq!(bytes[12], 1);
        assert_eq!(bytes[13], b'a');
        assert!(bytes[14..11 + COLUMN_ENTRY_SIZE].iter().all(|&b| b == 0));
        // second column entry
        assert_eq!(bytes[11 + COLUMN_ENTRY_SIZE], DataType::Number as u8);
        assert_eq!(bytes[12 + COLUMN_ENTRY_SIZE], 0);
        assert!(bytes[11 + 3 * COLUMN_ENTRY_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_schema_page_decode() {
        let schema = sample();
        let page = SchemaPage::from_schema(&schema).unwrap();
        let reread = SchemaPage::from_bytes(&page.as_bytes()[..]).unwrap();

        assert_eq!(reread.table_name().unwrap(), "tmp");
        assert_eq!(reread.to_schema().unwrap(), schema);
    }

    #[test]
    fn test_column_name_of_full_width() {
        let name = "x".repeat(MAX_COLUMN_LEN);
        let schema =
            TableSchema::with_columns("t", vec![Column::new(name.clone(), DataType::Number, true)]);
        let page = SchemaPage::from_schema(&schema).unwrap();
        assert_eq!(page.to_schema().unwrap().columns()[0].name, name);
    }

    #[test]
    fn test_rejects_oversized_schema() {
        let long_column = "x".repeat(MAX_COLUMN_LEN + 1);
        let schema =
            TableSchema::with_columns("t", vec![Column::new(long_column, DataType::Number, true)]);
        assert!(matches!(
            SchemaPage::from_schema(&schema),
            Err(StorageError::ValueTooLong { .. })
        ));

        let columns = (0..200)
            .map(|i| Column::new(format!("c{}", i), DataType::Number, i == 0))
            .collect();
        let schema = TableSchema::with_columns("wide", columns);
        assert!(matches!(
            SchemaPage::from_schema(&schema),
            Err(StorageError::SchemaTooLarge { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_type_tag() {
        let mut raw = *SchemaPage::from_schema(&sample()).unwrap().as_bytes();
        raw[11] = 9;
        let page = SchemaPage::from_bytes(&raw).unwrap();
        assert!(matches!(
            page.to_schema(),
            Err(StorageError::UnknownDataType(9))
        ));
    }
}
