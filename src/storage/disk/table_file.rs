use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{PageId, PAGE_SIZE, TABLE_HEADER_SIZE};
use byteorder::{BigEndian, ByteOrder};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A table file opened for the duration of one buffer manager call.
///
/// Layout: a 4-byte big-endian root page id followed by consecutive
/// `PAGE_SIZE` pages, page `k` at `4 + k * PAGE_SIZE`.
pub struct TableFile {
    file: File,
}

impl TableFile {
    pub fn create(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self { file })
    }

    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { file })
    }

    pub fn open_read(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        Ok(Self { file })
    }

    pub fn len(&self) -> StorageResult<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Number of whole pages after the header.
    pub fn num_pages(&self) -> StorageResult<u32> {
        let len = self.len()?;
        Ok((len.saturating_sub(TABLE_HEADER_SIZE as u64) / PAGE_SIZE as u64) as u32)
    }

    /// Reads the root page id, or `None` if the header is incomplete.
    pub fn read_root_id(&mut self) -> StorageResult<Option<PageId>> {
        let mut buf = [0u8; TABLE_HEADER_SIZE];
        self.file.seek(SeekFrom::Start(0))?;
        match self.file.read_exact(&mut buf) {
            Ok(()) => Ok(Some(PageId(BigEndian::read_u32(&buf)))),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn write_root_id(&mut self, root_id: PageId) -> StorageResult<()> {
        let mut buf = [0u8; TABLE_HEADER_SIZE];
        BigEndian::write_u32(&mut buf, root_id.0);
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&buf)?;
        Ok(())
    }

    /// Reads one page, or `None` if the file does not hold all of it.
    pub fn read_page(&mut self, page_id: PageId) -> StorageResult<Option<Box<[u8; PAGE_SIZE]>>> {
        let offset = page_id.file_offset();
        if offset + PAGE_SIZE as u64 > self.len()? {
            return Ok(None);
        }

        let mut buf = Box::new([0u8; PAGE_SIZE]);
        self.file.seek(SeekFrom::Start(offset))?;
        match self.file.read_exact(&mut buf[..]) {
            Ok(()) => Ok(Some(buf)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes one page in place. Writing the page right after the last one
    /// appends it; writing further out would leave a hole and is rejected.
    pub fn write_page(&mut self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> StorageResult<()> {
        let offset = page_id.file_offset();
        let len = self.len()?;
        if offset > len {
            return Err(StorageError::InvalidPage(format!(
                "page {} lies beyond the end of the file ({} bytes)",
                page_id.0, len
            )));
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        Ok(())
    }

    pub fn flush(&mut self) -> StorageResult<()> {
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_and_open() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.db");

        {
            let tf = TableFile::create(&path)?;
            assert_eq!(tf.len()?, 0);
            assert_eq!(tf.num_pages()?, 0);
        }

        let mut tf = TableFile::open(&path)?;
        assert_eq!(tf.read_root_id()?, None);
        Ok(())
    }

    #[test]
    fn test_root_id_is_big_endian() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.db");
        let mut tf = TableFile::create(&path)?;

        tf.write_root_id(PageId(0x0102_0304))?;
        assert_eq!(tf.read_root_id()?, Some(PageId(0x0102_0304)));
        drop(tf);

        assert_eq!(std::fs::read(&path)?, vec![1, 2, 3, 4]);
        Ok(())
    }

    #[test]
    fn test_write_and_read_pages() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.db");
        let mut tf = TableFile::create(&path)?;
        tf.write_root_id(PageId(0))?;

        for i in 0..3u8 {
            let buf = [i + 1; PAGE_SIZE];
            tf.write_page(PageId(i as u32), &buf)?;
        }
        assert_eq!(tf.num_pages()?, 3);
        assert_eq!(tf.len()?, (TABLE_HEADER_SIZE + 3 * PAGE_SIZE) as u64);

        for i in 0..3u8 {
            let page = tf.read_page(PageId(i as u32))?.unwrap();
            assert!(page.iter().all(|&b| b == i + 1));
        }
        Ok(())
    }

    #[test]
    fn test_overwrite_page() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.db");
        let mut tf = TableFile::create(&path)?;
        tf.write_root_id(PageId(0))?;

        tf.write_page(PageId(0), &[1u8; PAGE_SIZE])?;
        tf.write_page(PageId(0), &[2u8; PAGE_SIZE])?;

        assert_eq!(tf.num_pages()?, 1);
        assert_eq!(tf.read_page(PageId(0))?.unwrap()[0], 2);
        Ok(())
    }

    #[test]
    fn test_read_missing_page() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.db");
        let mut tf = TableFile::create(&path)?;
        tf.write_root_id(PageId(0))?;
        tf.write_page(PageId(0), &[0u8; PAGE_SIZE])?;

        assert!(tf.read_page(PageId(1))?.is_none());
        assert!(tf.read_page(PageId(40))?.is_none());
        Ok(())
    }

    #[test]
    fn test_write_past_end_is_rejected() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.db");
        let mut tf = TableFile::create(&path)?;
        tf.write_root_id(PageId(0))?;

        assert!(tf.write_page(PageId(2), &[0u8; PAGE_SIZE]).is_err());
        Ok(())
    }

    #[test]
    fn test_open_nonexistent_file() {
        let dir = tempdir().unwrap();
        assert!(TableFile::open(&dir.path().join("missing.db")).is_err());
    }
}
