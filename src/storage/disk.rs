//! Raw file access for table files.

pub mod table_file;

pub use table_file::TableFile;
