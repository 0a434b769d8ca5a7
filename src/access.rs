//! Access layer for row-oriented operations.
//!
//! - **Value / DataType**: typed column values
//! - **row_codec**: named values to fixed-width blocks and back
//! - **BTree**: the per-table clustered B-tree
//! - **Row / Projection**: what a scan hands back to the caller

pub mod btree;
pub mod row;
pub mod row_codec;
pub mod value;

pub use btree::BTree;
pub use row::{Projection, Row};
pub use row_codec::{decode, encode, RowData};
pub use value::{DataType, Value};
