pub mod canonical;
pub mod codec;
pub mod decode;
pub mod error;
pub mod legacy;
pub mod materialize;
pub mod options;
pub mod schema;
pub mod value;
pub mod vector;

pub use crate::error::{DecodeError, Error, Result};
pub use crate::materialize::{Row, chunk_count, columns, get_chunk, rows, rows_chunked};
pub use crate::options::{MapKeyPolicy, MaterializeOptions};
pub use crate::schema::{ColumnDescriptor, LogicalType, TypeTag};
pub use crate::value::Value;
pub use crate::vector::{DataChunk, QueryResult, Vector};

#[cfg(test)]
mod tests;
