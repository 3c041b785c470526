use crate::decode::decode_with_options;
use crate::error::DecodeError;
use crate::legacy::{self, ResultCells};
use crate::options::MaterializeOptions;
use crate::schema::ColumnDescriptor;
use crate::value::Value;
use crate::vector::{ChunkHandle, DataChunk, QueryResult};
use crate::{Error, Result};

/// One materialized row, one value per column in column order.
pub type Row = Vec<Value>;

pub fn columns(result: &QueryResult) -> &[ColumnDescriptor] {
    result.columns()
}

pub fn chunk_count(result: &QueryResult) -> usize {
    result.chunk_count()
}

pub fn get_chunk(result: &QueryResult, index: usize) -> Option<ChunkHandle<'_>> {
    result.chunk(index)
}

/// Flat-path rows. See [`legacy::rows`].
pub fn rows(result: &QueryResult) -> Result<Vec<Row>> {
    rows_with_options(result, &MaterializeOptions::default())
}

pub fn rows_with_options(result: &QueryResult, options: &MaterializeOptions) -> Result<Vec<Row>> {
    legacy::rows_with_options(&ResultCells::new(result, options), options)
}

/// Decodes every chunk in order through the vector decoder. This is the path
/// that keeps nested and high-precision values exact.
pub fn rows_chunked(result: &QueryResult) -> Result<Vec<Row>> {
    rows_chunked_with_options(result, &MaterializeOptions::default())
}

pub fn rows_chunked_with_options(
    result: &QueryResult,
    options: &MaterializeOptions,
) -> Result<Vec<Row>> {
    let total = result.row_count();
    let mut out = Vec::new();
    out.try_reserve_exact(total)
        .map_err(|_| Error::Decode(DecodeError::AllocationFailure { requested: total }))?;
    for chunk in result.chunks() {
        append_chunk_rows(&mut out, &chunk, result.columns(), options)?;
    }
    tracing::debug!(
        rows = out.len(),
        chunks = result.chunk_count(),
        columns = result.column_count(),
        "materialized result"
    );
    Ok(out)
}

/// Rows of a single chunk, for callers iterating chunks by hand.
pub fn chunk_rows(
    chunk: &DataChunk,
    columns: &[ColumnDescriptor],
    options: &MaterializeOptions,
) -> Result<Vec<Row>> {
    let mut out = Vec::new();
    out.try_reserve_exact(chunk.row_count())
        .map_err(|_| {
            Error::Decode(DecodeError::AllocationFailure {
                requested: chunk.row_count(),
            })
        })?;
    append_chunk_rows(&mut out, chunk, columns, options)?;
    Ok(out)
}

fn append_chunk_rows(
    out: &mut Vec<Row>,
    chunk: &DataChunk,
    columns: &[ColumnDescriptor],
    options: &MaterializeOptions,
) -> Result<()> {
    if chunk.column_count() != columns.len() {
        return Err(Error::Other(format!(
            "chunk has {} vectors for {} columns",
            chunk.column_count(),
            columns.len()
        )));
    }
    for row in 0..chunk.row_count() {
        let mut values = Vec::with_capacity(columns.len());
        for (column, vector) in columns.iter().zip(chunk.vectors()) {
            let value = match decode_with_options(vector, &column.ty, row, options) {
                Ok(v) => v,
                Err(DecodeError::UnsupportedType(tag)) => {
                    Value::Varchar(format!("<unsupported_{tag}_type>"))
                }
                Err(e) => return Err(e.into()),
            };
            values.push(value);
        }
        out.push(values);
    }
    Ok(())
}
