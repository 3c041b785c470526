//! Flat `(row, column)` extraction through the engine's single-cell API.
//!
//! Scalars are read as engine text and parsed per type. Nested values come
//! back as engine text as well, or as an angle-bracket placeholder when the
//! text is unavailable; [`crate::materialize::rows_chunked`] is the path that
//! reconstructs them exactly.
//!
//! Reading a uuid cell through the single-cell API corrupts the remaining
//! columns of the row in multi-column results. A result with more than one
//! column and any uuid column is therefore returned with every cell null.
//!
//! Structural decode errors propagate as they do on the chunked path;
//! only unsupported types degrade to placeholders.

use crate::canonical::canonicalize;
use crate::decode::decode_with_options;
use crate::error::{DecodeError, DecodeResult};
use crate::materialize::Row;
use crate::options::MaterializeOptions;
use crate::schema::{ColumnDescriptor, LogicalType, TypeTag};
use crate::value::Value;
use crate::vector::QueryResult;
use crate::Result;

// Placeholder vocabulary: text of the form `<...>` means the value is not
// available through the flat path.
pub const UUID_LIMITATION: &str = "<regular_api_uuid_limitation>";
pub const UNSUPPORTED_LIST: &str = "<unsupported_list_type>";
pub const UNSUPPORTED_STRUCT: &str = "<unsupported_struct_type>";
pub const UNSUPPORTED_MAP: &str = "<unsupported_map_type>";
pub const UNSUPPORTED_ARRAY: &str = "<unsupported_array_type>";
pub const ENUM_LIMITATION: &str = "<regular_api_enum_limitation>";
pub const TIMESTAMP_EXTRACTION_FAILED: &str = "<timestamp_extraction_failed>";

/// Single-cell access to a result, the way the engine's row API exposes it.
pub trait CellSource {
    fn column_count(&self) -> usize;
    fn row_count(&self) -> usize;
    fn column(&self, column: usize) -> Option<&ColumnDescriptor>;
    fn is_null(&self, column: usize, row: usize) -> bool;
    /// Engine text of the cell, `Ok(None)` when the engine cannot render it.
    /// `Err` is reserved for buffers the source cannot read at all.
    fn varchar(&self, column: usize, row: usize) -> DecodeResult<Option<String>>;
    fn blob(&self, column: usize, row: usize) -> DecodeResult<Option<Vec<u8>>>;

    fn column_type(&self, column: usize) -> Option<&LogicalType> {
        self.column(column).map(|c| &c.ty)
    }
}

/// A [`QueryResult`] seen through the single-cell API. Cells are rendered
/// with the caller's options, so map key policy applies before the text is
/// produced.
#[derive(Debug, Clone, Copy)]
pub struct ResultCells<'a> {
    result: &'a QueryResult,
    options: &'a MaterializeOptions,
}

impl<'a> ResultCells<'a> {
    pub fn new(result: &'a QueryResult, options: &'a MaterializeOptions) -> Self {
        Self { result, options }
    }

    fn cell(&self, column: usize, row: usize) -> DecodeResult<Option<Value>> {
        let Some((chunk, r)) = self.result.locate_row(row) else {
            return Ok(None);
        };
        let Some(vector) = chunk.vector(column) else {
            return Ok(None);
        };
        match decode_with_options(vector, vector.logical_type(), r, self.options) {
            Ok(v) => Ok(Some(v)),
            Err(DecodeError::UnsupportedType(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl CellSource for ResultCells<'_> {
    fn column_count(&self) -> usize {
        self.result.column_count()
    }

    fn row_count(&self) -> usize {
        self.result.row_count()
    }

    fn column(&self, column: usize) -> Option<&ColumnDescriptor> {
        self.result.columns().get(column)
    }

    fn is_null(&self, column: usize, row: usize) -> bool {
        self.result
            .locate_row(row)
            .and_then(|(chunk, r)| chunk.vector(column).map(|v| !v.is_valid(r)))
            .unwrap_or(true)
    }

    fn varchar(&self, column: usize, row: usize) -> DecodeResult<Option<String>> {
        Ok(match self.cell(column, row)? {
            None | Some(Value::Null) => None,
            Some(v) => Some(v.to_string()),
        })
    }

    fn blob(&self, column: usize, row: usize) -> DecodeResult<Option<Vec<u8>>> {
        Ok(match self.cell(column, row)? {
            Some(Value::Bytes(b)) => Some(b),
            None | Some(Value::Null) => None,
            Some(v) => Some(v.to_string().into_bytes()),
        })
    }
}

/// Cell as the flat path extracts it, before canonicalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl RawCell {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, RawCell::Text(s) if crate::value::is_placeholder(s))
    }
}

/// True when the flat path must null the whole result.
pub fn uuid_guard_applies<S: CellSource + ?Sized>(source: &S, options: &MaterializeOptions) -> bool {
    options.uuid_multi_column_guard()
        && source.column_count() > 1
        && (0..source.column_count())
            .any(|c| source.column(c).is_some_and(|d| d.tag() == TypeTag::Uuid))
}

pub fn raw_rows<S: CellSource + ?Sized>(source: &S) -> Result<Vec<Vec<RawCell>>> {
    raw_rows_with_options(source, &MaterializeOptions::default())
}

/// Raw cells of every row. Structural decode errors abort the call, the same
/// way they do on the chunked path.
pub fn raw_rows_with_options<S: CellSource + ?Sized>(
    source: &S,
    options: &MaterializeOptions,
) -> Result<Vec<Vec<RawCell>>> {
    let row_count = source.row_count();
    let column_count = source.column_count();
    if uuid_guard_applies(source, options) {
        tracing::debug!(
            columns = column_count,
            rows = row_count,
            error = %DecodeError::KnownEngineDefect,
            "nulling every cell on the flat path"
        );
        return Ok(vec![vec![RawCell::Null; column_count]; row_count]);
    }
    let mut out = Vec::new();
    out.try_reserve_exact(row_count)
        .map_err(|_| DecodeError::AllocationFailure { requested: row_count })?;
    for row in 0..row_count {
        let cells = (0..column_count)
            .map(|column| raw_cell(source, column, row))
            .collect::<DecodeResult<Vec<_>>>()?;
        out.push(cells);
    }
    Ok(out)
}

/// Flat-path rows, canonicalized into typed values.
pub fn rows<S: CellSource + ?Sized>(source: &S) -> Result<Vec<Row>> {
    rows_with_options(source, &MaterializeOptions::default())
}

pub fn rows_with_options<S: CellSource + ?Sized>(
    source: &S,
    options: &MaterializeOptions,
) -> Result<Vec<Row>> {
    let raw = raw_rows_with_options(source, options)?;
    let columns: Vec<Option<&ColumnDescriptor>> =
        (0..source.column_count()).map(|c| source.column(c)).collect();
    Ok(raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&columns)
                .map(|(cell, column)| match column {
                    Some(column) => canonicalize(cell, column, options),
                    None => Value::Null,
                })
                .collect()
        })
        .collect())
}

/// Extracts one cell the way the engine's row API allows for its type.
pub fn raw_cell<S: CellSource + ?Sized>(
    source: &S,
    column: usize,
    row: usize,
) -> DecodeResult<RawCell> {
    if source.is_null(column, row) {
        return Ok(RawCell::Null);
    }
    let Some(ty) = source.column_type(column) else {
        return Ok(RawCell::Null);
    };
    let text = || source.varchar(column, row);

    Ok(match ty.tag() {
        TypeTag::Boolean => match text()? {
            Some(s) => RawCell::Bool(s == "true" || s == "1"),
            None => RawCell::Null,
        },
        TypeTag::TinyInt | TypeTag::SmallInt | TypeTag::Integer | TypeTag::BigInt => {
            match text()? {
                Some(s) => s.trim().parse().map(RawCell::Int).unwrap_or(RawCell::Text(s)),
                None => RawCell::Null,
            }
        }
        TypeTag::UTinyInt | TypeTag::USmallInt | TypeTag::UInteger | TypeTag::UBigInt => {
            match text()? {
                Some(s) => s.trim().parse().map(RawCell::UInt).unwrap_or(RawCell::Text(s)),
                None => RawCell::Null,
            }
        }
        TypeTag::HugeInt => match text()? {
            Some(s) => match s.trim().parse::<i64>() {
                Ok(v) if v != i64::MAX && v != i64::MIN => RawCell::Int(v),
                _ => RawCell::Text(s),
            },
            None => RawCell::Null,
        },
        TypeTag::Float | TypeTag::Double => match text()? {
            Some(s) => parse_float_text(&s).map(RawCell::Float).unwrap_or(RawCell::Text(s)),
            None => RawCell::Null,
        },
        TypeTag::Varchar => text()?.map(RawCell::Text).unwrap_or(RawCell::Null),
        TypeTag::Blob => RawCell::Bytes(source.blob(column, row)?.unwrap_or_default()),
        TypeTag::Timestamp
        | TypeTag::TimestampS
        | TypeTag::TimestampMs
        | TypeTag::TimestampNs
        | TypeTag::TimestampTz => {
            non_empty(text()?).unwrap_or_else(|| RawCell::Text(TIMESTAMP_EXTRACTION_FAILED.into()))
        }
        TypeTag::Enum => {
            non_empty(text()?).unwrap_or_else(|| RawCell::Text(ENUM_LIMITATION.into()))
        }
        TypeTag::List => non_empty(text()?).unwrap_or_else(|| RawCell::Text(UNSUPPORTED_LIST.into())),
        TypeTag::Struct => {
            non_empty(text()?).unwrap_or_else(|| RawCell::Text(UNSUPPORTED_STRUCT.into()))
        }
        TypeTag::Map => non_empty(text()?).unwrap_or_else(|| RawCell::Text(UNSUPPORTED_MAP.into())),
        TypeTag::Array => {
            non_empty(text()?).unwrap_or_else(|| RawCell::Text(UNSUPPORTED_ARRAY.into()))
        }
        TypeTag::Uuid => {
            non_empty(text()?).unwrap_or_else(|| RawCell::Text(UUID_LIMITATION.into()))
        }
        TypeTag::Decimal
        | TypeTag::Date
        | TypeTag::Time
        | TypeTag::TimeTz
        | TypeTag::Interval
        | TypeTag::UHugeInt
        | TypeTag::Bit
        | TypeTag::Union
        | TypeTag::Unknown => non_empty(text()?).unwrap_or(RawCell::Null),
    })
}

/// Text that is present, non-empty and not the literal `NULL`.
fn non_empty(text: Option<String>) -> Option<RawCell> {
    text.filter(|s| !s.is_empty() && s != "NULL").map(RawCell::Text)
}

/// Float text including the engine's `nan`, `inf` and `-inf` spellings.
pub fn parse_float_text(text: &str) -> Option<f64> {
    let t = text.trim();
    match t.to_ascii_lowercase().as_str() {
        "nan" | "-nan" => Some(f64::NAN),
        "inf" | "+inf" | "infinity" | "+infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        _ => t.parse().ok(),
    }
}
