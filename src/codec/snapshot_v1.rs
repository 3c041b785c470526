//! `CMATSNAP` v1: a self-describing little-endian snapshot of a
//! [`QueryResult`], for handing a result to another worker or process.
//!
//! ```text
//! header  := magic[8] version:u16 flags:u16 col_count:u16 chunk_count:u32
//! column  := name:u16-len-bytes type
//! type    := engine_id:u16 meta
//! chunk   := row_count:u32 vector*col_count
//! vector  := len:u32 validity:u32-len-bytes kind:u8 payload child_count:u16 vector*
//! ```
//!
//! Type metadata: decimal `width:u8 scale:u8`; enum `count:u32` then
//! u32-len-bytes values; list `type`; array `size:u32 type`; map `type type`;
//! struct/union `count:u16` then `name type` pairs. Child types of vectors
//! are implied by the parent type.

use crate::schema::{ColumnDescriptor, LogicalType, StructField, TypeTag};
use crate::value::{Hugeint, Interval, Uhugeint};
use crate::vector::{DataChunk, ListEntry, QueryResult, ValidityBitmap, Vector, VectorData};
use crate::{Error, Result};

const MAGIC: &[u8; 8] = b"CMATSNAP";
const VERSION: u16 = 1;

/// Deepest type nesting a snapshot may declare.
const MAX_TYPE_DEPTH: usize = 64;

const KIND_NONE: u8 = 0;
const KIND_BOOL: u8 = 1;
const KIND_I8: u8 = 2;
const KIND_I16: u8 = 3;
const KIND_I32: u8 = 4;
const KIND_I64: u8 = 5;
const KIND_U8: u8 = 6;
const KIND_U16: u8 = 7;
const KIND_U32: u8 = 8;
const KIND_U64: u8 = 9;
const KIND_F32: u8 = 10;
const KIND_F64: u8 = 11;
const KIND_HUGEINT: u8 = 12;
const KIND_UHUGEINT: u8 = 13;
const KIND_INTERVAL: u8 = 14;
const KIND_VARLEN: u8 = 15;
const KIND_LIST_ENTRIES: u8 = 16;

fn write_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

fn write_u16_le(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_u16_len_bytes(out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    let len: u16 = bytes
        .len()
        .try_into()
        .map_err(|_| Error::Other("name too long".to_string()))?;
    write_u16_le(out, len);
    out.extend_from_slice(bytes);
    Ok(())
}

fn write_u32_len_bytes(out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    let len: u32 = bytes
        .len()
        .try_into()
        .map_err(|_| Error::Other("payload too large".to_string()))?;
    write_u32_le(out, len);
    out.extend_from_slice(bytes);
    Ok(())
}

fn to_u32(n: usize, what: &str) -> Result<u32> {
    n.try_into()
        .map_err(|_| Error::Other(format!("{what} too large")))
}

fn to_u16(n: usize, what: &str) -> Result<u16> {
    n.try_into()
        .map_err(|_| Error::Other(format!("{what} too large")))
}

#[inline]
fn checked_byte_len(count: usize, elem_size: usize, err: &'static str) -> Result<usize> {
    count
        .checked_mul(elem_size)
        .ok_or_else(|| Error::Other(err.to_string()))
}

pub fn encode_snapshot_v1(result: &QueryResult) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_snapshot_v1_into(result, &mut out)?;
    Ok(out)
}

pub fn encode_snapshot_v1_into(result: &QueryResult, out: &mut Vec<u8>) -> Result<()> {
    out.clear();
    out.extend_from_slice(MAGIC);
    write_u16_le(out, VERSION);
    write_u16_le(out, 0); // flags

    let col_count = to_u16(result.column_count(), "col_count")?;
    if col_count == 0 {
        return Err(Error::Other(
            "CMATSNAP must have at least one column".to_string(),
        ));
    }
    write_u16_le(out, col_count);
    write_u32_le(out, to_u32(result.chunk_count(), "chunk_count")?);

    for column in result.columns() {
        write_u16_len_bytes(out, column.name.as_bytes())?;
        write_type(out, &column.ty)?;
    }

    for chunk in result.chunks() {
        write_u32_le(out, to_u32(chunk.row_count(), "row_count")?);
        for vector in chunk.vectors() {
            write_vector(out, vector)?;
        }
    }
    Ok(())
}

fn write_fields(out: &mut Vec<u8>, fields: &[StructField]) -> Result<()> {
    write_u16_le(out, to_u16(fields.len(), "field count")?);
    for field in fields {
        write_u16_len_bytes(out, field.name.as_bytes())?;
        write_type(out, &field.ty)?;
    }
    Ok(())
}

fn write_type(out: &mut Vec<u8>, ty: &LogicalType) -> Result<()> {
    let id = ty.tag().engine_id().unwrap_or(0);
    write_u16_le(out, to_u16(id as usize, "type id")?);
    match ty {
        LogicalType::Decimal { width, scale } => {
            write_u8(out, *width);
            write_u8(out, *scale);
        }
        LogicalType::Enum(dict) => {
            write_u32_le(out, to_u32(dict.len(), "enum dictionary")?);
            for value in dict.values() {
                write_u32_len_bytes(out, value.as_bytes())?;
            }
        }
        LogicalType::List(child) => write_type(out, child)?,
        LogicalType::Array { child, size } => {
            write_u32_le(out, to_u32(*size, "array size")?);
            write_type(out, child)?;
        }
        LogicalType::Map { key, value } => {
            write_type(out, key)?;
            write_type(out, value)?;
        }
        LogicalType::Struct(fields) | LogicalType::Union(fields) => write_fields(out, fields)?,
        _ => {}
    }
    Ok(())
}

fn write_vector(out: &mut Vec<u8>, vector: &Vector) -> Result<()> {
    write_u32_le(out, to_u32(vector.len(), "vector length")?);
    write_u32_len_bytes(out, vector.validity().as_bytes())?;

    macro_rules! fixed {
        ($kind:expr, $values:expr) => {{
            write_u8(out, $kind);
            for v in $values {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }};
    }

    match vector.data() {
        VectorData::None => write_u8(out, KIND_NONE),
        VectorData::Bool(v) => fixed!(KIND_BOOL, v),
        VectorData::I8(v) => fixed!(KIND_I8, v),
        VectorData::I16(v) => fixed!(KIND_I16, v),
        VectorData::I32(v) => fixed!(KIND_I32, v),
        VectorData::I64(v) => fixed!(KIND_I64, v),
        VectorData::U8(v) => fixed!(KIND_U8, v),
        VectorData::U16(v) => fixed!(KIND_U16, v),
        VectorData::U32(v) => fixed!(KIND_U32, v),
        VectorData::U64(v) => fixed!(KIND_U64, v),
        VectorData::F32(v) => fixed!(KIND_F32, v),
        VectorData::F64(v) => fixed!(KIND_F64, v),
        VectorData::Hugeint(v) => {
            write_u8(out, KIND_HUGEINT);
            for h in v {
                out.extend_from_slice(&h.lower.to_le_bytes());
                out.extend_from_slice(&h.upper.to_le_bytes());
            }
        }
        VectorData::Uhugeint(v) => {
            write_u8(out, KIND_UHUGEINT);
            for h in v {
                out.extend_from_slice(&h.lower.to_le_bytes());
                out.extend_from_slice(&h.upper.to_le_bytes());
            }
        }
        VectorData::Interval(v) => {
            write_u8(out, KIND_INTERVAL);
            for i in v {
                out.extend_from_slice(&i.months.to_le_bytes());
                out.extend_from_slice(&i.days.to_le_bytes());
                out.extend_from_slice(&i.micros.to_le_bytes());
            }
        }
        VectorData::Varlen { offsets, data } => {
            write_u8(out, KIND_VARLEN);
            for o in offsets {
                out.extend_from_slice(&o.to_le_bytes());
            }
            write_u32_len_bytes(out, data)?;
        }
        VectorData::ListEntries(v) => {
            write_u8(out, KIND_LIST_ENTRIES);
            for e in v {
                out.extend_from_slice(&e.offset.to_le_bytes());
                out.extend_from_slice(&e.length.to_le_bytes());
            }
        }
    }

    write_u16_le(out, to_u16(vector.children().len(), "child count")?);
    for child in vector.children() {
        write_vector(out, child)?;
    }
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or_else(|| Error::Other("decode overflow".to_string()))?;
        if end > self.bytes.len() {
            return Err(Error::Other("truncated snapshot".to_string()));
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let b = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(b);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn read_string(&mut self, len: usize) -> Result<String> {
        let b = self.take(len)?;
        std::str::from_utf8(b)
            .map(str::to_string)
            .map_err(|_| Error::Other("invalid UTF-8 in snapshot".to_string()))
    }

    /// `count` elements of `N` bytes each, converted with `f`.
    fn fixed<const N: usize, T>(&mut self, count: usize, f: fn([u8; N]) -> T) -> Result<Vec<T>> {
        let len = checked_byte_len(count, N, "values length overflow")?;
        let b = self.take(len)?;
        Ok(b.chunks_exact(N)
            .map(|c| {
                let mut a = [0u8; N];
                a.copy_from_slice(c);
                f(a)
            })
            .collect())
    }
}

/// `N` bytes of a 16-byte slot starting at `at`.
fn word<const N: usize>(slot: &[u8; 16], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&slot[at..at + N]);
    out
}

pub fn decode_snapshot_v1(bytes: &[u8]) -> Result<QueryResult> {
    let mut r = Reader { bytes, pos: 0 };

    let magic = r.take(8)?;
    if magic != MAGIC {
        return Err(Error::Other("invalid CMATSNAP magic".to_string()));
    }
    let version = r.read_u16_le()?;
    if version != VERSION {
        return Err(Error::Other(format!(
            "unsupported CMATSNAP version: {version}"
        )));
    }
    let _flags = r.read_u16_le()?;
    let col_count = r.read_u16_le()? as usize;
    if col_count == 0 {
        return Err(Error::Other(
            "CMATSNAP must have at least one column".to_string(),
        ));
    }
    let chunk_count = r.read_u32_le()? as usize;

    let mut columns = Vec::with_capacity(col_count);
    for _ in 0..col_count {
        let name_len = r.read_u16_le()? as usize;
        let name = r.read_string(name_len)?;
        let ty = read_type(&mut r, 0)?;
        columns.push(ColumnDescriptor::new(name, ty));
    }

    let mut chunks = Vec::new();
    for _ in 0..chunk_count {
        let row_count = r.read_u32_le()? as usize;
        let mut vectors = Vec::with_capacity(col_count);
        for column in &columns {
            let vector = read_vector(&mut r, &column.ty, 0)?;
            if vector.len() != row_count {
                return Err(Error::Other("chunk row count mismatch".to_string()));
            }
            vectors.push(vector);
        }
        chunks.push(DataChunk::new(vectors)?);
    }

    if r.pos != bytes.len() {
        return Err(Error::Other("trailing bytes after snapshot".to_string()));
    }
    QueryResult::new(columns, chunks)
}

fn read_fields(r: &mut Reader<'_>, depth: usize) -> Result<Vec<StructField>> {
    let count = r.read_u16_le()? as usize;
    let mut fields = Vec::new();
    for _ in 0..count {
        let name_len = r.read_u16_le()? as usize;
        let name = r.read_string(name_len)?;
        let ty = read_type(r, depth + 1)?;
        fields.push(StructField::new(name, ty));
    }
    Ok(fields)
}

fn read_type(r: &mut Reader<'_>, depth: usize) -> Result<LogicalType> {
    if depth > MAX_TYPE_DEPTH {
        return Err(Error::Other("type nesting too deep".to_string()));
    }
    let id = r.read_u16_le()?;
    let tag = TypeTag::from_engine_id(id as u32);
    Ok(match tag {
        TypeTag::Decimal => {
            let width = r.read_u8()?;
            let scale = r.read_u8()?;
            LogicalType::decimal(width, scale)?
        }
        TypeTag::Enum => {
            let count = r.read_u32_le()? as usize;
            let mut values = Vec::new();
            for _ in 0..count {
                let len = r.read_u32_le()? as usize;
                values.push(r.read_string(len)?);
            }
            LogicalType::enumeration(values)?
        }
        TypeTag::List => LogicalType::list(read_type(r, depth + 1)?),
        TypeTag::Array => {
            let size = r.read_u32_le()? as usize;
            if size == 0 {
                return Err(Error::Other("array size must be positive".to_string()));
            }
            LogicalType::array(read_type(r, depth + 1)?, size)
        }
        TypeTag::Map => {
            let key = read_type(r, depth + 1)?;
            let value = read_type(r, depth + 1)?;
            LogicalType::map(key, value)
        }
        TypeTag::Struct => LogicalType::Struct(read_fields(r, depth)?),
        TypeTag::Union => LogicalType::Union(read_fields(r, depth)?),
        other => LogicalType::from(other),
    })
}

/// Types of the child vectors a vector of `ty` owns, in order.
fn child_types(ty: &LogicalType) -> Vec<LogicalType> {
    match ty {
        LogicalType::List(child) | LogicalType::Array { child, .. } => vec![(**child).clone()],
        LogicalType::Map { key, value } => vec![LogicalType::map_entry(key, value)],
        LogicalType::Struct(fields) => fields.iter().map(|f| f.ty.clone()).collect(),
        LogicalType::Union(members) => std::iter::once(LogicalType::UTinyInt)
            .chain(members.iter().map(|m| m.ty.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

fn read_vector(r: &mut Reader<'_>, ty: &LogicalType, depth: usize) -> Result<Vector> {
    if depth > MAX_TYPE_DEPTH {
        return Err(Error::Other("vector nesting too deep".to_string()));
    }
    let len = r.read_u32_le()? as usize;
    let validity_len = r.read_u32_le()? as usize;
    if validity_len != ValidityBitmap::len_for_row_count(len)? {
        return Err(Error::Other("validity length mismatch".to_string()));
    }
    let validity = ValidityBitmap {
        bytes: r.take(validity_len)?.to_vec(),
    };

    let kind = r.read_u8()?;
    let data = match kind {
        KIND_NONE => VectorData::None,
        KIND_BOOL => VectorData::Bool(r.fixed(len, |[b]: [u8; 1]| b)?),
        KIND_I8 => VectorData::I8(r.fixed(len, i8::from_le_bytes)?),
        KIND_I16 => VectorData::I16(r.fixed(len, i16::from_le_bytes)?),
        KIND_I32 => VectorData::I32(r.fixed(len, i32::from_le_bytes)?),
        KIND_I64 => VectorData::I64(r.fixed(len, i64::from_le_bytes)?),
        KIND_U8 => VectorData::U8(r.fixed(len, u8::from_le_bytes)?),
        KIND_U16 => VectorData::U16(r.fixed(len, u16::from_le_bytes)?),
        KIND_U32 => VectorData::U32(r.fixed(len, u32::from_le_bytes)?),
        KIND_U64 => VectorData::U64(r.fixed(len, u64::from_le_bytes)?),
        KIND_F32 => VectorData::F32(r.fixed(len, f32::from_le_bytes)?),
        KIND_F64 => VectorData::F64(r.fixed(len, f64::from_le_bytes)?),
        KIND_HUGEINT => VectorData::Hugeint(r.fixed(len, |b: [u8; 16]| {
            Hugeint::new(i64::from_le_bytes(word(&b, 8)), u64::from_le_bytes(word(&b, 0)))
        })?),
        KIND_UHUGEINT => VectorData::Uhugeint(r.fixed(len, |b: [u8; 16]| {
            Uhugeint::new(u64::from_le_bytes(word(&b, 8)), u64::from_le_bytes(word(&b, 0)))
        })?),
        KIND_INTERVAL => VectorData::Interval(r.fixed(len, |b: [u8; 16]| {
            Interval::new(
                i32::from_le_bytes(word(&b, 0)),
                i32::from_le_bytes(word(&b, 4)),
                i64::from_le_bytes(word(&b, 8)),
            )
        })?),
        KIND_VARLEN => {
            let offsets_count = len
                .checked_add(1)
                .ok_or_else(|| Error::Other("offsets overflow".to_string()))?;
            let offsets = r.fixed(offsets_count, u32::from_le_bytes)?;
            let data_len = r.read_u32_le()? as usize;
            let data = r.take(data_len)?.to_vec();
            VectorData::Varlen { offsets, data }
        }
        KIND_LIST_ENTRIES => VectorData::ListEntries(r.fixed(len, |b: [u8; 16]| {
            ListEntry::new(u64::from_le_bytes(word(&b, 0)), u64::from_le_bytes(word(&b, 8)))
        })?),
        other => {
            return Err(Error::Other(format!("unknown vector data kind: {other}")));
        }
    };

    let child_count = r.read_u16_le()? as usize;
    let types = child_types(ty);
    if child_count != types.len() {
        return Err(Error::Other(format!(
            "{} vector needs {} child vectors, snapshot has {child_count}",
            ty.tag(),
            types.len()
        )));
    }
    let mut children = Vec::with_capacity(types.len());
    for child_ty in &types {
        children.push(read_vector(r, child_ty, depth + 1)?);
    }

    Vector::new(ty.clone(), len, validity, data, children)
}
