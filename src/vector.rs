use crate::schema::{ColumnDescriptor, DecimalStorage, EnumStorage, LogicalType, StructField};
use crate::value::{Hugeint, Interval, Uhugeint};
use crate::{Error, Result};
use core::ops::Deref;
use uuid::Uuid;

/// Row capacity of a single chunk.
pub const STANDARD_VECTOR_SIZE: usize = 2048;

fn ceil_div_8(n: usize) -> Result<usize> {
    n.checked_add(7)
        .ok_or_else(|| Error::Other("size overflow".to_string()))
        .map(|v| v / 8)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityBitmap {
    pub bytes: Vec<u8>,
}

impl ValidityBitmap {
    pub fn new_all_invalid(row_count: usize) -> Result<Self> {
        let len = ceil_div_8(row_count)?;
        Ok(Self {
            bytes: vec![0u8; len],
        })
    }

    pub fn new_all_valid(row_count: usize) -> Result<Self> {
        let len = ceil_div_8(row_count)?;
        if len == 0 {
            return Ok(Self { bytes: Vec::new() });
        }
        let mut bytes = vec![0xFFu8; len];
        let rem = row_count % 8;
        if rem != 0 {
            let mask = (1u8 << rem) - 1;
            let last = bytes
                .last_mut()
                .ok_or_else(|| Error::Other("validity bitmap out of bounds".to_string()))?;
            *last = mask;
        }
        Ok(Self { bytes })
    }

    pub fn from_flags(flags: impl ExactSizeIterator<Item = bool>) -> Result<Self> {
        let mut bitmap = Self::new_all_invalid(flags.len())?;
        for (row, valid) in flags.enumerate() {
            if valid {
                bitmap.set(row, true)?;
            }
        }
        Ok(bitmap)
    }

    pub fn len_for_row_count(row_count: usize) -> Result<usize> {
        ceil_div_8(row_count)
    }

    pub fn set(&mut self, row_idx: usize, is_valid: bool) -> Result<()> {
        let byte_idx = row_idx / 8;
        let bit_idx = row_idx % 8;
        if byte_idx >= self.bytes.len() {
            return Err(Error::Other("validity bitmap out of bounds".to_string()));
        }
        let mask = 1u8 << bit_idx;
        if is_valid {
            self.bytes[byte_idx] |= mask;
        } else {
            self.bytes[byte_idx] &= !mask;
        }
        Ok(())
    }

    /// Rows past the end of the bitmap read as null.
    pub fn is_valid(&self, row_idx: usize) -> bool {
        self.bytes
            .get(row_idx / 8)
            .is_some_and(|b| b & (1u8 << (row_idx % 8)) != 0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }
}

/// `{offset, length}` entry of a list or map row into its child vector.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ListEntry {
    pub offset: u64,
    pub length: u64,
}

impl ListEntry {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }
}

/// Raw buffer of a vector. The layout is fixed by the vector's logical type:
/// dates are `I32` days, times and timestamps `I64` ticks, `TIME WITH TIME
/// ZONE` packed `U64`, uuids `Hugeint`, decimals the integer width of their
/// precision, enums the index width of their dictionary. Struct, array and
/// union vectors own no buffer of their own.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorData {
    None,
    Bool(Vec<u8>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Hugeint(Vec<Hugeint>),
    Uhugeint(Vec<Uhugeint>),
    Interval(Vec<Interval>),
    Varlen { offsets: Vec<u32>, data: Vec<u8> },
    ListEntries(Vec<ListEntry>),
}

impl VectorData {
    pub fn kind(&self) -> &'static str {
        match self {
            VectorData::None => "none",
            VectorData::Bool(_) => "bool",
            VectorData::I8(_) => "i8",
            VectorData::I16(_) => "i16",
            VectorData::I32(_) => "i32",
            VectorData::I64(_) => "i64",
            VectorData::U8(_) => "u8",
            VectorData::U16(_) => "u16",
            VectorData::U32(_) => "u32",
            VectorData::U64(_) => "u64",
            VectorData::F32(_) => "f32",
            VectorData::F64(_) => "f64",
            VectorData::Hugeint(_) => "hugeint",
            VectorData::Uhugeint(_) => "uhugeint",
            VectorData::Interval(_) => "interval",
            VectorData::Varlen { .. } => "varlen",
            VectorData::ListEntries(_) => "list_entries",
        }
    }

    /// Number of row slots in the buffer; `None` for buffer-less layouts.
    fn slot_count(&self) -> Option<usize> {
        Some(match self {
            VectorData::None => return None,
            VectorData::Bool(v) => v.len(),
            VectorData::I8(v) => v.len(),
            VectorData::I16(v) => v.len(),
            VectorData::I32(v) => v.len(),
            VectorData::I64(v) => v.len(),
            VectorData::U8(v) => v.len(),
            VectorData::U16(v) => v.len(),
            VectorData::U32(v) => v.len(),
            VectorData::U64(v) => v.len(),
            VectorData::F32(v) => v.len(),
            VectorData::F64(v) => v.len(),
            VectorData::Hugeint(v) => v.len(),
            VectorData::Uhugeint(v) => v.len(),
            VectorData::Interval(v) => v.len(),
            VectorData::Varlen { offsets, .. } => offsets.len().saturating_sub(1),
            VectorData::ListEntries(v) => v.len(),
        })
    }

    /// Bytes of row `row` of a variable-width buffer.
    pub fn varlen_slice(&self, row: usize) -> Option<&[u8]> {
        match self {
            VectorData::Varlen { offsets, data } => {
                let start = *offsets.get(row)? as usize;
                let end = *offsets.get(row + 1)? as usize;
                data.get(start..end)
            }
            _ => None,
        }
    }
}

/// Buffer kind a logical type is stored in.
pub(crate) fn expected_kind(ty: &LogicalType) -> &'static str {
    match ty {
        LogicalType::Boolean => "bool",
        LogicalType::TinyInt => "i8",
        LogicalType::SmallInt => "i16",
        LogicalType::Integer | LogicalType::Date => "i32",
        LogicalType::BigInt
        | LogicalType::Time
        | LogicalType::Timestamp(_)
        | LogicalType::TimestampTz => "i64",
        LogicalType::UTinyInt => "u8",
        LogicalType::USmallInt => "u16",
        LogicalType::UInteger => "u32",
        LogicalType::UBigInt | LogicalType::TimeTz => "u64",
        LogicalType::HugeInt | LogicalType::Uuid => "hugeint",
        LogicalType::UHugeInt => "uhugeint",
        LogicalType::Float => "f32",
        LogicalType::Double => "f64",
        LogicalType::Interval => "interval",
        LogicalType::Varchar | LogicalType::Blob | LogicalType::Bit => "varlen",
        LogicalType::List(_) | LogicalType::Map { .. } => "list_entries",
        LogicalType::Struct(_) | LogicalType::Array { .. } | LogicalType::Union(_) => "none",
        LogicalType::Unknown => "none",
        LogicalType::Decimal { .. } => match ty.decimal_storage() {
            Some(DecimalStorage::I16) => "i16",
            Some(DecimalStorage::I32) => "i32",
            Some(DecimalStorage::I64) => "i64",
            _ => "hugeint",
        },
        LogicalType::Enum(dict) => match dict.storage() {
            EnumStorage::U8 => "u8",
            EnumStorage::U16 => "u16",
            EnumStorage::U32 => "u32",
        },
    }
}

/// Fixed-width element types that map one-to-one onto a [`VectorData`] buffer.
pub trait FixedWidth: Copy + Default {
    fn into_data(values: Vec<Self>) -> VectorData;
}

macro_rules! fixed_width {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FixedWidth for $ty {
                fn into_data(values: Vec<Self>) -> VectorData {
                    VectorData::$variant(values)
                }
            }
        )*
    };
}

fixed_width! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Hugeint => Hugeint,
    Uhugeint => Uhugeint,
    Interval => Interval,
}

/// One column's data for one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    ty: LogicalType,
    len: usize,
    validity: ValidityBitmap,
    data: VectorData,
    children: Vec<Vector>,
}

impl Vector {
    /// Builds a vector and checks that buffer, validity and child lengths agree
    /// with `len` and with the layout `ty` implies. List and map entries are
    /// checked against the child range when they are read.
    pub fn new(
        ty: LogicalType,
        len: usize,
        validity: ValidityBitmap,
        data: VectorData,
        children: Vec<Vector>,
    ) -> Result<Self> {
        let v = Self {
            ty,
            len,
            validity,
            data,
            children,
        };
        v.validate()?;
        Ok(v)
    }

    pub fn validate(&self) -> Result<()> {
        let expected_validity = ValidityBitmap::len_for_row_count(self.len)?;
        if self.validity.bytes.len() != expected_validity {
            return Err(Error::Other("validity length mismatch".to_string()));
        }
        let expected = expected_kind(&self.ty);
        if self.data.kind() != expected {
            return Err(Error::Other(format!(
                "{} vector needs a {expected} buffer, got {}",
                self.ty.tag(),
                self.data.kind()
            )));
        }
        if let Some(slots) = self.data.slot_count() {
            if slots != self.len {
                return Err(Error::Other("values length mismatch".to_string()));
            }
        }
        if let VectorData::Varlen { offsets, data } = &self.data {
            if offsets.first().copied().unwrap_or(1) != 0 {
                return Err(Error::Other("offsets[0] must be 0".to_string()));
            }
            let mut prev = 0u32;
            for &o in offsets.iter() {
                if o < prev {
                    return Err(Error::Other("offsets must be non-decreasing".to_string()));
                }
                prev = o;
            }
            if prev as usize != data.len() {
                return Err(Error::Other("final offset mismatch".to_string()));
            }
        }
        self.validate_children()
    }

    fn validate_children(&self) -> Result<()> {
        let want = |n: usize| -> Result<()> {
            if self.children.len() != n {
                return Err(Error::Other(format!(
                    "{} vector needs {n} child vectors, got {}",
                    self.ty.tag(),
                    self.children.len()
                )));
            }
            Ok(())
        };
        let same_len = |children: &[Vector]| -> Result<()> {
            if children.iter().any(|c| c.len != self.len) {
                return Err(Error::Other("child length mismatch".to_string()));
            }
            Ok(())
        };
        match &self.ty {
            LogicalType::List(child) => {
                want(1)?;
                self.check_child_type(0, child)
            }
            LogicalType::Map { key, value } => {
                want(1)?;
                self.check_child_type(0, &LogicalType::map_entry(key, value))
            }
            LogicalType::Array { child, size } => {
                want(1)?;
                self.check_child_type(0, child)?;
                let expected = self
                    .len
                    .checked_mul(*size)
                    .ok_or_else(|| Error::Other("array size overflow".to_string()))?;
                if self.children[0].len != expected {
                    return Err(Error::Other("array child length mismatch".to_string()));
                }
                Ok(())
            }
            LogicalType::Struct(fields) => {
                want(fields.len())?;
                same_len(&self.children)?;
                for (i, f) in fields.iter().enumerate() {
                    self.check_child_type(i, &f.ty)?;
                }
                Ok(())
            }
            LogicalType::Union(members) => {
                want(members.len() + 1)?;
                same_len(&self.children)?;
                self.check_child_type(0, &LogicalType::UTinyInt)?;
                for (i, m) in members.iter().enumerate() {
                    self.check_child_type(i + 1, &m.ty)?;
                }
                Ok(())
            }
            _ => want(0),
        }
    }

    fn check_child_type(&self, index: usize, ty: &LogicalType) -> Result<()> {
        if self.children[index].ty != *ty {
            return Err(Error::Other(format!(
                "child {index} of {} vector has type {}, expected {}",
                self.ty.tag(),
                self.children[index].ty.tag(),
                ty.tag()
            )));
        }
        Ok(())
    }

    /// Fixed-width vector from optional values; `None` clears the validity bit.
    pub fn fixed<T: FixedWidth>(ty: LogicalType, values: &[Option<T>]) -> Result<Self> {
        let validity = ValidityBitmap::from_flags(values.iter().map(Option::is_some))?;
        let data = T::into_data(values.iter().map(|v| v.unwrap_or_default()).collect());
        Self::new(ty, values.len(), validity, data, Vec::new())
    }

    pub fn booleans(values: &[Option<bool>]) -> Result<Self> {
        let validity = ValidityBitmap::from_flags(values.iter().map(Option::is_some))?;
        let data = VectorData::Bool(values.iter().map(|v| v.unwrap_or(false) as u8).collect());
        Self::new(LogicalType::Boolean, values.len(), validity, data, Vec::new())
    }

    /// Variable-width vector (varchar, blob or bit) from optional byte strings.
    pub fn varlen<B: AsRef<[u8]>>(ty: LogicalType, values: &[Option<B>]) -> Result<Self> {
        let validity = ValidityBitmap::from_flags(values.iter().map(Option::is_some))?;
        let mut offsets = Vec::with_capacity(values.len() + 1);
        let mut data = Vec::new();
        offsets.push(0u32);
        for v in values {
            if let Some(bytes) = v {
                data.extend_from_slice(bytes.as_ref());
            }
            let off: u32 = data
                .len()
                .try_into()
                .map_err(|_| Error::Other("data too large".to_string()))?;
            offsets.push(off);
        }
        Self::new(
            ty,
            values.len(),
            validity,
            VectorData::Varlen { offsets, data },
            Vec::new(),
        )
    }

    pub fn strings(values: &[Option<&str>]) -> Result<Self> {
        Self::varlen(LogicalType::Varchar, values)
    }

    /// Decimal vector from unscaled integers, stored at the width the
    /// precision requires.
    pub fn decimals(width: u8, scale: u8, raws: &[Option<i128>]) -> Result<Self> {
        let ty = LogicalType::decimal(width, scale)?;
        let narrow = |what: &str| Error::Other(format!("decimal value does not fit {what}"));
        match ty.decimal_storage() {
            Some(DecimalStorage::I16) => {
                let vals = raws
                    .iter()
                    .map(|r| r.map(i16::try_from).transpose().map_err(|_| narrow("i16")))
                    .collect::<Result<Vec<_>>>()?;
                Self::fixed(ty, &vals)
            }
            Some(DecimalStorage::I32) => {
                let vals = raws
                    .iter()
                    .map(|r| r.map(i32::try_from).transpose().map_err(|_| narrow("i32")))
                    .collect::<Result<Vec<_>>>()?;
                Self::fixed(ty, &vals)
            }
            Some(DecimalStorage::I64) => {
                let vals = raws
                    .iter()
                    .map(|r| r.map(i64::try_from).transpose().map_err(|_| narrow("i64")))
                    .collect::<Result<Vec<_>>>()?;
                Self::fixed(ty, &vals)
            }
            _ => {
                let vals: Vec<Option<Hugeint>> =
                    raws.iter().map(|r| r.map(Hugeint::from_i128)).collect();
                Self::fixed(ty, &vals)
            }
        }
    }

    /// Enum vector from dictionary indices, stored at the width the
    /// dictionary size requires.
    pub fn enums<S: Into<String>>(
        dictionary: impl IntoIterator<Item = S>,
        indices: &[Option<u32>],
    ) -> Result<Self> {
        let ty = LogicalType::enumeration(dictionary)?;
        let too_wide = || Error::Other("enum index does not fit its storage width".to_string());
        match ty.enum_storage() {
            Some(EnumStorage::U8) => {
                let vals = indices
                    .iter()
                    .map(|i| i.map(u8::try_from).transpose().map_err(|_| too_wide()))
                    .collect::<Result<Vec<_>>>()?;
                Self::fixed(ty, &vals)
            }
            Some(EnumStorage::U16) => {
                let vals = indices
                    .iter()
                    .map(|i| i.map(u16::try_from).transpose().map_err(|_| too_wide()))
                    .collect::<Result<Vec<_>>>()?;
                Self::fixed(ty, &vals)
            }
            _ => Self::fixed(ty, indices),
        }
    }

    /// Uuid vector. The engine stores uuids with the top bit flipped so that
    /// signed 128-bit ordering matches uuid ordering.
    pub fn uuids(values: &[Option<Uuid>]) -> Result<Self> {
        let vals: Vec<Option<Hugeint>> = values
            .iter()
            .map(|u| {
                u.map(|u| {
                    let bits = u.as_u128() ^ (1u128 << 127);
                    Hugeint::from_i128(bits as i128)
                })
            })
            .collect();
        Self::fixed(LogicalType::Uuid, &vals)
    }

    pub fn list(entries: &[Option<ListEntry>], child: Vector) -> Result<Self> {
        let validity = ValidityBitmap::from_flags(entries.iter().map(Option::is_some))?;
        let data = VectorData::ListEntries(entries.iter().map(|e| e.unwrap_or_default()).collect());
        let ty = LogicalType::list(child.ty.clone());
        Self::new(ty, entries.len(), validity, data, vec![child])
    }

    /// Map vector; `keys[i]`/`values[i]` form entry `i` of the child range.
    pub fn map(entries: &[Option<ListEntry>], keys: Vector, values: Vector) -> Result<Self> {
        let ty = LogicalType::map(keys.ty.clone(), values.ty.clone());
        let entry_len = keys.len;
        let entry_struct = Self::structure(
            vec![("key".to_string(), keys), ("value".to_string(), values)],
            ValidityBitmap::new_all_valid(entry_len)?,
        )?;
        let validity = ValidityBitmap::from_flags(entries.iter().map(Option::is_some))?;
        let data = VectorData::ListEntries(entries.iter().map(|e| e.unwrap_or_default()).collect());
        Self::new(ty, entries.len(), validity, data, vec![entry_struct])
    }

    pub fn array(size: usize, validity: ValidityBitmap, child: Vector) -> Result<Self> {
        if size == 0 {
            return Err(Error::Other("array size must be positive".to_string()));
        }
        let len = child.len / size;
        let ty = LogicalType::array(child.ty.clone(), size);
        Self::new(ty, len, validity, VectorData::None, vec![child])
    }

    pub fn structure(fields: Vec<(String, Vector)>, validity: ValidityBitmap) -> Result<Self> {
        let len = fields.first().map(|(_, v)| v.len).unwrap_or(0);
        let ty = LogicalType::Struct(
            fields
                .iter()
                .map(|(name, v)| StructField::new(name.clone(), v.ty.clone()))
                .collect(),
        );
        let children = fields.into_iter().map(|(_, v)| v).collect();
        Self::new(ty, len, validity, VectorData::None, children)
    }

    /// Union vector: child 0 holds the active member tag, children `1..` the
    /// members. A null tag makes the whole row null.
    pub fn union(members: Vec<(String, Vector)>, tags: &[Option<u8>]) -> Result<Self> {
        let ty = LogicalType::Union(
            members
                .iter()
                .map(|(name, v)| StructField::new(name.clone(), v.ty.clone()))
                .collect(),
        );
        let validity = ValidityBitmap::from_flags(tags.iter().map(Option::is_some))?;
        let mut children = Vec::with_capacity(members.len() + 1);
        children.push(Self::fixed(LogicalType::UTinyInt, tags)?);
        children.extend(members.into_iter().map(|(_, v)| v));
        Self::new(ty, tags.len(), validity, VectorData::None, children)
    }

    pub fn logical_type(&self) -> &LogicalType {
        &self.ty
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn validity(&self) -> &ValidityBitmap {
        &self.validity
    }

    pub fn is_valid(&self, row: usize) -> bool {
        self.validity.is_valid(row)
    }

    pub fn data(&self) -> &VectorData {
        &self.data
    }

    pub fn child(&self, index: usize) -> Option<&Vector> {
        self.children.get(index)
    }

    pub fn children(&self) -> &[Vector] {
        &self.children
    }
}

/// Fixed-capacity batch of rows across all columns of a result.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChunk {
    row_count: usize,
    vectors: Vec<Vector>,
}

impl DataChunk {
    pub fn new(vectors: Vec<Vector>) -> Result<Self> {
        if vectors.is_empty() {
            return Err(Error::Other(
                "data chunk must have at least one vector".to_string(),
            ));
        }
        let row_count = vectors[0].len();
        if row_count > STANDARD_VECTOR_SIZE {
            return Err(Error::Other(format!(
                "chunk of {row_count} rows exceeds capacity {STANDARD_VECTOR_SIZE}"
            )));
        }
        if vectors.iter().any(|v| v.len() != row_count) {
            return Err(Error::Other("chunk vector length mismatch".to_string()));
        }
        Ok(Self { row_count, vectors })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.vectors.len()
    }

    pub fn vector(&self, index: usize) -> Option<&Vector> {
        self.vectors.get(index)
    }

    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }
}

/// Ordered chunks plus the column descriptors they share.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    columns: Vec<ColumnDescriptor>,
    chunks: Vec<DataChunk>,
    // first global row of each chunk
    chunk_starts: Vec<usize>,
    row_count: usize,
}

impl QueryResult {
    pub fn new(columns: Vec<ColumnDescriptor>, chunks: Vec<DataChunk>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::Other(
                "query result must have at least one column".to_string(),
            ));
        }
        for chunk in &chunks {
            if chunk.column_count() != columns.len() {
                return Err(Error::Other("chunk/columns length mismatch".to_string()));
            }
            for (col, vector) in columns.iter().zip(chunk.vectors()) {
                if vector.logical_type() != &col.ty {
                    return Err(Error::Other(format!(
                        "column {:?} is {} but its vector is {}",
                        col.name,
                        col.tag(),
                        vector.logical_type().tag()
                    )));
                }
            }
        }
        let mut chunk_starts = Vec::with_capacity(chunks.len());
        let mut row_count = 0usize;
        for chunk in &chunks {
            chunk_starts.push(row_count);
            row_count += chunk.row_count();
        }
        Ok(Self {
            columns,
            chunks,
            chunk_starts,
            row_count,
        })
    }

    /// Result holding a single chunk; column names pair with vectors in order.
    pub fn from_vectors(columns: Vec<(String, Vector)>) -> Result<Self> {
        let descriptors = columns
            .iter()
            .map(|(name, v)| ColumnDescriptor::new(name.clone(), v.logical_type().clone()))
            .collect();
        let chunk = DataChunk::new(columns.into_iter().map(|(_, v)| v).collect())?;
        Self::new(descriptors, vec![chunk])
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunk(&self, index: usize) -> Option<ChunkHandle<'_>> {
        self.chunks
            .get(index)
            .map(|chunk| ChunkHandle { index, chunk })
    }

    pub fn chunks(&self) -> impl Iterator<Item = ChunkHandle<'_>> {
        self.chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| ChunkHandle { index, chunk })
    }

    /// Locates global row `row` as `(chunk, row within chunk)`.
    pub fn locate_row(&self, row: usize) -> Option<(&DataChunk, usize)> {
        let index = self
            .chunk_starts
            .partition_point(|&start| start <= row)
            .checked_sub(1)?;
        let within = row - self.chunk_starts[index];
        let chunk = &self.chunks[index];
        (within < chunk.row_count()).then_some((chunk, within))
    }
}

/// Borrowed handle to one chunk of a [`QueryResult`]; it cannot outlive the
/// result it came from.
#[derive(Debug, Clone, Copy)]
pub struct ChunkHandle<'a> {
    index: usize,
    chunk: &'a DataChunk,
}

impl<'a> ChunkHandle<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self) -> &'a DataChunk {
        self.chunk
    }
}

impl Deref for ChunkHandle<'_> {
    type Target = DataChunk;

    fn deref(&self) -> &DataChunk {
        self.chunk
    }
}
