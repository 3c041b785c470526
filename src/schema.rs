use crate::{Error, Result};
use core::fmt;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Closed set of semantic type tags a result column can carry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    HugeInt,
    UTinyInt,
    USmallInt,
    UInteger,
    UBigInt,
    UHugeInt,
    Float,
    Double,
    Decimal,
    Varchar,
    Blob,
    Date,
    Time,
    Timestamp,
    TimestampS,
    TimestampMs,
    TimestampNs,
    TimestampTz,
    TimeTz,
    Interval,
    List,
    Array,
    Struct,
    Map,
    Union,
    Enum,
    Uuid,
    Bit,
    Unknown,
}

const TAG_TABLE: &[(TypeTag, &str, u32)] = &[
    (TypeTag::Boolean, "boolean", 1),
    (TypeTag::TinyInt, "tinyint", 2),
    (TypeTag::SmallInt, "smallint", 3),
    (TypeTag::Integer, "integer", 4),
    (TypeTag::BigInt, "bigint", 5),
    (TypeTag::UTinyInt, "utinyint", 6),
    (TypeTag::USmallInt, "usmallint", 7),
    (TypeTag::UInteger, "uinteger", 8),
    (TypeTag::UBigInt, "ubigint", 9),
    (TypeTag::Float, "float", 10),
    (TypeTag::Double, "double", 11),
    (TypeTag::Timestamp, "timestamp", 12),
    (TypeTag::Date, "date", 13),
    (TypeTag::Time, "time", 14),
    (TypeTag::Interval, "interval", 15),
    (TypeTag::HugeInt, "hugeint", 16),
    (TypeTag::Varchar, "varchar", 17),
    (TypeTag::Blob, "blob", 18),
    (TypeTag::Decimal, "decimal", 19),
    (TypeTag::TimestampS, "timestamp_s", 20),
    (TypeTag::TimestampMs, "timestamp_ms", 21),
    (TypeTag::TimestampNs, "timestamp_ns", 22),
    (TypeTag::Enum, "enum", 23),
    (TypeTag::List, "list", 24),
    (TypeTag::Struct, "struct", 25),
    (TypeTag::Map, "map", 26),
    (TypeTag::Uuid, "uuid", 27),
    (TypeTag::Union, "union", 28),
    (TypeTag::Bit, "bit", 29),
    (TypeTag::TimeTz, "time_tz", 30),
    (TypeTag::TimestampTz, "timestamp_tz", 31),
    (TypeTag::UHugeInt, "uhugeint", 32),
    (TypeTag::Array, "array", 33),
];

impl TypeTag {
    /// Maps an engine type identifier to its tag. Identifiers the registry
    /// does not know (including the engine's invalid/any/null ids) map to
    /// [`TypeTag::Unknown`].
    pub fn from_engine_id(id: u32) -> TypeTag {
        TAG_TABLE
            .iter()
            .find(|(_, _, engine_id)| *engine_id == id)
            .map(|(tag, _, _)| *tag)
            .unwrap_or(TypeTag::Unknown)
    }

    pub fn engine_id(self) -> Option<u32> {
        TAG_TABLE
            .iter()
            .find(|(tag, _, _)| *tag == self)
            .map(|(_, _, id)| *id)
    }

    pub fn name(self) -> &'static str {
        TAG_TABLE
            .iter()
            .find(|(tag, _, _)| *tag == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("unknown")
    }

    pub fn from_name(name: &str) -> TypeTag {
        TAG_TABLE
            .iter()
            .find(|(_, n, _)| *n == name)
            .map(|(tag, _, _)| *tag)
            .unwrap_or(TypeTag::Unknown)
    }

    pub fn is_nested(self) -> bool {
        matches!(
            self,
            TypeTag::List | TypeTag::Array | TypeTag::Struct | TypeTag::Map | TypeTag::Union
        )
    }

    pub fn is_timestamp(self) -> bool {
        matches!(
            self,
            TypeTag::Timestamp
                | TypeTag::TimestampS
                | TypeTag::TimestampMs
                | TypeTag::TimestampNs
                | TypeTag::TimestampTz
        )
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TimestampUnit {
    Seconds,
    Millis,
    Micros,
    Nanos,
}

impl TimestampUnit {
    pub fn ticks_per_second(self) -> i64 {
        match self {
            TimestampUnit::Seconds => 1,
            TimestampUnit::Millis => 1_000,
            TimestampUnit::Micros => 1_000_000,
            TimestampUnit::Nanos => 1_000_000_000,
        }
    }
}

/// Physical width the engine uses to store a decimal's unscaled integer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecimalStorage {
    I16,
    I32,
    I64,
    I128,
}

/// Physical width the engine uses to store an enum's dictionary index.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnumStorage {
    U8,
    U16,
    U32,
}

pub const MAX_DECIMAL_WIDTH: u8 = 38;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDictionary {
    values: Vec<String>,
}

impl EnumDictionary {
    pub fn new(values: Vec<String>) -> Result<Self> {
        if values.len() > u32::MAX as usize {
            return Err(Error::Other("enum dictionary too large".to_string()));
        }
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn storage(&self) -> EnumStorage {
        if self.values.len() <= u8::MAX as usize {
            EnumStorage::U8
        } else if self.values.len() <= u16::MAX as usize {
            EnumStorage::U16
        } else {
            EnumStorage::U32
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub ty: LogicalType,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: LogicalType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Full type descriptor of a column or child vector, including the metadata
/// (decimal width/scale, enum dictionary, child types) that the bare tag omits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    HugeInt,
    UTinyInt,
    USmallInt,
    UInteger,
    UBigInt,
    UHugeInt,
    Float,
    Double,
    Decimal { width: u8, scale: u8 },
    Varchar,
    Blob,
    Bit,
    Date,
    Time,
    TimeTz,
    Timestamp(TimestampUnit),
    TimestampTz,
    Interval,
    Uuid,
    Enum(EnumDictionary),
    List(Box<LogicalType>),
    Array { child: Box<LogicalType>, size: usize },
    Struct(Vec<StructField>),
    Map { key: Box<LogicalType>, value: Box<LogicalType> },
    Union(Vec<StructField>),
    Unknown,
}

impl LogicalType {
    pub fn decimal(width: u8, scale: u8) -> Result<Self> {
        if width == 0 || width > MAX_DECIMAL_WIDTH {
            return Err(Error::Other(format!("invalid decimal width: {width}")));
        }
        if scale > width {
            return Err(Error::Other(format!(
                "decimal scale {scale} exceeds width {width}"
            )));
        }
        Ok(LogicalType::Decimal { width, scale })
    }

    pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Result<Self> {
        let values = values.into_iter().map(Into::into).collect();
        Ok(LogicalType::Enum(EnumDictionary::new(values)?))
    }

    pub fn list(child: LogicalType) -> Self {
        LogicalType::List(Box::new(child))
    }

    pub fn array(child: LogicalType, size: usize) -> Self {
        LogicalType::Array {
            child: Box::new(child),
            size,
        }
    }

    pub fn map(key: LogicalType, value: LogicalType) -> Self {
        LogicalType::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// The struct type a map stores its entries as.
    pub fn map_entry(key: &LogicalType, value: &LogicalType) -> Self {
        LogicalType::Struct(vec![
            StructField::new("key", key.clone()),
            StructField::new("value", value.clone()),
        ])
    }

    pub fn tag(&self) -> TypeTag {
        match self {
            LogicalType::Boolean => TypeTag::Boolean,
            LogicalType::TinyInt => TypeTag::TinyInt,
            LogicalType::SmallInt => TypeTag::SmallInt,
            LogicalType::Integer => TypeTag::Integer,
            LogicalType::BigInt => TypeTag::BigInt,
            LogicalType::HugeInt => TypeTag::HugeInt,
            LogicalType::UTinyInt => TypeTag::UTinyInt,
            LogicalType::USmallInt => TypeTag::USmallInt,
            LogicalType::UInteger => TypeTag::UInteger,
            LogicalType::UBigInt => TypeTag::UBigInt,
            LogicalType::UHugeInt => TypeTag::UHugeInt,
            LogicalType::Float => TypeTag::Float,
            LogicalType::Double => TypeTag::Double,
            LogicalType::Decimal { .. } => TypeTag::Decimal,
            LogicalType::Varchar => TypeTag::Varchar,
            LogicalType::Blob => TypeTag::Blob,
            LogicalType::Bit => TypeTag::Bit,
            LogicalType::Date => TypeTag::Date,
            LogicalType::Time => TypeTag::Time,
            LogicalType::TimeTz => TypeTag::TimeTz,
            LogicalType::Timestamp(TimestampUnit::Seconds) => TypeTag::TimestampS,
            LogicalType::Timestamp(TimestampUnit::Millis) => TypeTag::TimestampMs,
            LogicalType::Timestamp(TimestampUnit::Micros) => TypeTag::Timestamp,
            LogicalType::Timestamp(TimestampUnit::Nanos) => TypeTag::TimestampNs,
            LogicalType::TimestampTz => TypeTag::TimestampTz,
            LogicalType::Interval => TypeTag::Interval,
            LogicalType::Uuid => TypeTag::Uuid,
            LogicalType::Enum(_) => TypeTag::Enum,
            LogicalType::List(_) => TypeTag::List,
            LogicalType::Array { .. } => TypeTag::Array,
            LogicalType::Struct(_) => TypeTag::Struct,
            LogicalType::Map { .. } => TypeTag::Map,
            LogicalType::Union(_) => TypeTag::Union,
            LogicalType::Unknown => TypeTag::Unknown,
        }
    }

    pub fn decimal_storage(&self) -> Option<DecimalStorage> {
        match self {
            LogicalType::Decimal { width, .. } => Some(match *width {
                0..=4 => DecimalStorage::I16,
                5..=9 => DecimalStorage::I32,
                10..=18 => DecimalStorage::I64,
                _ => DecimalStorage::I128,
            }),
            _ => None,
        }
    }

    pub fn enum_storage(&self) -> Option<EnumStorage> {
        match self {
            LogicalType::Enum(dict) => Some(dict.storage()),
            _ => None,
        }
    }
}

impl From<TypeTag> for LogicalType {
    /// Descriptor for tags that need no metadata. Tags that do (decimal,
    /// enum, nested types) become [`LogicalType::Unknown`].
    fn from(tag: TypeTag) -> Self {
        match tag {
            TypeTag::Boolean => LogicalType::Boolean,
            TypeTag::TinyInt => LogicalType::TinyInt,
            TypeTag::SmallInt => LogicalType::SmallInt,
            TypeTag::Integer => LogicalType::Integer,
            TypeTag::BigInt => LogicalType::BigInt,
            TypeTag::HugeInt => LogicalType::HugeInt,
            TypeTag::UTinyInt => LogicalType::UTinyInt,
            TypeTag::USmallInt => LogicalType::USmallInt,
            TypeTag::UInteger => LogicalType::UInteger,
            TypeTag::UBigInt => LogicalType::UBigInt,
            TypeTag::UHugeInt => LogicalType::UHugeInt,
            TypeTag::Float => LogicalType::Float,
            TypeTag::Double => LogicalType::Double,
            TypeTag::Varchar => LogicalType::Varchar,
            TypeTag::Blob => LogicalType::Blob,
            TypeTag::Bit => LogicalType::Bit,
            TypeTag::Date => LogicalType::Date,
            TypeTag::Time => LogicalType::Time,
            TypeTag::TimeTz => LogicalType::TimeTz,
            TypeTag::Timestamp => LogicalType::Timestamp(TimestampUnit::Micros),
            TypeTag::TimestampS => LogicalType::Timestamp(TimestampUnit::Seconds),
            TypeTag::TimestampMs => LogicalType::Timestamp(TimestampUnit::Millis),
            TypeTag::TimestampNs => LogicalType::Timestamp(TimestampUnit::Nanos),
            TypeTag::TimestampTz => LogicalType::TimestampTz,
            TypeTag::Interval => LogicalType::Interval,
            TypeTag::Uuid => LogicalType::Uuid,
            TypeTag::Decimal
            | TypeTag::Enum
            | TypeTag::List
            | TypeTag::Array
            | TypeTag::Struct
            | TypeTag::Map
            | TypeTag::Union
            | TypeTag::Unknown => LogicalType::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub ty: LogicalType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, ty: LogicalType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn tag(&self) -> TypeTag {
        self.ty.tag()
    }

    /// `(width, scale)` for decimal columns.
    pub fn decimal_meta(&self) -> Option<(u8, u8)> {
        match self.ty {
            LogicalType::Decimal { width, scale } => Some((width, scale)),
            _ => None,
        }
    }

    /// `(dictionary size, index storage)` for enum columns.
    pub fn enum_meta(&self) -> Option<(usize, EnumStorage)> {
        match &self.ty {
            LogicalType::Enum(dict) => Some((dict.len(), dict.storage())),
            _ => None,
        }
    }
}

impl Serialize for ColumnDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ColumnDescriptor", 5)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("type", &self.tag())?;
        match self.decimal_meta() {
            Some((width, scale)) => {
                s.serialize_field("width", &width)?;
                s.serialize_field("scale", &scale)?;
            }
            None => {
                s.skip_field("width")?;
                s.skip_field("scale")?;
            }
        }
        match self.enum_meta() {
            Some((size, _)) => s.serialize_field("dictionary_size", &size)?,
            None => s.skip_field("dictionary_size")?,
        }
        s.end()
    }
}
