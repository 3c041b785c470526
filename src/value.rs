use crate::schema::TimestampUnit;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use core::fmt;
use uuid::Uuid;

/// Signed 128-bit integer as the engine stores it: two 64-bit words.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Hugeint {
    pub lower: u64,
    pub upper: i64,
}

impl Hugeint {
    pub fn new(upper: i64, lower: u64) -> Self {
        Self { lower, upper }
    }

    pub fn from_i128(v: i128) -> Self {
        Self {
            lower: v as u64,
            upper: (v >> 64) as i64,
        }
    }

    /// Exact value, `upper * 2^64 + lower` in two's complement.
    pub fn to_i128(self) -> i128 {
        ((self.upper as i128) << 64) | (self.lower as i128)
    }
}

/// Unsigned 128-bit integer as the engine stores it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Uhugeint {
    pub lower: u64,
    pub upper: u64,
}

impl Uhugeint {
    pub fn new(upper: u64, lower: u64) -> Self {
        Self { lower, upper }
    }

    pub fn from_u128(v: u128) -> Self {
        Self {
            lower: v as u64,
            upper: (v >> 64) as u64,
        }
    }

    pub fn to_u128(self) -> u128 {
        ((self.upper as u128) << 64) | (self.lower as u128)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub micros: i64,
}

impl Interval {
    pub fn new(months: i32, days: i32, micros: i64) -> Self {
        Self {
            months,
            days,
            micros,
        }
    }
}

/// Scaled decimal. The unscaled integer is the source of truth; the value is
/// `raw * 10^-scale`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    raw: i128,
    scale: u8,
}

impl Decimal {
    pub fn new(raw: i128, scale: u8) -> Self {
        Self { raw, scale }
    }

    pub fn raw(&self) -> i128 {
        self.raw
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Lossy projection onto a double.
    pub fn to_f64(&self) -> f64 {
        self.raw as f64 / 10f64.powi(self.scale as i32)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.raw.unsigned_abs().to_string();
        let sign = if self.raw < 0 { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = if digits.len() <= scale {
            format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

/// Materialized cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    Varchar(String),
    Bytes(Vec<u8>),
    /// Bit string rendered as `'0'`/`'1'` characters, most significant first.
    Bit(String),
    Date(NaiveDate),
    Time(NaiveTime),
    TimeTz {
        time: NaiveTime,
        offset_seconds: i32,
    },
    Timestamp {
        value: NaiveDateTime,
        unit: TimestampUnit,
    },
    TimestampTz(DateTime<Utc>),
    Interval(Interval),
    Uuid(Uuid),
    Enum(String),
    List(Vec<Value>),
    Array(Vec<Value>),
    Struct(Vec<(String, Value)>),
    Map(Vec<(Value, Value)>),
    Union {
        tag: u8,
        name: String,
        value: Box<Value>,
    },
}

/// True for angle-bracket markers such as `<unsupported_list_type>`.
pub fn is_placeholder(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('<') && text.ends_with('>')
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Value::Varchar(s) if is_placeholder(s))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(s) | Value::Enum(s) | Value::Bit(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Looks up a struct field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Integer view for any integer variant that fits in `i128`.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::Int8(v) => Some(v as i128),
            Value::Int16(v) => Some(v as i128),
            Value::Int32(v) => Some(v as i128),
            Value::Int64(v) => Some(v as i128),
            Value::Int128(v) => Some(v),
            Value::UInt8(v) => Some(v as i128),
            Value::UInt16(v) => Some(v as i128),
            Value::UInt32(v) => Some(v as i128),
            Value::UInt64(v) => Some(v as i128),
            Value::UInt128(v) => i128::try_from(v).ok(),
            _ => None,
        }
    }

    /// Lossy floating-point view. Decimals go through [`Decimal::to_f64`].
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float32(v) => Some(v as f64),
            Value::Float64(v) => Some(v),
            Value::Decimal(d) => Some(d.to_f64()),
            _ => self.as_i128().map(|v| v as f64),
        }
    }

    /// JSON projection of the value. 128-bit integers and decimals are emitted
    /// as strings so no precision is lost; non-finite floats become strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{Map as JsonMap, Value as Json};
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int8(v) => Json::from(*v),
            Value::Int16(v) => Json::from(*v),
            Value::Int32(v) => Json::from(*v),
            Value::Int64(v) => Json::from(*v),
            Value::UInt8(v) => Json::from(*v),
            Value::UInt16(v) => Json::from(*v),
            Value::UInt32(v) => Json::from(*v),
            Value::UInt64(v) => Json::from(*v),
            Value::Int128(v) => Json::String(v.to_string()),
            Value::UInt128(v) => Json::String(v.to_string()),
            Value::Float32(v) => float_json(*v as f64),
            Value::Float64(v) => float_json(*v),
            Value::Decimal(d) => Json::String(d.to_string()),
            Value::Varchar(s) | Value::Enum(s) | Value::Bit(s) => Json::String(s.clone()),
            Value::Bytes(b) => Json::Array(b.iter().map(|x| Json::from(*x)).collect()),
            Value::Uuid(u) => Json::String(u.hyphenated().to_string()),
            Value::Interval(i) => {
                let mut obj = JsonMap::new();
                obj.insert("months".to_string(), Json::from(i.months));
                obj.insert("days".to_string(), Json::from(i.days));
                obj.insert("micros".to_string(), Json::from(i.micros));
                Json::Object(obj)
            }
            Value::Date(_)
            | Value::Time(_)
            | Value::TimeTz { .. }
            | Value::Timestamp { .. }
            | Value::TimestampTz(_) => Json::String(self.to_string()),
            Value::List(items) | Value::Array(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Struct(fields) => {
                let mut obj = JsonMap::new();
                for (name, v) in fields {
                    obj.insert(name.clone(), v.to_json());
                }
                Json::Object(obj)
            }
            Value::Map(entries) => Json::Array(
                entries
                    .iter()
                    .map(|(k, v)| Json::Array(vec![k.to_json(), v.to_json()]))
                    .collect(),
            ),
            Value::Union { name, value, .. } => {
                let mut obj = JsonMap::new();
                obj.insert("tag".to_string(), Json::String(name.clone()));
                obj.insert("value".to_string(), value.to_json());
                Json::Object(obj)
            }
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Varchar(s) | Value::Enum(s) => write_quoted(f, s),
            Value::Union { value, .. } => value.fmt_nested(f),
            other => write!(f, "{other}"),
        }
    }
}

fn float_json(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or_else(|| serde_json::Value::String(float_text(v)))
}

fn float_text(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        let text = if v > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else {
        v.to_string()
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for ch in s.chars() {
        if ch == '\'' {
            f.write_str("''")?;
        } else {
            write!(f, "{ch}")?;
        }
    }
    f.write_str("'")
}

/// Engine spelling of a UTC offset: `+01`, `-05:30`, `+00`.
pub(crate) fn offset_text(offset_seconds: i32) -> String {
    struct Offset(i32);
    impl fmt::Display for Offset {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write_offset(f, self.0)
        }
    }
    Offset(offset_seconds).to_string()
}

fn write_offset(f: &mut fmt::Formatter<'_>, offset_seconds: i32) -> fmt::Result {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let abs = offset_seconds.unsigned_abs();
    let (h, m, s) = (abs / 3600, (abs / 60) % 60, abs % 60);
    write!(f, "{sign}{h:02}")?;
    if m != 0 || s != 0 {
        write!(f, ":{m:02}")?;
    }
    if s != 0 {
        write!(f, ":{s:02}")?;
    }
    Ok(())
}

fn write_interval(f: &mut fmt::Formatter<'_>, i: &Interval) -> fmt::Result {
    fn unit(n: i64, singular: &str) -> String {
        if n == 1 || n == -1 {
            format!("{n} {singular}")
        } else {
            format!("{n} {singular}s")
        }
    }
    let mut parts = Vec::with_capacity(3);
    if i.months != 0 {
        parts.push(unit(i.months as i64, "month"));
    }
    if i.days != 0 {
        parts.push(unit(i.days as i64, "day"));
    }
    if i.micros != 0 {
        parts.push(unit(i.micros, "microsecond"));
    }
    if parts.is_empty() {
        return f.write_str("00:00:00");
    }
    f.write_str(&parts.join(" "))
}

/// Engine canonical text form, the same rendering a varchar cast produces.
/// Strings nested inside lists, structs and maps are single-quoted.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Int128(v) => write!(f, "{v}"),
            Value::UInt8(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::UInt128(v) => write!(f, "{v}"),
            Value::Float32(v) => f.write_str(&float_text(*v as f64)),
            Value::Float64(v) => f.write_str(&float_text(*v)),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Varchar(s) | Value::Enum(s) | Value::Bit(s) => f.write_str(s),
            Value::Bytes(bytes) => {
                for &b in bytes {
                    if b.is_ascii_graphic() || b == b' ' {
                        if b == b'\\' {
                            f.write_str("\\\\")?;
                        } else {
                            write!(f, "{}", b as char)?;
                        }
                    } else {
                        write!(f, "\\x{b:02X}")?;
                    }
                }
                Ok(())
            }
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::TimeTz {
                time,
                offset_seconds,
            } => {
                write!(f, "{}", time.format("%H:%M:%S%.f"))?;
                write_offset(f, *offset_seconds)
            }
            Value::Timestamp { value, .. } => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::TimestampTz(ts) => write!(f, "{}+00", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::Interval(i) => write_interval(f, i),
            Value::Uuid(u) => write!(f, "{}", u.hyphenated()),
            Value::List(items) | Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_str("]")
            }
            Value::Struct(fields) => {
                f.write_str("{")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, name)?;
                    f.write_str(": ")?;
                    v.fmt_nested(f)?;
                }
                f.write_str("}")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    k.fmt_nested(f)?;
                    f.write_str("=")?;
                    v.fmt_nested(f)?;
                }
                f.write_str("}")
            }
            Value::Union { value, .. } => write!(f, "{value}"),
        }
    }
}
