use crate::error::{DecodeError, DecodeResult};
use crate::options::{MapKeyPolicy, MaterializeOptions};
use crate::schema::{LogicalType, StructField, TimestampUnit, TypeTag};
use crate::value::{Decimal, Hugeint, Uhugeint, Value, offset_text};
use crate::vector::{Vector, VectorData};
use chrono::{DateTime, NaiveDate, NaiveTime};
use uuid::Uuid;

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_INFINITY: i32 = i32::MAX;
const DATE_NEG_INFINITY: i32 = -i32::MAX;
const TIMESTAMP_INFINITY: i64 = i64::MAX;
const TIMESTAMP_NEG_INFINITY: i64 = -i64::MAX;

/// Largest offset a packed `TIME WITH TIME ZONE` can carry (15:59:59).
pub(crate) const TIME_TZ_MAX_OFFSET: i32 = 16 * 60 * 60 - 1;
const TIME_TZ_OFFSET_BITS: u32 = 24;

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;
/// Engine text for `TIME '24:00:00'`, one past the last `NaiveTime`.
const END_OF_DAY: &str = "24:00:00";

/// Decodes row `row` of `vector`, reading it as `ty`.
///
/// A cleared validity bit yields [`Value::Null`] whatever the buffer holds.
/// Nested types recurse into the child vectors with the child types `ty`
/// declares.
pub fn decode(vector: &Vector, ty: &LogicalType, row: usize) -> DecodeResult<Value> {
    decode_with_options(vector, ty, row, &MaterializeOptions::default())
}

/// [`decode`] using the vector's own logical type.
pub fn decode_cell(vector: &Vector, row: usize) -> DecodeResult<Value> {
    decode(vector, vector.logical_type(), row)
}

pub fn decode_with_options(
    vector: &Vector,
    ty: &LogicalType,
    row: usize,
    options: &MaterializeOptions,
) -> DecodeResult<Value> {
    if row >= vector.len() {
        return Err(DecodeError::RowOutOfRange {
            row,
            len: vector.len(),
        });
    }
    if !vector.is_valid(row) {
        return Ok(Value::Null);
    }

    let data = vector.data();
    let tag = ty.tag();
    let mismatch = || DecodeError::BufferMismatch {
        tag,
        found: data.kind(),
    };

    macro_rules! fixed {
        ($variant:ident, $wrap:expr) => {
            match data {
                VectorData::$variant(values) => slot(values, row).map($wrap),
                _ => Err(mismatch()),
            }
        };
    }

    match ty {
        LogicalType::Boolean => fixed!(Bool, |b| Value::Bool(b != 0)),
        LogicalType::TinyInt => fixed!(I8, Value::Int8),
        LogicalType::SmallInt => fixed!(I16, Value::Int16),
        LogicalType::Integer => fixed!(I32, Value::Int32),
        LogicalType::BigInt => fixed!(I64, Value::Int64),
        LogicalType::UTinyInt => fixed!(U8, Value::UInt8),
        LogicalType::USmallInt => fixed!(U16, Value::UInt16),
        LogicalType::UInteger => fixed!(U32, Value::UInt32),
        LogicalType::UBigInt => fixed!(U64, Value::UInt64),
        LogicalType::Float => fixed!(F32, Value::Float32),
        LogicalType::Double => fixed!(F64, Value::Float64),
        LogicalType::HugeInt => fixed!(Hugeint, hugeint_value),
        LogicalType::UHugeInt => fixed!(Uhugeint, uhugeint_value),
        LogicalType::Interval => fixed!(Interval, Value::Interval),
        LogicalType::Uuid => fixed!(Hugeint, |h| Value::Uuid(uuid_from_storage(h))),
        LogicalType::Decimal { scale, .. } => {
            let raw = match data {
                VectorData::I16(v) => slot(v, row)? as i128,
                VectorData::I32(v) => slot(v, row)? as i128,
                VectorData::I64(v) => slot(v, row)? as i128,
                VectorData::Hugeint(v) => slot(v, row)?.to_i128(),
                _ => return Err(mismatch()),
            };
            Ok(Value::Decimal(Decimal::new(raw, *scale)))
        }
        LogicalType::Date => match data {
            VectorData::I32(v) => Ok(date_value(slot(v, row)?)),
            _ => Err(mismatch()),
        },
        LogicalType::Time => match data {
            VectorData::I64(v) => Ok(time_value(slot(v, row)?)),
            _ => Err(mismatch()),
        },
        LogicalType::TimeTz => match data {
            VectorData::U64(v) => Ok(time_tz_value(slot(v, row)?)),
            _ => Err(mismatch()),
        },
        LogicalType::Timestamp(unit) => match data {
            VectorData::I64(v) => Ok(timestamp_value(slot(v, row)?, *unit, false)),
            _ => Err(mismatch()),
        },
        LogicalType::TimestampTz => match data {
            VectorData::I64(v) => Ok(timestamp_value(slot(v, row)?, TimestampUnit::Micros, true)),
            _ => Err(mismatch()),
        },
        LogicalType::Varchar => {
            let bytes = data.varlen_slice(row).ok_or_else(mismatch)?;
            Ok(Value::Varchar(String::from_utf8_lossy(bytes).into_owned()))
        }
        LogicalType::Blob => {
            let bytes = data.varlen_slice(row).ok_or_else(mismatch)?;
            Ok(Value::Bytes(bytes.to_vec()))
        }
        LogicalType::Bit => {
            let bytes = data.varlen_slice(row).ok_or_else(mismatch)?;
            Ok(Value::Bit(bit_string(bytes)))
        }
        LogicalType::Enum(dict) => {
            let index = match data {
                VectorData::U8(v) => slot(v, row)? as u64,
                VectorData::U16(v) => slot(v, row)? as u64,
                VectorData::U32(v) => slot(v, row)? as u64,
                _ => return Err(mismatch()),
            };
            match usize::try_from(index).ok().and_then(|i| dict.get(i)) {
                Some(s) => Ok(Value::Enum(s.to_string())),
                None => {
                    let err = DecodeError::OutOfRangeIndex {
                        index,
                        size: dict.len(),
                    };
                    tracing::warn!(error = %err, "decoding enum as null");
                    Ok(Value::Null)
                }
            }
        }
        LogicalType::List(child_ty) => {
            let entry = match data {
                VectorData::ListEntries(v) => slot(v, row)?,
                _ => return Err(mismatch()),
            };
            let child = child_of(vector, tag, 0)?;
            let items = decode_range(child, child_ty, entry.offset, entry.length, options)?;
            Ok(Value::List(items))
        }
        LogicalType::Array { child: child_ty, size } => {
            let child = child_of(vector, tag, 0)?;
            let start = (row as u64).saturating_mul(*size as u64);
            let items = decode_range(child, child_ty, start, *size as u64, options)?;
            Ok(Value::Array(items))
        }
        LogicalType::Struct(fields) => decode_struct(vector, fields, row, options),
        LogicalType::Map { key, value } => {
            let entry = match data {
                VectorData::ListEntries(v) => slot(v, row)?,
                _ => return Err(mismatch()),
            };
            let child = child_of(vector, tag, 0)?;
            let entry_ty = LogicalType::map_entry(key, value);
            let entries = decode_range(child, &entry_ty, entry.offset, entry.length, options)?;
            Ok(Value::Map(build_map(entries, options.map_duplicate_keys())))
        }
        LogicalType::Union(members) => decode_union(vector, members, row, options),
        LogicalType::Unknown => Err(DecodeError::UnsupportedType(TypeTag::Unknown)),
    }
}

fn slot<T: Copy>(values: &[T], row: usize) -> DecodeResult<T> {
    values
        .get(row)
        .copied()
        .ok_or(DecodeError::RowOutOfRange {
            row,
            len: values.len(),
        })
}

fn child_of(vector: &Vector, tag: TypeTag, index: usize) -> DecodeResult<&Vector> {
    vector
        .child(index)
        .ok_or(DecodeError::MissingChild { tag, index })
}

/// Decodes child rows `[offset, offset + length)`.
fn decode_range(
    child: &Vector,
    child_ty: &LogicalType,
    offset: u64,
    length: u64,
    options: &MaterializeOptions,
) -> DecodeResult<Vec<Value>> {
    if length == 0 {
        return Ok(Vec::new());
    }
    let out_of_range = || DecodeError::ChildOutOfRange {
        start: offset as usize,
        end: offset.saturating_add(length) as usize,
        len: child.len(),
    };
    let start = usize::try_from(offset).map_err(|_| out_of_range())?;
    let len = usize::try_from(length).map_err(|_| out_of_range())?;
    let end = start.checked_add(len).ok_or_else(out_of_range)?;
    if end > child.len() {
        return Err(out_of_range());
    }

    let mut items = Vec::new();
    items
        .try_reserve_exact(len)
        .map_err(|_| DecodeError::AllocationFailure { requested: len })?;
    for child_row in start..end {
        items.push(decode_with_options(child, child_ty, child_row, options)?);
    }
    Ok(items)
}

fn decode_struct(
    vector: &Vector,
    fields: &[StructField],
    row: usize,
    options: &MaterializeOptions,
) -> DecodeResult<Value> {
    let mut out = Vec::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        let child = child_of(vector, TypeTag::Struct, i)?;
        let v = decode_with_options(child, &field.ty, row, options)?;
        out.push((field.name.clone(), v));
    }
    Ok(Value::Struct(out))
}

fn decode_union(
    vector: &Vector,
    members: &[StructField],
    row: usize,
    options: &MaterializeOptions,
) -> DecodeResult<Value> {
    let tags = child_of(vector, TypeTag::Union, 0)?;
    let tag = match decode_with_options(tags, &LogicalType::UTinyInt, row, options)? {
        Value::UInt8(t) => t,
        _ => return Ok(Value::Null),
    };
    let Some(member) = members.get(tag as usize) else {
        tracing::warn!(
            tag,
            member_count = members.len(),
            "union tag outside member list, decoding as null"
        );
        return Ok(Value::Null);
    };
    let child = child_of(vector, TypeTag::Union, tag as usize + 1)?;
    let value = decode_with_options(child, &member.ty, row, options)?;
    Ok(Value::Union {
        tag,
        name: member.name.clone(),
        value: Box::new(value),
    })
}

/// Splits decoded `{key, value}` entry structs into an ordered map.
fn build_map(entries: Vec<Value>, policy: MapKeyPolicy) -> Vec<(Value, Value)> {
    let pairs = entries.into_iter().filter_map(|entry| match entry {
        Value::Struct(mut kv) if kv.len() == 2 => {
            let (_, v) = kv.pop()?;
            let (_, k) = kv.pop()?;
            Some((k, v))
        }
        _ => None,
    });
    collect_map(pairs, policy)
}

pub(crate) fn collect_map(
    entries: impl Iterator<Item = (Value, Value)>,
    policy: MapKeyPolicy,
) -> Vec<(Value, Value)> {
    let mut out: Vec<(Value, Value)> = Vec::new();
    for (k, v) in entries {
        match policy {
            MapKeyPolicy::LastWins => match out.iter_mut().find(|(existing, _)| *existing == k) {
                Some(slot) => slot.1 = v,
                None => out.push((k, v)),
            },
            MapKeyPolicy::KeepAll => out.push((k, v)),
        }
    }
    out
}

/// Narrows to `Int64` when the value fits, otherwise keeps all 128 bits.
pub fn hugeint_value(h: Hugeint) -> Value {
    if h.upper == 0 && h.lower <= i64::MAX as u64 {
        Value::Int64(h.lower as i64)
    } else if h.upper == -1 && h.lower >= 1u64 << 63 {
        Value::Int64(h.lower as i64)
    } else {
        Value::Int128(h.to_i128())
    }
}

pub fn uhugeint_value(u: Uhugeint) -> Value {
    if u.upper == 0 {
        Value::UInt64(u.lower)
    } else {
        Value::UInt128(u.to_u128())
    }
}

/// Undoes the engine's sign-bit flip on stored uuids.
pub fn uuid_from_storage(h: Hugeint) -> Uuid {
    let upper = (h.upper as u64) ^ 0x8000_0000_0000_0000;
    Uuid::from_u64_pair(upper, h.lower)
}

/// Ticks the calendar types cannot hold stay local to their cell.
fn calendar_overflow(tag: TypeTag, ticks: i64) -> Value {
    let err = DecodeError::CalendarOutOfRange { tag, ticks };
    tracing::warn!(error = %err, "decoding as placeholder");
    Value::Varchar(format!("<{tag}_extraction_failed>"))
}

fn date_value(days: i32) -> Value {
    match days {
        DATE_INFINITY => Value::Varchar("infinity".to_string()),
        DATE_NEG_INFINITY => Value::Varchar("-infinity".to_string()),
        _ => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(Value::Date)
            .unwrap_or_else(|| calendar_overflow(TypeTag::Date, days as i64)),
    }
}

pub(crate) fn time_from_micros(micros: i64) -> Option<NaiveTime> {
    if micros < 0 {
        return None;
    }
    let secs = u32::try_from(micros / MICROS_PER_SECOND).ok()?;
    let nanos = (micros % MICROS_PER_SECOND) as u32 * 1_000;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}

fn time_value(micros: i64) -> Value {
    if micros == MICROS_PER_DAY {
        return Value::Varchar(END_OF_DAY.to_string());
    }
    time_from_micros(micros)
        .map(Value::Time)
        .unwrap_or_else(|| calendar_overflow(TypeTag::Time, micros))
}

fn time_tz_value(bits: u64) -> Value {
    let micros = (bits >> TIME_TZ_OFFSET_BITS) as i64;
    let encoded_offset = (bits & ((1u64 << TIME_TZ_OFFSET_BITS) - 1)) as i32;
    let offset_seconds = TIME_TZ_MAX_OFFSET - encoded_offset;
    if micros == MICROS_PER_DAY {
        return Value::Varchar(format!("{END_OF_DAY}{}", offset_text(offset_seconds)));
    }
    match time_from_micros(micros) {
        Some(time) => Value::TimeTz {
            time,
            offset_seconds,
        },
        None => calendar_overflow(TypeTag::TimeTz, micros),
    }
}

/// Packs a time and offset the way the engine stores `TIME WITH TIME ZONE`.
pub fn pack_time_tz(micros: i64, offset_seconds: i32) -> u64 {
    let encoded_offset = (TIME_TZ_MAX_OFFSET - offset_seconds) as u64;
    ((micros as u64) << TIME_TZ_OFFSET_BITS) | (encoded_offset & ((1u64 << TIME_TZ_OFFSET_BITS) - 1))
}

fn timestamp_value(ticks: i64, unit: TimestampUnit, utc: bool) -> Value {
    match ticks {
        TIMESTAMP_INFINITY => return Value::Varchar("infinity".to_string()),
        TIMESTAMP_NEG_INFINITY => return Value::Varchar("-infinity".to_string()),
        _ => {}
    }
    let per_second = unit.ticks_per_second();
    let secs = ticks.div_euclid(per_second);
    let sub = ticks.rem_euclid(per_second);
    let nanos = (sub * (1_000_000_000 / per_second)) as u32;
    let tag = match (unit, utc) {
        (_, true) => TypeTag::TimestampTz,
        (TimestampUnit::Seconds, _) => TypeTag::TimestampS,
        (TimestampUnit::Millis, _) => TypeTag::TimestampMs,
        (TimestampUnit::Micros, _) => TypeTag::Timestamp,
        (TimestampUnit::Nanos, _) => TypeTag::TimestampNs,
    };
    let Some(dt) = DateTime::from_timestamp(secs, nanos) else {
        return calendar_overflow(tag, ticks);
    };
    if utc {
        Value::TimestampTz(dt)
    } else {
        Value::Timestamp {
            value: dt.naive_utc(),
            unit,
        }
    }
}

/// Renders the engine's bit layout: byte 0 holds the number of padding bits
/// at the front of byte 1, the remaining bytes hold bits most significant
/// first.
fn bit_string(bytes: &[u8]) -> String {
    let Some((&padding, bits)) = bytes.split_first() else {
        return String::new();
    };
    let mut out = String::with_capacity(bits.len() * 8);
    for (i, byte) in bits.iter().enumerate() {
        let skip = if i == 0 { padding.min(8) } else { 0 };
        for bit in (0..(8 - skip)).rev() {
            out.push(if byte & (1 << bit) != 0 { '1' } else { '0' });
        }
    }
    out
}
