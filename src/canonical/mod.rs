//! Turns flat-path cells (engine text, native scalars, placeholders) into the
//! same typed [`Value`]s the chunked path produces.
//!
//! Every text rule is non-fatal: text that does not parse for its column type
//! is returned unchanged as [`Value::Varchar`]. Placeholders always pass
//! through untouched.

pub mod bracket;

use crate::decode::{TIME_TZ_MAX_OFFSET, collect_map, hugeint_value, uhugeint_value};
use crate::error::DecodeError;
use crate::legacy::{RawCell, parse_float_text};
use crate::options::MaterializeOptions;
use crate::schema::{ColumnDescriptor, LogicalType};
use crate::value::{Decimal, Hugeint, Interval, Uhugeint, Value, is_placeholder};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;

/// 2^63 as a double.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

type ParseResult<T> = core::result::Result<T, DecodeError>;

fn parse_failure(text: &str, target: &'static str) -> DecodeError {
    DecodeError::ParseFailure {
        text: text.to_string(),
        target,
    }
}

/// Canonicalizes one flat-path cell for its column.
pub fn canonicalize(cell: RawCell, column: &ColumnDescriptor, options: &MaterializeOptions) -> Value {
    canonicalize_for_type(cell, &column.ty, options)
}

pub fn canonicalize_for_type(
    cell: RawCell,
    ty: &LogicalType,
    options: &MaterializeOptions,
) -> Value {
    match cell {
        RawCell::Null => Value::Null,
        RawCell::Bool(b) => Value::Bool(b),
        RawCell::Int(v) => conform_integer(v as i128, ty),
        RawCell::UInt(v) => conform_integer(v as i128, ty),
        RawCell::Float(v) => match ty {
            LogicalType::Float => Value::Float32(v as f32),
            _ => Value::Float64(v),
        },
        RawCell::Bytes(b) => Value::Bytes(b),
        RawCell::Text(text) => canonicalize_text(text, ty, options),
    }
}

/// Type-directed parse of engine text. Returns the text unchanged when it is
/// a placeholder or does not parse.
pub fn canonicalize_text(text: String, ty: &LogicalType, options: &MaterializeOptions) -> Value {
    if is_placeholder(&text) {
        return Value::Varchar(text);
    }
    let parsed = match ty {
        LogicalType::Varchar => return Value::Varchar(text),
        LogicalType::Enum(_) => return Value::Enum(text),
        LogicalType::Bit => return Value::Bit(text),
        LogicalType::Blob => return Value::Bytes(text.into_bytes()),
        LogicalType::Union(_) | LogicalType::Unknown => return Value::Varchar(text),
        LogicalType::Boolean => match text.trim() {
            "true" | "1" => Ok(Value::Bool(true)),
            _ => Ok(Value::Bool(false)),
        },
        LogicalType::TinyInt
        | LogicalType::SmallInt
        | LogicalType::Integer
        | LogicalType::BigInt
        | LogicalType::UTinyInt
        | LogicalType::USmallInt
        | LogicalType::UInteger
        | LogicalType::UBigInt => text
            .trim()
            .parse::<i128>()
            .map_err(|_| parse_failure(&text, "integer"))
            .and_then(|v| match conform_integer(v, ty) {
                Value::Varchar(_) => Err(parse_failure(&text, "integer")),
                other => Ok(other),
            }),
        LogicalType::HugeInt => parse_hugeint_text(&text).map(|v| hugeint_value(Hugeint::from_i128(v))),
        LogicalType::UHugeInt => text
            .trim()
            .parse::<u128>()
            .map(|v| uhugeint_value(Uhugeint::from_u128(v)))
            .map_err(|_| parse_failure(&text, "uhugeint")),
        LogicalType::Float => parse_float_text(&text)
            .map(|v| Value::Float32(v as f32))
            .ok_or_else(|| parse_failure(&text, "float")),
        LogicalType::Double => parse_float_text(&text)
            .map(Value::Float64)
            .ok_or_else(|| parse_failure(&text, "double")),
        LogicalType::Decimal { scale, .. } => Ok(parse_decimal_text(&text, Some(*scale))),
        LogicalType::Date => parse_date_text(&text).map(Value::Date),
        LogicalType::Time => parse_time_text(&text).map(Value::Time),
        LogicalType::TimeTz => parse_time_tz_text(&text).map(|(time, offset_seconds)| {
            Value::TimeTz {
                time,
                offset_seconds,
            }
        }),
        LogicalType::Timestamp(unit) => {
            parse_timestamp_text(&text).map(|value| Value::Timestamp { value, unit: *unit })
        }
        LogicalType::TimestampTz => parse_timestamp_tz_text(&text).map(Value::TimestampTz),
        LogicalType::Interval => parse_interval_text(&text).map(Value::Interval),
        LogicalType::Uuid => Uuid::parse_str(text.trim())
            .map(Value::Uuid)
            .map_err(|_| parse_failure(&text, "uuid")),
        LogicalType::List(_)
        | LogicalType::Array { .. }
        | LogicalType::Struct(_)
        | LogicalType::Map { .. } => {
            if !options.canonicalize_structured_text() {
                return Value::Varchar(text);
            }
            parse_structured_text(&text).map(|v| conform(v, ty, options))
        }
    };
    match parsed {
        Ok(v) => v,
        Err(e) => {
            tracing::trace!(error = %e, "canonicalization left text unchanged");
            Value::Varchar(text)
        }
    }
}

/// Integer value narrowed to the variant of an integer column. Out of range
/// values come back as text.
fn conform_integer(v: i128, ty: &LogicalType) -> Value {
    fn narrow<T: TryFrom<i128>>(v: i128, wrap: fn(T) -> Value) -> Value {
        T::try_from(v).map(wrap).unwrap_or_else(|_| Value::Varchar(v.to_string()))
    }
    match ty {
        LogicalType::TinyInt => narrow(v, Value::Int8),
        LogicalType::SmallInt => narrow(v, Value::Int16),
        LogicalType::Integer => narrow(v, Value::Int32),
        LogicalType::BigInt => narrow(v, Value::Int64),
        LogicalType::UTinyInt => narrow(v, Value::UInt8),
        LogicalType::USmallInt => narrow(v, Value::UInt16),
        LogicalType::UInteger => narrow(v, Value::UInt32),
        LogicalType::UBigInt => narrow(v, Value::UInt64),
        LogicalType::HugeInt => hugeint_value(Hugeint::from_i128(v)),
        LogicalType::UHugeInt => match u128::try_from(v) {
            Ok(u) => uhugeint_value(Uhugeint::from_u128(u)),
            Err(_) => Value::Varchar(v.to_string()),
        },
        LogicalType::Decimal { scale, .. } => {
            match 10i128
                .checked_pow(u32::from(*scale))
                .and_then(|p| v.checked_mul(p))
            {
                Some(raw) => Value::Decimal(Decimal::new(raw, *scale)),
                None => Value::Varchar(v.to_string()),
            }
        }
        LogicalType::Float => Value::Float32(v as f32),
        LogicalType::Double => Value::Float64(v as f64),
        LogicalType::Varchar => Value::Varchar(v.to_string()),
        _ => i64::try_from(v)
            .map(Value::Int64)
            .unwrap_or(Value::Int128(v)),
    }
}

/// Parses `hugeint:<upper>:<lower>` or plain decimal digits into the exact
/// 128-bit value.
pub fn parse_hugeint_text(text: &str) -> ParseResult<i128> {
    let t = text.trim();
    if let Some(rest) = t.strip_prefix("hugeint:") {
        let (upper, lower) = rest
            .split_once(':')
            .ok_or_else(|| parse_failure(text, "hugeint"))?;
        let upper: i64 = upper.parse().map_err(|_| parse_failure(text, "hugeint"))?;
        let lower: u64 = lower.parse().map_err(|_| parse_failure(text, "hugeint"))?;
        return Ok(Hugeint::new(upper, lower).to_i128());
    }
    t.parse().map_err(|_| parse_failure(text, "hugeint"))
}

/// Decimal text to an exact `Decimal` when it is plain positional notation,
/// otherwise a lossy `Float64`. Without a column scale the scale is taken from
/// the text.
pub fn parse_decimal_text(text: &str, scale: Option<u8>) -> Value {
    match exact_decimal(text.trim(), scale) {
        Some(d) => Value::Decimal(d),
        None => match parse_float_text(text) {
            Some(f) => Value::Float64(f),
            None => Value::Varchar(text.to_string()),
        },
    }
}

fn exact_decimal(t: &str, scale: Option<u8>) -> Option<Decimal> {
    let (negative, digits) = match t.as_bytes().first()? {
        b'-' => (true, &t[1..]),
        b'+' => (false, &t[1..]),
        _ => (false, t),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let scale = match scale {
        Some(s) => s,
        None => u8::try_from(frac_part.len()).ok()?,
    };
    let scale_len = usize::from(scale);
    if frac_part.len() > scale_len && frac_part[scale_len..].bytes().any(|b| b != b'0') {
        return None;
    }
    let mut raw: i128 = 0;
    let frac_digits = frac_part.bytes().chain(core::iter::repeat(b'0')).take(scale_len);
    for b in int_part.bytes().chain(frac_digits) {
        raw = raw.checked_mul(10)?.checked_add(i128::from(b - b'0'))?;
    }
    Some(Decimal::new(if negative { -raw } else { raw }, scale))
}

pub fn parse_date_text(text: &str) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| parse_failure(text, "date"))
}

pub fn parse_time_text(text: &str) -> ParseResult<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M:%S%.f").map_err(|_| parse_failure(text, "time"))
}

/// `HH:MM:SS[.ffffff]±HH[:MM[:SS]]`.
pub fn parse_time_tz_text(text: &str) -> ParseResult<(NaiveTime, i32)> {
    let fail = || parse_failure(text, "time_tz");
    let t = text.trim();
    let split = t.rfind(['+', '-']).ok_or_else(fail)?;
    let (time, offset) = t.split_at(split);
    let time = parse_time_text(time)?;
    let sign = if offset.starts_with('-') { -1 } else { 1 };
    let parts: Vec<&str> = offset[1..].split(':').collect();
    if parts.len() > 3 {
        return Err(fail());
    }
    let mut seconds = 0i32;
    for (part, multiplier) in parts.iter().zip([3600, 60, 1]) {
        let n: i32 = part.parse().map_err(|_| fail())?;
        seconds = n
            .checked_mul(multiplier)
            .and_then(|v| seconds.checked_add(v))
            .ok_or_else(fail)?;
    }
    if !(0..=TIME_TZ_MAX_OFFSET).contains(&seconds) {
        return Err(fail());
    }
    Ok((time, sign * seconds))
}

pub fn parse_timestamp_text(text: &str) -> ParseResult<NaiveDateTime> {
    let t = text.trim();
    NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(t, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .ok_or(())
        })
        .map_err(|_| parse_failure(text, "timestamp"))
}

/// Timestamp text with a UTC offset (`+00`, `+05:30`, `Z`); a missing offset
/// reads as UTC.
pub fn parse_timestamp_tz_text(text: &str) -> ParseResult<DateTime<Utc>> {
    let t = text.trim();
    DateTime::parse_from_rfc3339(t)
        .or_else(|_| DateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| parse_timestamp_text(t).map(|naive| naive.and_utc()))
        .map_err(|_| parse_failure(text, "timestamp_tz"))
}

/// Parses `<n> <unit> ...` interval text, optionally ending in an
/// `[-]HH:MM:SS[.ffffff]` time part. Units may be singular or plural.
pub fn parse_interval_text(text: &str) -> ParseResult<Interval> {
    let fail = || parse_failure(text, "interval");
    let mut interval = Interval::default();
    let mut tokens = text.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return Err(fail());
    }
    while let Some(token) = tokens.next() {
        if token.contains(':') {
            let micros = clock_micros(token).ok_or_else(fail)?;
            interval.micros = interval.micros.checked_add(micros).ok_or_else(fail)?;
            continue;
        }
        let n: i64 = token.parse().map_err(|_| fail())?;
        let unit = tokens.next().ok_or_else(fail)?;
        let unit = unit.strip_suffix('s').unwrap_or(unit);
        match unit {
            "year" => {
                let months = n.checked_mul(12).ok_or_else(fail)?;
                interval.months = add_i32(interval.months, months).ok_or_else(fail)?;
            }
            "month" | "mon" => interval.months = add_i32(interval.months, n).ok_or_else(fail)?,
            "day" => interval.days = add_i32(interval.days, n).ok_or_else(fail)?,
            "hour" => add_micros(&mut interval, n, MICROS_PER_HOUR).ok_or_else(fail)?,
            "minute" | "min" => add_micros(&mut interval, n, MICROS_PER_MINUTE).ok_or_else(fail)?,
            "second" | "sec" => add_micros(&mut interval, n, MICROS_PER_SECOND).ok_or_else(fail)?,
            "millisecond" | "msec" => add_micros(&mut interval, n, 1_000).ok_or_else(fail)?,
            "microsecond" | "usec" => add_micros(&mut interval, n, 1).ok_or_else(fail)?,
            _ => return Err(fail()),
        }
    }
    Ok(interval)
}

fn add_i32(current: i32, n: i64) -> Option<i32> {
    i32::try_from(i64::from(current).checked_add(n)?).ok()
}

fn add_micros(interval: &mut Interval, n: i64, per_unit: i64) -> Option<()> {
    interval.micros = interval.micros.checked_add(n.checked_mul(per_unit)?)?;
    Some(())
}

fn clock_micros(token: &str) -> Option<i64> {
    let (negative, clock) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let mut parts = clock.split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds = parts.next().unwrap_or("0");
    if parts.next().is_some() {
        return None;
    }
    let (whole, frac) = seconds.split_once('.').unwrap_or((seconds, ""));
    let whole: i64 = whole.parse().ok()?;
    if frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let frac_micros: i64 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<6}").parse().ok()?
    };
    let micros = hours
        .checked_mul(MICROS_PER_HOUR)?
        .checked_add(minutes.checked_mul(MICROS_PER_MINUTE)?)?
        .checked_add(whole.checked_mul(MICROS_PER_SECOND)?)?
        .checked_add(frac_micros)?;
    Some(if negative { -micros } else { micros })
}

/// Structured text to a value tree: a JSON parse first, the bracket/brace
/// grammar when that fails.
pub fn parse_structured_text(text: &str) -> ParseResult<Value> {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(text) {
        if let Some(v) = json_value(json) {
            return Ok(v);
        }
    }
    tracing::trace!(len = text.len(), "structured text is not json, using bracket grammar");
    bracket::parse(text).ok_or_else(|| parse_failure(text, "structured text"))
}

/// Integral JSON numbers outside `i64`/`u64` only survive as lossy doubles,
/// so they are rejected and the bracket grammar keeps them exact.
fn json_value(json: serde_json::Value) -> Option<Value> {
    use serde_json::Value as Json;
    Some(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt64(u)
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() >= I64_LIMIT {
                    return None;
                }
                Value::Float64(f)
            }
        }
        Json::String(s) => Value::Varchar(s),
        Json::Array(items) => Value::List(
            items
                .into_iter()
                .map(json_value)
                .collect::<Option<Vec<_>>>()?,
        ),
        Json::Object(fields) => Value::Struct(
            fields
                .into_iter()
                .map(|(k, v)| json_value(v).map(|v| (k, v)))
                .collect::<Option<Vec<_>>>()?,
        ),
    })
}

/// Reshapes a generically parsed value tree to the declared type: lists become
/// arrays or maps where the type says so, and scalar leaves get the
/// type-directed text rules.
pub fn conform(value: Value, ty: &LogicalType, options: &MaterializeOptions) -> Value {
    match (value, ty) {
        (Value::Null, _) => Value::Null,
        (Value::List(items) | Value::Array(items), LogicalType::List(child)) => {
            Value::List(items.into_iter().map(|v| conform(v, child, options)).collect())
        }
        (Value::List(items) | Value::Array(items), LogicalType::Array { child, .. }) => {
            Value::Array(items.into_iter().map(|v| conform(v, child, options)).collect())
        }
        (Value::Struct(fields), LogicalType::Struct(declared)) => Value::Struct(
            fields
                .into_iter()
                .map(|(name, v)| {
                    let v = match declared.iter().find(|f| f.name == name) {
                        Some(f) => conform(v, &f.ty, options),
                        None => v,
                    };
                    (name, v)
                })
                .collect(),
        ),
        (Value::Map(entries), LogicalType::Map { key, value }) => {
            let entries = entries
                .into_iter()
                .map(|(k, v)| (conform(k, key, options), conform(v, value, options)));
            Value::Map(collect_map(entries, options.map_duplicate_keys()))
        }
        // `{}` and JSON objects parse as structs; under a map type the field
        // names are the keys.
        (Value::Struct(fields), LogicalType::Map { key, value }) => {
            let entries = fields.into_iter().map(|(k, v)| {
                (
                    conform(Value::Varchar(k), key, options),
                    conform(v, value, options),
                )
            });
            Value::Map(collect_map(entries, options.map_duplicate_keys()))
        }
        (v, ty) if ty.tag().is_nested() => v,
        (Value::Varchar(s), ty) => canonicalize_text(s, ty, options),
        (Value::Int64(i), ty) => conform_integer(i as i128, ty),
        (Value::Int128(i), ty) => conform_integer(i, ty),
        (Value::UInt64(u), ty) => conform_integer(u as i128, ty),
        (Value::Float64(f), LogicalType::Decimal { scale, .. }) => {
            parse_decimal_text(&f.to_string(), Some(*scale))
        }
        (Value::Float64(f), LogicalType::Float) => Value::Float32(f as f32),
        (Value::Bool(b), LogicalType::Varchar) => Value::Varchar(b.to_string()),
        (Value::Float64(f), LogicalType::Varchar) => Value::Varchar(f.to_string()),
        (v, _) => v,
    }
}
