//! Recursive-descent grammar for the engine's bracket/brace text.
//!
//! ```text
//! value   := list | braces | quoted | literal
//! list    := '[' (value (',' value)*)? ']'
//! braces  := '{' (entry (',' entry)*)? '}'
//! entry   := value ':' value        (struct field)
//!          | value '=' value        (map entry)
//! quoted  := '\'' ... '\'' | '"' ... '"'   (a doubled quote is a literal quote)
//! literal := NULL | null | nil | true | false | integer | float | bare text
//! ```
//!
//! Separators are only recognised at nesting depth zero and outside quotes.
//! A brace body whose entries use `:` is a struct, one using `=` is a map.

use crate::value::Value;

/// Parses bracket/brace text. `None` when the text is not a list or brace
/// body, or when brackets or quotes are unbalanced.
pub fn parse(text: &str) -> Option<Value> {
    let t = text.trim();
    if !(t.starts_with('[') || t.starts_with('{')) {
        return None;
    }
    parse_value(t)
}

/// Parses one element. Scalars never fail; bare text falls back to a string.
pub fn parse_value(text: &str) -> Option<Value> {
    let t = text.trim();
    if let Some(inner) = t.strip_prefix('[') {
        let inner = inner.strip_suffix(']')?;
        let items = split_top_level(inner, ',')?
            .into_iter()
            .map(parse_value)
            .collect::<Option<Vec<_>>>()?;
        return Some(Value::List(items));
    }
    if let Some(inner) = t.strip_prefix('{') {
        return parse_braces(inner.strip_suffix('}')?);
    }
    Some(parse_scalar(t))
}

fn parse_braces(inner: &str) -> Option<Value> {
    let entries = split_top_level(inner, ',')?;
    if entries.is_empty() {
        return Some(Value::Struct(Vec::new()));
    }
    let mut fields = Vec::with_capacity(entries.len());
    let mut pairs = Vec::with_capacity(entries.len());
    for entry in entries {
        let (at, sep) = find_top_level(entry, &[':', '='])?;
        let (key, value) = (&entry[..at], &entry[at + 1..]);
        let value = parse_value(value)?;
        match sep {
            ':' => fields.push((field_name(key), value)),
            _ => pairs.push((parse_value(key)?, value)),
        }
    }
    match (fields.is_empty(), pairs.is_empty()) {
        (false, true) => Some(Value::Struct(fields)),
        (true, false) => Some(Value::Map(pairs)),
        _ => None,
    }
}

fn field_name(key: &str) -> String {
    let k = key.trim();
    unquote(k).unwrap_or_else(|| k.to_string())
}

fn parse_scalar(t: &str) -> Value {
    if let Some(s) = unquote(t) {
        return Value::Varchar(s);
    }
    match t {
        "NULL" | "null" | "nil" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if is_integer(t) {
        if let Ok(v) = t.parse::<i64>() {
            return Value::Int64(v);
        }
        if let Ok(v) = t.parse::<i128>() {
            return Value::Int128(v);
        }
    }
    if is_float(t) {
        if let Ok(v) = t.parse::<f64>() {
            return Value::Float64(v);
        }
    }
    Value::Varchar(t.to_string())
}

/// `[+-]?[0-9]+`
fn is_integer(t: &str) -> bool {
    let digits = t.strip_prefix(['+', '-']).unwrap_or(t);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `[+-]?([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?` or an integer with an
/// exponent.
fn is_float(t: &str) -> bool {
    let body = t.strip_prefix(['+', '-']).unwrap_or(t);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], Some(&body[at + 1..])),
        None => (body, None),
    };
    if let Some(exp) = exponent {
        if !is_integer(exp) {
            return false;
        }
    }
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (mantissa, None),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    match frac_part {
        Some(f) => all_digits(int_part) && all_digits(f) && !(int_part.is_empty() && f.is_empty()),
        None => exponent.is_some() && !int_part.is_empty() && all_digits(int_part),
    }
}

/// Strips matching outer quotes and collapses doubled inner quotes.
fn unquote(t: &str) -> Option<String> {
    let quote = t.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    if t.len() < 2 || !t.ends_with(quote) {
        return None;
    }
    let inner = &t[1..t.len() - 1];
    let doubled: String = [quote, quote].iter().collect();
    Some(inner.replace(&doubled, &quote.to_string()))
}

/// Splits `text` on `sep` at depth zero outside quotes. Empty or
/// whitespace-only input yields no pieces. `None` on unbalanced input.
pub fn split_top_level(text: &str, sep: char) -> Option<Vec<&str>> {
    if text.trim().is_empty() {
        return Some(Vec::new());
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut scanner = Scanner::default();
    for (i, c) in text.char_indices() {
        if scanner.at_top_level() && c == sep {
            pieces.push(&text[start..i]);
            start = i + c.len_utf8();
            continue;
        }
        scanner.step(c)?;
    }
    if !scanner.balanced() {
        return None;
    }
    pieces.push(&text[start..]);
    Some(pieces)
}

/// First separator from `seps` at depth zero outside quotes, with its byte
/// offset.
fn find_top_level(text: &str, seps: &[char]) -> Option<(usize, char)> {
    let mut scanner = Scanner::default();
    for (i, c) in text.char_indices() {
        if scanner.at_top_level() && seps.contains(&c) {
            return Some((i, c));
        }
        scanner.step(c)?;
    }
    None
}

#[derive(Default)]
struct Scanner {
    depth: usize,
    quote: Option<char>,
}

impl Scanner {
    fn at_top_level(&self) -> bool {
        self.depth == 0 && self.quote.is_none()
    }

    fn balanced(&self) -> bool {
        self.at_top_level()
    }

    /// A doubled quote closes and reopens the string, which leaves the state
    /// where it was.
    fn step(&mut self, c: char) -> Option<()> {
        match (self.quote, c) {
            (Some(q), c) if c == q => self.quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => self.quote = Some(c),
            (None, '[' | '{') => self.depth += 1,
            (None, ']' | '}') => self.depth = self.depth.checked_sub(1)?,
            (None, _) => {}
        }
        Some(())
    }
}
