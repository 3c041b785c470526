use crate::canonical::bracket::{parse, parse_value, split_top_level};
use crate::value::Value;

fn s(v: &str) -> Value {
    Value::Varchar(v.to_string())
}

#[test]
fn split_respects_nesting_and_quotes() {
    assert_eq!(
        split_top_level("1, [2, 3], {'a': 4}", ',').unwrap(),
        vec!["1", " [2, 3]", " {'a': 4}"]
    );
    assert_eq!(
        split_top_level("'a,b', \"c,d\"", ',').unwrap(),
        vec!["'a,b'", " \"c,d\""]
    );
    assert_eq!(split_top_level("it''s, x", ',').unwrap(), vec!["it''s", " x"]);
}

#[test]
fn split_of_blank_input_is_empty() {
    assert!(split_top_level("", ',').unwrap().is_empty());
    assert!(split_top_level("   ", ',').unwrap().is_empty());
}

#[test]
fn split_rejects_unbalanced_input() {
    assert!(split_top_level("[1, 2", ',').is_none());
    assert!(split_top_level("1], 2", ',').is_none());
    assert!(split_top_level("'open, 2", ',').is_none());
}

#[test]
fn scalars() {
    assert_eq!(parse_value("42").unwrap(), Value::Int64(42));
    assert_eq!(parse_value("-7").unwrap(), Value::Int64(-7));
    assert_eq!(
        parse_value("-170141183460469231731687303715884105728").unwrap(),
        Value::Int128(i128::MIN)
    );
    assert_eq!(parse_value("2.5").unwrap(), Value::Float64(2.5));
    assert_eq!(parse_value("1e3").unwrap(), Value::Float64(1000.0));
    assert_eq!(parse_value(".5").unwrap(), Value::Float64(0.5));
    assert_eq!(parse_value("true").unwrap(), Value::Bool(true));
    assert_eq!(parse_value("false").unwrap(), Value::Bool(false));
    for null in ["NULL", "null", "nil"] {
        assert_eq!(parse_value(null).unwrap(), Value::Null);
    }
    assert_eq!(parse_value("abc").unwrap(), s("abc"));
    assert_eq!(parse_value("1.2.3").unwrap(), s("1.2.3"));
    assert_eq!(parse_value("2024-01-01").unwrap(), s("2024-01-01"));
}

#[test]
fn quoted_strings_unescape_doubled_quotes() {
    assert_eq!(parse_value("'it''s'").unwrap(), s("it's"));
    assert_eq!(parse_value("\"say \"\"hi\"\"\"").unwrap(), s("say \"hi\""));
    assert_eq!(parse_value("'NULL'").unwrap(), s("NULL"));
    assert_eq!(parse_value("'42'").unwrap(), s("42"));
}

#[test]
fn lists() {
    assert_eq!(parse("[]").unwrap(), Value::List(Vec::new()));
    assert_eq!(
        parse("[1, 'a', NULL]").unwrap(),
        Value::List(vec![Value::Int64(1), s("a"), Value::Null])
    );
    assert_eq!(
        parse(" [[1], [], [2, 3]] ").unwrap(),
        Value::List(vec![
            Value::List(vec![Value::Int64(1)]),
            Value::List(Vec::new()),
            Value::List(vec![Value::Int64(2), Value::Int64(3)]),
        ])
    );
}

#[test]
fn struct_braces() {
    assert_eq!(
        parse("{'a': 1, b: [x, y]}").unwrap(),
        Value::Struct(vec![
            ("a".to_string(), Value::Int64(1)),
            ("b".to_string(), Value::List(vec![s("x"), s("y")])),
        ])
    );
    assert_eq!(parse("{}").unwrap(), Value::Struct(Vec::new()));
}

#[test]
fn struct_value_may_contain_colons() {
    assert_eq!(
        parse("{'t': 12:30:00}").unwrap(),
        Value::Struct(vec![("t".to_string(), s("12:30:00"))])
    );
}

#[test]
fn map_braces() {
    assert_eq!(
        parse("{'k'=1, 2=[3]}").unwrap(),
        Value::Map(vec![
            (s("k"), Value::Int64(1)),
            (Value::Int64(2), Value::List(vec![Value::Int64(3)])),
        ])
    );
}

#[test]
fn mixed_separators_are_rejected() {
    assert!(parse("{a: 1, b=2}").is_none());
}

#[test]
fn entries_without_separator_are_rejected() {
    assert!(parse("{a, b}").is_none());
}

#[test]
fn parse_requires_an_opening_bracket() {
    assert!(parse("1, 2").is_none());
    assert!(parse("'[1]'").is_none());
    assert!(parse("[1, 2").is_none());
    assert!(parse("{'a': 1").is_none());
}
