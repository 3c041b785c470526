use crate::decode::pack_time_tz;
use crate::error::{DecodeError, DecodeResult};
use crate::legacy::{
    self, CellSource, ENUM_LIMITATION, RawCell, ResultCells, TIMESTAMP_EXTRACTION_FAILED,
    UNSUPPORTED_ARRAY, UNSUPPORTED_LIST, UNSUPPORTED_MAP, UNSUPPORTED_STRUCT, UUID_LIMITATION,
    parse_float_text, raw_rows, uuid_guard_applies,
};
use crate::materialize::rows_with_options;
use crate::options::{MapKeyPolicy, MaterializeOptions};
use crate::schema::{ColumnDescriptor, LogicalType, TimestampUnit};
use crate::value::{Hugeint, Interval, Uhugeint, Value};
use crate::vector::{DataChunk, ListEntry, ValidityBitmap};
use crate::{Error, QueryResult, Vector, rows, rows_chunked};
use uuid::Uuid;

/// Cell source that serves fixed engine text; `None` text means the engine
/// could not render the cell.
struct ScriptedSource {
    columns: Vec<ColumnDescriptor>,
    cells: Vec<Vec<Option<&'static str>>>,
}

impl ScriptedSource {
    fn single(ty: LogicalType, cells: &[Option<&'static str>]) -> Self {
        Self {
            columns: vec![ColumnDescriptor::new("c", ty)],
            cells: cells.iter().map(|c| vec![*c]).collect(),
        }
    }
}

impl CellSource for ScriptedSource {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn row_count(&self) -> usize {
        self.cells.len()
    }

    fn column(&self, column: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(column)
    }

    fn is_null(&self, _column: usize, _row: usize) -> bool {
        false
    }

    fn varchar(&self, column: usize, row: usize) -> DecodeResult<Option<String>> {
        Ok(self.cells[row][column].map(str::to_string))
    }

    fn blob(&self, _column: usize, _row: usize) -> DecodeResult<Option<Vec<u8>>> {
        Ok(None)
    }
}

fn raw_column(ty: LogicalType, cells: &[Option<&'static str>]) -> Vec<RawCell> {
    raw_rows(&ScriptedSource::single(ty, cells))
        .unwrap()
        .into_iter()
        .map(|mut row| row.remove(0))
        .collect()
}

fn uuid_and_int() -> QueryResult {
    let id = Uuid::parse_str("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11").unwrap();
    QueryResult::from_vectors(vec![
        ("id".to_string(), Vector::uuids(&[Some(id), None]).unwrap()),
        (
            "n".to_string(),
            Vector::fixed::<i32>(LogicalType::Integer, &[Some(7), Some(8)]).unwrap(),
        ),
    ])
    .unwrap()
}

#[test]
fn uuid_in_multi_column_result_nulls_the_flat_path() {
    let result = uuid_and_int();
    let options = MaterializeOptions::default();
    assert!(uuid_guard_applies(&ResultCells::new(&result, &options), &options));
    assert_eq!(
        rows(&result).unwrap(),
        vec![vec![Value::Null, Value::Null], vec![Value::Null, Value::Null]]
    );
}

#[test]
fn chunked_path_reads_uuid_in_multi_column_result() {
    let result = uuid_and_int();
    let id = Uuid::parse_str("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11").unwrap();
    assert_eq!(
        rows_chunked(&result).unwrap(),
        vec![
            vec![Value::Uuid(id), Value::Int32(7)],
            vec![Value::Null, Value::Int32(8)],
        ]
    );
}

#[test]
fn uuid_guard_can_be_turned_off() {
    let result = uuid_and_int();
    let mut options = MaterializeOptions::default();
    options.set_uuid_multi_column_guard(false);
    assert!(!uuid_guard_applies(&ResultCells::new(&result, &options), &options));
    assert_eq!(
        rows_with_options(&result, &options).unwrap(),
        rows_chunked(&result).unwrap()
    );
}

#[test]
fn single_uuid_column_reads_through_text() {
    let id = Uuid::parse_str("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11").unwrap();
    let result =
        QueryResult::from_vectors(vec![("id".to_string(), Vector::uuids(&[Some(id)]).unwrap())])
            .unwrap();
    let options = MaterializeOptions::default();
    assert!(!uuid_guard_applies(&ResultCells::new(&result, &options), &options));
    assert_eq!(rows(&result).unwrap(), vec![vec![Value::Uuid(id)]]);
}

#[test]
fn boolean_text_accepts_true_and_one() {
    assert_eq!(
        raw_column(
            LogicalType::Boolean,
            &[Some("true"), Some("1"), Some("false"), Some("0"), None]
        ),
        vec![
            RawCell::Bool(true),
            RawCell::Bool(true),
            RawCell::Bool(false),
            RawCell::Bool(false),
            RawCell::Null,
        ]
    );
}

#[test]
fn integer_text_is_parsed_natively() {
    assert_eq!(
        raw_column(LogicalType::Integer, &[Some("42"), Some("-3"), Some("abc")]),
        vec![
            RawCell::Int(42),
            RawCell::Int(-3),
            RawCell::Text("abc".to_string()),
        ]
    );
    assert_eq!(
        raw_column(LogicalType::UBigInt, &[Some("18446744073709551615")]),
        vec![RawCell::UInt(u64::MAX)]
    );
}

#[test]
fn hugeint_text_at_the_i64_edges_stays_text() {
    assert_eq!(
        raw_column(
            LogicalType::HugeInt,
            &[
                Some("12"),
                Some("9223372036854775807"),
                Some("-9223372036854775808"),
                Some("170141183460469231731687303715884105727"),
            ]
        ),
        vec![
            RawCell::Int(12),
            RawCell::Text("9223372036854775807".to_string()),
            RawCell::Text("-9223372036854775808".to_string()),
            RawCell::Text("170141183460469231731687303715884105727".to_string()),
        ]
    );
    let source = ScriptedSource::single(
        LogicalType::HugeInt,
        &[Some("9223372036854775807"), Some("170141183460469231731687303715884105727")],
    );
    assert_eq!(
        legacy::rows(&source).unwrap(),
        vec![vec![Value::Int64(i64::MAX)], vec![Value::Int128(i128::MAX)]]
    );
}

#[test]
fn float_text_handles_non_finite_spellings() {
    assert!(parse_float_text("nan").unwrap().is_nan());
    assert_eq!(parse_float_text("inf"), Some(f64::INFINITY));
    assert_eq!(parse_float_text("-inf"), Some(f64::NEG_INFINITY));
    assert_eq!(parse_float_text(" 2.5 "), Some(2.5));
    assert_eq!(parse_float_text("x"), None);

    let cells = raw_column(LogicalType::Double, &[Some("-inf"), Some("oops")]);
    assert_eq!(cells[0], RawCell::Float(f64::NEG_INFINITY));
    assert_eq!(cells[1], RawCell::Text("oops".to_string()));
}

#[test]
fn unavailable_text_yields_placeholders() {
    let cases = [
        (LogicalType::list(LogicalType::Integer), UNSUPPORTED_LIST),
        (
            LogicalType::Struct(vec![crate::schema::StructField::new(
                "a",
                LogicalType::Integer,
            )]),
            UNSUPPORTED_STRUCT,
        ),
        (
            LogicalType::map(LogicalType::Varchar, LogicalType::Integer),
            UNSUPPORTED_MAP,
        ),
        (LogicalType::array(LogicalType::Integer, 2), UNSUPPORTED_ARRAY),
        (LogicalType::enumeration(["a"]).unwrap(), ENUM_LIMITATION),
        (
            LogicalType::Timestamp(TimestampUnit::Millis),
            TIMESTAMP_EXTRACTION_FAILED,
        ),
        (LogicalType::TimestampTz, TIMESTAMP_EXTRACTION_FAILED),
        (LogicalType::Uuid, UUID_LIMITATION),
    ];
    for (ty, placeholder) in cases {
        let source = ScriptedSource::single(ty.clone(), &[None, Some("")]);
        let cells = raw_rows(&source).unwrap();
        assert_eq!(cells[0][0], RawCell::Text(placeholder.to_string()), "{}", ty.tag());
        assert!(cells[1][0].is_placeholder());
        assert_eq!(
            legacy::rows(&source).unwrap()[0][0],
            Value::Varchar(placeholder.to_string())
        );
    }
}

#[test]
fn other_types_without_text_are_null() {
    assert_eq!(
        raw_column(LogicalType::Date, &[None, Some(""), Some("NULL"), Some("2024-02-29")]),
        vec![
            RawCell::Null,
            RawCell::Null,
            RawCell::Null,
            RawCell::Text("2024-02-29".to_string()),
        ]
    );
    assert_eq!(raw_column(LogicalType::Varchar, &[None]), vec![RawCell::Null]);
}

#[test]
fn blob_without_bytes_is_empty() {
    assert_eq!(
        raw_column(LogicalType::Blob, &[Some("ignored")]),
        vec![RawCell::Bytes(Vec::new())]
    );
}

#[test]
fn flat_path_matches_chunked_path_for_supported_types() {
    let noon = 12 * 3_600 * 1_000_000;
    let child = Vector::fixed::<i32>(LogicalType::Integer, &[Some(1), Some(2), Some(3)]).unwrap();
    let list = Vector::list(&[Some(ListEntry::new(0, 3)), None], child).unwrap();
    let st = Vector::structure(
        vec![
            (
                "a".to_string(),
                Vector::fixed::<i32>(LogicalType::Integer, &[Some(1), None]).unwrap(),
            ),
            (
                "b".to_string(),
                Vector::strings(&[Some("x"), Some("y")]).unwrap(),
            ),
        ],
        ValidityBitmap::new_all_valid(2).unwrap(),
    )
    .unwrap();
    let map = Vector::map(
        &[Some(ListEntry::new(0, 3)), Some(ListEntry::new(3, 0))],
        Vector::strings(&[Some("a"), Some("b"), Some("a")]).unwrap(),
        Vector::fixed::<i32>(LogicalType::Integer, &[Some(1), Some(2), Some(3)]).unwrap(),
    )
    .unwrap();
    let array = Vector::array(
        2,
        ValidityBitmap::new_all_valid(2).unwrap(),
        Vector::fixed::<i64>(LogicalType::BigInt, &[Some(1), Some(2), None, Some(4)]).unwrap(),
    )
    .unwrap();

    let result = QueryResult::from_vectors(vec![
        ("bool".to_string(), Vector::booleans(&[Some(true), None]).unwrap()),
        (
            "tiny".to_string(),
            Vector::fixed::<i8>(LogicalType::TinyInt, &[Some(-5), None]).unwrap(),
        ),
        (
            "ubig".to_string(),
            Vector::fixed::<u64>(LogicalType::UBigInt, &[Some(u64::MAX), None]).unwrap(),
        ),
        (
            "huge".to_string(),
            Vector::fixed(
                LogicalType::HugeInt,
                &[Some(Hugeint::new(1, 0)), Some(Hugeint::new(0, 7))],
            )
            .unwrap(),
        ),
        (
            "uhuge".to_string(),
            Vector::fixed(LogicalType::UHugeInt, &[Some(Uhugeint::new(1, 0)), None]).unwrap(),
        ),
        (
            "real".to_string(),
            Vector::fixed::<f32>(LogicalType::Float, &[Some(1.5), None]).unwrap(),
        ),
        (
            "amount".to_string(),
            Vector::decimals(10, 3, &[Some(1_500), None]).unwrap(),
        ),
        (
            "text".to_string(),
            Vector::strings(&[Some("it's"), None]).unwrap(),
        ),
        (
            "day".to_string(),
            Vector::fixed::<i32>(LogicalType::Date, &[Some(19_723), Some(i32::MAX)]).unwrap(),
        ),
        (
            "clock".to_string(),
            Vector::fixed::<i64>(LogicalType::Time, &[Some(45_296_789_000), None]).unwrap(),
        ),
        (
            "clock_tz".to_string(),
            Vector::fixed::<u64>(LogicalType::TimeTz, &[Some(pack_time_tz(noon, -19_800)), None])
                .unwrap(),
        ),
        (
            "at".to_string(),
            Vector::fixed::<i64>(
                LogicalType::Timestamp(TimestampUnit::Micros),
                &[Some(1_700_000_000_123_456), None],
            )
            .unwrap(),
        ),
        (
            "at_tz".to_string(),
            Vector::fixed::<i64>(LogicalType::TimestampTz, &[Some(1_700_000_000_000_000), None])
                .unwrap(),
        ),
        (
            "span".to_string(),
            Vector::fixed(LogicalType::Interval, &[Some(Interval::new(1, 2, 3_000_000)), None])
                .unwrap(),
        ),
        (
            "mood".to_string(),
            Vector::enums(["a", "b"], &[Some(1), None]).unwrap(),
        ),
        (
            "raw".to_string(),
            Vector::varlen(LogicalType::Blob, &[Some(vec![1u8, 2]), None]).unwrap(),
        ),
        (
            "bits".to_string(),
            Vector::varlen(LogicalType::Bit, &[Some(vec![4u8, 0b1111_1010]), None]).unwrap(),
        ),
        ("list".to_string(), list),
        ("struct".to_string(), st),
        ("map".to_string(), map),
        ("array".to_string(), array),
    ])
    .unwrap();

    let chunked = rows_chunked(&result).unwrap();
    let flat = rows(&result).unwrap();
    assert_eq!(flat.len(), chunked.len());
    for (row, (f, c)) in flat.iter().zip(&chunked).enumerate() {
        for (col, (fv, cv)) in f.iter().zip(c).enumerate() {
            assert_eq!(fv, cv, "row {row} column {}", result.columns()[col].name);
        }
    }
}

#[test]
fn union_reads_as_member_text_on_the_flat_path() {
    let union = Vector::union(
        vec![(
            "n".to_string(),
            Vector::fixed::<i32>(LogicalType::Integer, &[Some(5)]).unwrap(),
        )],
        &[Some(0)],
    )
    .unwrap();
    let result = QueryResult::from_vectors(vec![("u".to_string(), union)]).unwrap();
    assert_eq!(rows(&result).unwrap(), vec![vec![Value::Varchar("5".to_string())]]);
}

#[test]
fn corrupt_list_fails_the_flat_path_like_the_chunked_path() {
    let child = Vector::fixed::<i32>(LogicalType::Integer, &[Some(1)]).unwrap();
    let list = Vector::list(&[Some(ListEntry::new(0, 4))], child).unwrap();
    let result = QueryResult::from_vectors(vec![("xs".to_string(), list)]).unwrap();

    let expected = Error::Decode(DecodeError::ChildOutOfRange {
        start: 0,
        end: 4,
        len: 1,
    });
    assert_eq!(rows_chunked(&result).unwrap_err(), expected);
    assert_eq!(rows(&result).unwrap_err(), expected);
}

#[test]
fn flat_path_honours_keep_all_map_keys() {
    let map = Vector::map(
        &[Some(ListEntry::new(0, 3))],
        Vector::strings(&[Some("a"), Some("b"), Some("a")]).unwrap(),
        Vector::fixed::<i32>(LogicalType::Integer, &[Some(1), Some(2), Some(3)]).unwrap(),
    )
    .unwrap();
    let result = QueryResult::from_vectors(vec![("m".to_string(), map)]).unwrap();
    let mut options = MaterializeOptions::default();
    options.set_map_duplicate_keys(MapKeyPolicy::KeepAll);

    let flat = rows_with_options(&result, &options).unwrap();
    assert_eq!(
        flat,
        vec![vec![Value::Map(vec![
            (Value::Varchar("a".to_string()), Value::Int32(1)),
            (Value::Varchar("b".to_string()), Value::Int32(2)),
            (Value::Varchar("a".to_string()), Value::Int32(3)),
        ])]]
    );
    assert_eq!(flat, crate::materialize::rows_chunked_with_options(&result, &options).unwrap());
}

#[test]
fn flat_path_walks_many_chunks_in_order() {
    let ty = LogicalType::BigInt;
    let mut chunks = Vec::new();
    let mut next = 0i64;
    for len in [2_048usize, 0, 7, 2_048, 1] {
        let values: Vec<Option<i64>> = (0..len as i64).map(|i| Some(next + i)).collect();
        next += len as i64;
        chunks.push(DataChunk::new(vec![Vector::fixed(ty.clone(), &values).unwrap()]).unwrap());
    }
    let result = QueryResult::new(vec![ColumnDescriptor::new("n", ty)], chunks).unwrap();

    let flat = rows(&result).unwrap();
    assert_eq!(flat.len(), 4_104);
    for (i, row) in flat.iter().enumerate() {
        assert_eq!(row, &vec![Value::Int64(i as i64)]);
    }
}
