use crate::error::DecodeError;
use crate::materialize::{chunk_rows, rows_chunked_with_options};
use crate::options::{MapKeyPolicy, MaterializeOptions};
use crate::schema::{ColumnDescriptor, LogicalType};
use crate::value::{Decimal, Value};
use crate::vector::{DataChunk, ListEntry, ValidityBitmap, VectorData};
use crate::{Error, QueryResult, Vector, chunk_count, columns, get_chunk, rows_chunked};

fn two_chunk_result() -> QueryResult {
    let cols = vec![
        ColumnDescriptor::new("id", LogicalType::Integer),
        ColumnDescriptor::new("name", LogicalType::Varchar),
    ];
    let first = DataChunk::new(vec![
        Vector::fixed::<i32>(LogicalType::Integer, &[Some(1), Some(2)]).unwrap(),
        Vector::strings(&[Some("a"), None]).unwrap(),
    ])
    .unwrap();
    let second = DataChunk::new(vec![
        Vector::fixed::<i32>(LogicalType::Integer, &[Some(3)]).unwrap(),
        Vector::strings(&[Some("c")]).unwrap(),
    ])
    .unwrap();
    QueryResult::new(cols, vec![first, second]).unwrap()
}

#[test]
fn rows_span_chunks_in_order() {
    let result = two_chunk_result();
    assert_eq!(chunk_count(&result), 2);
    assert_eq!(
        rows_chunked(&result).unwrap(),
        vec![
            vec![Value::Int32(1), Value::Varchar("a".to_string())],
            vec![Value::Int32(2), Value::Null],
            vec![Value::Int32(3), Value::Varchar("c".to_string())],
        ]
    );
}

#[test]
fn columns_report_names_and_types() {
    let result = two_chunk_result();
    let cols = columns(&result);
    assert_eq!(cols.len(), 2);
    assert_eq!(cols[0].name, "id");
    assert_eq!(cols[1].ty, LogicalType::Varchar);
}

#[test]
fn get_chunk_returns_handles_by_index() {
    let result = two_chunk_result();
    let handle = get_chunk(&result, 1).unwrap();
    assert_eq!(handle.index(), 1);
    assert_eq!(handle.row_count(), 1);
    assert!(get_chunk(&result, 2).is_none());

    let rows = chunk_rows(handle.get(), columns(&result), &MaterializeOptions::default()).unwrap();
    assert_eq!(
        rows,
        vec![vec![Value::Int32(3), Value::Varchar("c".to_string())]]
    );
}

#[test]
fn result_without_chunks_has_no_rows() {
    let result = QueryResult::new(
        vec![ColumnDescriptor::new("x", LogicalType::BigInt)],
        Vec::new(),
    )
    .unwrap();
    assert_eq!(chunk_count(&result), 0);
    assert!(rows_chunked(&result).unwrap().is_empty());
}

#[test]
fn unsupported_column_becomes_placeholder() {
    let unknown = Vector::new(
        LogicalType::Unknown,
        2,
        ValidityBitmap::new_all_valid(2).unwrap(),
        VectorData::None,
        Vec::new(),
    )
    .unwrap();
    let ids = Vector::fixed::<i64>(LogicalType::BigInt, &[Some(10), Some(11)]).unwrap();
    let result =
        QueryResult::from_vectors(vec![("id".to_string(), ids), ("odd".to_string(), unknown)])
            .unwrap();
    let rows = rows_chunked(&result).unwrap();
    assert_eq!(
        rows[1],
        vec![
            Value::Int64(11),
            Value::Varchar("<unsupported_unknown_type>".to_string()),
        ]
    );
    assert!(rows[0][1].is_placeholder());
}

#[test]
fn structural_errors_propagate() {
    let child = Vector::fixed::<i32>(LogicalType::Integer, &[Some(1)]).unwrap();
    let list = Vector::list(&[Some(ListEntry::new(0, 4))], child).unwrap();
    let result = QueryResult::from_vectors(vec![("l".to_string(), list)]).unwrap();
    assert_eq!(
        rows_chunked(&result).unwrap_err(),
        Error::Decode(DecodeError::ChildOutOfRange {
            start: 0,
            end: 4,
            len: 1
        })
    );
}

#[test]
fn chunk_with_wrong_column_count_is_rejected() {
    let result = two_chunk_result();
    let chunk = result.chunk(0).unwrap();
    let err = chunk_rows(chunk.get(), &columns(&result)[..1], &MaterializeOptions::default())
        .unwrap_err();
    assert_eq!(
        err,
        Error::Other("chunk has 2 vectors for 1 columns".to_string())
    );
}

#[test]
fn nested_and_exact_values_survive_materialization() {
    let items = Vector::decimals(10, 3, &[Some(1_500), Some(-2), Some(0)]).unwrap();
    let list = Vector::list(&[Some(ListEntry::new(0, 2)), Some(ListEntry::new(2, 1))], items)
        .unwrap();
    let keys = Vector::strings(&[Some("k"), Some("k")]).unwrap();
    let values = Vector::fixed::<i64>(LogicalType::BigInt, &[Some(1), Some(2)]).unwrap();
    let map = Vector::map(&[Some(ListEntry::new(0, 2)), None], keys, values).unwrap();
    let result = QueryResult::from_vectors(vec![
        ("amounts".to_string(), list),
        ("tags".to_string(), map),
    ])
    .unwrap();

    let mut options = MaterializeOptions::default();
    options.set_map_duplicate_keys(MapKeyPolicy::KeepAll);
    let rows = rows_chunked_with_options(&result, &options).unwrap();
    assert_eq!(
        rows[0][0],
        Value::List(vec![
            Value::Decimal(Decimal::new(1_500, 3)),
            Value::Decimal(Decimal::new(-2, 3)),
        ])
    );
    assert_eq!(rows[0][0].to_string(), "[1.500, -0.002]");
    assert_eq!(
        rows[0][1],
        Value::Map(vec![
            (Value::Varchar("k".to_string()), Value::Int64(1)),
            (Value::Varchar("k".to_string()), Value::Int64(2)),
        ])
    );
    assert_eq!(rows[1][1], Value::Null);

    let default_rows = rows_chunked(&result).unwrap();
    assert_eq!(
        default_rows[0][1],
        Value::Map(vec![(Value::Varchar("k".to_string()), Value::Int64(2))])
    );
}

#[test]
fn calendar_overflow_stays_in_its_cell() {
    let days = Vector::fixed::<i32>(LogicalType::Date, &[Some(0), Some(100_000_000)]).unwrap();
    let ns = Vector::fixed::<i32>(LogicalType::Integer, &[Some(1), Some(2)]).unwrap();
    let clock = Vector::fixed::<i64>(LogicalType::Time, &[Some(0), Some(86_400_000_000)]).unwrap();
    let result = QueryResult::from_vectors(vec![
        ("day".to_string(), days),
        ("n".to_string(), ns),
        ("clock".to_string(), clock),
    ])
    .unwrap();

    let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let midnight = chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap();
    let expected = vec![
        vec![Value::Date(epoch), Value::Int32(1), Value::Time(midnight)],
        vec![
            Value::Varchar("<date_extraction_failed>".to_string()),
            Value::Int32(2),
            Value::Varchar("24:00:00".to_string()),
        ],
    ];
    assert_eq!(rows_chunked(&result).unwrap(), expected);
    assert_eq!(crate::rows(&result).unwrap(), expected);
}

#[test]
fn calendar_overflow_inside_a_list_keeps_its_siblings() {
    let child = Vector::fixed::<i32>(LogicalType::Date, &[Some(1), Some(100_000_000)]).unwrap();
    let list = Vector::list(&[Some(ListEntry::new(0, 2))], child).unwrap();
    let result = QueryResult::from_vectors(vec![("days".to_string(), list)]).unwrap();

    let rows = rows_chunked(&result).unwrap();
    assert_eq!(
        rows,
        vec![vec![Value::List(vec![
            Value::Date(chrono::NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()),
            Value::Varchar("<date_extraction_failed>".to_string()),
        ])]]
    );
}
