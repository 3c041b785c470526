use columnar_materialize::codec::{decode_snapshot_v1, encode_snapshot_v1_into};
use columnar_materialize::schema::{ColumnDescriptor, StructField, TimestampUnit};
use columnar_materialize::vector::{DataChunk, ListEntry, ValidityBitmap};
use columnar_materialize::{LogicalType, QueryResult, Vector, rows_chunked};
use columnar_materialize::materialize::rows as rows_flat;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

const CHUNK_ROWS: usize = 2_048;

fn make_bars_like_chunk(first: usize, rows: usize) -> DataChunk {
    let pairs: Vec<Option<&str>> = (first..first + rows)
        .map(|i| Some(if (i & 1) == 0 { "BTCUSDT" } else { "ETHUSDT" }))
        .collect();
    let e_ms: Vec<Option<i64>> = (first..first + rows)
        .map(|i| Some(1_700_000_000_000i64 + i as i64 * 60_000))
        .collect();
    let close: Vec<Option<i128>> = (first..first + rows)
        .map(|i| Some(1_000_000 + i as i128 * 25))
        .collect();
    let volume: Vec<Option<f64>> = (first..first + rows)
        .map(|i| Some(100.0 + (i % 10) as f64))
        .collect();

    let mut entries = Vec::with_capacity(rows);
    let mut fills = Vec::new();
    for i in first..first + rows {
        let n = i % 4;
        entries.push(Some(ListEntry::new(fills.len() as u64, n as u64)));
        fills.extend((0..n).map(|j| Some((i * 4 + j) as i64)));
    }
    let fills = Vector::fixed(LogicalType::BigInt, &fills).unwrap();

    let bid: Vec<Option<f64>> = (first..first + rows)
        .map(|i| Some(10_000.0 + i as f64 * 0.25))
        .collect();
    let ask: Vec<Option<f64>> = bid.iter().map(|b| b.map(|b| b + 0.5)).collect();
    let quote = Vector::structure(
        vec![
            (
                "bid".to_string(),
                Vector::fixed(LogicalType::Double, &bid).unwrap(),
            ),
            (
                "ask".to_string(),
                Vector::fixed(LogicalType::Double, &ask).unwrap(),
            ),
        ],
        ValidityBitmap::new_all_valid(rows).unwrap(),
    )
    .unwrap();

    DataChunk::new(vec![
        Vector::strings(&pairs).unwrap(),
        Vector::fixed(LogicalType::Timestamp(TimestampUnit::Millis), &e_ms).unwrap(),
        Vector::decimals(18, 2, &close).unwrap(),
        Vector::fixed(LogicalType::Double, &volume).unwrap(),
        Vector::list(&entries, fills).unwrap(),
        quote,
    ])
    .unwrap()
}

fn make_bars_like_result(rows: usize) -> QueryResult {
    let columns = vec![
        ColumnDescriptor::new("pair", LogicalType::Varchar),
        ColumnDescriptor::new("e_ms", LogicalType::Timestamp(TimestampUnit::Millis)),
        ColumnDescriptor::new("close", LogicalType::decimal(18, 2).unwrap()),
        ColumnDescriptor::new("volume", LogicalType::Double),
        ColumnDescriptor::new("fills", LogicalType::list(LogicalType::BigInt)),
        ColumnDescriptor::new(
            "quote",
            LogicalType::Struct(vec![
                StructField::new("bid", LogicalType::Double),
                StructField::new("ask", LogicalType::Double),
            ]),
        ),
    ];
    let mut chunks = Vec::new();
    let mut first = 0;
    while first < rows {
        let n = CHUNK_ROWS.min(rows - first);
        chunks.push(make_bars_like_chunk(first, n));
        first += n;
    }
    QueryResult::new(columns, chunks).unwrap()
}

fn bench_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize_paths");
    for &rows in &[2_000usize, 100_000usize] {
        let result = make_bars_like_result(rows);

        group.bench_with_input(BenchmarkId::new("chunked", rows), &rows, |b, _| {
            b.iter(|| {
                let out = rows_chunked(black_box(&result)).unwrap();
                black_box(out.len());
            })
        });

        group.bench_with_input(BenchmarkId::new("flat", rows), &rows, |b, _| {
            b.iter(|| {
                let out = rows_flat(black_box(&result)).unwrap();
                black_box(out.len());
            })
        });

        let mut encoded = Vec::new();
        encode_snapshot_v1_into(&result, &mut encoded).unwrap();

        group.bench_with_input(BenchmarkId::new("snapshot_encode", rows), &rows, |b, _| {
            let mut out = Vec::new();
            b.iter(|| {
                encode_snapshot_v1_into(black_box(&result), &mut out).unwrap();
                black_box(out.len());
            })
        });

        group.bench_with_input(BenchmarkId::new("snapshot_decode", rows), &rows, |b, _| {
            b.iter(|| {
                let decoded = decode_snapshot_v1(black_box(encoded.as_slice())).unwrap();
                black_box(decoded.row_count());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_materialize);
criterion_main!(benches);
