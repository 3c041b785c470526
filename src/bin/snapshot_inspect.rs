use clap::Parser;
use columnar_materialize::codec::{
    decode_snapshot_v1, decode_snapshot_v1_compressed, is_snapshot_envelope,
};
use columnar_materialize::materialize::{rows_chunked_with_options, rows_with_options};
use columnar_materialize::{MapKeyPolicy, MaterializeOptions, QueryResult, Row};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "snapshot_inspect",
    about = "Print the columns and rows of a CMATSNAP result snapshot as JSON lines"
)]
struct Cli {
    /// Snapshot file to read, bare or inside a compression envelope.
    path: PathBuf,

    /// Refuse snapshots that decompress to more than this many bytes.
    #[arg(long, default_value_t = 256 * 1024 * 1024)]
    max_uncompressed_len: usize,

    /// Materialize through the flat single-cell path instead of chunks.
    #[arg(long)]
    flat: bool,

    /// Keep every map entry when keys repeat.
    #[arg(long)]
    keep_duplicate_map_keys: bool,

    /// Turn off the flat path's uuid multi-column guard.
    #[arg(long)]
    no_uuid_guard: bool,

    /// Only print the column descriptors.
    #[arg(long)]
    columns_only: bool,
}

fn load(cli: &Cli) -> columnar_materialize::Result<QueryResult> {
    let bytes = std::fs::read(&cli.path)
        .map_err(|e| columnar_materialize::Error::Other(format!("{}: {e}", cli.path.display())))?;
    if is_snapshot_envelope(&bytes) {
        return decode_snapshot_v1_compressed(&bytes, cli.max_uncompressed_len);
    }
    if bytes.len() > cli.max_uncompressed_len {
        return Err(columnar_materialize::Error::Other(
            "decompressed snapshot exceeds max_uncompressed_len".to_string(),
        ));
    }
    decode_snapshot_v1(&bytes)
}

fn row_json(row: &Row) -> serde_json::Value {
    serde_json::Value::Array(row.iter().map(|v| v.to_json()).collect())
}

fn run(cli: &Cli) -> columnar_materialize::Result<()> {
    let result = load(cli)?;
    tracing::info!(
        columns = result.column_count(),
        rows = result.row_count(),
        chunks = result.chunk_count(),
        "loaded snapshot"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let io_err = |e: std::io::Error| columnar_materialize::Error::Other(e.to_string());

    let columns = serde_json::to_string(result.columns())
        .map_err(|e| columnar_materialize::Error::Other(e.to_string()))?;
    writeln!(out, "{columns}").map_err(io_err)?;
    if cli.columns_only {
        return Ok(());
    }

    let mut options = MaterializeOptions::default();
    options.set_uuid_multi_column_guard(!cli.no_uuid_guard);
    if cli.keep_duplicate_map_keys {
        options.set_map_duplicate_keys(MapKeyPolicy::KeepAll);
    }

    let rows = if cli.flat {
        rows_with_options(&result, &options)?
    } else {
        rows_chunked_with_options(&result, &options)?
    };
    for row in &rows {
        writeln!(out, "{}", row_json(row)).map_err(io_err)?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
