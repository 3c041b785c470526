//! Compression envelope around a `CMATSNAP` snapshot.
//!
//! ```text
//! envelope := magic[8]="CMATSNPZ" codec:u8 plain_len:u64 payload
//! ```
//!
//! `codec` is 0 (stored), 1 (zstd) or 2 (gzip). `plain_len` is checked
//! against the caller's bound before anything is inflated, and the inflated
//! payload must match it exactly.

use crate::codec::snapshot_v1::{decode_snapshot_v1, encode_snapshot_v1_into};
use crate::vector::QueryResult;
use crate::{Error, Result};

const ENVELOPE_MAGIC: &[u8; 8] = b"CMATSNPZ";

const CODEC_STORED: u8 = 0;
const CODEC_ZSTD: u8 = 1;
const CODEC_GZIP: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Zstd { level: i32 },
    Gzip { level: u32 },
}

impl Compression {
    fn codec(self) -> u8 {
        match self {
            Compression::None => CODEC_STORED,
            Compression::Zstd { .. } => CODEC_ZSTD,
            Compression::Gzip { .. } => CODEC_GZIP,
        }
    }
}

/// Reusable scratch buffer for the uncompressed snapshot bytes.
#[derive(Debug, Default, Clone)]
pub struct SnapshotCompressedWorkspace {
    plain: Vec<u8>,
}

/// True when `bytes` start with the envelope magic rather than a bare
/// snapshot.
pub fn is_snapshot_envelope(bytes: &[u8]) -> bool {
    bytes.starts_with(ENVELOPE_MAGIC)
}

#[cfg(not(all(feature = "compression-zstd", feature = "compression-gzip")))]
fn feature_disabled(name: &str) -> Error {
    Error::Other(format!("{name} compression feature not enabled"))
}

fn exceeds_bound() -> Error {
    Error::Other("decompressed snapshot exceeds max_uncompressed_len".to_string())
}

#[cfg(any(feature = "compression-zstd", feature = "compression-gzip"))]
fn io_error(e: std::io::Error) -> Error {
    Error::Other(e.to_string())
}

fn deflate(c: Compression, plain: &[u8], out: &mut Vec<u8>) -> Result<()> {
    match c {
        Compression::None => {
            out.extend_from_slice(plain);
            Ok(())
        }
        #[cfg(feature = "compression-zstd")]
        Compression::Zstd { level } => {
            if !(-7..=22).contains(&level) {
                return Err(Error::Other("invalid zstd level".to_string()));
            }
            zstd::stream::copy_encode(plain, &mut *out, level).map_err(io_error)
        }
        #[cfg(not(feature = "compression-zstd"))]
        Compression::Zstd { .. } => Err(feature_disabled("zstd")),
        #[cfg(feature = "compression-gzip")]
        Compression::Gzip { level } => {
            use std::io::Write;
            if level > 9 {
                return Err(Error::Other("invalid gzip level".to_string()));
            }
            // mtime pinned so equal results give equal bytes
            let mut enc = flate2::GzBuilder::new()
                .mtime(0)
                .write(&mut *out, flate2::Compression::new(level));
            enc.write_all(plain).map_err(io_error)?;
            enc.finish().map_err(io_error)?;
            Ok(())
        }
        #[cfg(not(feature = "compression-gzip"))]
        Compression::Gzip { .. } => Err(feature_disabled("gzip")),
    }
}

#[cfg(any(feature = "compression-zstd", feature = "compression-gzip"))]
fn read_bounded<R: std::io::Read>(reader: R, plain_len: usize, out: &mut Vec<u8>) -> Result<()> {
    use std::io::Read;
    reader
        .take((plain_len as u64).saturating_add(1))
        .read_to_end(out)
        .map_err(io_error)?;
    Ok(())
}

fn inflate(codec: u8, payload: &[u8], plain_len: usize, out: &mut Vec<u8>) -> Result<()> {
    out.clear();
    match codec {
        #[cfg(feature = "compression-zstd")]
        CODEC_ZSTD => {
            let dec = zstd::stream::read::Decoder::new(payload).map_err(io_error)?;
            read_bounded(dec, plain_len, out)?;
        }
        #[cfg(not(feature = "compression-zstd"))]
        CODEC_ZSTD => return Err(feature_disabled("zstd")),
        #[cfg(feature = "compression-gzip")]
        CODEC_GZIP => read_bounded(flate2::read::GzDecoder::new(payload), plain_len, out)?,
        #[cfg(not(feature = "compression-gzip"))]
        CODEC_GZIP => return Err(feature_disabled("gzip")),
        other => return Err(Error::Other(format!("unknown snapshot codec: {other}"))),
    }
    if out.len() != plain_len {
        return Err(Error::Other(
            "snapshot length does not match envelope".to_string(),
        ));
    }
    Ok(())
}

pub fn encode_snapshot_v1_compressed_into(
    result: &QueryResult,
    out: &mut Vec<u8>,
    c: Compression,
) -> Result<()> {
    let mut ws = SnapshotCompressedWorkspace::default();
    encode_snapshot_v1_compressed_into_with_workspace(result, out, c, &mut ws)
}

pub fn encode_snapshot_v1_compressed_into_with_workspace(
    result: &QueryResult,
    out: &mut Vec<u8>,
    c: Compression,
    ws: &mut SnapshotCompressedWorkspace,
) -> Result<()> {
    encode_snapshot_v1_into(result, &mut ws.plain)?;
    out.clear();
    out.extend_from_slice(ENVELOPE_MAGIC);
    out.push(c.codec());
    out.extend_from_slice(&(ws.plain.len() as u64).to_le_bytes());
    deflate(c, &ws.plain, out)
}

/// Decodes an envelope of any codec. Payloads declaring or inflating to more
/// than `max_uncompressed_len` bytes are rejected before they are parsed.
pub fn decode_snapshot_v1_compressed(
    bytes: &[u8],
    max_uncompressed_len: usize,
) -> Result<QueryResult> {
    let mut ws = SnapshotCompressedWorkspace::default();
    decode_snapshot_v1_compressed_with_workspace(bytes, max_uncompressed_len, &mut ws)
}

pub fn decode_snapshot_v1_compressed_with_workspace(
    bytes: &[u8],
    max_uncompressed_len: usize,
    ws: &mut SnapshotCompressedWorkspace,
) -> Result<QueryResult> {
    let rest = bytes
        .strip_prefix(ENVELOPE_MAGIC.as_slice())
        .ok_or_else(|| Error::Other("invalid envelope magic".to_string()))?;
    let (&codec, rest) = rest
        .split_first()
        .ok_or_else(|| Error::Other("truncated envelope".to_string()))?;
    let (len, payload) = rest
        .split_first_chunk::<8>()
        .ok_or_else(|| Error::Other("truncated envelope".to_string()))?;
    let plain_len = usize::try_from(u64::from_le_bytes(*len))
        .ok()
        .filter(|&n| n <= max_uncompressed_len)
        .ok_or_else(exceeds_bound)?;

    if codec == CODEC_STORED {
        if payload.len() != plain_len {
            return Err(Error::Other(
                "snapshot length does not match envelope".to_string(),
            ));
        }
        return decode_snapshot_v1(payload);
    }
    inflate(codec, payload, plain_len, &mut ws.plain)?;
    decode_snapshot_v1(&ws.plain)
}
