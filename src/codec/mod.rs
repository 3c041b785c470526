pub mod snapshot_v1;
pub mod snapshot_v1_compressed;

pub use snapshot_v1::{decode_snapshot_v1, encode_snapshot_v1, encode_snapshot_v1_into};
pub use snapshot_v1_compressed::{
    Compression, decode_snapshot_v1_compressed, encode_snapshot_v1_compressed_into,
    is_snapshot_envelope,
};
