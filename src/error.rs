use crate::schema::TypeTag;

pub type Result<T> = core::result::Result<T, Error>;
pub type DecodeResult<T> = core::result::Result<T, DecodeError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Failure while turning one cell of a vector into a [`crate::value::Value`].
///
/// `UnsupportedType`, `OutOfRangeIndex`, `KnownEngineDefect`, `ParseFailure`
/// and `CalendarOutOfRange` are recoverable and are absorbed where they occur
/// (placeholder, Null, or original text). The remaining variants mean the
/// buffers are not in a state the decoder can read and are propagated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported type: {0}")]
    UnsupportedType(TypeTag),

    #[error("index {index} outside dictionary of size {size}")]
    OutOfRangeIndex { index: u64, size: usize },

    #[error("uuid extraction in a multi-column result is unreliable on the flat path")]
    KnownEngineDefect,

    #[error("allocation of {requested} elements failed")]
    AllocationFailure { requested: usize },

    #[error("cannot parse {text:?} as {target}")]
    ParseFailure { text: String, target: &'static str },

    #[error("{tag} tick count {ticks} has no calendar representation")]
    CalendarOutOfRange { tag: TypeTag, ticks: i64 },

    #[error("row {row} outside vector of length {len}")]
    RowOutOfRange { row: usize, len: usize },

    #[error("child range {start}..{end} outside child vector of length {len}")]
    ChildOutOfRange { start: usize, end: usize, len: usize },

    #[error("{tag} vector has no child vector {index}")]
    MissingChild { tag: TypeTag, index: usize },

    #[error("{tag} value cannot be read from a {found} buffer")]
    BufferMismatch { tag: TypeTag, found: &'static str },
}
