//! Error type shared by every stage of the `.vol` codec.
//!
//! All variants are fatal to the current parse or serialize call.  Nothing is
//! retried internally and no partially built [`Archive`](crate::Archive) is
//! ever handed back alongside an error.

use std::fmt;
use std::io;
use std::ops::Range;
use thiserror::Error;

use crate::codec::Compression;

pub type Result<T> = std::result::Result<T, VolError>;

/// A 4-byte tag formatted for diagnostics (printable ASCII verbatim, other
/// bytes escaped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicDisplay(pub [u8; 4]);

impl fmt::Display for MagicDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0.escape_ascii())
    }
}

/// Half-open byte range formatted as `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteRange(pub Range<u64>);

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.0.start, self.0.end)
    }
}

#[derive(Error, Debug)]
pub enum VolError {
    #[error("unexpected end of {context} (expected {expected} bytes, only {available} left)")]
    InsufficientData {
        context:   &'static str,
        expected:  u64,
        available: u64,
    },

    #[error("unexpected {context} magic: got {got}, expected {expected}")]
    MagicMismatch {
        context:  &'static str,
        got:      MagicDisplay,
        expected: MagicDisplay,
    },

    #[error("unknown archive header magic {got} (expected \" VOL\" or \"PVOL\")")]
    UnknownFormat { got: MagicDisplay },

    #[error("could not find {context} magic within {searched_bytes} bytes")]
    MagicNotFound {
        context:        &'static str,
        searched_bytes: usize,
    },

    #[error("filename table holds {filenames} names but item table holds {items} records")]
    CountMismatch { filenames: usize, items: usize },

    #[error("item {index} ({name}) range {range} out of bounds in payload region {region}")]
    ItemOutOfBounds {
        index:  usize,
        name:   String,
        range:  ByteRange,
        region: ByteRange,
    },

    #[error("item table payload of {payload_len} bytes is not a multiple of the 17-byte record size")]
    MalformedItemTable { payload_len: usize },

    #[error("missing NUL terminator in {context}")]
    TruncatedString { context: &'static str },

    #[error("parsing item {index} ({name}) at range {range}: {source}")]
    Item {
        index:  usize,
        name:   String,
        range:  ByteRange,
        #[source]
        source: Box<VolError>,
    },

    #[error("only the PVOL variant can be written; plain \" VOL\" archives are read-only")]
    UnsupportedVariant,

    #[error("entry {name} holds {len} bytes, more than the {max}-byte item limit")]
    PayloadTooLarge { name: String, len: usize, max: usize },

    #[error("{context} length {len} does not fit in a 32-bit length field")]
    LengthOverflow { context: &'static str, len: usize },

    #[error("invalid entry name {name:?}: names cannot contain NUL bytes")]
    InvalidName { name: String },

    #[error("entry {name} already exists in the archive")]
    DuplicateEntry { name: String },

    #[error("decompression of {kind} entries is not supported")]
    UnsupportedCompression { kind: Compression },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
