//! Compression tags and the decoder registry.
//!
//! Every item record carries a one-byte compression tag.  Only
//! [`Compression::None`] payloads are decoded here; RLE, LZ and LZH payloads
//! are recognised and reported but stay opaque, and are carried through
//! re-serialization untouched.
//!
//! | Tag | Kind |
//! |-----|------|
//! | 0   | none |
//! | 1   | rle  |
//! | 2   | lz   |
//! | 3   | lzh  |

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::error::{Result, VolError};

// ── Compression ──────────────────────────────────────────────────────────────

pub const TAG_NONE: u8 = 0;
pub const TAG_RLE:  u8 = 1;
pub const TAG_LZ:   u8 = 2;
pub const TAG_LZH:  u8 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compression {
    #[default]
    None,
    Rle,
    Lz,
    Lzh,
    /// A tag value this build does not know; preserved as-is.
    Unknown(u8),
}

impl Compression {
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            TAG_NONE => Compression::None,
            TAG_RLE  => Compression::Rle,
            TAG_LZ   => Compression::Lz,
            TAG_LZH  => Compression::Lzh,
            other    => Compression::Unknown(other),
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Compression::None       => TAG_NONE,
            Compression::Rle        => TAG_RLE,
            Compression::Lz         => TAG_LZ,
            Compression::Lzh        => TAG_LZH,
            Compression::Unknown(t) => t,
        }
    }

    /// Human-readable name (for diagnostics only — never parsed).
    pub fn name(self) -> &'static str {
        match self {
            Compression::None       => "none",
            Compression::Rle        => "rle",
            Compression::Lz         => "lz",
            Compression::Lzh        => "lzh",
            Compression::Unknown(_) => "unknown",
        }
    }

    /// Whether [`get_codec`] can decode payloads of this kind.
    pub fn is_supported(self) -> bool {
        self == Compression::None
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Unknown(t) => write!(f, "unknown (tag {t})"),
            other                   => f.write_str(other.name()),
        }
    }
}

// ── Codec trait ──────────────────────────────────────────────────────────────

pub trait Codec: Send + Sync {
    fn compression(&self) -> Compression;
    fn decompress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>>;
}

/// Stored payloads: decoding is the identity.
pub struct NoneCodec;

impl Codec for NoneCodec {
    fn compression(&self) -> Compression { Compression::None }
    fn decompress<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> { Ok(Cow::Borrowed(data)) }
}

pub fn get_codec(kind: Compression) -> Result<Box<dyn Codec>> {
    match kind {
        Compression::None => Ok(Box::new(NoneCodec)),
        other             => Err(VolError::UnsupportedCompression { kind: other }),
    }
}
