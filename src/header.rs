//! Top-level archive frame and format variant detection.
//!
//! The whole payload region (every item's inner frame) lives inside one
//! frame whose length counts its own 8-byte header.  Two magics exist:
//!
//! - `" VOL"` — the older plain layout, read-only here.
//! - `"PVOL"` — the P-variant, the only layout this crate writes.

use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::debug;

use crate::block::{Frame, FrameSpec, Magic, FRAME_HEADER_LEN};
use crate::cursor::ByteCursor;
use crate::error::{MagicDisplay, Result, VolError};

pub const MAGIC_VOL:  Magic = *b" VOL";
pub const MAGIC_PVOL: Magic = *b"PVOL";

const HEADER_FRAME: FrameSpec = FrameSpec {
    context:                "archive header",
    magic:                  None,
    length_bits:            0,
    length_includes_header: true,
};

/// Which of the two header layouts an archive uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// `" VOL"`: 16 unexplained bytes precede the filename table.
    Plain,
    /// `"PVOL"`: filename table follows the payload region directly.
    Pvol,
}

impl Variant {
    pub fn magic(self) -> Magic {
        match self {
            Variant::Plain => MAGIC_VOL,
            Variant::Pvol  => MAGIC_PVOL,
        }
    }

    pub fn from_magic(magic: &Magic) -> Option<Self> {
        match magic {
            m if m == &MAGIC_VOL  => Some(Variant::Plain),
            m if m == &MAGIC_PVOL => Some(Variant::Pvol),
            _                     => None,
        }
    }

    pub fn is_pvol(self) -> bool {
        self == Variant::Pvol
    }
}

/// Parsed top-level frame.
#[derive(Debug, Clone)]
pub struct VolHeader<'a> {
    pub variant: Variant,
    /// The payload region, borrowed from the input.
    pub payload: &'a [u8],
}

impl<'a> VolHeader<'a> {
    pub fn parse(cur: &mut ByteCursor<'a>) -> Result<Self> {
        let frame = Frame::parse(&HEADER_FRAME, cur)?;
        let variant = Variant::from_magic(&frame.magic).ok_or(VolError::UnknownFormat {
            got: MagicDisplay(frame.magic),
        })?;
        debug!(?variant, region_len = frame.payload.len(), "parsed archive header");
        Ok(Self { variant, payload: frame.payload })
    }

    /// Absolute file offset of the first payload-region byte.
    pub fn payload_offset(&self) -> u64 {
        FRAME_HEADER_LEN as u64
    }

    pub fn payload_len(&self) -> u64 {
        self.payload.len() as u64
    }

    /// `[payload_offset, payload_offset + payload_len)`.
    pub fn payload_region(&self) -> std::ops::Range<u64> {
        self.payload_offset()..self.payload_offset() + self.payload_len()
    }
}

/// Write the top-level frame around an already assembled payload region.
pub fn write_header<W: Write>(variant: Variant, payload: &[u8], writer: W) -> Result<()> {
    if !variant.is_pvol() {
        return Err(VolError::UnsupportedVariant);
    }
    Frame { magic: variant.magic(), payload }.write(true, writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_both_variants() {
        for (magic, variant) in [(MAGIC_VOL, Variant::Plain), (MAGIC_PVOL, Variant::Pvol)] {
            let mut data = magic.to_vec();
            data.extend_from_slice(&11u32.to_le_bytes());
            data.extend_from_slice(b"abc");
            let hdr = VolHeader::parse(&mut ByteCursor::new(&data)).unwrap();
            assert_eq!(hdr.variant, variant);
            assert_eq!(hdr.payload, b"abc");
            assert_eq!(hdr.payload_region(), 8..11);
        }
    }

    #[test]
    fn rejects_unknown_magic() {
        let mut data = b"ZVOL".to_vec();
        data.extend_from_slice(&8u32.to_le_bytes());
        let err = VolHeader::parse(&mut ByteCursor::new(&data)).unwrap_err();
        assert!(matches!(err, VolError::UnknownFormat { got } if got.0 == *b"ZVOL"));
    }

    #[test]
    fn plain_variant_cannot_be_written() {
        let mut out = Vec::new();
        assert!(matches!(
            write_header(Variant::Plain, b"", &mut out),
            Err(VolError::UnsupportedVariant)
        ));
        assert!(out.is_empty());

        write_header(Variant::Pvol, b"xy", &mut out).unwrap();
        assert_eq!(out, b"PVOL\x0a\x00\x00\x00xy");
    }
}
