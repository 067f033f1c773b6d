//! The framed-record primitive every section of a `.vol` file is built from.
//!
//! On disk a frame is:
//!
//! | Offset | Size | Field   |
//! |--------|------|---------|
//! | 0      | 4    | magic   |
//! | 4      | 4    | length (u32 LE) |
//! | 8      | n    | payload |
//!
//! How `length` maps to `n` depends on the call site, see [`FrameSpec`].

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::io::Write;
use tracing::trace;

use crate::cursor::ByteCursor;
use crate::error::{MagicDisplay, Result, VolError};

pub type Magic = [u8; 4];

/// Size of the magic + length header preceding every payload.
pub const FRAME_HEADER_LEN: usize = 8;

/// How a frame is read at one particular place in the file.
#[derive(Debug, Clone, Copy)]
pub struct FrameSpec {
    /// Name used in error messages.
    pub context:                &'static str,
    /// Required magic, or `None` to accept anything.
    pub magic:                  Option<Magic>,
    /// When non-zero only the low `length_bits` bits of the length field are
    /// significant; the rest are legacy flag bits and are cleared.
    pub length_bits:            u32,
    /// The length field counts the 8-byte header as well as the payload.
    pub length_includes_header: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<'a> {
    pub magic:   Magic,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn parse(spec: &FrameSpec, cur: &mut ByteCursor<'a>) -> Result<Self> {
        let hdr = cur.next(spec.context, FRAME_HEADER_LEN)?;

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&hdr[..4]);
        let raw_len = LittleEndian::read_u32(&hdr[4..]);

        if let Some(expected) = spec.magic {
            if magic != expected {
                return Err(VolError::MagicMismatch {
                    context:  spec.context,
                    got:      MagicDisplay(magic),
                    expected: MagicDisplay(expected),
                });
            }
        }

        let mut len = mask_length(raw_len, spec.length_bits) as usize;
        if spec.length_includes_header {
            len = len.checked_sub(FRAME_HEADER_LEN).ok_or(VolError::InsufficientData {
                context:   spec.context,
                expected:  FRAME_HEADER_LEN as u64,
                available: len as u64,
            })?;
        }

        trace!(
            context = spec.context,
            magic = %MagicDisplay(magic),
            raw_len,
            len,
            "frame header"
        );

        let payload = cur.next(spec.context, len)?;
        Ok(Self { magic, payload })
    }

    /// Serialized size of this frame, header included.
    pub fn encoded_len(&self) -> usize {
        FRAME_HEADER_LEN + self.payload.len()
    }

    pub fn write<W: Write>(&self, length_includes_header: bool, mut writer: W) -> Result<()> {
        let mut len = self.payload.len();
        if length_includes_header {
            len += FRAME_HEADER_LEN;
        }
        let len = u32::try_from(len).map_err(|_| VolError::LengthOverflow {
            context: "frame",
            len,
        })?;

        writer.write_all(&self.magic)?;
        writer.write_u32::<LittleEndian>(len)?;
        writer.write_all(self.payload)?;
        Ok(())
    }
}

/// Clear every bit at or above `bits`; `bits == 0` keeps all 32.
pub fn mask_length(len: u32, bits: u32) -> u32 {
    if bits == 0 || bits >= 32 {
        len
    } else {
        len & ((1u32 << bits) - 1)
    }
}
