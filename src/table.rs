//! Filename and item tables that trail the payload region.
//!
//! ```text
//! [Unknown(16), plain variant only]
//! "vols" len  (name NUL)*
//! [padding, at most `max_gap` bytes]
//! "voli" len  ItemRecord*
//! ```

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::io::Write;
use tracing::{debug, trace};

use crate::block::{Frame, FrameSpec, Magic};
use crate::codec::Compression;
use crate::cursor::ByteCursor;
use crate::error::{Result, VolError};
use crate::header::Variant;

pub const MAGIC_VOLS: Magic = *b"vols";
pub const MAGIC_VOLI: Magic = *b"voli";

/// Bytes skipped before the filename table in plain-variant archives: two
/// magic/offset pairs of unknown purpose.
pub const PLAIN_PREAMBLE_LEN: usize = 2 * (2 * 4);

/// Default bound on padding between the filename and item tables.
pub const DEFAULT_MAX_ITEM_TABLE_GAP: usize = 8;

/// On-disk size of one [`ItemRecord`].
pub const ITEM_RECORD_LEN: usize = 4 + 4 + 4 + 4 + 1;

const FILENAMES_FRAME: FrameSpec = FrameSpec {
    context:                "filename table",
    magic:                  Some(MAGIC_VOLS),
    length_bits:            0,
    length_includes_header: false,
};

const ITEMS_FRAME: FrameSpec = FrameSpec {
    context:                "item table",
    magic:                  Some(MAGIC_VOLI),
    length_bits:            0,
    length_includes_header: false,
};

// ── Filenames ────────────────────────────────────────────────────────────────

pub fn parse_filenames(variant: Variant, cur: &mut ByteCursor<'_>) -> Result<Vec<String>> {
    if !variant.is_pvol() {
        cur.skip("plain-variant filename preamble", PLAIN_PREAMBLE_LEN)?;
    }

    let frame = Frame::parse(&FILENAMES_FRAME, cur)?;
    let mut blob = ByteCursor::new(frame.payload);
    let mut names = Vec::new();
    while !blob.is_empty() {
        let nul = blob
            .rest()
            .iter()
            .position(|&b| b == 0)
            .ok_or(VolError::TruncatedString { context: "filename table" })?;
        let raw = blob.next("filename table", nul + 1)?;
        names.push(String::from_utf8_lossy(&raw[..nul]).into_owned());
    }

    debug!(count = names.len(), "parsed filename table");
    Ok(names)
}

pub fn write_filenames<S, W>(names: &[S], writer: W) -> Result<()>
where
    S: AsRef<str>,
    W: Write,
{
    let mut blob = Vec::new();
    for name in names {
        let name = name.as_ref();
        if name.as_bytes().contains(&0) {
            return Err(VolError::InvalidName { name: name.to_owned() });
        }
        blob.extend_from_slice(name.as_bytes());
        blob.push(0);
    }
    Frame { magic: MAGIC_VOLS, payload: &blob }.write(false, writer)
}

// ── Items ────────────────────────────────────────────────────────────────────

/// One fixed-size item table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRecord {
    /// Two legacy u32 fields of unknown meaning, kept byte-for-byte.
    pub opaque:      [u8; 8],
    /// Absolute file offset of the item's inner frame header.
    pub offset:      u32,
    /// Inner payload length, header excluded.
    pub payload_len: u32,
    pub compression: Compression,
}

impl ItemRecord {
    fn decode(raw: &[u8]) -> Self {
        let mut opaque = [0u8; 8];
        opaque.copy_from_slice(&raw[..8]);
        Self {
            opaque,
            offset:      LittleEndian::read_u32(&raw[8..12]),
            payload_len: LittleEndian::read_u32(&raw[12..16]),
            compression: Compression::from_tag(raw[16]),
        }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.opaque)?;
        writer.write_u32::<LittleEndian>(self.offset)?;
        writer.write_u32::<LittleEndian>(self.payload_len)?;
        writer.write_u8(self.compression.tag())?;
        Ok(())
    }

    /// `[offset, offset + 8 + payload_len)` as absolute file offsets.
    pub fn byte_range(&self) -> std::ops::Range<u64> {
        let start = u64::from(self.offset);
        start..start + 8 + u64::from(self.payload_len)
    }
}

pub fn parse_items(cur: &mut ByteCursor<'_>, max_gap: usize) -> Result<Vec<ItemRecord>> {
    let gap = match cur.find_magic(&MAGIC_VOLI) {
        Some(gap) if gap <= max_gap => gap,
        _ => {
            return Err(VolError::MagicNotFound {
                context:        "item table",
                searched_bytes: max_gap,
            })
        }
    };
    if gap > 0 {
        trace!(gap, "skipping padding before item table");
        cur.skip("item table padding", gap)?;
    }

    let frame = Frame::parse(&ITEMS_FRAME, cur)?;
    if frame.payload.len() % ITEM_RECORD_LEN != 0 {
        return Err(VolError::MalformedItemTable { payload_len: frame.payload.len() });
    }

    let items: Vec<ItemRecord> = frame
        .payload
        .chunks_exact(ITEM_RECORD_LEN)
        .map(ItemRecord::decode)
        .collect();

    debug!(count = items.len(), gap, "parsed item table");
    Ok(items)
}

pub fn write_items<W: Write>(records: &[ItemRecord], writer: W) -> Result<()> {
    let mut blob = Vec::with_capacity(records.len() * ITEM_RECORD_LEN);
    for record in records {
        record.write(&mut blob)?;
    }
    Frame { magic: MAGIC_VOLI, payload: &blob }.write(false, writer)
}
