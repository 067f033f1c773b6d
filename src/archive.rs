//! High-level [`Archive`] API — the surface collaborators embed.
//!
//! ```
//! use darkvol::{Archive, Compression};
//!
//! // Build
//! let mut ar = Archive::new();
//! ar.upsert("readme.txt", Compression::None, b"Hello, world!".to_vec())?;
//! let bytes = ar.to_bytes()?;
//!
//! // Read
//! let ar = darkvol::parse(&bytes)?;
//! assert_eq!(ar.get("readme.txt").unwrap().payload(), b"Hello, world!");
//! # Ok::<(), darkvol::VolError>(())
//! ```
//!
//! # Parse
//! Strictly linear: header → filename table → item table → one inner
//! `"VBLK"` frame per item.  Filenames and item records are paired by
//! position, and every item's `[offset, offset + 8 + len)` range must fall
//! inside the header's payload region.  The first failure aborts the parse.
//!
//! # Serialize
//! Always emits the PVOL layout, also for archives parsed from plain `" VOL"`
//! files (their unexplained preamble is dropped).  Entries are laid out back
//! to back in the payload region in archive order; item offsets are
//! recomputed.  Freshly added entries are always stored uncompressed; entries
//! read from an archive keep their compression tag, payload bytes and the two
//! opaque record fields unchanged.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::io::Write;
use tracing::{debug, trace};

use crate::block::{Frame, FrameSpec, Magic, FRAME_HEADER_LEN};
use crate::codec::{get_codec, Compression};
use crate::cursor::ByteCursor;
use crate::error::{ByteRange, Result, VolError};
use crate::header::{write_header, Variant, VolHeader};
use crate::table::{self, ItemRecord, DEFAULT_MAX_ITEM_TABLE_GAP};

pub const MAGIC_VBLK: Magic = *b"VBLK";

/// Largest payload an inner item frame can describe: its length field only
/// keeps the low 24 bits.
pub const MAX_ITEM_PAYLOAD_LEN: usize = 0x00FF_FFFF;

const ITEM_FRAME: FrameSpec = FrameSpec {
    context:                "item",
    magic:                  Some(MAGIC_VBLK),
    length_bits:            24,
    length_includes_header: false,
};

// ── ParseOptions ─────────────────────────────────────────────────────────────

/// Configuration for [`Archive::parse_with`].
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// How many padding bytes may sit between the filename table and the
    /// `"voli"` magic.
    pub max_item_table_gap: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_item_table_gap: DEFAULT_MAX_ITEM_TABLE_GAP }
    }
}

// ── Entry ────────────────────────────────────────────────────────────────────

/// One file stored in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name:        String,
    compression: Compression,
    payload:     Vec<u8>,
    opaque:      [u8; 8],
}

impl Entry {
    /// An uncompressed entry.
    pub fn new(name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            name:        name.into(),
            compression: Compression::None,
            payload:     payload.into(),
            opaque:      [0u8; 8],
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn compression(&self) -> Compression { self.compression }

    /// Stored bytes, exactly as they appear inside the item frame.
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// The two legacy item-record fields, raw.  Zero for entries that were
    /// not read from an archive.
    pub fn opaque(&self) -> [u8; 8] { self.opaque }

    /// Decoded contents; fails for every compression kind but `None`.
    pub fn decompressed(&self) -> Result<Cow<'_, [u8]>> {
        get_codec(self.compression)?.decompress(&self.payload)
    }
}

// ── EntryInfo ────────────────────────────────────────────────────────────────

/// Lightweight descriptor returned by [`Archive::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub name:        String,
    pub compression: Compression,
    pub stored_size: u64,
}

impl From<&Entry> for EntryInfo {
    fn from(e: &Entry) -> Self {
        EntryInfo {
            name:        e.name.clone(),
            compression: e.compression,
            stored_size: e.payload.len() as u64,
        }
    }
}

// ── Archive ──────────────────────────────────────────────────────────────────

/// Where an [`Archive`] came from.  Decides whether a plain-variant archive
/// may be written (as PVOL) or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Parsed,
    Built,
}

#[derive(Debug, Clone)]
pub struct Archive {
    variant: Variant,
    origin:  Origin,
    entries: Vec<Entry>,
}

/// Archives compare by layout variant and entries; how they were obtained
/// does not matter.
impl PartialEq for Archive {
    fn eq(&self, other: &Self) -> bool {
        self.variant == other.variant && self.entries == other.entries
    }
}

impl Eq for Archive {}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}

impl Archive {
    /// An empty PVOL archive.
    pub fn new() -> Self {
        Self::with_variant(Variant::Pvol)
    }

    pub fn with_variant(variant: Variant) -> Self {
        Self { variant, origin: Origin::Built, entries: Vec::new() }
    }

    // ── Parse ────────────────────────────────────────────────────────────────

    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with(data, &ParseOptions::default())
    }

    pub fn parse_with(data: &[u8], opts: &ParseOptions) -> Result<Self> {
        let mut cur = ByteCursor::new(data);
        let header = VolHeader::parse(&mut cur)?;
        let names = table::parse_filenames(header.variant, &mut cur)?;
        let items = table::parse_items(&mut cur, opts.max_item_table_gap)?;

        if names.len() != items.len() {
            return Err(VolError::CountMismatch {
                filenames: names.len(),
                items:     items.len(),
            });
        }
        if !cur.is_empty() {
            trace!(trailing = cur.remaining(), "ignoring bytes after item table");
        }

        let region = header.payload_region();
        let mut entries = Vec::with_capacity(items.len());
        for (index, (name, item)) in names.into_iter().zip(items).enumerate() {
            let range = item.byte_range();
            if range.start < region.start || range.end > region.end {
                return Err(VolError::ItemOutOfBounds {
                    index,
                    name,
                    range:  ByteRange(range),
                    region: ByteRange(region.clone()),
                });
            }
            trace!(index, name = %name, start = range.start, end = range.end, "resolving item");

            // A zero-length item has no inner frame worth reading; legacy
            // writers emit a degenerate header for it, if anything.
            let payload = if item.payload_len == 0 {
                Vec::new()
            } else {
                let slice = &data[range.start as usize..range.end as usize];
                match Frame::parse(&ITEM_FRAME, &mut ByteCursor::new(slice)) {
                    Ok(frame) => frame.payload.to_vec(),
                    Err(e) => {
                        return Err(VolError::Item {
                            index,
                            name,
                            range:  ByteRange(range),
                            source: Box::new(e),
                        })
                    }
                }
            };

            entries.push(Entry {
                name,
                compression: item.compression,
                payload,
                opaque: item.opaque,
            });
        }

        debug!(variant = ?header.variant, entries = entries.len(), "parsed archive");
        Ok(Self { variant: header.variant, origin: Origin::Parsed, entries })
    }

    // ── Read ─────────────────────────────────────────────────────────────────

    pub fn variant(&self) -> Variant { self.variant }
    pub fn entries(&self) -> &[Entry] { &self.entries }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn list(&self) -> Vec<EntryInfo> {
        self.entries.iter().map(EntryInfo::from).collect()
    }

    // ── Build ────────────────────────────────────────────────────────────────

    /// Insert a new entry at the end, or replace the entry with the same name
    /// in place.  Returns the replaced entry, if any.
    ///
    /// Only [`Compression::None`] payloads can be packed; compressed entries
    /// exist only as read from an archive.
    pub fn upsert(
        &mut self,
        name:        impl Into<String>,
        compression: Compression,
        payload:     impl Into<Vec<u8>>,
    ) -> Result<Option<Entry>> {
        if compression != Compression::None {
            return Err(VolError::UnsupportedCompression { kind: compression });
        }
        let entry = Entry::new(name, payload);
        match self.entries.iter().position(|e| e.name == entry.name) {
            Some(i) => Ok(Some(std::mem::replace(&mut self.entries[i], entry))),
            None => {
                self.entries.push(entry);
                Ok(None)
            }
        }
    }

    /// Append an uncompressed entry, refusing to overwrite an existing one.
    pub fn add(&mut self, name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Result<()> {
        let name = name.into();
        if name.as_bytes().contains(&0) {
            return Err(VolError::InvalidName { name });
        }
        if self.contains(&name) {
            return Err(VolError::DuplicateEntry { name });
        }
        self.entries.push(Entry::new(name, payload));
        Ok(())
    }

    /// Re-label the archive as PVOL.  Entries are kept; the plain layout's
    /// unexplained preamble is not carried over.
    pub fn into_p_variant(self) -> Self {
        Self { variant: Variant::Pvol, ..self }
    }

    // ── Serialize ────────────────────────────────────────────────────────────

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        // A plain archive built from scratch has no preamble to write and no
        // source to convert from.
        if !self.variant.is_pvol() && self.origin == Origin::Built {
            return Err(VolError::UnsupportedVariant);
        }

        let mut region  = Vec::new();
        let mut names   = Vec::with_capacity(self.entries.len());
        let mut records = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            if entry.payload.len() > MAX_ITEM_PAYLOAD_LEN {
                return Err(VolError::PayloadTooLarge {
                    name: entry.name.clone(),
                    len:  entry.payload.len(),
                    max:  MAX_ITEM_PAYLOAD_LEN,
                });
            }
            let offset = FRAME_HEADER_LEN + region.len();
            let offset = u32::try_from(offset).map_err(|_| VolError::LengthOverflow {
                context: "item offset",
                len:     offset,
            })?;

            // Empty payloads still get their 8-byte frame header so the item
            // range stays inside the payload region.
            Frame { magic: MAGIC_VBLK, payload: &entry.payload }.write(false, &mut region)?;

            names.push(entry.name.as_str());
            records.push(ItemRecord {
                opaque:      entry.opaque,
                offset,
                payload_len: entry.payload.len() as u32,
                compression: entry.compression,
            });
        }

        debug!(entries = records.len(), region_len = region.len(), "writing archive");
        write_header(Variant::Pvol, &region, &mut writer)?;
        table::write_filenames(&names, &mut writer)?;
        table::write_items(&records, &mut writer)?;
        Ok(())
    }
}
