pub mod cursor;
pub mod block;
pub mod header;
pub mod table;
pub mod codec;
pub mod archive;
pub mod error;

pub use archive::{Archive, Entry, EntryInfo, ParseOptions};
pub use codec::{Compression, Codec, get_codec};
pub use error::{Result, VolError};
pub use header::Variant;

/// Parse a complete `.vol` file held in memory.
pub fn parse(data: &[u8]) -> Result<Archive> {
    Archive::parse(data)
}

/// Parse with explicit [`ParseOptions`].
pub fn parse_with(data: &[u8], opts: &ParseOptions) -> Result<Archive> {
    Archive::parse_with(data, opts)
}

/// Serialize `archive` as a PVOL file.
pub fn serialize(archive: &Archive) -> Result<Vec<u8>> {
    archive.to_bytes()
}
