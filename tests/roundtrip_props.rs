use darkvol::{Archive, Compression};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

const NAME: &str = "[a-zA-Z0-9_./ -]{1,24}";

/// Distinct NUL-free names with arbitrary payloads.
fn stored_entries() -> impl Strategy<Value = Vec<(String, Vec<u8>)>> {
    btree_map(NAME, vec(any::<u8>(), 0..256), 0..12).prop_map(|m| m.into_iter().collect())
}

/// Raw item records as a legacy writer might leave them: any tag, any opaque
/// bytes.
fn raw_items() -> impl Strategy<Value = Vec<(String, [u8; 8], u8, Vec<u8>)>> {
    btree_map(NAME, (any::<[u8; 8]>(), any::<u8>(), vec(any::<u8>(), 0..64)), 0..8)
        .prop_map(|m| m.into_iter().map(|(n, (o, t, p))| (n, o, t, p)).collect())
}

/// Hand-assemble a PVOL archive from raw item records.
fn assemble(items: &[(String, [u8; 8], u8, Vec<u8>)]) -> Vec<u8> {
    let mut region = Vec::new();
    let mut names = Vec::new();
    let mut records = Vec::new();
    for (name, opaque, tag, payload) in items {
        let offset = 8 + region.len() as u32;
        region.extend_from_slice(b"VBLK");
        region.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        region.extend_from_slice(payload);

        names.extend_from_slice(name.as_bytes());
        names.push(0);

        records.extend_from_slice(opaque);
        records.extend_from_slice(&offset.to_le_bytes());
        records.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        records.push(*tag);
    }

    let mut out = b"PVOL".to_vec();
    out.extend_from_slice(&(8 + region.len() as u32).to_le_bytes());
    out.extend(region);
    out.extend_from_slice(b"vols");
    out.extend_from_slice(&(names.len() as u32).to_le_bytes());
    out.extend(names);
    out.extend_from_slice(b"voli");
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    out.extend(records);
    out
}

proptest! {
    #[test]
    fn built_archives_survive_a_roundtrip(list in stored_entries()) {
        let mut ar = Archive::new();
        for (name, payload) in &list {
            ar.upsert(name.as_str(), Compression::None, payload.clone()).unwrap();
        }

        let bytes = darkvol::serialize(&ar).unwrap();
        let back = darkvol::parse(&bytes).unwrap();
        prop_assert_eq!(&back, &ar);

        // Re-serializing a parsed archive is byte-stable.
        prop_assert_eq!(darkvol::serialize(&back).unwrap(), bytes);
    }

    #[test]
    fn parsed_entries_pass_through_unchanged(items in raw_items()) {
        let data = assemble(&items);
        let first = darkvol::parse(&data).unwrap();
        for (entry, (name, opaque, tag, payload)) in first.entries().iter().zip(&items) {
            prop_assert_eq!(entry.name(), name.as_str());
            prop_assert_eq!(entry.opaque(), *opaque);
            prop_assert_eq!(entry.compression(), Compression::from_tag(*tag));
            prop_assert_eq!(entry.payload(), payload.as_slice());
        }

        let rewritten = darkvol::serialize(&first).unwrap();
        prop_assert_eq!(&rewritten, &data);
        prop_assert_eq!(darkvol::parse(&rewritten).unwrap(), first);
    }

    #[test]
    fn parse_never_panics(data in vec(any::<u8>(), 0..512)) {
        let _ = darkvol::parse(&data);
    }

    #[test]
    fn parse_never_panics_on_pvol_prefix(tail in vec(any::<u8>(), 0..256)) {
        let mut data = b"PVOL".to_vec();
        data.extend_from_slice(&((8 + tail.len().min(64)) as u32).to_le_bytes());
        data.extend_from_slice(&tail);
        let _ = darkvol::parse(&data);
    }
}
