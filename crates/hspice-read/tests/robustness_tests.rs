//! Malformed input: truncation, corrupted framing, bad header fields.
//!
//! Every case must end in a typed error, never a panic.

mod common;

use common::{Fixture, TEXT_OFFSET};
use hspice_read::{read, read_from_slice, Endian, HspiceError, PostVersion, ReadOptions};
use proptest::prelude::*;

fn small_swept(version: PostVersion) -> Fixture {
    let mut fixture = Fixture::swept(Endian::Little, version, "VDD", &[1.8, 2.0], &["V(1)"], 3);
    fixture.data_chunk = 4;
    fixture
}

fn decode(bytes: &[u8]) -> hspice_read::Result<hspice_read::DecodedResult> {
    read_from_slice(bytes, &ReadOptions::default())
}

// =============================================================================
// Truncation
// =============================================================================

#[test]
fn test_every_prefix_is_truncated() {
    for version in [PostVersion::V9601, PostVersion::V2001] {
        let bytes = small_swept(version).to_bytes();
        assert!(decode(&bytes).is_ok());

        for len in 0..bytes.len() {
            match decode(&bytes[..len]) {
                Err(HspiceError::Truncated { offset, .. }) => assert!(offset <= len),
                other => panic!("prefix of {} bytes ({}): {:?}", len, version, other.map(|_| ())),
            }
        }
    }
}

#[test]
fn test_truncated_file_on_disk() {
    let bytes = small_swept(PostVersion::V9601).to_bytes();
    for len in [1, TEXT_OFFSET + 10, bytes.len() / 2, bytes.len() - 1] {
        let file = common::write_bytes(&bytes[..len]);
        assert!(
            matches!(read(file.path(), 0), Err(HspiceError::Truncated { .. })),
            "prefix of {} bytes",
            len
        );
    }
}

// =============================================================================
// Framing
// =============================================================================

#[test]
fn test_corrupted_block_magic() {
    let mut bytes = small_swept(PostVersion::V9601).to_bytes();
    bytes[0] = 5;
    assert!(matches!(decode(&bytes), Err(HspiceError::Format(_))));
}

#[test]
fn test_trailer_mismatch() {
    let fixture = small_swept(PostVersion::V9601);
    let mut bytes = fixture.to_bytes();
    // Trailer of the first header record
    let trailer = TEXT_OFFSET + fixture.header_chunk;
    assert_eq!(bytes[trailer], fixture.header_chunk as u8);
    bytes[trailer] -= 1;

    let err = decode(&bytes).unwrap_err();
    assert!(err.to_string().contains("mismatch"), "{}", err);
}

#[test]
fn test_mixed_byte_order() {
    let fixture = small_swept(PostVersion::V2001);
    let mut big = fixture.clone();
    big.endian = Endian::Big;

    // Little-endian header records followed by big-endian data records
    let header_len = fixture.header_bytes().len();
    let mut bytes = fixture.to_bytes()[..header_len].to_vec();
    let big_bytes = big.to_bytes();
    bytes.extend_from_slice(&big_bytes[header_len..]);

    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, HspiceError::Format(_)), "{:?}", err);
}

#[test]
fn test_header_record_after_terminator_is_data() {
    let fixture = Fixture::transient(Endian::Little, PostVersion::V9601, &["V(1)"], 4);
    let full = fixture.to_bytes();
    let header_len = fixture.header_bytes().len();

    // Stray text after the `$&%#` record is read as the first data record
    let mut bytes = full[..header_len].to_vec();
    common::push_record(&mut bytes, Endian::Little, b"  ");
    bytes.extend_from_slice(&full[header_len..]);

    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, HspiceError::Format(_)), "{:?}", err);
    assert!(err.to_string().contains("not a multiple of 4"), "{}", err);
}

#[test]
fn test_ragged_table() {
    let mut fixture = Fixture::transient(Endian::Little, PostVersion::V2001, &["V(1)"], 4);
    fixture.tables[0].push(99.0);
    let err = decode(&fixture.to_bytes()).unwrap_err();
    assert!(err.to_string().contains("not a multiple"), "{}", err);
}

#[test]
fn test_missing_end_marker() {
    let mut fixture = Fixture::transient(Endian::Little, PostVersion::V9601, &["V(1)"], 4);
    fixture.data_chunk = 1;
    let mut bytes = fixture.to_bytes();
    // Drop the last record, which holds only the end marker
    let last_record = 16 + 4 + 4;
    bytes.truncate(bytes.len() - last_record);
    assert!(matches!(decode(&bytes), Err(HspiceError::Truncated { .. })));
}

// =============================================================================
// Header fields
// =============================================================================

#[test]
fn test_unknown_post_marker_is_format_error() {
    let mut bytes = small_swept(PostVersion::V9601).to_bytes();
    let marker = TEXT_OFFSET + 16;
    assert_eq!(&bytes[marker..marker + 4], b"9601");
    bytes[marker + 1] = b'A';
    assert!(matches!(decode(&bytes), Err(HspiceError::Format(_))));
}

#[test]
fn test_numeric_post_marker_is_unsupported_version() {
    let mut bytes = small_swept(PostVersion::V9601).to_bytes();
    let marker = TEXT_OFFSET + 16;
    bytes[marker..marker + 4].copy_from_slice(b"8888");
    match decode(&bytes) {
        Err(HspiceError::UnsupportedVersion(v)) => assert_eq!(v, "8888"),
        other => panic!("expected UnsupportedVersion, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_two_dimensional_sweep_unsupported() {
    let mut bytes = small_swept(PostVersion::V2001).to_bytes();
    let sweep_count = TEXT_OFFSET + 11;
    assert_eq!(bytes[sweep_count], b'1');
    bytes[sweep_count] = b'2';
    assert!(matches!(decode(&bytes), Err(HspiceError::Unsupported(_))));
}

#[test]
fn test_zero_sweep_points() {
    let fixture = Fixture::swept(Endian::Little, PostVersion::V9601, "VDD", &[], &["V(1)"], 3);
    let err = decode(&fixture.to_bytes()).unwrap_err();
    assert!(matches!(err, HspiceError::Format(_)), "{:?}", err);
}

#[test]
fn test_missing_sweep_size() {
    let mut fixture = small_swept(PostVersion::V9601);
    // Whole header text before the terminator in one record
    fixture.header_chunk = 4096;
    let mut bytes = fixture.to_bytes();
    let size = TEXT_OFFSET + 176;
    assert_eq!(bytes[size], b'2');
    bytes[size] = b' ';
    assert!(matches!(decode(&bytes), Err(HspiceError::Format(_))));
}

#[test]
fn test_missing_vector_name() {
    let mut fixture = Fixture::transient(Endian::Little, PostVersion::V9601, &["V(1)"], 3);
    // Scale name left out of the name list
    fixture.scale = String::new();
    let err = decode(&fixture.to_bytes()).unwrap_err();
    assert!(matches!(err, HspiceError::Format(_)), "{:?}", err);
}

#[test]
fn test_header_without_terminator() {
    let mut out = Vec::new();
    common::push_record(&mut out, Endian::Little, &[b' '; 300]);
    assert!(matches!(decode(&out), Err(HspiceError::Truncated { .. })));
}

#[test]
fn test_short_header_text() {
    let mut out = Vec::new();
    common::push_record(&mut out, Endian::Big, b"   2   0   0    9601 TIME $&%#");
    assert!(matches!(decode(&out), Err(HspiceError::Format(_))));
}

// =============================================================================
// Fuzzing
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..1024)) {
        let _ = decode(&data);
    }

    #[test]
    fn prop_corrupted_file_never_panics(
        flips in prop::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 1..8),
        version in prop_oneof![
            Just(PostVersion::V9007),
            Just(PostVersion::V9601),
            Just(PostVersion::V2001),
        ],
    ) {
        let mut bytes = small_swept(version).to_bytes();
        for (index, value) in flips {
            let at = index.index(bytes.len());
            bytes[at] = value;
        }
        let _ = decode(&bytes);
    }

    #[test]
    fn prop_valid_file_survives_any_chunking(
        header_chunk in 1usize..300,
        data_chunk in 1usize..40,
        big_endian in any::<bool>(),
    ) {
        let mut fixture = small_swept(PostVersion::V9601);
        fixture.header_chunk = header_chunk;
        fixture.data_chunk = data_chunk;
        if big_endian {
            fixture.endian = Endian::Big;
        }
        let result = decode(&fixture.to_bytes()).unwrap();
        prop_assert_eq!(result.tables().len(), 2);
        prop_assert_eq!(result.len(), 3);
    }
}
