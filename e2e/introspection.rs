//! E2E Test Suite 04: Buffer Introspection
//!
//! The cbuffer_* calls read everything from the 16-byte header, with no
//! global state and no decompression. Unrecognized buffers come back
//! zero-filled rather than as errors.

extern crate blosc;

use std::sync::Mutex;

static GLOBAL_API: Mutex<()> = Mutex::new(());

fn float_data() -> Vec<u8> {
    (0..1_000_000u32)
        .flat_map(|i| (i as f32).to_le_bytes())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: sizes recorded in the header
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cbuffer_sizes() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let src = float_data();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(5, 1, 4, &src, &mut packed);
    assert!(cbytes > 0);

    let (nbytes, recorded_cbytes, blocksize) = blosc::cbuffer_sizes(&packed);
    assert_eq!(nbytes, src.len());
    assert_eq!(recorded_cbytes, cbytes as usize);
    assert!(blocksize > 4096, "blocksize {blocksize} suspiciously small");
    assert!(blocksize <= nbytes);
    assert_eq!(blocksize % 4, 0, "blocksize must stay typesize-aligned");
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: filter and typesize metadata
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cbuffer_metainfo() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let src = float_data();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    assert!(blosc::compress(5, 1, 4, &src, &mut packed) > 0);

    let (typesize, [shuffled, memcpyed, bit_shuffled]) = blosc::cbuffer_metainfo(&packed);
    assert_eq!(typesize, 4);
    assert!(shuffled);
    assert!(!memcpyed);
    assert!(!bit_shuffled);

    assert!(blosc::compress(5, 2, 4, &src, &mut packed) > 0);
    let (_, [shuffled, _, bit_shuffled]) = blosc::cbuffer_metainfo(&packed);
    assert!(!shuffled);
    assert!(bit_shuffled);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: format versions
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cbuffer_versions() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let src = float_data();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    assert!(blosc::compress(5, 1, 4, &src, &mut packed) > 0);

    let (version, versionlz) = blosc::cbuffer_versions(&packed);
    assert_eq!(version, blosc::VERSION_FORMAT as i32);
    assert_eq!(versionlz, 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: complib name follows the codec that wrote the buffer
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cbuffer_complib_per_codec() {
    let _guard = GLOBAL_API.lock().unwrap();
    let src = float_data();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];

    for name in blosc::list_compressors() {
        assert!(blosc::set_compressor(name) >= 0);
        assert!(blosc::compress(5, 1, 4, &src, &mut packed) > 0);
        let (libname, _) = blosc::complib_info(name).expect("listed codec has info");
        assert_eq!(blosc::cbuffer_complib(&packed), Some(libname), "codec {name}");
    }
    blosc::set_compressor("blosclz");
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: unrecognized buffers yield zeros, not errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unrecognized_buffer_yields_zeros() {
    let junk = [0u8; 16];
    assert_eq!(blosc::cbuffer_sizes(&junk), (0, 0, 0));
    assert_eq!(blosc::cbuffer_metainfo(&junk), (0, [false; 3]));
    assert_eq!(blosc::cbuffer_versions(&junk), (0, 0));
    assert_eq!(blosc::cbuffer_complib(&junk), None);

    // Shorter than a header.
    assert_eq!(blosc::cbuffer_sizes(&junk[..8]), (0, 0, 0));
}
