//! E2E Test Suite 01: Compress / Decompress Roundtrips
//!
//! Exercises the global-regime API end to end:
//! - compress with every filter and every compiled-in codec
//! - decompress back to the original bytes
//! - the memcpy path for level 0 and tiny inputs
//!
//! The global API shares process-wide state, so every test serializes on
//! one lock before touching it.

extern crate blosc;

use std::sync::Mutex;

static GLOBAL_API: Mutex<()> = Mutex::new(());

/// One million ascending f32 values, the classic Blosc demo dataset.
fn float_data() -> Vec<u8> {
    let _ = env_logger::builder().is_test(true).try_init();
    (0..1_000_000u32)
        .flat_map(|i| (i as f32).to_le_bytes())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: shuffled float data compresses well and roundtrips
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_compress_roundtrip_float_data() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::init();
    assert!(blosc::set_compressor("blosclz") >= 0);

    let src = float_data();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(5, 1, 4, &src, &mut packed);
    assert!(cbytes > 0, "compression failed: {cbytes}");

    let ratio = src.len() as f64 / cbytes as f64;
    assert!(ratio > 20.0, "poor compression ratio {ratio:.1}");

    let mut back = vec![0u8; src.len()];
    let nbytes = blosc::decompress(&packed[..cbytes as usize], &mut back);
    assert_eq!(nbytes as usize, src.len());
    assert_eq!(back, src);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: every compiled-in codec roundtrips
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_all_codecs_roundtrip() {
    let _guard = GLOBAL_API.lock().unwrap();
    let src = float_data();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let mut back = vec![0u8; src.len()];

    for name in blosc::list_compressors() {
        assert!(blosc::set_compressor(name) >= 0, "codec {name}");
        let cbytes = blosc::compress(5, 1, 4, &src, &mut packed);
        assert!(cbytes > 0, "codec {name}: compress returned {cbytes}");
        back.fill(0);
        let nbytes = blosc::decompress(&packed[..cbytes as usize], &mut back);
        assert_eq!(nbytes as usize, src.len(), "codec {name}");
        assert_eq!(back, src, "codec {name}");
    }
    blosc::set_compressor("blosclz");
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: bit shuffle roundtrips
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_bitshuffle_roundtrip() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");

    // Small-magnitude u16 values leave most bit planes empty.
    let src: Vec<u8> = (0..500_000u32)
        .flat_map(|i| ((i % 97) as u16).to_le_bytes())
        .collect();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(5, 2, 2, &src, &mut packed);
    assert!(cbytes > 0);
    assert!((cbytes as usize) < src.len());

    let mut back = vec![0u8; src.len()];
    assert_eq!(
        blosc::decompress(&packed[..cbytes as usize], &mut back) as usize,
        src.len()
    );
    assert_eq!(back, src);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: no-shuffle roundtrip
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_noshuffle_roundtrip() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");

    let src = b"streams of repeated text compress without any shuffle. ".repeat(4000);
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(5, 0, 1, &src, &mut packed);
    assert!(cbytes > 0);
    assert!((cbytes as usize) < src.len());

    let mut back = vec![0u8; src.len()];
    assert_eq!(
        blosc::decompress(&packed[..cbytes as usize], &mut back) as usize,
        src.len()
    );
    assert_eq!(back, src);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: level 0 is a pure memcpy
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_clevel_zero_is_memcpy() {
    let _guard = GLOBAL_API.lock().unwrap();
    let src = float_data();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(0, 1, 4, &src, &mut packed);
    assert_eq!(cbytes as usize, src.len() + blosc::MAX_OVERHEAD);

    let (_, [_, memcpyed, _]) = blosc::cbuffer_metainfo(&packed);
    assert!(memcpyed, "level 0 must set the memcpy flag");

    let mut back = vec![0u8; src.len()];
    assert_eq!(
        blosc::decompress(&packed[..cbytes as usize], &mut back) as usize,
        src.len()
    );
    assert_eq!(back, src);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 6: tiny inputs take the memcpy path too
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_tiny_input_is_memcpy() {
    let _guard = GLOBAL_API.lock().unwrap();
    let src = b"short".to_vec();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(9, 1, 1, &src, &mut packed);
    assert_eq!(cbytes as usize, src.len() + blosc::MAX_OVERHEAD);

    let mut back = vec![0u8; src.len()];
    assert_eq!(
        blosc::decompress(&packed[..cbytes as usize], &mut back) as usize,
        src.len()
    );
    assert_eq!(back, src);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 7: multi-threaded compression matches serial output
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_threaded_output_is_deterministic() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let src = float_data();
    let mut serial = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let mut threaded = vec![0u8; src.len() + blosc::MAX_OVERHEAD];

    let previous = blosc::set_nthreads(1);
    assert!(previous >= 1);
    let cs = blosc::compress(5, 1, 4, &src, &mut serial);
    blosc::set_nthreads(4);
    let ct = blosc::compress(5, 1, 4, &src, &mut threaded);
    blosc::set_nthreads(1);

    assert_eq!(cs, ct);
    assert_eq!(serial[..cs as usize], threaded[..ct as usize]);

    let mut back = vec![0u8; src.len()];
    assert_eq!(
        blosc::decompress(&threaded[..ct as usize], &mut back) as usize,
        src.len()
    );
    assert_eq!(back, src);
}
