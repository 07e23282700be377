//! E2E Test Suite 03: Process-Wide Configuration
//!
//! Covers the global setters/getters, the compressor catalog, lifecycle
//! calls, and the BLOSC_* environment variables. Everything here mutates
//! process-wide state (including the environment), so each test holds the
//! same lock and restores the defaults on its way out.

extern crate blosc;

use std::env;
use std::sync::Mutex;

static GLOBAL_API: Mutex<()> = Mutex::new(());

fn restore_defaults() {
    let _ = env_logger::builder().is_test(true).try_init();
    blosc::set_compressor("blosclz");
    blosc::set_nthreads(1);
    blosc::set_blocksize(0);
    blosc::set_splitmode(4);
}

fn sample() -> Vec<u8> {
    (0..50_000u32).flat_map(u32::to_le_bytes).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: nthreads setter returns the previous value
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_set_nthreads_returns_previous() {
    let _guard = GLOBAL_API.lock().unwrap();
    restore_defaults();

    assert_eq!(blosc::set_nthreads(4), 1);
    assert_eq!(blosc::get_nthreads(), 4);
    assert_eq!(blosc::set_nthreads(2), 4);

    // Out-of-range counts are rejected and leave the setting alone.
    assert_eq!(blosc::set_nthreads(0), -1);
    assert_eq!(blosc::set_nthreads(blosc::MAX_THREADS + 1), -1);
    assert_eq!(blosc::get_nthreads(), 2);
    restore_defaults();
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: compressor selection by name
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_set_compressor_by_name() {
    let _guard = GLOBAL_API.lock().unwrap();
    restore_defaults();

    assert_eq!(blosc::set_compressor("lz4"), 1);
    assert_eq!(blosc::get_compressor(), "lz4");
    assert_eq!(blosc::set_compressor("nosuchcodec"), -1);
    assert_eq!(blosc::get_compressor(), "lz4", "failed set must not change state");
    restore_defaults();
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: compressor catalog
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_compressor_catalog() {
    let names = blosc::list_compressors();
    assert_eq!(names[0], "blosclz");

    assert_eq!(blosc::compcode_to_compname(0), Some("blosclz"));
    assert_eq!(blosc::compname_to_compcode("blosclz"), Some(0));
    assert_eq!(blosc::compcode_to_compname(99), None);
    assert_eq!(blosc::compname_to_compcode("nosuch"), None);

    let (libname, version) = blosc::complib_info("blosclz").expect("blosclz always present");
    assert_eq!(libname, "BloscLZ");
    assert!(!version.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: forced blocksize shows up in the produced buffers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_forced_blocksize() {
    let _guard = GLOBAL_API.lock().unwrap();
    restore_defaults();

    blosc::set_blocksize(65_536);
    assert_eq!(blosc::get_blocksize(), 65_536);

    let src = sample();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(5, 1, 4, &src, &mut packed);
    assert!(cbytes > 0);
    let (_, _, blocksize) = blosc::cbuffer_sizes(&packed);
    assert_eq!(blocksize, 65_536);

    // Back to automatic; the getter reports what was set, not what any
    // buffer used.
    blosc::set_blocksize(0);
    assert_eq!(blosc::get_blocksize(), 0);
    restore_defaults();
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: split mode setter validates its argument
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_set_splitmode_validation() {
    let _guard = GLOBAL_API.lock().unwrap();
    restore_defaults();

    assert_eq!(blosc::set_splitmode(2), 0);
    assert_eq!(blosc::set_splitmode(0), -1);
    assert_eq!(blosc::set_splitmode(5), -1);
    assert_eq!(blosc::set_splitmode(4), 0);
    restore_defaults();
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 6: lifecycle — init, free_resources, destroy
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_lifecycle_calls() {
    let _guard = GLOBAL_API.lock().unwrap();
    restore_defaults();

    blosc::init();
    blosc::set_nthreads(2);
    let src = sample();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    assert!(blosc::compress(5, 1, 4, &src, &mut packed) > 0);

    // Dropping the pool is invisible to later calls.
    assert_eq!(blosc::free_resources(), 0);
    assert_eq!(blosc::get_nthreads(), 2);
    assert!(blosc::compress(5, 1, 4, &src, &mut packed) > 0);

    // destroy resets everything to the defaults.
    blosc::destroy();
    assert_eq!(blosc::get_nthreads(), 1);
    assert_eq!(blosc::get_compressor(), "blosclz");
    assert_eq!(blosc::get_blocksize(), 0);
    blosc::init();
    restore_defaults();
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 7: version reporting
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_version_string() {
    assert_eq!(blosc::get_version_string(), blosc::VERSION_STRING);
    assert_eq!(blosc::VERSION_FORMAT, 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 8: racing setters settle on one of the written values
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_concurrent_setters_are_coherent() {
    let _guard = GLOBAL_API.lock().unwrap();
    restore_defaults();

    let a = std::thread::spawn(|| blosc::set_nthreads(2));
    let b = std::thread::spawn(|| blosc::set_nthreads(4));
    assert!(a.join().unwrap() >= 1);
    assert!(b.join().unwrap() >= 1);

    let settled = blosc::get_nthreads();
    assert!(settled == 2 || settled == 4, "got {settled}");
    restore_defaults();
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 9: BLOSC_* environment variables
//
// The environment is process-global, so every variable is exercised inside
// this single test, with cleanup even on the error paths.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_environment_overrides() {
    let _guard = GLOBAL_API.lock().unwrap();
    restore_defaults();
    let src = sample();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let mut back = vec![0u8; src.len()];

    // BLOSC_CLEVEL overrides the argument: level 0 would memcpy, the
    // override compresses.
    env::set_var("BLOSC_CLEVEL", "5");
    let cbytes = blosc::compress(0, 1, 4, &src, &mut packed);
    env::remove_var("BLOSC_CLEVEL");
    assert!(cbytes > 0);
    assert!((cbytes as usize) < src.len(), "override should compress");

    // BLOSC_SHUFFLE by symbolic name.
    env::set_var("BLOSC_SHUFFLE", "NOSHUFFLE");
    let cbytes = blosc::compress(5, 1, 4, &src, &mut packed);
    env::remove_var("BLOSC_SHUFFLE");
    assert!(cbytes > 0);
    let (_, [shuffled, _, _]) = blosc::cbuffer_metainfo(&packed);
    assert!(!shuffled, "NOSHUFFLE override must clear the filter");

    // BLOSC_TYPESIZE changes the recorded element size.
    env::set_var("BLOSC_TYPESIZE", "8");
    let cbytes = blosc::compress(5, 1, 4, &src, &mut packed);
    env::remove_var("BLOSC_TYPESIZE");
    assert!(cbytes > 0);
    let (typesize, _) = blosc::cbuffer_metainfo(&packed);
    assert_eq!(typesize, 8);

    // BLOSC_COMPRESSOR persists, like calling set_compressor.
    env::set_var("BLOSC_COMPRESSOR", "lz4");
    let cbytes = blosc::compress(5, 1, 4, &src, &mut packed);
    env::remove_var("BLOSC_COMPRESSOR");
    assert!(cbytes > 0);
    assert_eq!(blosc::get_compressor(), "lz4");
    assert_eq!(blosc::cbuffer_complib(&packed), Some("LZ4"));
    blosc::set_compressor("blosclz");

    // Malformed values are ignored; the arguments stand.
    env::set_var("BLOSC_CLEVEL", "banana");
    let cbytes = blosc::compress(0, 1, 4, &src, &mut packed);
    env::remove_var("BLOSC_CLEVEL");
    assert_eq!(cbytes as usize, src.len() + blosc::MAX_OVERHEAD, "memcpy expected");

    // BLOSC_NOLOCK routes around the global mutex but still roundtrips.
    env::set_var("BLOSC_NOLOCK", "1");
    let cbytes = blosc::compress(5, 1, 4, &src, &mut packed);
    let nbytes = blosc::decompress(&packed[..cbytes as usize], &mut back);
    env::remove_var("BLOSC_NOLOCK");
    assert!(cbytes > 0);
    assert_eq!(nbytes as usize, src.len());
    assert_eq!(back, src);

    restore_defaults();
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 10: the NOLOCK path honors the last-set global configuration
//
// NOLOCK skips the mutex for the work, not the settings: the throwaway
// context starts from whatever the setters last stored, with BLOSC_*
// variables layered on top.
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_nolock_uses_global_configuration() {
    let _guard = GLOBAL_API.lock().unwrap();
    restore_defaults();
    let src = sample();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let mut back = vec![0u8; src.len()];

    assert_eq!(blosc::set_compressor("lz4"), 1);
    blosc::set_blocksize(65_536);

    env::set_var("BLOSC_NOLOCK", "1");
    let cbytes = blosc::compress(5, 1, 4, &src, &mut packed);
    env::remove_var("BLOSC_NOLOCK");
    assert!(cbytes > 0);
    assert_eq!(blosc::cbuffer_complib(&packed), Some("LZ4"));
    let (_, _, blocksize) = blosc::cbuffer_sizes(&packed);
    assert_eq!(blocksize, 65_536);

    // Environment variables still win over the stored settings.
    env::set_var("BLOSC_NOLOCK", "1");
    env::set_var("BLOSC_COMPRESSOR", "zstd");
    let cbytes = blosc::compress(5, 1, 4, &src, &mut packed);
    env::remove_var("BLOSC_COMPRESSOR");
    env::remove_var("BLOSC_NOLOCK");
    assert!(cbytes > 0);
    assert_eq!(blosc::cbuffer_complib(&packed), Some("Zstd"));

    let nbytes = blosc::decompress(&packed[..cbytes as usize], &mut back);
    assert_eq!(nbytes as usize, src.len());
    assert_eq!(back, src);
    restore_defaults();
}
