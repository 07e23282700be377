//! E2E Test Suite 05: Context Regime
//!
//! Contexts carry their own settings and thread pools, return typed
//! errors, and never touch the global mutex — so none of these tests
//! needs a lock.

extern crate blosc;

use blosc::{BloscError, Compressor, Context, Filter, SplitMode};

fn float_data(n: u32) -> Vec<u8> {
    (0..n).flat_map(|i| (i as f32).to_le_bytes()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: basic roundtrip through a context
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_context_roundtrip() {
    let ctx = Context::new();
    let src = float_data(250_000);
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = ctx
        .compress(5, Filter::Shuffle, 4, &src, &mut packed)
        .expect("compression should succeed");
    assert!(cbytes < src.len());

    let mut back = vec![0u8; src.len()];
    let nbytes = ctx
        .decompress(&packed[..cbytes], &mut back)
        .expect("decompression should succeed");
    assert_eq!(nbytes, src.len());
    assert_eq!(back, src);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: contexts with different settings coexist
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_contexts_are_isolated() {
    let zstd_available = Compressor::Zstd.supported();
    let a = Context::new().compressor(Compressor::BloscLz).blocksize(65_536);
    let b = if zstd_available {
        Context::new().compressor(Compressor::Zstd).splitmode(SplitMode::Never)
    } else {
        Context::new().splitmode(SplitMode::Never)
    };

    let src = float_data(250_000);
    let mut pa = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let mut pb = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let ca = a.compress(5, Filter::Shuffle, 4, &src, &mut pa).unwrap();
    let cb = b.compress(5, Filter::Shuffle, 4, &src, &mut pb).unwrap();

    let (_, _, blocksize_a) = blosc::cbuffer_sizes(&pa);
    assert_eq!(blocksize_a, 65_536);

    // Buffers are self-describing: either context decodes the other's.
    let mut back = vec![0u8; src.len()];
    assert_eq!(a.decompress(&pb[..cb], &mut back).unwrap(), src.len());
    assert_eq!(back, src);
    back.fill(0);
    assert_eq!(b.decompress(&pa[..ca], &mut back).unwrap(), src.len());
    assert_eq!(back, src);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: thread count never changes the bytes produced
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_threaded_context_determinism() {
    let serial = Context::new();
    let threaded = Context::new().nthreads(4);
    let src = float_data(1_000_000);
    let mut ps = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let mut pt = vec![0u8; src.len() + blosc::MAX_OVERHEAD];

    let cs = serial.compress(5, Filter::Shuffle, 4, &src, &mut ps).unwrap();
    let ct = threaded.compress(5, Filter::Shuffle, 4, &src, &mut pt).unwrap();
    assert_eq!(cs, ct);
    assert_eq!(ps[..cs], pt[..ct]);

    let mut back = vec![0u8; src.len()];
    assert_eq!(threaded.decompress(&ps[..cs], &mut back).unwrap(), src.len());
    assert_eq!(back, src);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: getitem through a context
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_context_getitem() {
    let ctx = Context::new();
    let src = float_data(100_000);
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = ctx.compress(5, Filter::Shuffle, 4, &src, &mut packed).unwrap();

    let mut items = vec![0u8; 500 * 4];
    let got = ctx.getitem(&packed[..cbytes], 42_000, 500, &mut items).unwrap();
    assert_eq!(got, 500 * 4);
    assert_eq!(items, src[42_000 * 4..42_500 * 4]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: typed errors instead of sentinels
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_context_typed_errors() {
    let ctx = Context::new();
    let src = float_data(10_000);

    let mut tiny = vec![0u8; 100];
    match ctx.compress(5, Filter::Shuffle, 4, &src, &mut tiny) {
        Err(BloscError::DestTooSmall { needed, avail }) => {
            assert_eq!(needed, src.len() + blosc::MAX_OVERHEAD);
            assert_eq!(avail, 100);
        }
        other => panic!("expected DestTooSmall, got {other:?}"),
    }

    match ctx.compress(11, Filter::Shuffle, 4, &src, &mut vec![0u8; 100_000]) {
        Err(BloscError::InvalidParam(_)) => {}
        other => panic!("expected InvalidParam, got {other:?}"),
    }

    let mut back = vec![0u8; 64];
    assert!(matches!(
        ctx.decompress(&[0xabu8; 64], &mut back),
        Err(BloscError::Corrupt)
    ));
}
