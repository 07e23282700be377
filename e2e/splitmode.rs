//! E2E Test Suite 06: Split Mode
//!
//! Splitting compresses each byte plane of a shuffled block as its own
//! stream. For the fast LZ codecs on typed numeric data that is a ratio
//! win, which is exactly what the default (forward-compatible) mode is
//! for. These tests pin that property and the split decision table.

extern crate blosc;

use std::sync::Mutex;

use blosc::{Compressor, Context, Filter, SplitMode};

static GLOBAL_API: Mutex<()> = Mutex::new(());

fn float_data() -> Vec<u8> {
    (0..1_000_000u32)
        .flat_map(|i| (i as f32).to_le_bytes())
        .collect()
}

fn compress_with(ctx: &Context, src: &[u8]) -> Vec<u8> {
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = ctx.compress(5, Filter::Shuffle, 4, src, &mut packed).unwrap();
    packed.truncate(cbytes);
    packed
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: the default split beats never-split on typed numeric data
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_default_split_beats_never_split() {
    let src = float_data();
    let split = compress_with(&Context::new(), &src);
    let unsplit = compress_with(&Context::new().splitmode(SplitMode::Never), &src);

    let ratio = src.len() as f64 / split.len() as f64;
    assert!(ratio > 20.0, "ratio {ratio:.1} too low");
    assert!(
        split.len() < unsplit.len(),
        "split {} should beat never-split {}",
        split.len(),
        unsplit.len()
    );

    // Both decode to the same bytes regardless of the writer's mode.
    let ctx = Context::new();
    let mut back = vec![0u8; src.len()];
    assert_eq!(ctx.decompress(&split, &mut back).unwrap(), src.len());
    assert_eq!(back, src);
    back.fill(0);
    assert_eq!(ctx.decompress(&unsplit, &mut back).unwrap(), src.len());
    assert_eq!(back, src);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: split decision per mode and codec
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_split_decision_table() {
    let src = float_data();

    // Shuffled typed data with the fast baseline codec: every mode but
    // Never splits.
    for (mode, expect) in [
        (SplitMode::Always, true),
        (SplitMode::Never, false),
        (SplitMode::Auto, true),
        (SplitMode::ForwardCompat, true),
    ] {
        let packed = compress_with(&Context::new().splitmode(mode), &src);
        let (_, [_, memcpyed, _]) = blosc::cbuffer_metainfo(&packed);
        assert!(!memcpyed);
        let split = packed[2] & 0x10 != 0;
        assert_eq!(split, expect, "mode {mode:?}");
    }

    // The heavier codecs only split when forced.
    if Compressor::Zstd.supported() {
        let ctx = Context::new().compressor(Compressor::Zstd);
        let packed = compress_with(&ctx, &src);
        assert_eq!(packed[2] & 0x10, 0, "zstd must not split by default");
        let ctx = ctx.splitmode(SplitMode::Always);
        let packed = compress_with(&ctx, &src);
        assert_ne!(packed[2] & 0x10, 0, "Always must force the split");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: unsplittable shapes never split
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unsplittable_shapes() {
    let ctx = Context::new().splitmode(SplitMode::Always);
    let mut packed = vec![0u8; 2_000_000 + blosc::MAX_OVERHEAD];

    // No shuffle: nothing to split along.
    let src = float_data();
    let cbytes = ctx.compress(5, Filter::None, 4, &src, &mut packed).unwrap();
    assert_eq!(packed[2] & 0x10, 0);
    let mut back = vec![0u8; src.len()];
    assert_eq!(ctx.decompress(&packed[..cbytes], &mut back).unwrap(), src.len());
    assert_eq!(back, src);

    // Typesize beyond the split limit of 16 bytes.
    let src: Vec<u8> = (0..1_000_000usize).map(|i| (i % 251) as u8).collect();
    let cbytes = ctx.compress(5, Filter::Shuffle, 32, &src, &mut packed).unwrap();
    assert_eq!(packed[2] & 0x10, 0);
    back.resize(src.len(), 0);
    assert_eq!(ctx.decompress(&packed[..cbytes], &mut back).unwrap(), src.len());
    assert_eq!(back, src);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: the global set_splitmode drives the same machinery
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_global_splitmode() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let src = float_data();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];

    assert_eq!(blosc::set_splitmode(4), 0);
    let default_size = blosc::compress(5, 1, 4, &src, &mut packed);
    assert!(default_size > 0);

    assert_eq!(blosc::set_splitmode(2), 0);
    let never_size = blosc::compress(5, 1, 4, &src, &mut packed);
    assert!(never_size > 0);

    blosc::set_splitmode(4);
    assert!(
        default_size < never_size,
        "default split {default_size} should beat never-split {never_size}"
    );
}
