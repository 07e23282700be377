//! E2E Test Suite 02: Partial Decompression (getitem)
//!
//! Validates random access into compressed buffers without full
//! decompression: interior ranges, boundary items, memcpyed buffers, and
//! out-of-range requests.

extern crate blosc;

use std::sync::Mutex;

static GLOBAL_API: Mutex<()> = Mutex::new(());

const NITEMS: usize = 100_000;
const TYPESIZE: usize = 4;

fn compressed_floats() -> (Vec<u8>, Vec<u8>) {
    let src: Vec<u8> = (0..NITEMS as u32)
        .flat_map(|i| (i as f32).to_le_bytes())
        .collect();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(5, 1, TYPESIZE, &src, &mut packed);
    assert!(cbytes > 0);
    packed.truncate(cbytes as usize);
    (src, packed)
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: interior range spanning several blocks
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_getitem_interior_range() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let (src, packed) = compressed_floats();

    let (start, nitems) = (1000, 10_000);
    let mut items = vec![0u8; nitems * TYPESIZE];
    let got = blosc::getitem(&packed, start, nitems, &mut items);
    assert_eq!(got as usize, nitems * TYPESIZE);
    assert_eq!(items, src[start * TYPESIZE..(start + nitems) * TYPESIZE]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: whole buffer through getitem equals full decompression
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_getitem_whole_buffer() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let (src, packed) = compressed_floats();

    let mut items = vec![0u8; src.len()];
    let got = blosc::getitem(&packed, 0, NITEMS, &mut items);
    assert_eq!(got as usize, src.len());
    assert_eq!(items, src);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: first item, last item, empty range
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_getitem_boundary_items() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let (src, packed) = compressed_floats();

    let mut item = vec![0u8; TYPESIZE];
    assert_eq!(blosc::getitem(&packed, 0, 1, &mut item) as usize, TYPESIZE);
    assert_eq!(item, src[..TYPESIZE]);

    assert_eq!(
        blosc::getitem(&packed, NITEMS - 1, 1, &mut item) as usize,
        TYPESIZE
    );
    assert_eq!(item, src[src.len() - TYPESIZE..]);

    assert_eq!(blosc::getitem(&packed, 500, 0, &mut []), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: getitem on a memcpyed buffer
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_getitem_memcpyed_buffer() {
    let _guard = GLOBAL_API.lock().unwrap();
    let src: Vec<u8> = (0..NITEMS as u32)
        .flat_map(|i| (i as f32).to_le_bytes())
        .collect();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(0, 1, TYPESIZE, &src, &mut packed);
    assert_eq!(cbytes as usize, src.len() + blosc::MAX_OVERHEAD);

    let mut items = vec![0u8; 64 * TYPESIZE];
    let got = blosc::getitem(&packed[..cbytes as usize], 2000, 64, &mut items);
    assert_eq!(got as usize, 64 * TYPESIZE);
    assert_eq!(items, src[2000 * TYPESIZE..2064 * TYPESIZE]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: out-of-range requests fail with -1
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_getitem_out_of_range() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let (_, packed) = compressed_floats();

    let mut items = vec![0u8; 10 * TYPESIZE];
    assert_eq!(blosc::getitem(&packed, NITEMS, 10, &mut items), -1);
    assert_eq!(blosc::getitem(&packed, NITEMS - 5, 10, &mut items), -1);
}
