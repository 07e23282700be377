//! E2E Test Suite 07: Sentinel Error Contract
//!
//! The global regime keeps the C return-value contract:
//! - compress: size > 0, 0 = destination too small, -1 = hard failure,
//!   -10 = out-of-range parameter
//! - decompress / getitem: size >= 0 or -1
//! - setters: previous value / code, or -1
//!
//! A zero from compress is a capacity report, not output: grow the
//! destination to nbytes + MAX_OVERHEAD and retry.

extern crate blosc;

use std::sync::Mutex;

static GLOBAL_API: Mutex<()> = Mutex::new(());

fn sample() -> Vec<u8> {
    (0..50_000u32).flat_map(u32::to_le_bytes).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: bad parameters return -10
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_bad_parameters_return_minus_ten() {
    let _guard = GLOBAL_API.lock().unwrap();
    let src = sample();
    let mut dest = vec![0u8; src.len() + blosc::MAX_OVERHEAD];

    assert_eq!(blosc::compress(10, 1, 4, &src, &mut dest), -10);
    assert_eq!(blosc::compress(-1, 1, 4, &src, &mut dest), -10);
    assert_eq!(blosc::compress(5, 3, 4, &src, &mut dest), -10);
    assert_eq!(blosc::compress(5, -1, 4, &src, &mut dest), -10);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: zero means "grow the destination and retry"
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_zero_is_a_capacity_report() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let src = sample();

    let mut small = vec![0u8; 32];
    assert_eq!(blosc::compress(5, 1, 4, &src, &mut small), 0);

    // The documented retry size always succeeds.
    let mut full = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(5, 1, 4, &src, &mut full);
    assert!(cbytes > 0);
    assert!(cbytes as usize <= src.len() + blosc::MAX_OVERHEAD);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: decompress failures are -1
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_decompress_failures_return_minus_one() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let src = sample();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(5, 1, 4, &src, &mut packed) as usize;

    // Garbage header.
    let mut back = vec![0u8; src.len()];
    assert_eq!(blosc::decompress(&[0u8; 16], &mut back), -1);

    // Truncated buffer.
    assert_eq!(blosc::decompress(&packed[..cbytes / 2], &mut back), -1);

    // Destination shorter than nbytes. The -1 deliberately does not say
    // whether the buffer was corrupt or the destination short.
    let mut short = vec![0u8; src.len() / 2];
    assert_eq!(blosc::decompress(&packed[..cbytes], &mut short), -1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: corrupted payload bytes are caught, not crashed on
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_corrupted_payload_is_caught() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let src = sample();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(5, 1, 4, &src, &mut packed) as usize;
    let mut back = vec![0u8; src.len()];

    // Flip bytes throughout the body; every variant must either fail
    // cleanly or decode (a flip may land in dead padding), never panic.
    for at in (20..cbytes).step_by(97) {
        let mut bad = packed[..cbytes].to_vec();
        bad[at] ^= 0xff;
        let _ = blosc::decompress(&bad, &mut back);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: getitem failures are -1
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_getitem_failures_return_minus_one() {
    let _guard = GLOBAL_API.lock().unwrap();
    blosc::set_compressor("blosclz");
    let src = sample();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = blosc::compress(5, 1, 4, &src, &mut packed) as usize;

    let mut items = vec![0u8; 40];
    assert_eq!(blosc::getitem(&[0u8; 16], 0, 10, &mut items), -1);
    assert_eq!(blosc::getitem(&packed[..cbytes], 50_000, 10, &mut items), -1);
    // Destination too small for the requested items.
    assert_eq!(blosc::getitem(&packed[..cbytes], 0, 100, &mut items), -1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 6: setter sentinels
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_setter_sentinels() {
    let _guard = GLOBAL_API.lock().unwrap();
    assert_eq!(blosc::set_compressor("definitely-not-a-codec"), -1);
    assert_eq!(blosc::set_nthreads(-3), -1);
    assert_eq!(blosc::set_nthreads(blosc::MAX_THREADS + 1), -1);
    assert_eq!(blosc::set_splitmode(99), -1);
    assert_eq!(blosc::free_resources(), 0);
}
