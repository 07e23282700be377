//! Automatic blocksize heuristic: level bands, clamping, alignment.

use blosc::config::{automatic_blocksize, L1, L2};

const BIG: usize = 64 * 1024 * 1024;

#[test]
fn level_bands() {
    assert_eq!(automatic_blocksize(0, 4, BIG), L1);
    assert_eq!(automatic_blocksize(3, 4, BIG), L1);
    assert_eq!(automatic_blocksize(4, 4, BIG), 4 * L1);
    assert_eq!(automatic_blocksize(5, 4, BIG), 4 * L1);
    assert_eq!(automatic_blocksize(6, 4, BIG), 4 * L1);
    assert_eq!(automatic_blocksize(7, 4, BIG), L2);
    assert_eq!(automatic_blocksize(8, 4, BIG), L2);
    assert_eq!(automatic_blocksize(9, 4, BIG), 2 * L2);
}

#[test]
fn clamped_to_source_size() {
    assert_eq!(automatic_blocksize(5, 4, 1000), 1000);
    assert_eq!(automatic_blocksize(9, 1, 37), 37);
}

#[test]
fn aligned_to_typesize() {
    for typesize in [2usize, 3, 6, 8, 10, 16] {
        for clevel in [1, 5, 9] {
            let bs = automatic_blocksize(clevel, typesize, BIG);
            assert_eq!(bs % typesize, 0, "clevel {clevel} typesize {typesize}");
        }
        let bs = automatic_blocksize(5, typesize, 1001);
        assert_eq!(bs % typesize, 0, "clamped, typesize {typesize}");
    }
}

#[test]
fn never_zero() {
    assert!(automatic_blocksize(5, 4, 1) >= 1);
    assert!(automatic_blocksize(0, 300, 10) >= 1);
}
