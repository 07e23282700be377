//! Shuffle filters: byte-plane transposition and bit-plane transposition.
//!
//! Ported from shuffle-generic.c / bitshuffle-generic.c of the C source.
//! Both filters are pure permutations applied per block before the codec
//! stage; neither changes the data length, and both are exactly inverted on
//! decompression.
//!
//! Byte shuffle rearranges `n` elements of `typesize` bytes into `typesize`
//! contiguous byte planes of `n` bytes each. Bit shuffle does the same at
//! bit granularity: `8 * typesize` bit planes. Trailing bytes that do not
//! form a complete element (or, for bit shuffle, a complete group of eight
//! elements) are copied through unchanged, as in the C kernels.

// ─────────────────────────────────────────────────────────────────────────────
// Filter selector
// ─────────────────────────────────────────────────────────────────────────────

/// Pre-compression filter, as passed via the `doshuffle` argument
/// (BLOSC_NOSHUFFLE / BLOSC_SHUFFLE / BLOSC_BITSHUFFLE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Filter {
    /// No reordering.
    #[default]
    None = 0,
    /// Byte-plane shuffle.
    Shuffle = 1,
    /// Bit-plane shuffle; slower, but can expose more redundancy.
    BitShuffle = 2,
}

impl Filter {
    /// Decode the C constant; `None` for values outside 0..=2.
    pub fn from_i32(v: i32) -> Option<Filter> {
        match v {
            0 => Some(Filter::None),
            1 => Some(Filter::Shuffle),
            2 => Some(Filter::BitShuffle),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Byte shuffle
// ─────────────────────────────────────────────────────────────────────────────

/// Transpose `src` into byte planes: output plane `j` holds the `j`-th byte
/// of every complete element. `dest` must be the same length as `src`.
pub fn shuffle(typesize: usize, src: &[u8], dest: &mut [u8]) {
    debug_assert_eq!(src.len(), dest.len());
    if typesize <= 1 || src.len() < typesize {
        dest.copy_from_slice(src);
        return;
    }
    let nelems = src.len() / typesize;
    for (e, elem) in src.chunks_exact(typesize).enumerate() {
        for (j, &byte) in elem.iter().enumerate() {
            dest[j * nelems + e] = byte;
        }
    }
    let tail = nelems * typesize;
    dest[tail..].copy_from_slice(&src[tail..]);
}

/// Inverse of [`shuffle`].
pub fn unshuffle(typesize: usize, src: &[u8], dest: &mut [u8]) {
    debug_assert_eq!(src.len(), dest.len());
    if typesize <= 1 || src.len() < typesize {
        dest.copy_from_slice(src);
        return;
    }
    let nelems = src.len() / typesize;
    for (e, elem) in dest.chunks_exact_mut(typesize).enumerate() {
        for (j, byte) in elem.iter_mut().enumerate() {
            *byte = src[j * nelems + e];
        }
    }
    let tail = nelems * typesize;
    dest[tail..].copy_from_slice(&src[tail..]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Bit shuffle
// ─────────────────────────────────────────────────────────────────────────────

/// Transpose `src` into bit planes. Elements are processed in groups of
/// eight; each of the `8 * typesize` planes receives one bit per element.
/// The trailing group fragment is copied through unchanged.
pub fn bitshuffle(typesize: usize, src: &[u8], dest: &mut [u8]) {
    debug_assert_eq!(src.len(), dest.len());
    let nelems = src.len() / typesize.max(1);
    let full = nelems - nelems % 8;
    if typesize == 0 || full == 0 {
        dest.copy_from_slice(src);
        return;
    }
    let plane_len = full / 8;
    let nplanes = typesize * 8;
    dest[..plane_len * nplanes].fill(0);
    for e in 0..full {
        for j in 0..typesize {
            let byte = src[e * typesize + j];
            for k in 0..8 {
                let bit = (byte >> k) & 1;
                dest[(j * 8 + k) * plane_len + e / 8] |= bit << (e % 8);
            }
        }
    }
    let tail = full * typesize;
    dest[tail..].copy_from_slice(&src[tail..]);
}

/// Inverse of [`bitshuffle`].
pub fn bitunshuffle(typesize: usize, src: &[u8], dest: &mut [u8]) {
    debug_assert_eq!(src.len(), dest.len());
    let nelems = src.len() / typesize.max(1);
    let full = nelems - nelems % 8;
    if typesize == 0 || full == 0 {
        dest.copy_from_slice(src);
        return;
    }
    let plane_len = full / 8;
    dest[..full * typesize].fill(0);
    for e in 0..full {
        for j in 0..typesize {
            let mut byte = 0u8;
            for k in 0..8 {
                let bit = (src[(j * 8 + k) * plane_len + e / 8] >> (e % 8)) & 1;
                byte |= bit << k;
            }
            dest[e * typesize + j] = byte;
        }
    }
    let tail = full * typesize;
    dest[tail..].copy_from_slice(&src[tail..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn shuffle_transposes_planes() {
        let src = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let mut out = [0u8; 6];
        shuffle(2, &src, &mut out);
        assert_eq!(out, [0x01, 0x03, 0x05, 0x02, 0x04, 0x06]);
    }

    #[test]
    fn shuffle_roundtrip_with_tail() {
        for typesize in [1usize, 2, 3, 4, 8, 16] {
            let src = pattern(1000 + 3); // deliberately not a typesize multiple
            let mut mid = vec![0u8; src.len()];
            let mut back = vec![0u8; src.len()];
            shuffle(typesize, &src, &mut mid);
            unshuffle(typesize, &mid, &mut back);
            assert_eq!(back, src, "typesize {typesize}");
        }
    }

    #[test]
    fn bitshuffle_roundtrip() {
        for typesize in [1usize, 2, 4, 8] {
            for len in [typesize * 8, 500, 1021] {
                let src = pattern(len);
                let mut mid = vec![0u8; len];
                let mut back = vec![0u8; len];
                bitshuffle(typesize, &src, &mut mid);
                bitunshuffle(typesize, &mid, &mut back);
                assert_eq!(back, src, "typesize {typesize} len {len}");
            }
        }
    }

    #[test]
    fn bitshuffle_concentrates_low_entropy_bits() {
        // 16-bit values all below 256: the high byte planes must come out
        // as all-zero runs.
        let src: Vec<u8> = (0..512u16).flat_map(|i| (i % 200).to_le_bytes()).collect();
        let mut out = vec![0u8; src.len()];
        bitshuffle(2, &src, &mut out);
        let plane_len = src.len() / 2 / 8;
        assert!(out[8 * plane_len..].iter().all(|&b| b == 0));
    }
}
