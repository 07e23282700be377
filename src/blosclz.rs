//! BloscLZ — the baseline LZ codec that is always compiled in.
//!
//! Port of blosclz.c (c-blosc-1.21), itself a descendant of FastLZ. The
//! encoder is a greedy single-pass hash matcher; the stream is a sequence of
//! two op kinds:
//!
//! * **Literal run** — control byte `0..=31` = run length minus one,
//!   followed by that many literal bytes.
//! * **Match** — control byte with the length code in the top three bits
//!   (`code + 2` bytes for codes 2..=6; code 7 means 9 bytes plus
//!   255-terminated extension bytes) and the distance high bits in the low
//!   five; one distance low byte follows. The reserved distance code 8191
//!   flags a far match, whose extra distance follows as a big-endian u16.
//!
//! Matches may overlap their own output (distance < length), which gives
//! run-length behavior on constant data. Distances are limited to
//! [`MAX_DISTANCE`] for the two-byte encoding and [`MAX_FARDISTANCE`]
//! overall; far matches must be at least [`MIN_FARMATCH`] long to pay for
//! their two extra bytes.

use crate::error::BloscError;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Distances up to this fit the two-byte match encoding.
pub const MAX_DISTANCE: usize = 8191;
/// Absolute distance limit (far matches carry a 16-bit extension).
pub const MAX_FARDISTANCE: usize = MAX_DISTANCE + 65535;
/// Minimum match length.
pub const MIN_MATCH: usize = 4;
/// Minimum length for a far match to be worth its wider encoding.
pub const MIN_FARMATCH: usize = 6;

/// Log2 of the hash table entry count.
const HASH_LOG: u32 = 14;
const HASH_SIZE: usize = 1 << HASH_LOG;

/// Inputs shorter than this are emitted as bare literal runs.
const MIN_COMPRESSIBLE: usize = 16;
/// No match may start within the last few bytes; they always end as literals.
const TAIL_LITERALS: usize = 12;

/// Fibonacci-style multiplicative hash over a 4-byte window.
#[inline]
fn hash(v: u32) -> usize {
    (v.wrapping_mul(2_654_435_761) >> (32 - HASH_LOG)) as usize
}

#[inline]
fn read_u32(src: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([src[pos], src[pos + 1], src[pos + 2], src[pos + 3]])
}

// ─────────────────────────────────────────────────────────────────────────────
// Compression
// ─────────────────────────────────────────────────────────────────────────────

/// Append `lits` as literal-run ops (at most 32 literals per control byte).
fn emit_literals(out: &mut Vec<u8>, lits: &[u8]) {
    for run in lits.chunks(32) {
        out.push((run.len() - 1) as u8);
        out.extend_from_slice(run);
    }
}

/// Append one match op for `len` bytes at back-distance `dist_val + 1`.
fn emit_match(out: &mut Vec<u8>, len: usize, dist_val: usize) {
    debug_assert!(len >= MIN_MATCH && dist_val <= MAX_FARDISTANCE);
    let code = (len - 2).min(7) as u8;
    let (high, low, far) = if dist_val < MAX_DISTANCE {
        ((dist_val >> 8) as u8, (dist_val & 0xff) as u8, None)
    } else {
        // Distance code 8191 marks a far match; the u16 extension follows
        // the distance low byte.
        (31, 255, Some((dist_val - MAX_DISTANCE) as u16))
    };
    out.push((code << 5) | high);
    if code == 7 {
        let mut ext = len - 9;
        while ext >= 255 {
            out.push(255);
            ext -= 255;
        }
        out.push(ext as u8);
    }
    out.push(low);
    if let Some(extra) = far {
        out.extend_from_slice(&extra.to_be_bytes());
    }
}

/// Compress `src` into a fresh buffer.
///
/// The output is unbounded here; the container layer falls back to storing
/// the stream raw whenever the result is not strictly smaller than the
/// input, so a pathological expansion never reaches the wire.
pub fn compress(src: &[u8]) -> Vec<u8> {
    let n = src.len();
    let mut out = Vec::with_capacity(n / 2 + 64);
    if n < MIN_COMPRESSIBLE {
        emit_literals(&mut out, src);
        return out;
    }

    let mut table = vec![0u32; HASH_SIZE]; // position + 1; 0 = empty
    let limit = n - TAIL_LITERALS;
    let mut ip = 0usize;
    let mut anchor = 0usize;

    while ip < limit {
        let v = read_u32(src, ip);
        let h = hash(v);
        let cand = table[h] as usize;
        table[h] = (ip + 1) as u32;
        if cand > 0 {
            let cand = cand - 1;
            let dist_val = ip - cand - 1;
            if dist_val <= MAX_FARDISTANCE && read_u32(src, cand) == v {
                let mut len = MIN_MATCH;
                let maxlen = n - ip;
                while len < maxlen && src[cand + len] == src[ip + len] {
                    len += 1;
                }
                let far = dist_val >= MAX_DISTANCE;
                if !(far && len < MIN_FARMATCH) {
                    emit_literals(&mut out, &src[anchor..ip]);
                    emit_match(&mut out, len, dist_val);
                    ip += len;
                    anchor = ip;
                    continue;
                }
            }
        }
        ip += 1;
    }
    emit_literals(&mut out, &src[anchor..]);
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Decompression
// ─────────────────────────────────────────────────────────────────────────────

/// Decompress a blosclz stream into `dest`, which must be sized to the
/// exact uncompressed length. Every read is bounds-checked; malformed
/// input yields [`BloscError::Corrupt`], never a panic or out-of-bounds
/// write.
pub fn decompress(src: &[u8], dest: &mut [u8]) -> Result<(), BloscError> {
    let n = dest.len();
    let mut ip = 0usize;
    let mut op = 0usize;

    macro_rules! next {
        () => {{
            let b = *src.get(ip).ok_or(BloscError::Corrupt)?;
            ip += 1;
            b
        }};
    }

    while op < n {
        let ctrl = next!();
        if ctrl < 32 {
            // Literal run.
            let run = ctrl as usize + 1;
            if ip + run > src.len() || op + run > n {
                return Err(BloscError::Corrupt);
            }
            dest[op..op + run].copy_from_slice(&src[ip..ip + run]);
            ip += run;
            op += run;
        } else {
            // Match.
            let code = (ctrl >> 5) as usize;
            let mut len = code + 2;
            if code == 7 {
                len = 9;
                loop {
                    let b = next!();
                    len += b as usize;
                    if b < 255 {
                        break;
                    }
                }
            }
            let mut dist_val = ((ctrl & 31) as usize) << 8 | next!() as usize;
            if dist_val == MAX_DISTANCE {
                let hi = next!() as usize;
                let lo = next!() as usize;
                dist_val += (hi << 8) | lo;
            }
            let distance = dist_val + 1;
            if distance > op || op + len > n {
                return Err(BloscError::Corrupt);
            }
            // Overlapping copy: byte-at-a-time so distance < len replicates.
            for k in 0..len {
                dest[op + k] = dest[op + k - distance];
            }
            op += len;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data: &[u8]) {
        let packed = compress(data);
        let mut back = vec![0u8; data.len()];
        decompress(&packed, &mut back).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn roundtrip_constant_data() {
        let data = vec![0x5au8; 100_000];
        let packed = compress(&data);
        assert!(packed.len() < data.len() / 100);
        let mut back = vec![0u8; data.len()];
        decompress(&packed, &mut back).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn roundtrip_periodic_data() {
        let data: Vec<u8> = (0..65_536usize).map(|i| (i % 48) as u8).collect();
        roundtrip(&data);
    }

    #[test]
    fn roundtrip_text() {
        let data = b"the quick brown fox jumps over the lazy dog. ".repeat(200);
        let packed = compress(&data);
        assert!(packed.len() < data.len());
        let mut back = vec![0u8; data.len()];
        decompress(&packed, &mut back).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn roundtrip_pseudorandom_data() {
        // xorshift noise; expansion is fine, correctness is not optional.
        let mut x = 0x1234_5678u32;
        let data: Vec<u8> = (0..10_000)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                x as u8
            })
            .collect();
        roundtrip(&data);
    }

    #[test]
    fn roundtrip_short_inputs() {
        for len in 0..MIN_COMPRESSIBLE + 4 {
            let data: Vec<u8> = (0..len as u8).collect();
            roundtrip(&data);
        }
    }

    #[test]
    fn far_matches_roundtrip() {
        // Repetition period beyond MAX_DISTANCE forces the far encoding.
        let unit: Vec<u8> = (0..10_000usize).map(|i| (i * 7 % 253) as u8).collect();
        let mut data = unit.clone();
        data.extend_from_slice(&unit);
        roundtrip(&data);
    }

    #[test]
    fn truncated_stream_is_corrupt() {
        let data = b"abcdabcdabcdabcdabcdabcdabcd".repeat(8);
        let packed = compress(&data);
        let mut back = vec![0u8; data.len()];
        assert!(decompress(&packed[..packed.len() / 2], &mut back).is_err());
    }

    #[test]
    fn bogus_distance_is_corrupt() {
        // A match op referring before the start of the output.
        let stream = [(7u8 << 5) | 31, 0, 200, 100];
        let mut back = vec![0u8; 64];
        assert!(decompress(&stream, &mut back).is_err());
    }
}
