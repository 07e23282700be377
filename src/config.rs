// config.rs — Compile-time configuration constants.
// Migrated from blosc.h / blosc-common.h (c-blosc-1.21/blosc).

/// Minimum length of a compressed buffer: the bare header.
/// Corresponds to BLOSC_MIN_HEADER_LENGTH in blosc.h.
pub const MIN_HEADER_LENGTH: usize = 16;

/// Maximum overhead added by compression. Sizing the destination buffer to
/// `nbytes + MAX_OVERHEAD` guarantees that compression succeeds.
/// Corresponds to BLOSC_MAX_OVERHEAD in blosc.h.
pub const MAX_OVERHEAD: usize = MIN_HEADER_LENGTH;

/// Maximum typesize that still fits in the one-byte header field.
/// Corresponds to BLOSC_MAX_TYPESIZE in blosc.h. Larger typesizes are
/// treated as a plain byte stream (typesize 1, shuffle disabled).
pub const MAX_TYPESIZE: usize = 255;

/// Maximum source buffer size that can be compressed: the header length
/// fields are 32-bit. Corresponds to BLOSC_MAX_BUFFERSIZE in blosc.h.
pub const MAX_BUFFERSIZE: usize = i32::MAX as usize - MAX_OVERHEAD;

/// Sources smaller than this are stored with a plain memcpy; the container
/// bookkeeping would outweigh any compression gain.
/// Corresponds to BLOSC_MIN_BUFFERSIZE in blosc.c.
pub const MIN_BUFFERSIZE: usize = 128;

/// Maximum number of byte-plane streams a block is split into.
/// Corresponds to MAX_SPLITS in blosc.c.
pub const MAX_SPLITS: usize = 16;

/// Maximum number of worker threads selectable at runtime.
/// Corresponds to BLOSC_MAX_THREADS in blosc.h.
pub const MAX_THREADS: i32 = 256;

/// Typical L1 data cache size; anchor for the automatic blocksize heuristic.
pub const L1: usize = 32 * 1024;

/// Typical L2 cache size; blocksize ceiling for the highest levels.
pub const L2: usize = 256 * 1024;

/// Default number of worker threads (serial operation).
pub const NTHREADS_DEFAULT: i32 = 1;

// ─────────────────────────────────────────────────────────────────────────────
// Split mode — whether a block's shuffled byte planes are compressed as
// separate streams (blosc.h BLOSC_*_SPLIT).
// ─────────────────────────────────────────────────────────────────────────────

/// Policy controlling whether full blocks are split into one compressed
/// stream per byte plane after the shuffle filter.
///
/// Splitting never affects round-trip correctness, only the ratio/speed
/// tradeoff. `ForwardCompat` is the default, as in the C library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SplitMode {
    /// Split unconditionally (whenever the block shape allows it at all).
    Always = 1,
    /// Never split.
    Never = 2,
    /// Heuristic choice; currently splits for the fast LZ codecs only.
    Auto = 3,
    /// Split the way pre-1.11 C-Blosc always did, so older readers can
    /// still decode the output.
    ForwardCompat = 4,
}

impl SplitMode {
    /// Decode the numeric constant used by the C API; `None` for values
    /// outside 1..=4.
    pub fn from_i32(v: i32) -> Option<SplitMode> {
        match v {
            1 => Some(SplitMode::Always),
            2 => Some(SplitMode::Never),
            3 => Some(SplitMode::Auto),
            4 => Some(SplitMode::ForwardCompat),
            _ => None,
        }
    }
}

/// Default split mode (BLOSC_FORWARD_COMPAT_SPLIT).
pub const SPLITMODE_DEFAULT: SplitMode = SplitMode::ForwardCompat;

/// Compute the automatic blocksize for a compression level.
///
/// Mirrors `compute_blocksize` in blosc.c: low levels favor L1-resident
/// blocks, high levels trade cache locality for ratio. The result is
/// clamped to the source size and rounded down to a typesize multiple so
/// full blocks shuffle and split cleanly.
pub fn automatic_blocksize(clevel: i32, typesize: usize, nbytes: usize) -> usize {
    let mut blocksize = match clevel {
        0..=3 => L1,
        4..=6 => 4 * L1,
        7 | 8 => L2,
        _ => 2 * L2,
    };
    if blocksize > nbytes {
        blocksize = nbytes;
    }
    let typesize = typesize.clamp(1, MAX_TYPESIZE);
    if blocksize > typesize {
        blocksize -= blocksize % typesize;
    }
    blocksize.max(typesize).max(1)
}
