//! Compressed-buffer header: layout, encode/decode, and the `cbuffer_*`
//! introspection calls.
//!
//! Implements the 16-byte header described in README_HEADER.rst of the C
//! source and the corresponding metadata functions from blosc.c:
//!
//! | Rust function        | C equivalent             |
//! |----------------------|--------------------------|
//! | [`cbuffer_sizes`]    | `blosc_cbuffer_sizes`    |
//! | [`cbuffer_metainfo`] | `blosc_cbuffer_metainfo` |
//! | [`cbuffer_versions`] | `blosc_cbuffer_versions` |
//! | [`cbuffer_complib`]  | `blosc_cbuffer_complib`  |
//!
//! Layout (multi-byte fields little-endian):
//!
//! ```text
//! |-0-|-1-|-2-|-3-|-4-|-5-|-6-|-7-|-8-|-9-|-A-|-B-|-C-|-D-|-E-|-F-|
//!   ^   ^   ^   ^   |  nbytes       |  blocksize    |  cbytes       |
//!   |   |   |   +-- typesize
//!   |   |   +------ flags
//!   |   +---------- versionlz (format version of the inner codec)
//!   +-------------- version   (Blosc format version)
//! ```
//!
//! Introspection is best-effort by contract: a buffer whose header is not
//! recognized yields zero/false-filled results, never an error or a panic.

use crate::config::MIN_HEADER_LENGTH;
use crate::VERSION_FORMAT;

// ─────────────────────────────────────────────────────────────────────────────
// Flag bits (blosc.h)
// ─────────────────────────────────────────────────────────────────────────────

/// Byte-shuffle filter was applied (BLOSC_DOSHUFFLE).
pub const FLAG_DOSHUFFLE: u8 = 0x1;
/// Buffer is a plain memcpy of the source (BLOSC_MEMCPYED).
pub const FLAG_MEMCPYED: u8 = 0x2;
/// Bit-shuffle filter was applied (BLOSC_DOBITSHUFFLE).
pub const FLAG_DOBITSHUFFLE: u8 = 0x4;
/// Full blocks are stored as one stream per byte plane. Readers need no
/// global state to decide how a block was encoded.
pub const FLAG_DOSPLIT: u8 = 0x10;

/// Mask of the compressor format code stored in flag bits 5-7.
pub const FLAG_CODEC_MASK: u8 = 0xe0;
/// Shift of the compressor format code within the flags byte.
pub const FLAG_CODEC_SHIFT: u32 = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Header
// ─────────────────────────────────────────────────────────────────────────────

/// Decoded form of the 16-byte buffer header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub versionlz: u8,
    pub flags: u8,
    pub typesize: u8,
    pub nbytes: u32,
    pub blocksize: u32,
    pub cbytes: u32,
}

impl Header {
    /// Parse and sanity-check a header.
    ///
    /// Returns `None` when the buffer is too short, stems from an unknown
    /// format version, or carries internally inconsistent lengths. All the
    /// `cbuffer_*` calls and the decompression path gate on this.
    pub fn read(src: &[u8]) -> Option<Header> {
        if src.len() < MIN_HEADER_LENGTH {
            return None;
        }
        let header = Header {
            version: src[0],
            versionlz: src[1],
            flags: src[2],
            typesize: src[3],
            nbytes: u32::from_le_bytes([src[4], src[5], src[6], src[7]]),
            blocksize: u32::from_le_bytes([src[8], src[9], src[10], src[11]]),
            cbytes: u32::from_le_bytes([src[12], src[13], src[14], src[15]]),
        };
        if header.version == 0 || header.version > VERSION_FORMAT {
            return None;
        }
        if (header.cbytes as usize) < MIN_HEADER_LENGTH {
            return None;
        }
        if header.nbytes > 0 && (header.typesize == 0 || header.blocksize == 0) {
            return None;
        }
        Some(header)
    }

    /// Serialize into the first 16 bytes of `dest`.
    pub fn write(&self, dest: &mut [u8]) {
        dest[0] = self.version;
        dest[1] = self.versionlz;
        dest[2] = self.flags;
        dest[3] = self.typesize;
        dest[4..8].copy_from_slice(&self.nbytes.to_le_bytes());
        dest[8..12].copy_from_slice(&self.blocksize.to_le_bytes());
        dest[12..16].copy_from_slice(&self.cbytes.to_le_bytes());
    }

    pub fn shuffled(&self) -> bool {
        self.flags & FLAG_DOSHUFFLE != 0
    }

    pub fn bit_shuffled(&self) -> bool {
        self.flags & FLAG_DOBITSHUFFLE != 0
    }

    pub fn memcpyed(&self) -> bool {
        self.flags & FLAG_MEMCPYED != 0
    }

    pub fn split(&self) -> bool {
        self.flags & FLAG_DOSPLIT != 0
    }

    /// Compressor format code recorded in the upper flag bits.
    pub fn codec_format(&self) -> u8 {
        (self.flags & FLAG_CODEC_MASK) >> FLAG_CODEC_SHIFT
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Introspection — pure reads over the header, safe to call concurrently
// ─────────────────────────────────────────────────────────────────────────────

/// Return `(nbytes, cbytes, blocksize)` recorded in a compressed buffer.
///
/// All zeros when the header is not recognized. Only the first 16 bytes of
/// the buffer are examined.
pub fn cbuffer_sizes(cbuffer: &[u8]) -> (usize, usize, usize) {
    match Header::read(cbuffer) {
        Some(h) => (h.nbytes as usize, h.cbytes as usize, h.blocksize as usize),
        None => (0, 0, 0),
    }
}

/// Return `(typesize, [shuffled, pure_memcpy, bit_shuffled])` for a
/// compressed buffer; zero/false-filled when the header is not recognized.
pub fn cbuffer_metainfo(cbuffer: &[u8]) -> (usize, [bool; 3]) {
    match Header::read(cbuffer) {
        Some(h) => (
            h.typesize as usize,
            [h.shuffled(), h.memcpyed(), h.bit_shuffled()],
        ),
        None => (0, [false; 3]),
    }
}

/// Return `(format_version, codec_format_version)` for a compressed buffer,
/// or zeros when the header is not recognized.
pub fn cbuffer_versions(cbuffer: &[u8]) -> (i32, i32) {
    match Header::read(cbuffer) {
        Some(h) => (h.version as i32, h.versionlz as i32),
        None => (0, 0),
    }
}

/// Name of the compression library stamped into a buffer's header, or
/// `None` when the header or the recorded format code is not recognized.
pub fn cbuffer_complib(cbuffer: &[u8]) -> Option<&'static str> {
    let header = Header::read(cbuffer)?;
    crate::codec::format_code_to_libname(header.codec_format())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header {
            version: VERSION_FORMAT,
            versionlz: 1,
            flags: FLAG_DOSHUFFLE | (1 << FLAG_CODEC_SHIFT),
            typesize: 4,
            nbytes: 4096,
            blocksize: 1024,
            cbytes: 512,
        }
    }

    #[test]
    fn header_roundtrip() {
        let mut buf = [0u8; 16];
        sample().write(&mut buf);
        assert_eq!(Header::read(&buf), Some(sample()));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let mut buf = [0u8; 16];
        sample().write(&mut buf);
        assert_eq!(Header::read(&buf[..15]), None);
    }

    #[test]
    fn zeroed_header_yields_zeroed_metadata() {
        let buf = [0u8; 16];
        assert_eq!(cbuffer_sizes(&buf), (0, 0, 0));
        assert_eq!(cbuffer_metainfo(&buf), (0, [false; 3]));
        assert_eq!(cbuffer_versions(&buf), (0, 0));
        assert_eq!(cbuffer_complib(&buf), None);
    }

    #[test]
    fn future_version_is_rejected() {
        let mut buf = [0u8; 16];
        let mut h = sample();
        h.version = VERSION_FORMAT + 1;
        h.write(&mut buf);
        assert_eq!(Header::read(&buf), None);
    }
}
