//! Codec registry: name/code tables and per-stream backend dispatch.
//!
//! Covers the compressor-catalog calls of blosc.c:
//!
//! | Rust function              | C equivalent                 |
//! |----------------------------|------------------------------|
//! | [`Compressor::from_name`]  | `blosc_compname_to_compcode` |
//! | [`compcode_to_compname`]   | `blosc_compcode_to_compname` |
//! | [`list_compressors`]       | `blosc_list_compressors`     |
//! | [`complib_info`]           | `blosc_get_complib_info`     |
//!
//! BloscLZ is always present. The other backends are Cargo features, on by
//! default; a codec disabled at build time still has a stable code and name
//! here so that catalog lookups and error messages stay meaningful, but
//! [`Compressor::supported`] reports it absent and compression with it
//! fails with [`BloscError::CodecUnavailable`].

#[cfg(feature = "zlib")]
use std::io::Write as _;

use crate::error::BloscError;

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// A selectable compression backend.
///
/// Discriminants are the public compressor codes (BLOSC_BLOSCLZ and
/// friends); these are API values, distinct from the 3-bit format codes
/// stamped into buffer headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Compressor {
    #[default]
    BloscLz = 0,
    Lz4 = 1,
    Lz4hc = 2,
    Snappy = 3,
    Zlib = 4,
    Zstd = 5,
}

/// Every codec in catalog order.
pub const ALL: [Compressor; 6] = [
    Compressor::BloscLz,
    Compressor::Lz4,
    Compressor::Lz4hc,
    Compressor::Snappy,
    Compressor::Zlib,
    Compressor::Zstd,
];

impl Compressor {
    /// Canonical lowercase name, as accepted by `set_compressor`.
    pub fn name(self) -> &'static str {
        match self {
            Compressor::BloscLz => "blosclz",
            Compressor::Lz4 => "lz4",
            Compressor::Lz4hc => "lz4hc",
            Compressor::Snappy => "snappy",
            Compressor::Zlib => "zlib",
            Compressor::Zstd => "zstd",
        }
    }

    /// Look a codec up by its canonical name. Names are case-sensitive,
    /// matching the C library.
    pub fn from_name(name: &str) -> Option<Compressor> {
        ALL.into_iter().find(|c| c.name() == name)
    }

    /// Look a codec up by its public code.
    pub fn from_code(code: i32) -> Option<Compressor> {
        ALL.into_iter().find(|&c| c as i32 == code)
    }

    /// Whether the backing implementation was compiled into this build.
    pub fn supported(self) -> bool {
        match self {
            Compressor::BloscLz => true,
            Compressor::Lz4 | Compressor::Lz4hc => cfg!(feature = "lz4"),
            Compressor::Snappy => cfg!(feature = "snappy"),
            Compressor::Zlib => cfg!(feature = "zlib"),
            Compressor::Zstd => cfg!(feature = "zstd"),
        }
    }

    /// The 3-bit format code recorded in buffer headers. LZ4 and LZ4HC
    /// share a stream format and therefore a format code.
    pub fn format_code(self) -> u8 {
        match self {
            Compressor::BloscLz => 0,
            Compressor::Lz4 | Compressor::Lz4hc => 1,
            Compressor::Snappy => 2,
            Compressor::Zlib => 3,
            Compressor::Zstd => 4,
        }
    }

    /// Format version stamped into the header's `versionlz` byte.
    pub fn version_format(self) -> u8 {
        1
    }

    /// Name of the backing compression library, as reported by
    /// `cbuffer_complib` and `complib_info`.
    pub fn libname(self) -> &'static str {
        match self {
            Compressor::BloscLz => "BloscLZ",
            Compressor::Lz4 | Compressor::Lz4hc => "LZ4",
            Compressor::Snappy => "Snappy",
            Compressor::Zlib => "Zlib",
            Compressor::Zstd => "Zstd",
        }
    }
}

/// Decode a header format code back into the codec that can read it.
pub fn format_code_to_decoder(code: u8) -> Option<Compressor> {
    match code {
        0 => Some(Compressor::BloscLz),
        1 => Some(Compressor::Lz4),
        2 => Some(Compressor::Snappy),
        3 => Some(Compressor::Zlib),
        4 => Some(Compressor::Zstd),
        _ => None,
    }
}

/// Library name for a header format code.
pub fn format_code_to_libname(code: u8) -> Option<&'static str> {
    format_code_to_decoder(code).map(Compressor::libname)
}

/// Name for a public compressor code, independent of build features.
pub fn compcode_to_compname(code: i32) -> Option<&'static str> {
    Compressor::from_code(code).map(Compressor::name)
}

/// Code for a codec name; `None` when the name is unknown or the codec is
/// not compiled in, matching `blosc_compname_to_compcode`.
pub fn compname_to_compcode(name: &str) -> Option<i32> {
    Compressor::from_name(name)
        .filter(|c| c.supported())
        .map(|c| c as i32)
}

/// Names of the codecs usable in this build, in catalog order. BloscLZ is
/// always first.
pub fn list_compressors() -> Vec<&'static str> {
    ALL.into_iter()
        .filter(|c| c.supported())
        .map(Compressor::name)
        .collect()
}

/// `(library name, version)` for a codec name, or `None` when the codec is
/// unknown or not compiled in. Versions are those of the bundled backend
/// implementations.
pub fn complib_info(compname: &str) -> Option<(&'static str, &'static str)> {
    let codec = Compressor::from_name(compname)?;
    if !codec.supported() {
        return None;
    }
    let version = match codec {
        Compressor::BloscLz => "2.0.0",
        Compressor::Lz4 | Compressor::Lz4hc => "1.9.4",
        Compressor::Snappy => "1.1.0",
        Compressor::Zlib => "1.2.13",
        Compressor::Zstd => "1.5.5",
    };
    Some((codec.libname(), version))
}

// ─────────────────────────────────────────────────────────────────────────────
// Stream dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Clamp a Blosc level (1..=9) onto zstd's useful positive range.
#[cfg(feature = "zstd")]
fn zstd_level(clevel: i32) -> i32 {
    (clevel * 2).clamp(1, 19)
}

/// Compress one stream with the selected backend.
///
/// The result may be larger than the input; the container compares and
/// stores the stream raw in that case, so backends never need a bounded
/// output mode.
pub fn compress_stream(
    codec: Compressor,
    clevel: i32,
    src: &[u8],
) -> Result<Vec<u8>, BloscError> {
    if !codec.supported() {
        return Err(BloscError::CodecUnavailable(codec.name()));
    }
    let _ = clevel;
    match codec {
        Compressor::BloscLz => Ok(crate::blosclz::compress(src)),
        #[cfg(feature = "lz4")]
        Compressor::Lz4 | Compressor::Lz4hc => Ok(lz4_flex::block::compress(src)),
        #[cfg(feature = "snappy")]
        Compressor::Snappy => snap::raw::Encoder::new()
            .compress_vec(src)
            .map_err(|e| BloscError::Internal(e.to_string())),
        #[cfg(feature = "zlib")]
        Compressor::Zlib => {
            let level = flate2::Compression::new(clevel.clamp(1, 9) as u32);
            let mut enc = flate2::write::ZlibEncoder::new(
                Vec::with_capacity(src.len() / 2 + 64),
                level,
            );
            enc.write_all(src)
                .and_then(|_| enc.finish())
                .map_err(|e| BloscError::Internal(e.to_string()))
        }
        #[cfg(feature = "zstd")]
        Compressor::Zstd => zstd::bulk::compress(src, zstd_level(clevel))
            .map_err(|e| BloscError::Internal(e.to_string())),
        #[allow(unreachable_patterns)]
        _ => Err(BloscError::CodecUnavailable(codec.name())),
    }
}

/// Decompress one stream into `dest`, which must be sized to the exact
/// uncompressed stream length. Any backend failure or length mismatch is
/// reported as [`BloscError::Corrupt`].
pub fn decompress_stream(
    codec: Compressor,
    src: &[u8],
    dest: &mut [u8],
) -> Result<(), BloscError> {
    if !codec.supported() {
        return Err(BloscError::CodecUnavailable(codec.name()));
    }
    match codec {
        Compressor::BloscLz => crate::blosclz::decompress(src, dest),
        #[cfg(feature = "lz4")]
        Compressor::Lz4 | Compressor::Lz4hc => {
            let out = lz4_flex::block::decompress(src, dest.len())
                .map_err(|_| BloscError::Corrupt)?;
            if out.len() != dest.len() {
                return Err(BloscError::Corrupt);
            }
            dest.copy_from_slice(&out);
            Ok(())
        }
        #[cfg(feature = "snappy")]
        Compressor::Snappy => {
            let out = snap::raw::Decoder::new()
                .decompress_vec(src)
                .map_err(|_| BloscError::Corrupt)?;
            if out.len() != dest.len() {
                return Err(BloscError::Corrupt);
            }
            dest.copy_from_slice(&out);
            Ok(())
        }
        #[cfg(feature = "zlib")]
        Compressor::Zlib => {
            let mut dec =
                flate2::write::ZlibDecoder::new(Vec::with_capacity(dest.len()));
            let out = dec
                .write_all(src)
                .and_then(|_| dec.finish())
                .map_err(|_| BloscError::Corrupt)?;
            if out.len() != dest.len() {
                return Err(BloscError::Corrupt);
            }
            dest.copy_from_slice(&out);
            Ok(())
        }
        #[cfg(feature = "zstd")]
        Compressor::Zstd => {
            let out = zstd::bulk::decompress(src, dest.len())
                .map_err(|_| BloscError::Corrupt)?;
            if out.len() != dest.len() {
                return Err(BloscError::Corrupt);
            }
            dest.copy_from_slice(&out);
            Ok(())
        }
        #[allow(unreachable_patterns)]
        _ => Err(BloscError::CodecUnavailable(codec.name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_codes_are_stable() {
        assert_eq!(Compressor::from_name("blosclz"), Some(Compressor::BloscLz));
        assert_eq!(Compressor::BloscLz as i32, 0);
        assert_eq!(Compressor::Lz4 as i32, 1);
        assert_eq!(Compressor::Lz4hc as i32, 2);
        assert_eq!(Compressor::Snappy as i32, 3);
        assert_eq!(Compressor::Zlib as i32, 4);
        assert_eq!(Compressor::Zstd as i32, 5);
        assert_eq!(compcode_to_compname(0), Some("blosclz"));
        assert_eq!(compcode_to_compname(6), None);
        assert_eq!(Compressor::from_name("BLOSCLZ"), None);
    }

    #[test]
    fn blosclz_heads_the_compressor_list() {
        let names = list_compressors();
        assert_eq!(names[0], "blosclz");
        assert!(!names.is_empty());
    }

    #[test]
    fn lz4_variants_share_a_format_code() {
        assert_eq!(
            Compressor::Lz4.format_code(),
            Compressor::Lz4hc.format_code()
        );
        assert_eq!(format_code_to_libname(0), Some("BloscLZ"));
        assert_eq!(format_code_to_libname(7), None);
    }

    #[test]
    fn complib_info_reports_known_codecs() {
        assert_eq!(complib_info("blosclz"), Some(("BloscLZ", "2.0.0")));
        assert_eq!(complib_info("nosuch"), None);
    }

    #[test]
    fn every_supported_backend_roundtrips() {
        let data: Vec<u8> = (0..20_000usize).map(|i| (i % 97) as u8).collect();
        for codec in ALL.into_iter().filter(|c| c.supported()) {
            let packed = compress_stream(codec, 5, &data).unwrap();
            let mut back = vec![0u8; data.len()];
            decompress_stream(codec, &packed, &mut back).unwrap();
            assert_eq!(back, data, "codec {}", codec.name());
        }
    }
}
