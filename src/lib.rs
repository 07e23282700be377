// blosc — Rust port of the c-blosc-1.21 blocked compression library

pub mod blosclz;
pub mod codec;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod global;
pub mod header;
pub mod shuffle;

mod container;

#[cfg(feature = "c-abi")]
pub mod abi;

// ── Version constants (mirrors blosc.h) ──────────────────────────────────────
pub const VERSION_MAJOR: u32 = 1;
pub const VERSION_MINOR: u32 = 21;
pub const VERSION_RELEASE: u32 = 6;
pub const VERSION_STRING: &str = "1.21.6";
/// Version of the compressed-buffer format this build reads and writes
/// (header byte 0). Buffers from newer formats are rejected on decode.
pub const VERSION_FORMAT: u8 = 2;

/// Returns the runtime version string (equivalent to
/// `blosc_get_version_string()`).
pub fn get_version_string() -> &'static str {
    VERSION_STRING
}

// ── Top-level re-exports ──────────────────────────────────────────────────────
pub use codec::{
    compcode_to_compname, compname_to_compcode, complib_info, list_compressors, Compressor,
};
pub use config::{
    SplitMode, MAX_BUFFERSIZE, MAX_OVERHEAD, MAX_THREADS, MAX_TYPESIZE, MIN_BUFFERSIZE,
    MIN_HEADER_LENGTH,
};
pub use context::Context;
pub use error::BloscError;
pub use global::{
    compress, decompress, destroy, free_resources, get_blocksize, get_compressor,
    get_nthreads, getitem, init, set_blocksize, set_compressor, set_nthreads, set_splitmode,
};
pub use header::{cbuffer_complib, cbuffer_metainfo, cbuffer_sizes, cbuffer_versions};
pub use shuffle::Filter;
