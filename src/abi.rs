//! C-ABI shims — export the blosc.h entry points.
//!
//! Enabled with:
//!   cargo build --release --features c-abi
//!
//! The produced `target/release/libblosc.a` is a drop-in for programs that
//! link the C library's flat API. Every shim validates pointers and sizes
//! before touching memory and folds errors into the documented sentinel
//! values; callers get the C contract, never a panic across the boundary.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::slice;
use std::sync::OnceLock;

use crate::codec::{self, Compressor};
use crate::config::MIN_HEADER_LENGTH;
use crate::header::{self, Header};
use crate::{global, VERSION_STRING};

// ─── helpers ─────────────────────────────────────────────────────────────────

/// NUL-terminated canonical name for a codec, with static lifetime.
fn compname_cstr(codec: Compressor) -> *const c_char {
    let bytes: &'static [u8] = match codec {
        Compressor::BloscLz => b"blosclz\0",
        Compressor::Lz4 => b"lz4\0",
        Compressor::Lz4hc => b"lz4hc\0",
        Compressor::Snappy => b"snappy\0",
        Compressor::Zlib => b"zlib\0",
        Compressor::Zstd => b"zstd\0",
    };
    bytes.as_ptr() as *const c_char
}

/// Read `cbytes` out of a compressed buffer whose total length the C API
/// never passes; `None` when the first 16 bytes are not a valid header.
unsafe fn peek_cbytes(cbuffer: *const c_void) -> Option<usize> {
    let head = slice::from_raw_parts(cbuffer as *const u8, MIN_HEADER_LENGTH);
    Header::read(head).map(|h| h.cbytes as usize)
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle (blosc.h)
//
// void blosc_init(void);
// void blosc_destroy(void);
// int  blosc_free_resources(void);
// ─────────────────────────────────────────────────────────────────────────────
#[no_mangle]
pub extern "C" fn blosc_init() {
    global::init();
}

#[no_mangle]
pub extern "C" fn blosc_destroy() {
    global::destroy();
}

#[no_mangle]
pub extern "C" fn blosc_free_resources() -> c_int {
    global::free_resources()
}

// ─────────────────────────────────────────────────────────────────────────────
// blosc_compress  (blosc.h)
//
// int blosc_compress(int clevel, int doshuffle, size_t typesize,
//                    size_t nbytes, const void *src, void *dest,
//                    size_t destsize);
//
// Returns the compressed size, 0 when dest is too small, negative on error.
// ─────────────────────────────────────────────────────────────────────────────
#[no_mangle]
pub unsafe extern "C" fn blosc_compress(
    clevel: c_int,
    doshuffle: c_int,
    typesize: usize,
    nbytes: usize,
    src: *const c_void,
    dest: *mut c_void,
    destsize: usize,
) -> c_int {
    if src.is_null() || dest.is_null() {
        return -1;
    }
    let src_slice = slice::from_raw_parts(src as *const u8, nbytes);
    let dest_slice = slice::from_raw_parts_mut(dest as *mut u8, destsize);
    global::compress(clevel, doshuffle, typesize, src_slice, dest_slice)
}

// ─────────────────────────────────────────────────────────────────────────────
// blosc_decompress  (blosc.h)
//
// int blosc_decompress(const void *src, void *dest, size_t destsize);
//
// Returns the uncompressed size, negative on error.
// ─────────────────────────────────────────────────────────────────────────────
#[no_mangle]
pub unsafe extern "C" fn blosc_decompress(
    src: *const c_void,
    dest: *mut c_void,
    destsize: usize,
) -> c_int {
    if src.is_null() || dest.is_null() {
        return -1;
    }
    let cbytes = match peek_cbytes(src) {
        Some(n) => n,
        None => return -1,
    };
    let src_slice = slice::from_raw_parts(src as *const u8, cbytes);
    let dest_slice = slice::from_raw_parts_mut(dest as *mut u8, destsize);
    global::decompress(src_slice, dest_slice)
}

// ─────────────────────────────────────────────────────────────────────────────
// blosc_getitem  (blosc.h)
//
// int blosc_getitem(const void *src, int start, int nitems, void *dest);
//
// Returns the number of bytes copied to dest, negative on error.
// ─────────────────────────────────────────────────────────────────────────────
#[no_mangle]
pub unsafe extern "C" fn blosc_getitem(
    src: *const c_void,
    start: c_int,
    nitems: c_int,
    dest: *mut c_void,
) -> c_int {
    if src.is_null() || dest.is_null() || start < 0 || nitems < 0 {
        return -1;
    }
    let cbytes = match peek_cbytes(src) {
        Some(n) => n,
        None => return -1,
    };
    let src_slice = slice::from_raw_parts(src as *const u8, cbytes);
    // The C API gives no dest capacity; it promises room for the items.
    let typesize = match Header::read(src_slice) {
        Some(h) => (h.typesize as usize).max(1),
        None => return -1,
    };
    let dest_slice = slice::from_raw_parts_mut(dest as *mut u8, nitems as usize * typesize);
    global::getitem(src_slice, start as usize, nitems as usize, dest_slice)
}

// ─────────────────────────────────────────────────────────────────────────────
// Thread and compressor selection (blosc.h)
// ─────────────────────────────────────────────────────────────────────────────
#[no_mangle]
pub extern "C" fn blosc_get_nthreads() -> c_int {
    global::get_nthreads()
}

#[no_mangle]
pub extern "C" fn blosc_set_nthreads(nthreads: c_int) -> c_int {
    global::set_nthreads(nthreads)
}

#[no_mangle]
pub unsafe extern "C" fn blosc_set_compressor(compname: *const c_char) -> c_int {
    if compname.is_null() {
        return -1;
    }
    match CStr::from_ptr(compname).to_str() {
        Ok(name) => global::set_compressor(name),
        Err(_) => -1,
    }
}

#[no_mangle]
pub extern "C" fn blosc_get_compressor() -> *const c_char {
    match Compressor::from_name(global::get_compressor()) {
        Some(codec) => compname_cstr(codec),
        None => std::ptr::null(),
    }
}

#[no_mangle]
pub extern "C" fn blosc_list_compressors() -> *const c_char {
    static LIST: OnceLock<CString> = OnceLock::new();
    LIST.get_or_init(|| {
        CString::new(codec::list_compressors().join(",")).unwrap_or_default()
    })
    .as_ptr()
}

#[no_mangle]
pub unsafe extern "C" fn blosc_compcode_to_compname(
    compcode: c_int,
    compname: *mut *const c_char,
) -> c_int {
    match Compressor::from_code(compcode) {
        Some(codec) => {
            if !compname.is_null() {
                *compname = compname_cstr(codec);
            }
            0
        }
        None => -1,
    }
}

#[no_mangle]
pub unsafe extern "C" fn blosc_compname_to_compcode(compname: *const c_char) -> c_int {
    if compname.is_null() {
        return -1;
    }
    match CStr::from_ptr(compname).to_str() {
        Ok(name) => codec::compname_to_compcode(name).unwrap_or(-1),
        Err(_) => -1,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Version and blocksize (blosc.h)
// ─────────────────────────────────────────────────────────────────────────────
#[no_mangle]
pub extern "C" fn blosc_get_version_string() -> *const c_char {
    static VERSION: OnceLock<CString> = OnceLock::new();
    VERSION
        .get_or_init(|| CString::new(VERSION_STRING).unwrap_or_default())
        .as_ptr()
}

#[no_mangle]
pub extern "C" fn blosc_get_blocksize() -> c_int {
    global::get_blocksize() as c_int
}

#[no_mangle]
pub extern "C" fn blosc_set_blocksize(blocksize: usize) {
    global::set_blocksize(blocksize);
}

#[no_mangle]
pub extern "C" fn blosc_set_splitmode(splitmode: c_int) {
    global::set_splitmode(splitmode);
}

// ─────────────────────────────────────────────────────────────────────────────
// Buffer introspection (blosc.h)
//
// All four examine only the 16-byte header and zero-fill their outputs
// when it is not recognized.
// ─────────────────────────────────────────────────────────────────────────────
#[no_mangle]
pub unsafe extern "C" fn blosc_cbuffer_sizes(
    cbuffer: *const c_void,
    nbytes: *mut usize,
    cbytes: *mut usize,
    blocksize: *mut usize,
) {
    if cbuffer.is_null() {
        return;
    }
    let head = slice::from_raw_parts(cbuffer as *const u8, MIN_HEADER_LENGTH);
    let (n, c, b) = header::cbuffer_sizes(head);
    if !nbytes.is_null() {
        *nbytes = n;
    }
    if !cbytes.is_null() {
        *cbytes = c;
    }
    if !blocksize.is_null() {
        *blocksize = b;
    }
}

#[no_mangle]
pub unsafe extern "C" fn blosc_cbuffer_metainfo(
    cbuffer: *const c_void,
    typesize: *mut usize,
    flags: *mut c_int,
) {
    if cbuffer.is_null() {
        return;
    }
    let head = slice::from_raw_parts(cbuffer as *const u8, MIN_HEADER_LENGTH);
    let (ts, [shuffled, memcpyed, bit_shuffled]) = header::cbuffer_metainfo(head);
    if !typesize.is_null() {
        *typesize = ts;
    }
    if !flags.is_null() {
        *flags = shuffled as c_int
            | (memcpyed as c_int) << 1
            | (bit_shuffled as c_int) << 2;
    }
}

#[no_mangle]
pub unsafe extern "C" fn blosc_cbuffer_versions(
    cbuffer: *const c_void,
    version: *mut c_int,
    versionlz: *mut c_int,
) {
    if cbuffer.is_null() {
        return;
    }
    let head = slice::from_raw_parts(cbuffer as *const u8, MIN_HEADER_LENGTH);
    let (v, vlz) = header::cbuffer_versions(head);
    if !version.is_null() {
        *version = v;
    }
    if !versionlz.is_null() {
        *versionlz = vlz;
    }
}

#[no_mangle]
pub unsafe extern "C" fn blosc_cbuffer_complib(cbuffer: *const c_void) -> *const c_char {
    if cbuffer.is_null() {
        return std::ptr::null();
    }
    let head = slice::from_raw_parts(cbuffer as *const u8, MIN_HEADER_LENGTH);
    match header::cbuffer_complib(head) {
        Some("BloscLZ") => b"BloscLZ\0".as_ptr() as *const c_char,
        Some("LZ4") => b"LZ4\0".as_ptr() as *const c_char,
        Some("Snappy") => b"Snappy\0".as_ptr() as *const c_char,
        Some("Zlib") => b"Zlib\0".as_ptr() as *const c_char,
        Some("Zstd") => b"Zstd\0".as_ptr() as *const c_char,
        _ => std::ptr::null(),
    }
}
