//! Error type for the `Result`-based API layer.
//!
//! The C-compatible entry points in [`crate::global`] and the `c-abi` shims
//! never surface this type: they fold it back into the sentinel convention
//! (0 for "did not fit", negative for hard failures) that C-Blosc callers
//! depend on. The richer enum exists only above that boundary.

use thiserror::Error;

/// Errors produced by the compression container and the codec backends.
#[derive(Error, Debug)]
pub enum BloscError {
    /// The destination buffer cannot hold the result. For compression this
    /// maps to the `0` sentinel: the caller must discard the destination
    /// contents, not treat them as output.
    #[error("destination buffer too small ({needed} bytes needed, {avail} available)")]
    DestTooSmall { needed: usize, avail: usize },

    /// The source exceeds the 31-bit length the header can record.
    #[error("source buffer of {0} bytes exceeds the maximum compressible size")]
    InputTooLarge(usize),

    /// A caller-supplied parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),

    /// The requested codec is known but was not compiled into this build.
    #[error("compressor '{0}' is not available in this build")]
    CodecUnavailable(&'static str),

    /// The compressed source cannot be decoded. Deliberately does not
    /// distinguish corruption from a short destination: the underlying
    /// stream format cannot tell them apart either.
    #[error("compressed buffer is corrupt or does not match the destination")]
    Corrupt,

    /// A codec backend failed on well-formed input. Never expected; callers
    /// should report this upstream rather than mask it.
    #[error("internal codec failure: {0}")]
    Internal(String),
}

impl BloscError {
    /// Fold into the C sentinel convention used by the global-regime API.
    pub(crate) fn sentinel(&self) -> i32 {
        match self {
            BloscError::DestTooSmall { .. } => 0,
            BloscError::InvalidParam(_) => -10,
            _ => -1,
        }
    }
}
