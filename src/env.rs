//! Environment-variable convenience layer.
//!
//! Mirrors the `BLOSC_*` variables honored by blosc_compress in blosc.c.
//! Two kinds exist:
//!
//! * **Per-call overrides** (`BLOSC_CLEVEL`, `BLOSC_SHUFFLE`,
//!   `BLOSC_TYPESIZE`) replace the corresponding arguments of one
//!   global-regime `compress` call without touching any stored state.
//! * **State overrides** (`BLOSC_COMPRESSOR`, `BLOSC_NTHREADS`,
//!   `BLOSC_BLOCKSIZE`, `BLOSC_SPLITMODE`) act like calling the matching
//!   setter before the operation, and persist in the global state.
//!
//! `BLOSC_NOLOCK` reroutes the call through a throwaway [`Context`]
//! seeded with the last-set global configuration, so the real work never
//! runs under the global mutex. Malformed values are ignored with a debug
//! log line, never an error; the explicit arguments then stand.

use std::env;

use crate::codec::Compressor;
use crate::config::SplitMode;
use crate::context::Context;
use crate::shuffle::Filter;

fn var(name: &'static str) -> Option<String> {
    env::var(name).ok()
}

fn parsed<T: std::str::FromStr>(name: &'static str) -> Option<T> {
    let raw = var(name)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::debug!("ignoring unparseable {name}={raw:?}");
            None
        }
    }
}

/// `BLOSC_CLEVEL` as a compression level, if set and well-formed.
pub fn clevel_override() -> Option<i32> {
    parsed("BLOSC_CLEVEL")
}

/// `BLOSC_SHUFFLE` as a filter. Accepts the symbolic names and the
/// numeric constants.
pub fn shuffle_override() -> Option<Filter> {
    let raw = var("BLOSC_SHUFFLE")?;
    let filter = match raw.as_str() {
        "NOSHUFFLE" | "0" => Filter::None,
        "SHUFFLE" | "1" => Filter::Shuffle,
        "BITSHUFFLE" | "2" => Filter::BitShuffle,
        _ => {
            log::debug!("ignoring unknown BLOSC_SHUFFLE={raw:?}");
            return None;
        }
    };
    Some(filter)
}

/// `BLOSC_TYPESIZE` in bytes, if set and well-formed.
pub fn typesize_override() -> Option<usize> {
    parsed("BLOSC_TYPESIZE")
}

/// State overrides gathered from the environment; `None` fields were
/// unset or malformed.
#[derive(Debug, Default)]
pub struct StateOverrides {
    pub compressor: Option<Compressor>,
    pub nthreads: Option<i32>,
    pub blocksize: Option<usize>,
    pub splitmode: Option<SplitMode>,
}

/// Read `BLOSC_COMPRESSOR`, `BLOSC_NTHREADS`, `BLOSC_BLOCKSIZE` and
/// `BLOSC_SPLITMODE`. `BLOSC_NTHREADS=0` means "all cores".
pub fn state_overrides() -> StateOverrides {
    let compressor = var("BLOSC_COMPRESSOR").and_then(|raw| {
        let codec = Compressor::from_name(&raw).filter(|c| c.supported());
        if codec.is_none() {
            log::debug!("ignoring unknown BLOSC_COMPRESSOR={raw:?}");
        }
        codec
    });
    let nthreads = parsed::<i32>("BLOSC_NTHREADS")
        .map(|n| if n == 0 { num_cpus::get() as i32 } else { n });
    let blocksize = parsed::<usize>("BLOSC_BLOCKSIZE");
    let splitmode = var("BLOSC_SPLITMODE").and_then(|raw| {
        let mode = match raw.as_str() {
            "ALWAYS" | "1" => Some(SplitMode::Always),
            "NEVER" | "2" => Some(SplitMode::Never),
            "AUTO" | "3" => Some(SplitMode::Auto),
            "FORWARD_COMPAT" | "4" => Some(SplitMode::ForwardCompat),
            _ => {
                log::debug!("ignoring unknown BLOSC_SPLITMODE={raw:?}");
                None
            }
        };
        mode
    });
    StateOverrides {
        compressor,
        nthreads,
        blocksize,
        splitmode,
    }
}

/// Whether `BLOSC_NOLOCK` asks for the lock-free call path.
pub fn nolock() -> bool {
    matches!(var("BLOSC_NOLOCK"), Some(v) if v != "0")
}

/// Apply the environment's state overrides on top of a base context.
/// The `BLOSC_NOLOCK` path builds its throwaway context this way: the
/// last-set global configuration as the base, environment on top.
pub fn override_context(mut ctx: Context) -> Context {
    let o = state_overrides();
    if let Some(c) = o.compressor {
        ctx = ctx.compressor(c);
    }
    if let Some(n) = o.nthreads {
        ctx = ctx.nthreads(n);
    }
    if let Some(b) = o.blocksize {
        ctx = ctx.blocksize(b);
    }
    if let Some(m) = o.splitmode {
        ctx = ctx.splitmode(m);
    }
    ctx
}
