//! Global regime: the process-wide state behind the classic C-style API.
//!
//! One mutex guards the mutable knobs (`set_compressor`, `set_nthreads`,
//! `set_blocksize`, `set_splitmode`) and the shared thread pool, so the
//! flat `compress`/`decompress` calls are safe from any thread. Each
//! operation snapshots the state and releases the lock before doing any
//! real work; only the snapshot itself is serialized.
//!
//! Return values follow the C sentinel convention rather than `Result`:
//! `compress` yields the compressed size, `0` when the destination is too
//! small (grow it to `nbytes + MAX_OVERHEAD` and retry), `-1` on hard
//! failure and `-10` on out-of-range parameters; `decompress` and
//! `getitem` yield the byte count or `-1`. Code that wants typed errors
//! uses [`crate::Context`] instead.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::codec::Compressor;
use crate::config::{SplitMode, MAX_THREADS, NTHREADS_DEFAULT, SPLITMODE_DEFAULT};
use crate::container::{self, Params};
use crate::context::Context;
use crate::env;
use crate::error::BloscError;
use crate::shuffle::Filter;

struct GlobalState {
    compressor: Compressor,
    nthreads: i32,
    blocksize: usize,
    splitmode: SplitMode,
    pool: Option<Pool>,
    initialized: bool,
}

struct Pool {
    threads: i32,
    inner: Arc<rayon::ThreadPool>,
}

static GLOBAL: Mutex<GlobalState> = Mutex::new(GlobalState {
    compressor: Compressor::BloscLz,
    nthreads: NTHREADS_DEFAULT,
    blocksize: 0,
    splitmode: SPLITMODE_DEFAULT,
    pool: None,
    initialized: false,
});

/// A poisoned lock only means some other thread panicked mid-setter; the
/// state itself is always coherent, so keep going.
fn lock() -> MutexGuard<'static, GlobalState> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

impl GlobalState {
    fn reset(&mut self) {
        *self = GlobalState {
            compressor: Compressor::BloscLz,
            nthreads: NTHREADS_DEFAULT,
            blocksize: 0,
            splitmode: SPLITMODE_DEFAULT,
            pool: None,
            initialized: false,
        };
    }

    /// Shared pool for the current thread count, building it on first
    /// use and rebuilding after `set_nthreads`. `None` runs serial.
    fn pool(&mut self) -> Option<Arc<rayon::ThreadPool>> {
        if self.nthreads <= 1 {
            return None;
        }
        if self.pool.as_ref().map(|p| p.threads) != Some(self.nthreads) {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.nthreads as usize)
                .build()
            {
                Ok(pool) => {
                    self.pool = Some(Pool {
                        threads: self.nthreads,
                        inner: Arc::new(pool),
                    });
                }
                Err(err) => {
                    log::warn!("thread pool creation failed, running serial: {err}");
                    self.pool = None;
                    return None;
                }
            }
        }
        self.pool.as_ref().map(|p| p.inner.clone())
    }

    fn apply_env(&mut self, o: &env::StateOverrides) {
        if let Some(c) = o.compressor {
            self.compressor = c;
        }
        if let Some(n) = o.nthreads {
            self.nthreads = n.clamp(1, MAX_THREADS);
        }
        if let Some(b) = o.blocksize {
            self.blocksize = b;
        }
        if let Some(m) = o.splitmode {
            self.splitmode = m;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

/// Initialize the global state. Optional: every call works without it,
/// but pairing `init`/`destroy` matches the C library's contract.
pub fn init() {
    let mut st = lock();
    st.initialized = true;
    log::debug!("blosc initialized");
}

/// Tear the global state down to its defaults and release the pool.
pub fn destroy() {
    lock().reset();
    log::debug!("blosc destroyed");
}

/// Release the shared thread pool. It is rebuilt transparently on the
/// next multi-threaded call; `0` on success.
pub fn free_resources() -> i32 {
    lock().pool = None;
    0
}

// ─────────────────────────────────────────────────────────────────────────────
// Setters / getters
// ─────────────────────────────────────────────────────────────────────────────

/// Set the worker thread count; returns the previous count, or `-1` when
/// `nthreads` is outside `1..=MAX_THREADS`. Setting 1 tears the shared
/// pool down, not just bypasses it: the worker threads exit now.
pub fn set_nthreads(nthreads: i32) -> i32 {
    if !(1..=MAX_THREADS).contains(&nthreads) {
        log::debug!("rejecting nthreads={nthreads}");
        return -1;
    }
    let mut st = lock();
    let previous = st.nthreads;
    st.nthreads = nthreads;
    if nthreads == 1 {
        st.pool = None;
    }
    previous
}

pub fn get_nthreads() -> i32 {
    lock().nthreads
}

/// Select the compressor by canonical name; returns its code, or `-1`
/// when the name is unknown or the codec is not compiled in.
pub fn set_compressor(compname: &str) -> i32 {
    match Compressor::from_name(compname) {
        Some(codec) if codec.supported() => {
            lock().compressor = codec;
            codec as i32
        }
        _ => {
            log::debug!("rejecting compressor {compname:?}");
            -1
        }
    }
}

/// Canonical name of the currently selected compressor.
pub fn get_compressor() -> &'static str {
    lock().compressor.name()
}

/// Force a fixed blocksize in bytes; 0 restores the automatic heuristic.
pub fn set_blocksize(blocksize: usize) {
    lock().blocksize = blocksize;
}

/// The configured blocksize: whatever was last set (0 meaning automatic),
/// not the size any particular buffer was cut into.
pub fn get_blocksize() -> usize {
    lock().blocksize
}

/// Set the split policy from its numeric constant; `0` on success, `-1`
/// for values outside `1..=4`.
pub fn set_splitmode(splitmode: i32) -> i32 {
    match SplitMode::from_i32(splitmode) {
        Some(mode) => {
            lock().splitmode = mode;
            0
        }
        None => {
            log::debug!("rejecting splitmode={splitmode}");
            -1
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────────────────────────

/// Context for the `BLOSC_NOLOCK` path: the last-set global configuration
/// as the base, environment state overrides on top. The lock is held only
/// for the snapshot; the work itself runs lock-free.
fn nolock_context() -> Context {
    let base = {
        let st = lock();
        Context::new()
            .compressor(st.compressor)
            .nthreads(st.nthreads)
            .blocksize(st.blocksize)
            .splitmode(st.splitmode)
    };
    env::override_context(base)
}

fn try_compress(
    clevel: i32,
    doshuffle: i32,
    typesize: usize,
    src: &[u8],
    dest: &mut [u8],
) -> Result<usize, BloscError> {
    let filter = Filter::from_i32(doshuffle)
        .ok_or(BloscError::InvalidParam("doshuffle must be 0, 1 or 2"))?;
    // Per-call environment overrides beat the explicit arguments.
    let clevel = env::clevel_override().unwrap_or(clevel);
    let filter = env::shuffle_override().unwrap_or(filter);
    let typesize = env::typesize_override().unwrap_or(typesize);

    if env::nolock() {
        return nolock_context().compress(clevel, filter, typesize, src, dest);
    }

    let (params, pool) = {
        let mut st = lock();
        st.apply_env(&env::state_overrides());
        (
            Params {
                clevel,
                filter,
                typesize,
                codec: st.compressor,
                blocksize: st.blocksize,
                splitmode: st.splitmode,
            },
            st.pool(),
        )
    };
    container::compress(&params, pool.as_deref(), src, dest)
}

/// Compress `src` into `dest` with the process-wide settings.
///
/// Returns the compressed size; `0` means `dest` is too small (its
/// contents are then undefined), `-10` an out-of-range parameter, `-1` a
/// hard failure.
pub fn compress(clevel: i32, doshuffle: i32, typesize: usize, src: &[u8], dest: &mut [u8]) -> i32 {
    match try_compress(clevel, doshuffle, typesize, src, dest) {
        Ok(n) => n as i32,
        Err(err) => {
            log::debug!("compress failed: {err}");
            err.sentinel()
        }
    }
}

/// Decompress a whole buffer into `dest`. Returns the uncompressed size,
/// or `-1` when the source is corrupt or `dest` cannot hold the result.
pub fn decompress(src: &[u8], dest: &mut [u8]) -> i32 {
    let result = if env::nolock() {
        nolock_context().decompress(src, dest)
    } else {
        let pool = lock().pool();
        container::decompress(pool.as_deref(), src, dest)
    };
    match result {
        Ok(n) => n as i32,
        Err(err) => {
            log::debug!("decompress failed: {err}");
            -1
        }
    }
}

/// Decompress `nitems` items starting at item `start` into `dest`.
/// Returns the byte count, or `-1` on any failure.
pub fn getitem(src: &[u8], start: usize, nitems: usize, dest: &mut [u8]) -> i32 {
    match container::getitem(src, start, nitems, dest) {
        Ok(n) => n as i32,
        Err(err) => {
            log::debug!("getitem failed: {err}");
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_nthreads_one_releases_the_pool() {
        assert_eq!(set_nthreads(4), 1);
        assert!(lock().pool().is_some());

        // Going back to serial drops the cached pool and its workers,
        // instead of keeping them parked.
        assert_eq!(set_nthreads(1), 4);
        assert!(lock().pool.is_none());

        // And serial calls still work afterwards.
        let src: Vec<u8> = (0..10_000u32).flat_map(u32::to_le_bytes).collect();
        let mut packed = vec![0u8; src.len() + crate::config::MAX_OVERHEAD];
        assert!(compress(5, 1, 4, &src, &mut packed) > 0);
        destroy();
    }
}
