//! Context regime: per-object compression state, no process-wide locking.
//!
//! A [`Context`] owns the knobs the global regime keeps behind its mutex
//! (compressor, thread count, blocksize, split mode) plus its own lazily
//! built thread pool. Independent contexts never contend with each other
//! or with the global API, so concurrent pipelines can each carry their
//! own settings. Errors surface as [`BloscError`] instead of the C
//! sentinel codes.

use std::sync::{Arc, OnceLock};

use crate::codec::Compressor;
use crate::config::{SplitMode, MAX_THREADS, NTHREADS_DEFAULT, SPLITMODE_DEFAULT};
use crate::container::{self, Params};
use crate::error::BloscError;
use crate::shuffle::Filter;

/// Self-contained compression context.
///
/// Built with chained setters:
///
/// ```
/// use blosc::{Compressor, Context, Filter};
///
/// let ctx = Context::new().compressor(Compressor::BloscLz).nthreads(2);
/// let src = vec![42u8; 10_000];
/// let mut dest = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
/// let cbytes = ctx.compress(5, Filter::Shuffle, 1, &src, &mut dest).unwrap();
/// assert!(cbytes > 0);
/// ```
#[derive(Debug)]
pub struct Context {
    compressor: Compressor,
    nthreads: i32,
    blocksize: usize,
    splitmode: SplitMode,
    pool: OnceLock<Option<Arc<rayon::ThreadPool>>>,
}

impl Default for Context {
    fn default() -> Self {
        Context {
            compressor: Compressor::default(),
            nthreads: NTHREADS_DEFAULT,
            blocksize: 0,
            splitmode: SPLITMODE_DEFAULT,
            pool: OnceLock::new(),
        }
    }
}

impl Context {
    /// A context with the library defaults: BloscLZ, one thread,
    /// automatic blocksize, forward-compatible split mode.
    pub fn new() -> Context {
        Context::default()
    }

    pub fn compressor(mut self, compressor: Compressor) -> Context {
        self.compressor = compressor;
        self
    }

    /// Worker thread count, clamped to `1..=MAX_THREADS`.
    pub fn nthreads(mut self, nthreads: i32) -> Context {
        self.nthreads = nthreads.clamp(1, MAX_THREADS);
        self.pool = OnceLock::new();
        self
    }

    /// Fixed blocksize in bytes; 0 restores the automatic heuristic.
    pub fn blocksize(mut self, blocksize: usize) -> Context {
        self.blocksize = blocksize;
        self
    }

    pub fn splitmode(mut self, splitmode: SplitMode) -> Context {
        self.splitmode = splitmode;
        self
    }

    fn pool(&self) -> Option<&rayon::ThreadPool> {
        self.pool
            .get_or_init(|| {
                if self.nthreads <= 1 {
                    return None;
                }
                match rayon::ThreadPoolBuilder::new()
                    .num_threads(self.nthreads as usize)
                    .build()
                {
                    Ok(pool) => Some(Arc::new(pool)),
                    Err(err) => {
                        log::warn!("thread pool creation failed, running serial: {err}");
                        None
                    }
                }
            })
            .as_deref()
    }

    fn params(&self, clevel: i32, filter: Filter, typesize: usize) -> Params {
        Params {
            clevel,
            filter,
            typesize,
            codec: self.compressor,
            blocksize: self.blocksize,
            splitmode: self.splitmode,
        }
    }

    /// Compress `src` into `dest`; returns the compressed size.
    pub fn compress(
        &self,
        clevel: i32,
        filter: Filter,
        typesize: usize,
        src: &[u8],
        dest: &mut [u8],
    ) -> Result<usize, BloscError> {
        container::compress(&self.params(clevel, filter, typesize), self.pool(), src, dest)
    }

    /// Decompress a whole buffer into `dest`; returns the uncompressed size.
    pub fn decompress(&self, src: &[u8], dest: &mut [u8]) -> Result<usize, BloscError> {
        container::decompress(self.pool(), src, dest)
    }

    /// Decompress `nitems` items starting at item `start` into `dest`.
    pub fn getitem(
        &self,
        src: &[u8],
        start: usize,
        nitems: usize,
        dest: &mut [u8],
    ) -> Result<usize, BloscError> {
        container::getitem(src, start, nitems, dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_OVERHEAD;

    #[test]
    fn contexts_are_independent() {
        let a = Context::new().compressor(Compressor::BloscLz);
        let b = Context::new().splitmode(SplitMode::Never);
        let src: Vec<u8> = (0..40_000u32).flat_map(u32::to_le_bytes).collect();
        let mut pa = vec![0u8; src.len() + MAX_OVERHEAD];
        let mut pb = vec![0u8; src.len() + MAX_OVERHEAD];
        let ca = a.compress(5, Filter::Shuffle, 4, &src, &mut pa).unwrap();
        let cb = b.compress(5, Filter::Shuffle, 4, &src, &mut pb).unwrap();

        let mut back = vec![0u8; src.len()];
        assert_eq!(a.decompress(&pb[..cb], &mut back).unwrap(), src.len());
        assert_eq!(back, src);
        back.fill(0);
        assert_eq!(b.decompress(&pa[..ca], &mut back).unwrap(), src.len());
        assert_eq!(back, src);
    }

    #[test]
    fn threaded_context_output_matches_serial() {
        let serial = Context::new();
        let threaded = Context::new().nthreads(4);
        let src: Vec<u8> = (0..300_000u32).flat_map(u32::to_le_bytes).collect();
        let mut ps = vec![0u8; src.len() + MAX_OVERHEAD];
        let mut pt = vec![0u8; src.len() + MAX_OVERHEAD];
        let cs = serial.compress(5, Filter::Shuffle, 4, &src, &mut ps).unwrap();
        let ct = threaded.compress(5, Filter::Shuffle, 4, &src, &mut pt).unwrap();
        assert_eq!(cs, ct);
        assert_eq!(ps[..cs], pt[..ct]);
    }

    #[test]
    fn errors_surface_as_results() {
        let ctx = Context::new();
        let src = vec![7u8; 10_000];
        let mut tiny = vec![0u8; 32];
        assert!(matches!(
            ctx.compress(5, Filter::None, 1, &src, &mut tiny),
            Err(BloscError::DestTooSmall { .. })
        ));
        let mut back = vec![0u8; 16];
        assert!(ctx.decompress(&[0u8; 40], &mut back).is_err());
    }
}
