//! Container format engine: the block loop behind `compress`, `decompress`
//! and `getitem`.
//!
//! This is the counterpart of blosc.c's `blosc_c` / `blosc_d` pipeline. A
//! compressed buffer is the 16-byte header, then `nblocks` little-endian
//! u32 block offsets (absolute, from the start of the buffer), then the
//! block bodies. Each body is a sequence of streams; a stream is a u32
//! compressed size followed by its payload, and a stream whose recorded
//! size equals its uncompressed length is stored raw. Full blocks are
//! split into one stream per byte plane when the split decision says so
//! (recorded in the header flags); the trailing partial block is never
//! split.
//!
//! Blocks are independent, which is what makes multi-threaded operation
//! and `getitem` random access possible. Output is byte-identical
//! regardless of how many threads produced it.

use std::borrow::Cow;

use rayon::prelude::*;

use crate::codec::{self, Compressor};
use crate::config::{
    automatic_blocksize, SplitMode, MAX_BUFFERSIZE, MAX_SPLITS, MAX_TYPESIZE,
    MIN_BUFFERSIZE, MIN_HEADER_LENGTH,
};
use crate::error::BloscError;
use crate::header::{
    Header, FLAG_CODEC_SHIFT, FLAG_DOBITSHUFFLE, FLAG_DOSHUFFLE, FLAG_DOSPLIT,
    FLAG_MEMCPYED,
};
use crate::shuffle::{self, Filter};
use crate::VERSION_FORMAT;

/// Minimum number of elements per split stream; blocks with fewer are
/// compressed whole.
const MIN_STREAM_ELEMS: usize = 32;

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Fully resolved knobs for one compression call. The global and context
/// regimes both reduce to this before reaching the engine.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    /// Compression level, 0..=9. Zero short-circuits to a plain memcpy.
    pub clevel: i32,
    pub filter: Filter,
    pub typesize: usize,
    pub codec: Compressor,
    /// Requested blocksize in bytes; 0 selects the automatic heuristic.
    pub blocksize: usize,
    pub splitmode: SplitMode,
}

/// Normalized parameters the block loop actually runs with.
struct Plan {
    filter: Filter,
    typesize: usize,
    blocksize: usize,
    split: bool,
}

impl Params {
    /// Validate and normalize against a concrete source length.
    fn plan(&self, nbytes: usize) -> Result<Plan, BloscError> {
        if !(0..=9).contains(&self.clevel) {
            return Err(BloscError::InvalidParam("clevel must be in 0..=9"));
        }
        // Out-of-range typesizes degrade to a plain byte stream.
        let typesize = if (1..=MAX_TYPESIZE).contains(&self.typesize) {
            self.typesize
        } else {
            1
        };
        // Byte shuffle over one-byte elements is the identity; drop the flag.
        let filter = match self.filter {
            Filter::Shuffle if typesize < 2 => Filter::None,
            f => f,
        };
        let mut blocksize = if self.blocksize != 0 {
            let mut bs = self.blocksize.min(nbytes.max(1));
            if bs > typesize {
                bs -= bs % typesize;
            }
            bs.max(typesize)
        } else {
            automatic_blocksize(self.clevel, typesize, nbytes.max(1))
        };
        blocksize = blocksize.max(1);

        let splittable = filter == Filter::Shuffle
            && (2..=MAX_SPLITS).contains(&typesize)
            && blocksize % typesize == 0
            && blocksize / typesize >= MIN_STREAM_ELEMS;
        let split = match self.splitmode {
            SplitMode::Always => splittable,
            SplitMode::Never => false,
            // The fast LZ codecs gain from plane-local streams; the
            // heavier ones do better over whole blocks.
            SplitMode::Auto | SplitMode::ForwardCompat => {
                splittable
                    && matches!(
                        self.codec,
                        Compressor::BloscLz | Compressor::Lz4 | Compressor::Lz4hc
                    )
            }
        };
        Ok(Plan {
            filter,
            typesize,
            blocksize,
            split,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Compression
// ─────────────────────────────────────────────────────────────────────────────

fn write_memcpy(plan: &Plan, codec: Compressor, src: &[u8], dest: &mut [u8]) -> usize {
    let cbytes = src.len() + MIN_HEADER_LENGTH;
    Header {
        version: VERSION_FORMAT,
        versionlz: codec.version_format(),
        flags: FLAG_MEMCPYED | (codec.format_code() << FLAG_CODEC_SHIFT),
        typesize: plan.typesize as u8,
        nbytes: src.len() as u32,
        blocksize: plan.blocksize as u32,
        cbytes: cbytes as u32,
    }
    .write(dest);
    dest[MIN_HEADER_LENGTH..cbytes].copy_from_slice(src);
    cbytes
}

/// Filter and encode one block into its body (streams, no offsets).
fn compress_block(
    codec: Compressor,
    clevel: i32,
    plan: &Plan,
    block: &[u8],
) -> Result<Vec<u8>, BloscError> {
    let filtered: Cow<[u8]> = match plan.filter {
        Filter::None => Cow::Borrowed(block),
        Filter::Shuffle => {
            let mut buf = vec![0u8; block.len()];
            shuffle::shuffle(plan.typesize, block, &mut buf);
            Cow::Owned(buf)
        }
        Filter::BitShuffle => {
            let mut buf = vec![0u8; block.len()];
            shuffle::bitshuffle(plan.typesize, block, &mut buf);
            Cow::Owned(buf)
        }
    };
    // Only full blocks split; the trailing partial block is one stream.
    let stream_len = if plan.split && block.len() == plan.blocksize {
        plan.blocksize / plan.typesize
    } else {
        block.len()
    };
    let mut body = Vec::with_capacity(block.len() / 2 + 16);
    for stream in filtered.chunks(stream_len.max(1)) {
        let encoded = codec::compress_stream(codec, clevel, stream)?;
        if encoded.len() < stream.len() {
            body.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
            body.extend_from_slice(&encoded);
        } else {
            // Expansion: store the stream raw. The recorded size matching
            // the uncompressed length is what marks it raw for the reader.
            body.extend_from_slice(&(stream.len() as u32).to_le_bytes());
            body.extend_from_slice(stream);
        }
    }
    Ok(body)
}

/// Compress `src` into `dest` and return the number of bytes written.
///
/// `Err(DestTooSmall)` means the destination must be grown (to
/// `src.len() + MAX_OVERHEAD` in the worst case) and its contents are
/// undefined; every other error is a hard failure.
pub fn compress(
    params: &Params,
    pool: Option<&rayon::ThreadPool>,
    src: &[u8],
    dest: &mut [u8],
) -> Result<usize, BloscError> {
    let nbytes = src.len();
    if nbytes > MAX_BUFFERSIZE {
        return Err(BloscError::InputTooLarge(nbytes));
    }
    let plan = params.plan(nbytes)?;
    let memcpy_size = nbytes + MIN_HEADER_LENGTH;

    // Tiny or incompressible-by-decree sources skip the block loop.
    if params.clevel == 0 || nbytes < MIN_BUFFERSIZE {
        if dest.len() < memcpy_size {
            return Err(BloscError::DestTooSmall {
                needed: memcpy_size,
                avail: dest.len(),
            });
        }
        return Ok(write_memcpy(&plan, params.codec, src, dest));
    }

    let nblocks = nbytes.div_ceil(plan.blocksize);
    let encode = |block: &[u8]| compress_block(params.codec, params.clevel, &plan, block);
    let bodies: Vec<Vec<u8>> = match pool.filter(|_| nblocks > 1) {
        Some(pool) => pool.install(|| {
            src.par_chunks(plan.blocksize)
                .map(encode)
                .collect::<Result<_, _>>()
        })?,
        None => src
            .chunks(plan.blocksize)
            .map(encode)
            .collect::<Result<_, _>>()?,
    };

    let data_start = MIN_HEADER_LENGTH + 4 * nblocks;
    let total = data_start + bodies.iter().map(Vec::len).sum::<usize>();
    if total >= memcpy_size || total > dest.len() {
        // No benefit (or no room for the compressed form): fall back to a
        // memcpy when the destination allows the guaranteed worst case.
        if dest.len() < memcpy_size {
            return Err(BloscError::DestTooSmall {
                needed: memcpy_size,
                avail: dest.len(),
            });
        }
        return Ok(write_memcpy(&plan, params.codec, src, dest));
    }

    let mut flags = (params.codec.format_code() << FLAG_CODEC_SHIFT)
        | match plan.filter {
            Filter::None => 0,
            Filter::Shuffle => FLAG_DOSHUFFLE,
            Filter::BitShuffle => FLAG_DOBITSHUFFLE,
        };
    if plan.split {
        flags |= FLAG_DOSPLIT;
    }
    Header {
        version: VERSION_FORMAT,
        versionlz: params.codec.version_format(),
        flags,
        typesize: plan.typesize as u8,
        nbytes: nbytes as u32,
        blocksize: plan.blocksize as u32,
        cbytes: total as u32,
    }
    .write(dest);

    let mut offset = data_start;
    for (i, body) in bodies.iter().enumerate() {
        let at = MIN_HEADER_LENGTH + 4 * i;
        dest[at..at + 4].copy_from_slice(&(offset as u32).to_le_bytes());
        dest[offset..offset + body.len()].copy_from_slice(body);
        offset += body.len();
    }
    debug_assert_eq!(offset, total);
    Ok(total)
}

// ─────────────────────────────────────────────────────────────────────────────
// Decompression
// ─────────────────────────────────────────────────────────────────────────────

/// Everything decode-side derived from one header read.
struct Layout {
    codec: Compressor,
    filter: Filter,
    typesize: usize,
    blocksize: usize,
    nbytes: usize,
    split: bool,
    bstarts: Vec<usize>,
}

impl Layout {
    fn read(src: &[u8], header: &Header) -> Result<Layout, BloscError> {
        let codec =
            codec::format_code_to_decoder(header.codec_format()).ok_or(BloscError::Corrupt)?;
        if !codec.supported() {
            return Err(BloscError::CodecUnavailable(codec.name()));
        }
        let filter = if header.shuffled() {
            Filter::Shuffle
        } else if header.bit_shuffled() {
            Filter::BitShuffle
        } else {
            Filter::None
        };
        let nbytes = header.nbytes as usize;
        let blocksize = header.blocksize as usize;
        let typesize = header.typesize as usize;
        if header.split() && (typesize == 0 || blocksize % typesize != 0) {
            return Err(BloscError::Corrupt);
        }
        let nblocks = nbytes.div_ceil(blocksize);
        let data_start = MIN_HEADER_LENGTH + 4 * nblocks;
        if src.len() < data_start {
            return Err(BloscError::Corrupt);
        }
        let mut bstarts = Vec::with_capacity(nblocks);
        for i in 0..nblocks {
            let at = MIN_HEADER_LENGTH + 4 * i;
            let start =
                u32::from_le_bytes([src[at], src[at + 1], src[at + 2], src[at + 3]]) as usize;
            if start < data_start || start > src.len() {
                return Err(BloscError::Corrupt);
            }
            bstarts.push(start);
        }
        Ok(Layout {
            codec,
            filter,
            typesize,
            blocksize,
            nbytes,
            split: header.split(),
            bstarts,
        })
    }

    /// Decode block `index` into `out`, which must be sized to that
    /// block's exact uncompressed length.
    fn decode_block(&self, src: &[u8], index: usize, out: &mut [u8]) -> Result<(), BloscError> {
        let split = self.split && out.len() == self.blocksize;
        let stream_len = if split {
            self.blocksize / self.typesize
        } else {
            out.len()
        };
        match self.filter {
            Filter::None => self.decode_streams(src, index, stream_len, out),
            Filter::Shuffle => {
                let mut scratch = vec![0u8; out.len()];
                self.decode_streams(src, index, stream_len, &mut scratch)?;
                shuffle::unshuffle(self.typesize, &scratch, out);
                Ok(())
            }
            Filter::BitShuffle => {
                let mut scratch = vec![0u8; out.len()];
                self.decode_streams(src, index, stream_len, &mut scratch)?;
                shuffle::bitunshuffle(self.typesize, &scratch, out);
                Ok(())
            }
        }
    }

    fn decode_streams(
        &self,
        src: &[u8],
        index: usize,
        stream_len: usize,
        target: &mut [u8],
    ) -> Result<(), BloscError> {
        let mut pos = self.bstarts[index];
        for chunk in target.chunks_mut(stream_len.max(1)) {
            if pos + 4 > src.len() {
                return Err(BloscError::Corrupt);
            }
            let csize =
                u32::from_le_bytes([src[pos], src[pos + 1], src[pos + 2], src[pos + 3]])
                    as usize;
            pos += 4;
            if csize > src.len() - pos {
                return Err(BloscError::Corrupt);
            }
            if csize == chunk.len() {
                chunk.copy_from_slice(&src[pos..pos + csize]);
            } else {
                codec::decompress_stream(self.codec, &src[pos..pos + csize], chunk)?;
            }
            pos += csize;
        }
        Ok(())
    }
}

fn open(src: &[u8]) -> Result<(Header, &[u8]), BloscError> {
    let header = Header::read(src).ok_or(BloscError::Corrupt)?;
    let cbytes = header.cbytes as usize;
    if src.len() < cbytes {
        return Err(BloscError::Corrupt);
    }
    Ok((header, &src[..cbytes]))
}

/// Decompress a whole buffer into `dest` and return the uncompressed size.
pub fn decompress(
    pool: Option<&rayon::ThreadPool>,
    src: &[u8],
    dest: &mut [u8],
) -> Result<usize, BloscError> {
    let (header, src) = open(src)?;
    let nbytes = header.nbytes as usize;
    if dest.len() < nbytes {
        return Err(BloscError::DestTooSmall {
            needed: nbytes,
            avail: dest.len(),
        });
    }
    if nbytes == 0 {
        return Ok(0);
    }
    if header.memcpyed() {
        if src.len() != nbytes + MIN_HEADER_LENGTH {
            return Err(BloscError::Corrupt);
        }
        dest[..nbytes].copy_from_slice(&src[MIN_HEADER_LENGTH..]);
        return Ok(nbytes);
    }

    let layout = Layout::read(src, &header)?;
    let nblocks = layout.bstarts.len();
    match pool.filter(|_| nblocks > 1) {
        Some(pool) => pool.install(|| {
            dest[..nbytes]
                .par_chunks_mut(layout.blocksize)
                .enumerate()
                .try_for_each(|(i, out)| layout.decode_block(src, i, out))
        })?,
        None => {
            for (i, out) in dest[..nbytes].chunks_mut(layout.blocksize).enumerate() {
                layout.decode_block(src, i, out)?;
            }
        }
    }
    Ok(nbytes)
}

/// Decompress only items `start..start + nitems` (in units of the recorded
/// typesize) into `dest`, touching just the blocks that overlap the range.
/// Returns the number of bytes copied out.
pub fn getitem(
    src: &[u8],
    start: usize,
    nitems: usize,
    dest: &mut [u8],
) -> Result<usize, BloscError> {
    let (header, src) = open(src)?;
    let nbytes = header.nbytes as usize;
    let typesize = (header.typesize as usize).max(1);

    let byte_start = start
        .checked_mul(typesize)
        .ok_or(BloscError::InvalidParam("item range overflows"))?;
    let want = nitems
        .checked_mul(typesize)
        .ok_or(BloscError::InvalidParam("item range overflows"))?;
    let byte_end = byte_start
        .checked_add(want)
        .ok_or(BloscError::InvalidParam("item range overflows"))?;
    if byte_end > nbytes {
        return Err(BloscError::InvalidParam("item range beyond buffer end"));
    }
    if dest.len() < want {
        return Err(BloscError::DestTooSmall {
            needed: want,
            avail: dest.len(),
        });
    }
    if want == 0 {
        return Ok(0);
    }
    if header.memcpyed() {
        if src.len() != nbytes + MIN_HEADER_LENGTH {
            return Err(BloscError::Corrupt);
        }
        let at = MIN_HEADER_LENGTH + byte_start;
        dest[..want].copy_from_slice(&src[at..at + want]);
        return Ok(want);
    }

    let layout = Layout::read(src, &header)?;
    let first = byte_start / layout.blocksize;
    let last = (byte_end - 1) / layout.blocksize;
    let mut block = vec![0u8; layout.blocksize];
    for i in first..=last {
        let block_start = i * layout.blocksize;
        let block_len = layout.blocksize.min(nbytes - block_start);
        layout.decode_block(src, i, &mut block[..block_len])?;
        let lo = byte_start.max(block_start);
        let hi = byte_end.min(block_start + block_len);
        dest[lo - byte_start..hi - byte_start]
            .copy_from_slice(&block[lo - block_start..hi - block_start]);
    }
    Ok(want)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_OVERHEAD, SPLITMODE_DEFAULT};

    fn params() -> Params {
        Params {
            clevel: 5,
            filter: Filter::Shuffle,
            typesize: 4,
            codec: Compressor::BloscLz,
            blocksize: 0,
            splitmode: SPLITMODE_DEFAULT,
        }
    }

    fn sample(n: usize) -> Vec<u8> {
        (0..n as u32).flat_map(u32::to_le_bytes).collect()
    }

    #[test]
    fn roundtrip_with_default_params() {
        let src = sample(50_000);
        let mut packed = vec![0u8; src.len() + MAX_OVERHEAD];
        let cbytes = compress(&params(), None, &src, &mut packed).unwrap();
        assert!(cbytes < src.len());
        let mut back = vec![0u8; src.len()];
        assert_eq!(decompress(None, &packed[..cbytes], &mut back).unwrap(), src.len());
        assert_eq!(back, src);
    }

    #[test]
    fn tiny_input_is_memcpyed() {
        let src = b"hello".to_vec();
        let mut packed = vec![0u8; src.len() + MAX_OVERHEAD];
        let cbytes = compress(&params(), None, &src, &mut packed).unwrap();
        assert_eq!(cbytes, src.len() + MIN_HEADER_LENGTH);
        let header = Header::read(&packed).unwrap();
        assert!(header.memcpyed());
        let mut back = vec![0u8; src.len()];
        decompress(None, &packed[..cbytes], &mut back).unwrap();
        assert_eq!(back, src);
    }

    #[test]
    fn clevel_zero_is_memcpyed() {
        let src = sample(10_000);
        let mut p = params();
        p.clevel = 0;
        let mut packed = vec![0u8; src.len() + MAX_OVERHEAD];
        let cbytes = compress(&p, None, &src, &mut packed).unwrap();
        assert_eq!(cbytes, src.len() + MIN_HEADER_LENGTH);
        assert!(Header::read(&packed).unwrap().memcpyed());
    }

    #[test]
    fn short_destination_is_reported() {
        let src = sample(10_000);
        let mut packed = vec![0u8; 8];
        match compress(&params(), None, &src, &mut packed) {
            Err(BloscError::DestTooSmall { needed, .. }) => {
                assert_eq!(needed, src.len() + MAX_OVERHEAD)
            }
            other => panic!("expected DestTooSmall, got {other:?}"),
        }
    }

    #[test]
    fn incompressible_input_falls_back_to_memcpy() {
        // Noise does not compress; with room for nbytes + overhead the
        // engine must still succeed, via the memcpy fallback.
        let mut x = 0x9e3779b9u32;
        let src: Vec<u8> = (0..100_000)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                x as u8
            })
            .collect();
        let mut packed = vec![0u8; src.len() + MAX_OVERHEAD];
        let cbytes = compress(&params(), None, &src, &mut packed).unwrap();
        assert!(cbytes <= src.len() + MAX_OVERHEAD);
        let mut back = vec![0u8; src.len()];
        decompress(None, &packed[..cbytes], &mut back).unwrap();
        assert_eq!(back, src);
    }

    #[test]
    fn split_flag_is_recorded() {
        let src = sample(100_000);
        let mut packed = vec![0u8; src.len() + MAX_OVERHEAD];
        let cbytes = compress(&params(), None, &src, &mut packed).unwrap();
        assert!(Header::read(&packed[..cbytes]).unwrap().split());

        let mut p = params();
        p.splitmode = SplitMode::Never;
        let cbytes = compress(&p, None, &src, &mut packed).unwrap();
        assert!(!Header::read(&packed[..cbytes]).unwrap().split());
    }

    #[test]
    fn getitem_matches_full_decompression() {
        let src = sample(60_000);
        let mut packed = vec![0u8; src.len() + MAX_OVERHEAD];
        let cbytes = compress(&params(), None, &src, &mut packed).unwrap();
        let packed = &packed[..cbytes];

        let mut items = vec![0u8; 10_000 * 4];
        assert_eq!(getitem(packed, 1000, 10_000, &mut items).unwrap(), 10_000 * 4);
        assert_eq!(items, &src[1000 * 4..11_000 * 4]);

        // Range past the end is a parameter error, not a decode error.
        assert!(matches!(
            getitem(packed, 55_000, 10_000, &mut items),
            Err(BloscError::InvalidParam(_))
        ));
    }

    #[test]
    fn truncated_buffer_is_corrupt() {
        let src = sample(50_000);
        let mut packed = vec![0u8; src.len() + MAX_OVERHEAD];
        let cbytes = compress(&params(), None, &src, &mut packed).unwrap();
        let mut back = vec![0u8; src.len()];
        assert!(matches!(
            decompress(None, &packed[..cbytes / 2], &mut back),
            Err(BloscError::Corrupt)
        ));
    }

    #[test]
    fn garbage_header_is_corrupt() {
        let junk = vec![0xffu8; 64];
        let mut back = vec![0u8; 64];
        assert!(decompress(None, &junk, &mut back).is_err());
    }
}
