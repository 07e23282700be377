//! Wire-format pinning: the 16-byte header layout must never drift, and
//! buffers must stay self-describing (any reader decodes any writer's
//! output without shared state).

use blosc::{Compressor, Context, Filter};

#[test]
fn memcpy_header_bytes_are_pinned() {
    let ctx = Context::new();
    let src = [7u8; 100]; // below MIN_BUFFERSIZE: memcpy path
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = ctx.compress(5, Filter::Shuffle, 4, &src, &mut packed).unwrap();
    assert_eq!(cbytes, 116);

    assert_eq!(packed[0], blosc::VERSION_FORMAT);
    assert_eq!(packed[1], 1); // codec format version
    assert_eq!(packed[2] & 0x2, 0x2, "memcpy flag");
    assert_eq!(packed[3], 4, "typesize byte");
    assert_eq!(u32::from_le_bytes(packed[4..8].try_into().unwrap()), 100);
    assert_eq!(u32::from_le_bytes(packed[12..16].try_into().unwrap()), 116);
    assert_eq!(&packed[16..116], &src[..]);
}

#[test]
fn compressed_header_records_codec_and_filter() {
    let src: Vec<u8> = (0..100_000u32).flat_map(u32::to_le_bytes).collect();
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];

    for codec in [
        Compressor::BloscLz,
        Compressor::Lz4,
        Compressor::Snappy,
        Compressor::Zlib,
        Compressor::Zstd,
    ] {
        if !codec.supported() {
            continue;
        }
        let ctx = Context::new().compressor(codec);
        let cbytes = ctx.compress(5, Filter::Shuffle, 4, &src, &mut packed).unwrap();
        let flags = packed[2];
        assert_eq!(flags >> 5, codec.format_code(), "codec {}", codec.name());
        assert_eq!(flags & 0x1, 0x1, "shuffle flag, codec {}", codec.name());
        assert_eq!(
            u32::from_le_bytes(packed[12..16].try_into().unwrap()) as usize,
            cbytes
        );
    }
}

#[test]
fn buffers_are_self_describing() {
    let src: Vec<u8> = (0..100_000u32).flat_map(u32::to_le_bytes).collect();
    let writer = Context::new()
        .compressor(if Compressor::Lz4.supported() {
            Compressor::Lz4
        } else {
            Compressor::BloscLz
        })
        .blocksize(32_768);
    let mut packed = vec![0u8; src.len() + blosc::MAX_OVERHEAD];
    let cbytes = writer.compress(7, Filter::BitShuffle, 2, &src, &mut packed).unwrap();

    // A default-configured reader needs nothing from the writer.
    let reader = Context::new();
    let mut back = vec![0u8; src.len()];
    assert_eq!(reader.decompress(&packed[..cbytes], &mut back).unwrap(), src.len());
    assert_eq!(back, src);

    let (typesize, [shuffled, memcpyed, bit_shuffled]) = blosc::cbuffer_metainfo(&packed);
    assert_eq!(typesize, 2);
    assert!(!shuffled && bit_shuffled);

    let (nbytes, recorded, blocksize) = blosc::cbuffer_sizes(&packed);
    assert_eq!((nbytes, recorded), (src.len(), cbytes));
    assert_eq!(blocksize, 32_768);
    assert!(!memcpyed);
}
