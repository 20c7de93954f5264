use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sld_codec_bc1::{decode_bc1_block, encode_bc1_block};
use sld_codec_common::color_8888::Color8888;
use sld_codec_common::decoded_4x4_block::{Decoded4x4Block, ALL_PIXELS_VALID};
use sld_codec_common::format::BcQuality;
use std::hint::black_box;

#[cfg(not(target_os = "windows"))]
use pprof::criterion::{Output, PProfProfiler};

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("BC1 Block Codec");

    // Set up the test data - 1MB of BC1 blocks
    let bc1_size = 1048576;
    let blocks_count = bc1_size / 8;

    // This creates simple BC1 blocks with varying colors
    // Real-world data would have more variety, but this is suitable for benchmarking
    let input: Vec<u8> = (0..bc1_size).map(|i| (i % 255) as u8).collect();

    group.throughput(criterion::Throughput::Bytes(bc1_size as u64));
    group.bench_function("decode_bc1_blocks", |b| {
        b.iter(|| {
            let mut checksum = 0u32;
            for block in input.chunks_exact(8) {
                let decoded = unsafe { decode_bc1_block(block.as_ptr()) };
                checksum = checksum.wrapping_add(decoded.pixels[0].r as u32);
            }
            black_box(checksum)
        })
    });

    // Decoding the input gives realistic tiles to encode, with a mix of both block modes.
    let tiles: Vec<Decoded4x4Block> = input
        .chunks_exact(8)
        .take(blocks_count / 16)
        .map(|block| unsafe { decode_bc1_block(block.as_ptr()) })
        .map(|mut tile| {
            // Add some noise so that tiles do not sit exactly on a BC1 palette.
            for (i, pixel) in tile.pixels.iter_mut().enumerate() {
                *pixel = Color8888::new(
                    pixel.r.wrapping_add(i as u8),
                    pixel.g,
                    pixel.b.wrapping_sub(i as u8),
                    pixel.a,
                );
            }
            tile
        })
        .collect();

    group.throughput(criterion::Throughput::Elements(tiles.len() as u64));
    for quality in [BcQuality::Fast, BcQuality::Normal, BcQuality::Slow] {
        group.bench_with_input(
            BenchmarkId::new("encode_bc1_blocks", format!("{quality:?}")),
            &quality,
            |b, quality| {
                b.iter(|| {
                    let mut checksum = 0u8;
                    for tile in &tiles {
                        let encoded = encode_bc1_block(tile, ALL_PIXELS_VALID, *quality);
                        checksum = checksum.wrapping_add(encoded[4]);
                    }
                    black_box(checksum)
                })
            },
        );
    }

    group.finish();
}

#[cfg(not(target_os = "windows"))]
criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = criterion_benchmark
}

#[cfg(target_os = "windows")]
criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = criterion_benchmark
}

criterion_main!(benches);
