use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sld_codec_api::{
    decode_layer, encode_layer, BlockGrid, DecodeSettings, EncodeSettings, PreviousFrameContext,
};
use sld_codec_common::color_8888::Color8888;
use sld_codec_common::format::BcFormat;
use sld_codec_common::raster::Raster;
use std::hint::black_box;

#[cfg(not(target_os = "windows"))]
use pprof::criterion::{Output, PProfProfiler};

const FRAME_SIZE: u32 = 256;
const FRAME_COUNT: u32 = 16;

/// A sprite that moves one block right per frame over a static background gradient.
fn make_frames() -> Vec<Raster> {
    (0..FRAME_COUNT)
        .map(|frame| {
            let pixels = (0..FRAME_SIZE * FRAME_SIZE)
                .map(|i| {
                    let (x, y) = (i % FRAME_SIZE, i / FRAME_SIZE);
                    let sprite_x = frame * 4;
                    if (sprite_x..sprite_x + 32).contains(&x) && (96..160).contains(&y) {
                        Color8888::new(220, (x * 7) as u8, (y * 3) as u8, 255)
                    } else {
                        Color8888::new(x as u8, y as u8, 64, 255)
                    }
                })
                .collect();
            Raster::from_pixels(FRAME_SIZE, FRAME_SIZE, pixels).unwrap()
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Delta Chain");
    let frames = make_frames();
    group.throughput(criterion::Throughput::Elements(FRAME_COUNT as u64));

    for format in [BcFormat::Bc1, BcFormat::Bc4] {
        let settings = EncodeSettings {
            format,
            ..EncodeSettings::default()
        };

        group.bench_with_input(
            BenchmarkId::new("encode_chain", format!("{format:?}")),
            &settings,
            |b, settings| {
                b.iter(|| {
                    let mut previous: Option<BlockGrid> = None;
                    let mut drawn = 0usize;
                    for frame in &frames {
                        let context = previous.as_ref().map(|grid| PreviousFrameContext::new(grid, (0, 0)));
                        let encoded = encode_layer(frame, context, settings).unwrap();
                        drawn += encoded.commands.map_or(0, |stream| stream.blocks.len());
                        previous = Some(encoded.grid);
                    }
                    black_box(drawn)
                })
            },
        );

        // Encode once, then measure reconstruction of the whole chain.
        let mut previous: Option<BlockGrid> = None;
        let mut streams = Vec::with_capacity(frames.len());
        for frame in &frames {
            let context = previous.as_ref().map(|grid| PreviousFrameContext::new(grid, (0, 0)));
            let encoded = encode_layer(frame, context, &settings).unwrap();
            streams.push(encoded.commands.unwrap());
            previous = Some(encoded.grid);
        }

        let decode_settings = DecodeSettings::matching(&settings);
        group.bench_with_input(
            BenchmarkId::new("decode_chain", format!("{format:?}")),
            &streams,
            |b, streams| {
                b.iter(|| {
                    let mut previous: Option<BlockGrid> = None;
                    for stream in streams {
                        let context = previous.as_ref().map(|grid| PreviousFrameContext::new(grid, (0, 0)));
                        let decoded = decode_layer(
                            &stream.blocks,
                            FRAME_SIZE,
                            FRAME_SIZE,
                            format,
                            Some(&stream.commands[..]),
                            context,
                            &decode_settings,
                        )
                        .unwrap();
                        previous = Some(decoded.grid);
                    }
                    black_box(previous)
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
