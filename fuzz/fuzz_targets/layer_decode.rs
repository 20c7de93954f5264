#![no_main]

// Feeds arbitrary streams and commands to the layer decoder. Decoding may fail, but must
// not panic, and a successful decode must cover the whole layer.

use libfuzzer_sys::{arbitrary, fuzz_target};
use sld_codec_api::{decode_layer, BlockGrid, DecodeSettings, DrawCommand, PreviousFrameContext, SkipFill};
use sld_codec_common::format::{block_count, BcFormat};

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct LayerInput {
    pub width: u8,
    pub height: u8,
    pub bc4: bool,
    pub transparent_fill: bool,
    pub commands: Vec<(u8, u8)>,
    pub blocks: Vec<u8>,
    pub previous: Option<(u8, u8, i8, i8)>,
}

fuzz_target!(|input: LayerInput| {
    let format = if input.bc4 { BcFormat::Bc4 } else { BcFormat::Bc1 };
    let settings = DecodeSettings {
        skip_fill: if input.transparent_fill {
            SkipFill::Transparent
        } else {
            SkipFill::Strict
        },
    };
    let commands: Vec<DrawCommand> = input
        .commands
        .iter()
        .map(|&(skip, draw)| DrawCommand::new(skip, draw))
        .collect();

    let previous_grid = input.previous.and_then(|(width, height, _, _)| {
        BlockGrid::transparent(format, width.max(1) as u32, height.max(1) as u32).ok()
    });
    let previous = previous_grid.as_ref().zip(input.previous).map(|(grid, (_, _, dx, dy))| {
        PreviousFrameContext::new(grid, (dx as i32, dy as i32))
    });

    let width = input.width as u32;
    let height = input.height as u32;
    if let Ok(decoded) = decode_layer(
        &input.blocks,
        width,
        height,
        format,
        (!commands.is_empty()).then_some(commands.as_slice()),
        previous,
        &settings,
    ) {
        assert_eq!(decoded.grid.block_count(), block_count(width, height));
        assert_eq!(decoded.raster.dimensions(), (width, height));
    }
});
