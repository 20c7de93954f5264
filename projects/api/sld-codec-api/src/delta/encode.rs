//! Layer encoding with optional skip/draw command generation.

use super::{EncodeSettings, PreviousFrameContext, SkipFill};
use crate::block::{encode_surface, BlockGrid};
use crate::draw_command::{commands_from_skips, DrawCommand};
use crate::error::CodecResult;
use log::debug;
use sld_codec_common::{format::BcFormat, raster::Raster};

/// Draw commands and the block stream they draw from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandStream {
    /// Run-length skip/draw commands covering the whole layer.
    pub commands: Vec<DrawCommand>,
    /// The drawn blocks, in order.
    pub blocks: Vec<u8>,
}

/// An encoded layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLayer {
    /// Every block of the layer. Pass it as the previous frame context of the next frame.
    pub grid: BlockGrid,
    /// Commands and delta block stream, if requested in [`EncodeSettings::generate_commands`].
    pub commands: Option<CommandStream>,
}

/// Encodes `raster`, optionally against the previous frame's grid.
///
/// A block is skipped when its encoded bytes equal the previous frame's block at the same
/// position, so decoding the commands reproduces [`EncodedLayer::grid`] exactly. Blocks
/// with no counterpart in `previous` are only skipped under [`SkipFill::Transparent`], and
/// only when they are the format's transparent block.
///
/// # Errors
///
/// - [`CodecError::Alignment`] if `previous` is not offset by a whole number of blocks.
/// - [`CodecError::MissingContext`] if `previous` is stored in another format.
///
/// [`CodecError::Alignment`]: crate::error::CodecError::Alignment
/// [`CodecError::MissingContext`]: crate::error::CodecError::MissingContext
pub fn encode_layer(
    raster: &Raster,
    previous: Option<PreviousFrameContext<'_>>,
    settings: &EncodeSettings,
) -> CodecResult<EncodedLayer> {
    if let Some(previous) = &previous {
        previous.check_compatible(settings.format)?;
    }

    let grid = encode_surface(raster, settings.format, settings.quality);
    if !settings.generate_commands {
        debug!(
            "Encoded full {:?} layer: {}x{}, {} blocks",
            settings.format,
            raster.width(),
            raster.height(),
            grid.block_count()
        );
        return Ok(EncodedLayer {
            grid,
            commands: None,
        });
    }

    let blocks_wide = grid.blocks_wide();
    let skips: Vec<bool> = grid
        .iter_blocks()
        .enumerate()
        .map(|(index, block)| {
            is_skippable(index, block, blocks_wide, settings.format, previous.as_ref(), settings.skip_fill)
        })
        .collect();

    let commands = commands_from_skips(skips.iter().copied());
    let mut blocks = Vec::new();
    for (block, skip) in grid.iter_blocks().zip(&skips) {
        if !skip {
            blocks.extend_from_slice(block);
        }
    }

    let skipped = skips.iter().filter(|skip| **skip).count();
    debug!(
        "Encoded {:?} layer: {} blocks, {} skipped, {} drawn, {} commands",
        settings.format,
        grid.block_count(),
        skipped,
        grid.block_count() - skipped,
        commands.len()
    );

    Ok(EncodedLayer {
        grid,
        commands: Some(CommandStream { commands, blocks }),
    })
}

fn is_skippable(
    index: usize,
    block: &[u8],
    blocks_wide: u32,
    format: BcFormat,
    previous: Option<&PreviousFrameContext<'_>>,
    skip_fill: SkipFill,
) -> bool {
    if let Some(previous) = previous {
        if let Ok(previous_block) = previous.block_for(index, blocks_wide) {
            return block == previous_block;
        }
    }

    skip_fill == SkipFill::Transparent && block == format.transparent_block()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{decode_layer, DecodeSettings, EncodeSettingsBuilder};
    use crate::test_prelude::*;

    fn settings(format: BcFormat, skip_fill: SkipFill) -> EncodeSettings {
        EncodeSettings {
            format,
            skip_fill,
            ..EncodeSettings::default()
        }
    }

    /// Opaque content on the left half, transparent on the right.
    fn half_transparent(width: u32, height: u32) -> Raster {
        raster_from_fn(width, height, |x, _| {
            if x < width / 2 {
                OPAQUE_RED
            } else {
                Color8888::TRANSPARENT
            }
        })
    }

    #[test]
    fn identical_frames_skip_everything() {
        init_logging();
        let frame = Raster::filled(8, 8, Color8888::new(0, 0, 0, 255)).unwrap();
        let settings = EncodeSettings::default();

        let first = encode_layer(&frame, None, &settings).unwrap();
        assert_eq!(first.grid.as_bytes(), &[0u8; 32]);

        let context = PreviousFrameContext::new(&first.grid, (0, 0));
        let second = encode_layer(&frame, Some(context), &settings).unwrap();
        let stream = second.commands.unwrap();
        assert_eq!(stream.commands, vec![DrawCommand::new(4, 0)]);
        assert!(stream.blocks.is_empty());
    }

    #[test]
    fn first_frame_draws_everything_in_strict_mode() {
        let frame = half_transparent(16, 4);
        let encoded = encode_layer(&frame, None, &EncodeSettings::default()).unwrap();
        let stream = encoded.commands.unwrap();
        assert_eq!(stream.commands, vec![DrawCommand::new(0, 4)]);
        assert_eq!(stream.blocks, encoded.grid.as_bytes());
    }

    #[test]
    fn transparent_mode_skips_empty_blocks() {
        let frame = half_transparent(16, 4);
        let settings = settings(BcFormat::Bc1, SkipFill::Transparent);
        let encoded = encode_layer(&frame, None, &settings).unwrap();
        let stream = encoded.commands.unwrap();
        assert_eq!(stream.commands, vec![DrawCommand::new(0, 2), DrawCommand::new(2, 0)]);
        assert_eq!(stream.blocks, &encoded.grid.as_bytes()[..16]);
    }

    #[test]
    fn only_changed_blocks_are_drawn() {
        let first_frame = checker_raster(16, 8, 0);
        let mut second_frame = first_frame.clone();
        // Change one pixel in block (2, 1).
        second_frame.set_pixel(9, 5, Color8888::new(0, 255, 0, 255));

        let settings = EncodeSettings::default();
        let first = encode_layer(&first_frame, None, &settings).unwrap();
        let context = PreviousFrameContext::new(&first.grid, (0, 0));
        let second = encode_layer(&second_frame, Some(context), &settings).unwrap();

        let stream = second.commands.unwrap();
        assert_eq!(stream.commands, vec![DrawCommand::new(6, 1), DrawCommand::new(1, 0)]);
        assert_eq!(stream.blocks, second.grid.block(2, 1).unwrap());
    }

    #[test]
    fn shifted_frames_reuse_blocks() {
        // The second layer starts one block right of the first and shares its content.
        let wide = checker_raster(16, 4, 9);
        let first = encode_layer(&wide, None, &EncodeSettings::default()).unwrap();

        let mut shifted = Raster::new(12, 4).unwrap();
        for y in 0..4 {
            for x in 0..12 {
                shifted.set_pixel(x, y, wide.get_pixel(x + 4, y).unwrap());
            }
        }

        let context = PreviousFrameContext::new(&first.grid, (-4, 0));
        let second = encode_layer(&shifted, Some(context), &EncodeSettings::default()).unwrap();
        let stream = second.commands.unwrap();
        assert_eq!(stream.commands, vec![DrawCommand::new(3, 0)]);
        assert_eq!(second.grid.as_bytes(), &first.grid.as_bytes()[8..]);
    }

    #[rstest]
    #[case(BcFormat::Bc1, SkipFill::Strict)]
    #[case(BcFormat::Bc1, SkipFill::Transparent)]
    #[case(BcFormat::Bc4, SkipFill::Strict)]
    #[case(BcFormat::Bc4, SkipFill::Transparent)]
    fn commands_decode_to_the_full_grid(#[case] format: BcFormat, #[case] skip_fill: SkipFill) {
        init_logging();
        let settings = settings(format, skip_fill);
        let decode_settings = DecodeSettings::matching(&settings);

        // Previous frame is smaller than the current one, so some blocks have no counterpart.
        let first_frame = half_transparent(8, 8);
        let first = encode_layer(&first_frame, None, &settings).unwrap();

        let second_frame = raster_from_fn(14, 10, |x, y| {
            if x < 4 && y < 8 {
                OPAQUE_RED
            } else if y >= 8 {
                Color8888::new(10, 20, 30, 255)
            } else {
                Color8888::TRANSPARENT
            }
        });
        let context = PreviousFrameContext::new(&first.grid, (0, 0));
        let second = encode_layer(&second_frame, Some(context), &settings).unwrap();
        let stream = second.commands.as_ref().unwrap();

        assert_eq!(
            crate::draw_command::command_total(&stream.commands),
            second.grid.block_count()
        );

        let decoded = decode_layer(
            &stream.blocks,
            14,
            10,
            format,
            Some(&stream.commands[..]),
            Some(context),
            &decode_settings,
        )
        .unwrap();
        assert_eq!(decoded.grid, second.grid);
    }

    #[test]
    fn without_commands_only_the_grid_is_returned() {
        let frame = checker_raster(8, 8, 1);
        let settings = EncodeSettingsBuilder::new().generate_commands(false).build();
        let encoded = encode_layer(&frame, None, &settings).unwrap();
        assert!(encoded.commands.is_none());
        assert_eq!(encoded.grid.block_count(), 4);
    }

    #[test]
    fn rejects_misaligned_previous() {
        let frame = checker_raster(8, 8, 1);
        let first = encode_layer(&frame, None, &EncodeSettings::default()).unwrap();
        let context = PreviousFrameContext::new(&first.grid, (0, 6));
        let result = encode_layer(&frame, Some(context), &EncodeSettings::default());
        assert!(matches!(result, Err(CodecError::Alignment { dx: 0, dy: 6 })));
    }

    #[test]
    fn rejects_previous_of_other_format() {
        let frame = checker_raster(8, 8, 1);
        let first = encode_layer(&frame, None, &EncodeSettings::default()).unwrap();
        let context = PreviousFrameContext::new(&first.grid, (0, 0));
        let settings = settings(BcFormat::Bc4, SkipFill::Strict);
        let result = encode_layer(&frame, Some(context), &settings);
        assert!(matches!(
            result,
            Err(CodecError::MissingContext(MissingContextKind::FormatMismatch { .. }))
        ));
    }
}
