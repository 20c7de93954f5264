//! Layer reconstruction from a block stream and draw commands.

use super::{DecodeSettings, PreviousFrameContext, SkipFill};
use crate::block::{check_layer_size, decode_surface, BlockGrid};
use crate::draw_command::{command_total, draw_total, DrawCommand};
use crate::error::{CodecResult, DimensionMismatchKind, MalformedBlockKind, MissingContextKind};
use likely_stable::unlikely;
use log::{debug, warn};
use sld_codec_common::{
    format::{block_count, blocks_for_pixels, BcFormat, BLOCK_SIZE_BYTES},
    raster::Raster,
};

/// A decoded layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLayer {
    /// The layer's pixels.
    pub raster: Raster,
    /// The assembled block grid, reused blocks included. Pass it as the previous frame
    /// context of the next frame.
    pub grid: BlockGrid,
}

/// Reconstructs a `width` x `height` layer.
///
/// Without `commands`, `blocks` must hold the layer's full block grid. With `commands`, the
/// grid is walked in row-major order: each command first takes `skip` blocks from `previous`,
/// then `draw` blocks from `blocks`.
///
/// # Errors
///
/// Checked in this order:
///
/// - [`DimensionMismatchKind::ZeroSize`] if either dimension is zero.
/// - [`MalformedBlockKind::InvalidLength`] if `blocks` is not a whole number of blocks.
/// - [`DimensionMismatchKind::CommandTotal`] if the commands do not cover every block.
/// - [`MalformedBlockKind::Truncated`] or [`MalformedBlockKind::TrailingData`] if the draws
///   do not consume `blocks` exactly.
/// - [`MalformedBlockKind::SizeMismatch`] if there are no commands and `blocks` is not the
///   full grid.
/// - [`CodecError::Alignment`] if a skip is requested against a misaligned `previous`.
/// - [`CodecError::MissingContext`] if a skip has no previous block and `settings` asks for
///   [`SkipFill::Strict`], or if `previous` is stored in another format.
///
/// [`CodecError::Alignment`]: crate::error::CodecError::Alignment
/// [`CodecError::MissingContext`]: crate::error::CodecError::MissingContext
pub fn decode_layer(
    blocks: &[u8],
    width: u32,
    height: u32,
    format: BcFormat,
    commands: Option<&[DrawCommand]>,
    previous: Option<PreviousFrameContext<'_>>,
    settings: &DecodeSettings,
) -> CodecResult<DecodedLayer> {
    check_layer_size(width, height)?;
    if unlikely(blocks.len() % BLOCK_SIZE_BYTES != 0) {
        return Err(MalformedBlockKind::InvalidLength(blocks.len()).into());
    }

    let total_blocks = block_count(width, height);
    let grid = match commands {
        Some(commands) => {
            check_commands(blocks, commands, total_blocks)?;
            assemble_grid(
                blocks,
                blocks_for_pixels(width),
                total_blocks,
                format,
                commands,
                previous,
                settings,
            )?
        }
        None => {
            let expected = total_blocks * BLOCK_SIZE_BYTES;
            if blocks.len() != expected {
                return Err(MalformedBlockKind::SizeMismatch {
                    expected,
                    actual: blocks.len(),
                }
                .into());
            }
            debug!("Decoding full {format:?} layer: {width}x{height}, {total_blocks} blocks");
            blocks.to_vec()
        }
    };

    let grid = BlockGrid::from_parts(format, width, height, grid);
    let raster = decode_surface(&grid)?;
    Ok(DecodedLayer { raster, grid })
}

fn check_commands(blocks: &[u8], commands: &[DrawCommand], total_blocks: usize) -> CodecResult<()> {
    let covered = command_total(commands);
    if covered != total_blocks {
        return Err(DimensionMismatchKind::CommandTotal {
            expected: total_blocks,
            actual: covered,
        }
        .into());
    }

    let used = draw_total(commands) * BLOCK_SIZE_BYTES;
    if used > blocks.len() {
        return Err(MalformedBlockKind::Truncated {
            needed: used,
            actual: blocks.len(),
        }
        .into());
    }
    if used < blocks.len() {
        return Err(MalformedBlockKind::TrailingData {
            used,
            actual: blocks.len(),
        }
        .into());
    }

    Ok(())
}

/// Builds the full block grid; lengths must already be validated by [`check_commands`].
fn assemble_grid(
    blocks: &[u8],
    blocks_wide: u32,
    total_blocks: usize,
    format: BcFormat,
    commands: &[DrawCommand],
    previous: Option<PreviousFrameContext<'_>>,
    settings: &DecodeSettings,
) -> CodecResult<Vec<u8>> {
    let skipped = total_blocks - blocks.len() / BLOCK_SIZE_BYTES;
    if skipped > 0 {
        if let Some(previous) = &previous {
            previous.check_compatible(format)?;
        }
    }

    let mut grid = Vec::with_capacity(total_blocks * BLOCK_SIZE_BYTES);
    let mut cursor = 0;
    let mut filled = 0usize;

    for command in commands {
        for _ in 0..command.skip {
            let index = grid.len() / BLOCK_SIZE_BYTES;
            let block = match &previous {
                Some(previous) => match previous.block_for(index, blocks_wide) {
                    Ok(block) => *block,
                    Err(position) => match settings.skip_fill {
                        SkipFill::Strict => return Err(previous.out_of_bounds(position)),
                        SkipFill::Transparent => {
                            filled += 1;
                            format.transparent_block()
                        }
                    },
                },
                None => match settings.skip_fill {
                    SkipFill::Strict => return Err(MissingContextKind::NoPreviousFrame.into()),
                    SkipFill::Transparent => {
                        filled += 1;
                        format.transparent_block()
                    }
                },
            };
            grid.extend_from_slice(&block);
        }

        let end = cursor + command.draw as usize * BLOCK_SIZE_BYTES;
        grid.extend_from_slice(&blocks[cursor..end]);
        cursor = end;
    }

    if filled > 0 {
        if previous.is_some() {
            warn!("{filled} skipped blocks fall outside of the previous frame; filled with transparent blocks");
        } else {
            debug!("{filled} skipped blocks without a previous frame; filled with transparent blocks");
        }
    }
    debug!(
        "Decoded {format:?} layer: {total_blocks} blocks, {skipped} skipped, {} drawn, {} commands",
        total_blocks - skipped,
        commands.len()
    );

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::encode_surface;
    use crate::test_prelude::*;
    use sld_codec_common::format::{BC1_TRANSPARENT_BLOCK, BC4_TRANSPARENT_BLOCK};

    fn numbered_blocks(count: usize) -> Vec<u8> {
        // Equal endpoints keep every block a valid solid BC4 block.
        (0..count as u8).flat_map(|i| [i * 10, i * 10, 0, 0, 0, 0, 0, 0]).collect()
    }

    fn strict() -> DecodeSettings {
        DecodeSettings::default()
    }

    fn lenient() -> DecodeSettings {
        DecodeSettings {
            skip_fill: SkipFill::Transparent,
        }
    }

    #[test]
    fn decodes_full_grid_without_commands() {
        init_logging();
        let raster = checker_raster(10, 6, 3);
        let grid = encode_surface(&raster, BcFormat::Bc1, BcQuality::Normal);

        let decoded = decode_layer(grid.as_bytes(), 10, 6, BcFormat::Bc1, None, None, &strict()).unwrap();
        assert_eq!(decoded.grid, grid);
        assert_eq!(decoded.raster, decode_surface(&grid).unwrap());
    }

    #[test]
    fn skips_reuse_previous_blocks() {
        init_logging();
        let previous = BlockGrid::new(BcFormat::Bc4, 8, 8, numbered_blocks(4)).unwrap();
        let context = PreviousFrameContext::new(&previous, (0, 0));
        let fresh = [200u8, 200, 0, 0, 0, 0, 0, 0];
        let commands = [DrawCommand::new(1, 1), DrawCommand::new(2, 0)];

        let decoded = decode_layer(&fresh, 8, 8, BcFormat::Bc4, Some(&commands[..]), Some(context), &strict()).unwrap();

        let bytes = decoded.grid.as_bytes();
        assert_eq!(&bytes[0..8], previous.block_at(0).unwrap());
        assert_eq!(&bytes[8..16], &fresh);
        assert_eq!(&bytes[16..32], &previous.as_bytes()[16..32]);
        assert_eq!(decoded.raster.get_pixel(4, 0), Some(Color8888::splat(200)));
        assert_eq!(decoded.raster.get_pixel(0, 7), Some(Color8888::splat(20)));
    }

    #[test]
    fn skips_follow_offset() {
        // Previous layer is 3x1 blocks starting 4 pixels left of the current 2x1 layer.
        let previous = BlockGrid::new(BcFormat::Bc4, 12, 4, numbered_blocks(3)).unwrap();
        let context = PreviousFrameContext::new(&previous, (-4, 0));
        let commands = [DrawCommand::new(2, 0)];

        let decoded = decode_layer(&[], 8, 4, BcFormat::Bc4, Some(&commands[..]), Some(context), &strict()).unwrap();
        assert_eq!(decoded.grid.as_bytes(), &previous.as_bytes()[8..24]);
    }

    #[rstest]
    #[case(0, 4)]
    #[case(4, 0)]
    fn rejects_zero_size(#[case] width: u32, #[case] height: u32) {
        let result = decode_layer(&[], width, height, BcFormat::Bc1, None, None, &strict());
        assert!(matches!(
            result,
            Err(CodecError::DimensionMismatch(DimensionMismatchKind::ZeroSize { .. }))
        ));
    }

    #[test]
    fn rejects_partial_blocks() {
        let result = decode_layer(&[0; 12], 4, 4, BcFormat::Bc1, None, None, &strict());
        assert!(matches!(
            result,
            Err(CodecError::MalformedBlock(MalformedBlockKind::InvalidLength(12)))
        ));
    }

    #[rstest]
    #[case(vec![DrawCommand::new(0, 3)])]
    #[case(vec![DrawCommand::new(2, 1), DrawCommand::new(0, 2)])]
    #[case(vec![])]
    fn rejects_commands_not_covering_grid(#[case] commands: Vec<DrawCommand>) {
        let blocks = numbered_blocks(3);
        let result = decode_layer(&blocks, 8, 8, BcFormat::Bc4, Some(&commands[..]), None, &strict());
        assert!(matches!(
            result,
            Err(CodecError::DimensionMismatch(DimensionMismatchKind::CommandTotal { expected: 4, .. }))
        ));
    }

    #[test]
    fn rejects_truncated_stream() {
        let blocks = numbered_blocks(3);
        let commands = [DrawCommand::new(0, 4)];
        let result = decode_layer(&blocks, 8, 8, BcFormat::Bc4, Some(&commands[..]), None, &strict());
        assert!(matches!(
            result,
            Err(CodecError::MalformedBlock(MalformedBlockKind::Truncated { needed: 32, actual: 24 }))
        ));
    }

    #[test]
    fn rejects_trailing_data() {
        let blocks = numbered_blocks(4);
        let commands = [DrawCommand::new(0, 4)];
        let padded: Vec<u8> = blocks.iter().copied().chain([0; 8]).collect();
        let result = decode_layer(&padded, 8, 8, BcFormat::Bc4, Some(&commands[..]), None, &strict());
        assert!(matches!(
            result,
            Err(CodecError::MalformedBlock(MalformedBlockKind::TrailingData { used: 32, actual: 40 }))
        ));
    }

    #[test]
    fn rejects_wrong_full_grid_size() {
        let result = decode_layer(&numbered_blocks(3), 8, 8, BcFormat::Bc4, None, None, &strict());
        assert!(matches!(
            result,
            Err(CodecError::MalformedBlock(MalformedBlockKind::SizeMismatch { expected: 32, actual: 24 }))
        ));
    }

    #[test]
    fn rejects_misaligned_skip() {
        let previous = BlockGrid::new(BcFormat::Bc4, 8, 8, numbered_blocks(4)).unwrap();
        let context = PreviousFrameContext::new(&previous, (2, 0));
        let commands = [DrawCommand::new(4, 0)];
        let result = decode_layer(&[], 8, 8, BcFormat::Bc4, Some(&commands[..]), Some(context), &strict());
        assert!(matches!(result, Err(CodecError::Alignment { dx: 2, dy: 0 })));
    }

    #[test]
    fn misaligned_context_is_fine_without_skips() {
        let previous = BlockGrid::new(BcFormat::Bc4, 8, 8, numbered_blocks(4)).unwrap();
        let context = PreviousFrameContext::new(&previous, (2, 0));
        let blocks = numbered_blocks(4);
        let commands = [DrawCommand::new(0, 4)];
        let decoded = decode_layer(&blocks, 8, 8, BcFormat::Bc4, Some(&commands[..]), Some(context), &strict()).unwrap();
        assert_eq!(decoded.grid.as_bytes(), blocks.as_slice());
    }

    #[test]
    fn strict_skip_without_context_fails() {
        let commands = [DrawCommand::new(1, 0)];
        let result = decode_layer(&[], 4, 4, BcFormat::Bc1, Some(&commands[..]), None, &strict());
        assert!(matches!(
            result,
            Err(CodecError::MissingContext(MissingContextKind::NoPreviousFrame))
        ));
    }

    #[test]
    fn strict_skip_outside_previous_fails() {
        // Previous frame is a single block; the current one is two blocks wide.
        let previous = BlockGrid::new(BcFormat::Bc4, 4, 4, numbered_blocks(1)).unwrap();
        let context = PreviousFrameContext::new(&previous, (0, 0));
        let commands = [DrawCommand::new(2, 0)];
        let result = decode_layer(&[], 8, 4, BcFormat::Bc4, Some(&commands[..]), Some(context), &strict());
        assert!(matches!(
            result,
            Err(CodecError::MissingContext(MissingContextKind::OutOfBounds {
                block_x: 1,
                block_y: 0,
                ..
            }))
        ));
    }

    #[rstest]
    #[case(BcFormat::Bc1, BC1_TRANSPARENT_BLOCK)]
    #[case(BcFormat::Bc4, BC4_TRANSPARENT_BLOCK)]
    fn transparent_fill_without_context(#[case] format: BcFormat, #[case] transparent: [u8; 8]) {
        init_logging();
        let drawn = [7u8, 7, 0, 0, 0, 0, 0, 0];
        let commands = [DrawCommand::new(1, 1)];
        let decoded = decode_layer(&drawn, 8, 4, format, Some(&commands[..]), None, &lenient()).unwrap();
        assert_eq!(&decoded.grid.as_bytes()[..8], &transparent);
        assert_eq!(&decoded.grid.as_bytes()[8..], &drawn);
    }

    #[test]
    fn transparent_fill_outside_previous() {
        init_logging();
        let previous = BlockGrid::new(BcFormat::Bc4, 4, 4, numbered_blocks(2)[8..].to_vec()).unwrap();
        let context = PreviousFrameContext::new(&previous, (0, 0));
        let commands = [DrawCommand::new(2, 0)];
        let decoded = decode_layer(&[], 8, 4, BcFormat::Bc4, Some(&commands[..]), Some(context), &lenient()).unwrap();
        assert_eq!(&decoded.grid.as_bytes()[..8], previous.as_bytes());
        assert_eq!(&decoded.grid.as_bytes()[8..], &BC4_TRANSPARENT_BLOCK);
    }

    #[test]
    fn rejects_previous_of_other_format() {
        let previous = BlockGrid::transparent(BcFormat::Bc1, 4, 4).unwrap();
        let context = PreviousFrameContext::new(&previous, (0, 0));
        let commands = [DrawCommand::new(1, 0)];
        let result = decode_layer(&[], 4, 4, BcFormat::Bc4, Some(&commands[..]), Some(context), &lenient());
        assert!(matches!(
            result,
            Err(CodecError::MissingContext(MissingContextKind::FormatMismatch { .. }))
        ));
    }
}
