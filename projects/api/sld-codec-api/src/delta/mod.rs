//! Delta engine: converts between rasters and block streams with skip/draw commands.
//!
//! Consecutive frames of a sprite share most of their blocks. A delta layer only stores the
//! blocks that changed; every other block is taken verbatim from the previous frame's
//! [`BlockGrid`], so a chain of delta frames reproduces the same bytes a full encode would.
//!
//! The previous frame is passed explicitly as a [`PreviousFrameContext`] and never mutated.
//! Each call returns a fresh grid which becomes the context of the next frame.

mod decode;
mod encode;
mod settings;

pub use decode::{decode_layer, DecodedLayer};
pub use encode::{encode_layer, CommandStream, EncodedLayer};
pub use settings::{DecodeSettings, EncodeSettings, EncodeSettingsBuilder, SkipFill};

use crate::block::BlockGrid;
use crate::error::{CodecError, CodecResult, MissingContextKind};
use sld_codec_common::format::{BcFormat, BLOCK_HEIGHT, BLOCK_WIDTH};

/// One layer of the previous frame, positioned relative to the current layer.
#[derive(Debug, Clone, Copy)]
pub struct PreviousFrameContext<'a> {
    grid: &'a BlockGrid,
    offset: (i32, i32),
}

impl<'a> PreviousFrameContext<'a> {
    /// Creates a context from the previous frame's grid and the offset
    /// `previous.origin - current.origin`, in pixels.
    pub fn new(grid: &'a BlockGrid, offset: (i32, i32)) -> Self {
        Self { grid, offset }
    }

    /// The previous frame's block grid.
    #[inline]
    pub fn grid(&self) -> &'a BlockGrid {
        self.grid
    }

    /// Offset of the previous layer's origin from the current one, in pixels.
    #[inline]
    pub fn offset(&self) -> (i32, i32) {
        self.offset
    }

    /// Whether the offset is a whole number of blocks on both axes.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.offset.0 % BLOCK_WIDTH as i32 == 0 && self.offset.1 % BLOCK_HEIGHT as i32 == 0
    }

    /// Fails unless blocks of a `format` layer can be taken from this context.
    pub(crate) fn check_compatible(&self, format: BcFormat) -> CodecResult<()> {
        if !self.is_aligned() {
            return Err(CodecError::Alignment {
                dx: self.offset.0,
                dy: self.offset.1,
            });
        }
        if self.grid.format() != format {
            return Err(MissingContextKind::FormatMismatch {
                previous: self.grid.format(),
                current: format,
            }
            .into());
        }
        Ok(())
    }

    /// Previous frame's block covering the same pixels as block `index` of a current layer
    /// that is `blocks_wide` blocks wide.
    ///
    /// Returns the previous grid's block coordinates on failure. The offset must be aligned.
    pub(crate) fn block_for(&self, index: usize, blocks_wide: u32) -> Result<&'a [u8; 8], (i64, i64)> {
        let bx = (index % blocks_wide as usize) as i64;
        let by = (index / blocks_wide as usize) as i64;
        let col = bx - (self.offset.0 / BLOCK_WIDTH as i32) as i64;
        let row = by - (self.offset.1 / BLOCK_HEIGHT as i32) as i64;

        if col < 0
            || row < 0
            || col >= self.grid.blocks_wide() as i64
            || row >= self.grid.blocks_high() as i64
        {
            return Err((col, row));
        }
        self.grid.block(col as u32, row as u32).ok_or((col, row))
    }

    pub(crate) fn out_of_bounds(&self, (block_x, block_y): (i64, i64)) -> CodecError {
        MissingContextKind::OutOfBounds {
            block_x,
            block_y,
            blocks_wide: self.grid.blocks_wide(),
            blocks_high: self.grid.blocks_high(),
        }
        .into()
    }
}
