//! Format dispatch for single blocks and whole surfaces.
//!
//! [`BlockGrid`] is the unit passed between frames: the row-major blocks of one layer
//! together with the pixel size and format they were encoded at.

use crate::error::{CodecResult, DimensionMismatchKind, MalformedBlockKind};
use multiversion::multiversion;
use sld_codec_bc1::{decode_bc1_block, encode_bc1_block};
use sld_codec_bc4::{decode_bc4_block, encode_bc4_block};
use sld_codec_common::{
    decoded_4x4_block::Decoded4x4Block,
    format::{block_count, blocks_for_pixels, BcFormat, BcQuality, BLOCK_SIZE_BYTES},
    raster::Raster,
};

/// The blocks of one layer in row-major order, `ceil(width / 4)` blocks per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockGrid {
    format: BcFormat,
    width: u32,
    height: u32,
    blocks: Vec<u8>,
}

impl BlockGrid {
    /// Wraps raw block data covering a `width` x `height` pixel layer.
    ///
    /// # Errors
    ///
    /// - [`DimensionMismatchKind::ZeroSize`] if either dimension is zero.
    /// - [`MalformedBlockKind::SizeMismatch`] if `blocks` does not hold exactly one block
    ///   per 4x4 tile.
    pub fn new(format: BcFormat, width: u32, height: u32, blocks: Vec<u8>) -> CodecResult<Self> {
        check_layer_size(width, height)?;
        let expected = block_count(width, height) * BLOCK_SIZE_BYTES;
        if blocks.len() != expected {
            return Err(MalformedBlockKind::SizeMismatch {
                expected,
                actual: blocks.len(),
            }
            .into());
        }

        Ok(Self::from_parts(format, width, height, blocks))
    }

    /// Creates a grid where every block is the format's transparent block.
    pub fn transparent(format: BcFormat, width: u32, height: u32) -> CodecResult<Self> {
        check_layer_size(width, height)?;
        let blocks = format.transparent_block().repeat(block_count(width, height));
        Ok(Self::from_parts(format, width, height, blocks))
    }

    /// Assembles a grid whose block data is already known to match its dimensions.
    pub(crate) fn from_parts(format: BcFormat, width: u32, height: u32, blocks: Vec<u8>) -> Self {
        debug_assert_eq!(blocks.len(), block_count(width, height) * BLOCK_SIZE_BYTES);
        Self {
            format,
            width,
            height,
            blocks,
        }
    }

    /// Format of every block in the grid.
    #[inline]
    pub fn format(&self) -> BcFormat {
        self.format
    }

    /// Width of the layer in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the layer in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width and height of the layer in pixels.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Width of the grid in blocks.
    #[inline]
    pub fn blocks_wide(&self) -> u32 {
        blocks_for_pixels(self.width)
    }

    /// Height of the grid in blocks.
    #[inline]
    pub fn blocks_high(&self) -> u32 {
        blocks_for_pixels(self.height)
    }

    /// Total number of blocks.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len() / BLOCK_SIZE_BYTES
    }

    /// Raw block data.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.blocks
    }

    /// Consumes the grid, returning its raw block data.
    pub fn into_bytes(self) -> Vec<u8> {
        self.blocks
    }

    /// Block at block coordinates `(bx, by)`, or [`None`] if outside of the grid.
    #[inline]
    pub fn block(&self, bx: u32, by: u32) -> Option<&[u8; 8]> {
        if bx >= self.blocks_wide() || by >= self.blocks_high() {
            return None;
        }
        self.block_at(by as usize * self.blocks_wide() as usize + bx as usize)
    }

    /// Block at a row-major block index, or [`None`] if outside of the grid.
    #[inline]
    pub fn block_at(&self, index: usize) -> Option<&[u8; 8]> {
        let start = index.checked_mul(BLOCK_SIZE_BYTES)?;
        self.blocks
            .get(start..start + BLOCK_SIZE_BYTES)?
            .try_into()
            .ok()
    }

    /// Iterates over every block in row-major order.
    pub fn iter_blocks(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.blocks.chunks_exact(BLOCK_SIZE_BYTES)
    }
}

#[inline]
pub(crate) fn check_layer_size(width: u32, height: u32) -> CodecResult<()> {
    if width == 0 || height == 0 {
        return Err(DimensionMismatchKind::ZeroSize { width, height }.into());
    }
    Ok(())
}

/// Encodes a 4x4 tile into an 8 byte block of the given format.
///
/// Bit `i` of `valid_mask` is set when tile pixel `i` lies inside the image; other pixels
/// are padding and never affect the result.
#[inline]
pub fn encode_block(
    tile: &Decoded4x4Block,
    valid_mask: u16,
    format: BcFormat,
    quality: BcQuality,
) -> [u8; 8] {
    match format {
        BcFormat::Bc1 => encode_bc1_block(tile, valid_mask, quality),
        BcFormat::Bc4 => encode_bc4_block(tile, valid_mask, quality),
    }
}

/// Decodes an 8 byte block of the given format.
///
/// # Errors
///
/// [`MalformedBlockKind::SizeMismatch`] if `block` is not exactly 8 bytes long.
///
/// # Example
///
/// ```
/// use sld_codec_api::decode_block;
/// use sld_codec_common::{color_8888::Color8888, format::BcFormat};
///
/// let decoded = decode_block(&[0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF], BcFormat::Bc1).unwrap();
/// assert!(decoded.pixels.iter().all(|p| *p == Color8888::TRANSPARENT));
///
/// assert!(decode_block(&[0; 4], BcFormat::Bc4).is_err());
/// ```
pub fn decode_block(block: &[u8], format: BcFormat) -> CodecResult<Decoded4x4Block> {
    let block: &[u8; 8] = block
        .try_into()
        .map_err(|_| MalformedBlockKind::SizeMismatch {
            expected: BLOCK_SIZE_BYTES,
            actual: block.len(),
        })?;
    Ok(decode_block_array(block, format))
}

/// Decodes a block whose size is known at compile time.
#[inline]
pub(crate) fn decode_block_array(block: &[u8; 8], format: BcFormat) -> Decoded4x4Block {
    // SAFETY: `block` is exactly 8 bytes, which is all either decoder reads.
    unsafe {
        match format {
            BcFormat::Bc1 => decode_bc1_block(block.as_ptr()),
            BcFormat::Bc4 => decode_bc4_block(block.as_ptr()),
        }
    }
}

/// Encodes every tile of `raster`, returning a full block grid.
///
/// # Example
///
/// ```
/// use sld_codec_api::encode_surface;
/// use sld_codec_common::{color_8888::Color8888, format::{BcFormat, BcQuality}, raster::Raster};
///
/// let black = Raster::filled(8, 8, Color8888::new(0, 0, 0, 255)).unwrap();
/// let grid = encode_surface(&black, BcFormat::Bc1, BcQuality::Normal);
/// assert_eq!(grid.as_bytes(), &[0u8; 32]);
/// ```
pub fn encode_surface(raster: &Raster, format: BcFormat, quality: BcQuality) -> BlockGrid {
    let mut blocks = Vec::with_capacity(block_count(raster.width(), raster.height()) * BLOCK_SIZE_BYTES);
    encode_blocks(raster, format, quality, &mut blocks);
    BlockGrid::from_parts(format, raster.width(), raster.height(), blocks)
}

/// Decodes every block of `grid` into a raster of the grid's pixel size.
pub fn decode_surface(grid: &BlockGrid) -> CodecResult<Raster> {
    let mut raster = Raster::new(grid.width(), grid.height())?;
    decode_blocks(grid, &mut raster);
    Ok(raster)
}

#[multiversion(targets(
    // x86-64-v3 without lahfsahf
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    // x86-64-v2 without lahfsahf
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
))]
fn encode_blocks(raster: &Raster, format: BcFormat, quality: BcQuality, output: &mut Vec<u8>) {
    for by in 0..raster.blocks_high() {
        for bx in 0..raster.blocks_wide() {
            let (tile, valid_mask) = raster.block(bx, by);
            output.extend_from_slice(&encode_block(&tile, valid_mask, format, quality));
        }
    }
}

#[multiversion(targets(
    // x86-64-v3 without lahfsahf
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    // x86-64-v2 without lahfsahf
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
))]
fn decode_blocks(grid: &BlockGrid, raster: &mut Raster) {
    let blocks_wide = grid.blocks_wide();
    let mut block = [0u8; BLOCK_SIZE_BYTES];
    for (index, chunk) in grid.iter_blocks().enumerate() {
        // `iter_blocks` only yields whole blocks.
        block.copy_from_slice(chunk);
        let index = index as u32;
        raster.put_block(
            index % blocks_wide,
            index / blocks_wide,
            &decode_block_array(&block, grid.format()),
        );
    }
}
