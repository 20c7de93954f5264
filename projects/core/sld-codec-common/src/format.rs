//! Block formats and encoder quality levels.
//!
//! Both supported formats share the same geometry: a block covers 4x4 pixels and is
//! stored in exactly [`BLOCK_SIZE_BYTES`] bytes.

use derive_enum_all_values::AllValues;

/// Width of a block in pixels.
pub const BLOCK_WIDTH: u32 = 4;

/// Height of a block in pixels.
pub const BLOCK_HEIGHT: u32 = 4;

/// Size of a single compressed block in bytes, for both BC1 and BC4.
pub const BLOCK_SIZE_BYTES: usize = 8;

/// Fully transparent BC1 block: `c0 == c1 == 0` selects 3-colour mode, and every index
/// is 3 (transparent black).
pub const BC1_TRANSPARENT_BLOCK: [u8; BLOCK_SIZE_BYTES] = [0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF];

/// Empty BC4 block: both endpoints and all indices zero.
pub const BC4_TRANSPARENT_BLOCK: [u8; BLOCK_SIZE_BYTES] = [0; BLOCK_SIZE_BYTES];

/// A block compression format supported by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AllValues)]
pub enum BcFormat {
    /// BC1 (DXT1): RGB565 endpoints + 2-bit indices, with 1-bit punch-through alpha.
    Bc1,
    /// BC4: single channel, 8-bit endpoints + 3-bit indices.
    Bc4,
}

impl BcFormat {
    /// Returns the block that represents "nothing here" in this format.
    #[inline]
    pub const fn transparent_block(self) -> [u8; BLOCK_SIZE_BYTES] {
        match self {
            BcFormat::Bc1 => BC1_TRANSPARENT_BLOCK,
            BcFormat::Bc4 => BC4_TRANSPARENT_BLOCK,
        }
    }

    /// Size in bytes of a single block of this format.
    #[inline]
    pub const fn block_size(self) -> usize {
        BLOCK_SIZE_BYTES
    }
}

/// Trade-off between encoder speed and endpoint search effort.
///
/// Decoding never depends on the quality level; it only affects which endpoints the
/// encoder picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AllValues)]
pub enum BcQuality {
    /// Per-channel bounding box endpoints.
    Fast,
    /// Principal axis endpoints.
    Normal,
    /// Principal axis endpoints refined by a local search in endpoint space.
    Slow,
}

impl Default for BcQuality {
    fn default() -> Self {
        BcQuality::Normal
    }
}

/// Number of blocks needed to cover `pixels` along one axis.
///
/// # Examples
///
/// ```
/// use sld_codec_common::format::blocks_for_pixels;
///
/// assert_eq!(blocks_for_pixels(8), 2);
/// assert_eq!(blocks_for_pixels(9), 3);
/// assert_eq!(blocks_for_pixels(1), 1);
/// ```
#[inline]
pub const fn blocks_for_pixels(pixels: u32) -> u32 {
    pixels.div_ceil(BLOCK_WIDTH)
}

/// Number of blocks needed to tile a `width` x `height` pixel area.
#[inline]
pub const fn block_count(width: u32, height: u32) -> usize {
    blocks_for_pixels(width) as usize * blocks_for_pixels(height) as usize
}
