//! # Decoded 4x4 Block
//!
//! This module provides the [`Decoded4x4Block`] structure for representing decompressed
//! 4x4 pixel blocks used by the BC1 and BC4 formats.
//!
//! ## Overview
//!
//! BC formats compress textures by dividing them into 4x4 pixel blocks. This module provides
//! a representation for working with these blocks before they are compressed, and after they
//! have been decompressed to RGBA format.
//!
//! ## Usage
//!
//! ```
//! use sld_codec_common::color_8888::Color8888;
//! use sld_codec_common::decoded_4x4_block::Decoded4x4Block;
//!
//! // Create a block filled with red pixels
//! let red_pixel = Color8888::new(255, 0, 0, 255);
//! let block = Decoded4x4Block::new(red_pixel);
//!
//! // Check if all pixels are identical
//! assert!(block.has_identical_pixels());
//! ```
//!
//! ## Memory Layout
//!
//! The pixels are stored in row-major order:
//! ```text
//! [ 0] [ 1] [ 2] [ 3]
//! [ 4] [ 5] [ 6] [ 7]
//! [ 8] [ 9] [10] [11]
//! [12] [13] [14] [15]
//! ```
//!
//! The same order is used by the index bits of an encoded block and by the `valid_mask`
//! values returned from [`Raster::block`](crate::raster::Raster::block).

use crate::color_8888::Color8888;

/// A `valid_mask` with every pixel of the block inside the source image.
pub const ALL_PIXELS_VALID: u16 = 0xFFFF;

/// Represents a decoded 4x4 block of BC pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded4x4Block {
    /// The 16 pixels in the block (row-major order)
    /// (i.e. `pixels[0]` is top-left, `pixels[3]` is top-right, etc.)
    pub pixels: [Color8888; 16],
}

impl Decoded4x4Block {
    /// Constructs a new decoded block initialised with 16 copies of the provided pixel.
    ///
    /// # Examples
    ///
    /// ```
    /// use sld_codec_common::color_8888::Color8888;
    /// use sld_codec_common::decoded_4x4_block::Decoded4x4Block;
    ///
    /// let pixel = Color8888::new(255, 0, 0, 255);
    /// let block = Decoded4x4Block::new(pixel);
    /// assert!(block.pixels.iter().all(|&p| p == pixel));
    /// ```
    pub fn new(pixel: Color8888) -> Self {
        Self {
            pixels: [pixel; 16],
        }
    }

    /// Gets the pixel at the specified coordinates (0-3, 0-3).
    ///
    /// # Panics
    ///
    /// If `x` or `y` is 4 or greater.
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> Color8888 {
        assert!(x < 4 && y < 4, "pixel ({x}, {y}) is outside of a 4x4 block");
        self.pixels[y * 4 + x]
    }

    /// Sets the pixel at the specified coordinates (0-3, 0-3).
    ///
    /// # Panics
    ///
    /// If `x` or `y` is 4 or greater.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, pixel: Color8888) {
        assert!(x < 4 && y < 4, "pixel ({x}, {y}) is outside of a 4x4 block");
        self.pixels[y * 4 + x] = pixel;
    }

    /// Sets a pixel at the specified coordinates (0-3, 0-3) without bounds checking
    ///
    /// # Safety
    ///
    /// The caller must ensure that `x < 4` and `y < 4`.
    #[inline]
    pub unsafe fn set_pixel_unchecked(&mut self, x: usize, y: usize, pixel: Color8888) {
        *self.pixels.get_unchecked_mut(y * 4 + x) = pixel;
    }

    /// Checks if all pixels in the block have the same color values
    ///
    /// # Returns
    /// `true` if all pixels in the block are identical, `false` otherwise
    #[inline]
    pub fn has_identical_pixels(&self) -> bool {
        let first = self.pixels[0];
        self.pixels.iter().all(|pixel| *pixel == first)
    }

    /// Iterates over the pixels selected by `valid_mask` (bit `i` selects `pixels[i]`).
    #[inline]
    pub fn masked_pixels(&self, valid_mask: u16) -> impl Iterator<Item = (usize, Color8888)> + '_ {
        self.pixels
            .iter()
            .enumerate()
            .filter(move |(i, _)| valid_mask & (1u16 << *i) != 0)
            .map(|(i, p)| (i, *p))
    }
}
