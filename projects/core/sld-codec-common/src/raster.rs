//! Owned RGBA8 images, and their view as a grid of 4x4 tiles.
//!
//! A raster's width and height need not be multiples of 4. Tiles hanging over the right or
//! bottom edge are padded: [`Raster::block`] reports which tile pixels are real through a
//! `valid_mask`, and [`Raster::put_block`] drops the padding when writing a tile back.

use crate::color_8888::Color8888;
use crate::decoded_4x4_block::Decoded4x4Block;
use crate::format::blocks_for_pixels;
use alloc::vec;
use alloc::vec::Vec;
use thiserror::Error;

/// Errors raised when constructing a [`Raster`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    /// Width or height was zero.
    #[error("Invalid raster dimensions: {width}x{height}. Both must be non-zero.")]
    InvalidDimensions {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },

    /// The supplied pixel buffer does not match the requested dimensions.
    #[error("Pixel buffer size mismatch: expected {expected} bytes, got {actual} bytes.")]
    BufferSizeMismatch {
        /// Size implied by the dimensions, in bytes
        expected: usize,
        /// Size of the supplied buffer, in bytes
        actual: usize,
    },
}

/// An owned `width` x `height` image of [`Color8888`] pixels in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Color8888>,
}

impl Raster {
    /// Creates a fully transparent raster.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        Self::filled(width, height, Color8888::TRANSPARENT)
    }

    /// Creates a raster with every pixel set to `pixel`.
    pub fn filled(width: u32, height: u32, pixel: Color8888) -> Result<Self, RasterError> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![pixel; width as usize * height as usize],
        })
    }

    /// Wraps an existing pixel buffer.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color8888>) -> Result<Self, RasterError> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(RasterError::BufferSizeMismatch {
                expected: expected * 4,
                actual: pixels.len() * 4,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Creates a raster from tightly packed RGBA8 bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use sld_codec_common::raster::Raster;
    ///
    /// let raster = Raster::from_rgba8(1, 2, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    /// assert_eq!(raster.get_pixel(0, 1).unwrap().to_array(), [5, 6, 7, 8]);
    /// assert_eq!(raster.to_rgba8(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    /// ```
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, RasterError> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(RasterError::BufferSizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let pixels = bytes
            .chunks_exact(4)
            .map(|px| Color8888::new(px[0], px[1], px[2], px[3]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Returns the pixels as tightly packed RGBA8 bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            out.extend_from_slice(&pixel.to_array());
        }
        out
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in pixels.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of block columns covering this raster.
    #[inline]
    pub fn blocks_wide(&self) -> u32 {
        blocks_for_pixels(self.width)
    }

    /// Number of block rows covering this raster.
    #[inline]
    pub fn blocks_high(&self) -> u32 {
        blocks_for_pixels(self.height)
    }

    /// All pixels in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[Color8888] {
        &self.pixels
    }

    /// Returns the pixel at `(x, y)`, or [`None`] if it lies outside the raster.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Color8888> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Returns the pixel at signed coordinates `(x, y)`, treating everything outside the
    /// raster as transparent.
    #[inline]
    pub fn pixel_or_transparent(&self, x: i64, y: i64) -> Color8888 {
        if x < 0 || y < 0 {
            return Color8888::TRANSPARENT;
        }
        self.get_pixel(x as u32, y as u32)
            .unwrap_or(Color8888::TRANSPARENT)
    }

    /// Overwrites the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// If `(x, y)` lies outside the raster.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Color8888) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) is outside of a {}x{} raster",
            self.width,
            self.height
        );
        self.pixels[y as usize * self.width as usize + x as usize] = pixel;
    }

    /// Gathers the 4x4 tile at block coordinates `(bx, by)`.
    ///
    /// Returns the tile and a mask where bit `i` is set when tile pixel `i` (row-major)
    /// lies inside the raster. Padding pixels are transparent black.
    pub fn block(&self, bx: u32, by: u32) -> (Decoded4x4Block, u16) {
        let mut block = Decoded4x4Block::new(Color8888::TRANSPARENT);
        let mut valid_mask = 0u16;

        let x0 = bx * 4;
        let y0 = by * 4;
        for py in 0..4 {
            let y = y0 + py;
            if y >= self.height {
                break;
            }
            let row = y as usize * self.width as usize;
            for px in 0..4 {
                let x = x0 + px;
                if x >= self.width {
                    break;
                }
                let i = (py * 4 + px) as usize;
                block.pixels[i] = self.pixels[row + x as usize];
                valid_mask |= 1 << i;
            }
        }

        (block, valid_mask)
    }

    /// Writes a 4x4 tile at block coordinates `(bx, by)`, dropping pixels that fall outside
    /// the raster.
    pub fn put_block(&mut self, bx: u32, by: u32, block: &Decoded4x4Block) {
        let x0 = bx * 4;
        let y0 = by * 4;
        for py in 0..4 {
            let y = y0 + py;
            if y >= self.height {
                break;
            }
            let row = y as usize * self.width as usize;
            for px in 0..4 {
                let x = x0 + px;
                if x >= self.width {
                    break;
                }
                self.pixels[row + x as usize] = block.pixels[(py * 4 + px) as usize];
            }
        }
    }
}

#[inline]
fn check_dimensions(width: u32, height: u32) -> Result<(), RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimensions { width, height });
    }
    Ok(())
}
