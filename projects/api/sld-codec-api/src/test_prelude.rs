//! Common test imports and utilities for API tests
//!
//! This module provides a common prelude for test modules to avoid
//! duplicate imports across the codebase.

// External crates commonly used in tests
pub use rstest::rstest;

// Common types from sld_codec_common
pub use sld_codec_common::color_565::Color565;
pub use sld_codec_common::color_8888::Color8888;
pub use sld_codec_common::format::{BcFormat, BcQuality};
pub use sld_codec_common::raster::Raster;

pub use crate::block::BlockGrid;
pub use crate::draw_command::DrawCommand;
pub use crate::error::{CodecError, DimensionMismatchKind, MalformedBlockKind, MissingContextKind};

/// Opaque colour used to mark content in test rasters.
pub(crate) const OPAQUE_RED: Color8888 = Color8888::new(255, 0, 0, 255);

/// Builds a raster where every pixel is produced by `pixel(x, y)`.
pub(crate) fn raster_from_fn(
    width: u32,
    height: u32,
    pixel: impl Fn(u32, u32) -> Color8888,
) -> Raster {
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push(pixel(x, y));
        }
    }
    Raster::from_pixels(width, height, pixels).unwrap()
}

/// A raster whose 4x4 tiles each hold a distinct solid colour, so every tile encodes to a
/// different block.
pub(crate) fn checker_raster(width: u32, height: u32, seed: u8) -> Raster {
    raster_from_fn(width, height, |x, y| {
        let tile = (y / 4) * 16 + x / 4;
        Color8888::new(
            (tile as u8).wrapping_mul(37).wrapping_add(seed),
            (tile as u8).wrapping_mul(11),
            200u8.wrapping_sub(seed),
            255,
        )
    })
}

/// Initializes logging for tests; safe to call repeatedly.
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
