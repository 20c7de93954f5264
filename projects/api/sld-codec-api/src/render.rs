//! Layer compositing.
//!
//! The output always has the main layer's size; other layers are clipped to it.
//!
//! - The shadow layer's red channel is its coverage. The shadow is black, and the main layer
//!   is composited over it.
//! - The player colour mask's red channel is the tint weight. The tint replaces a pixel's
//!   colour with its boosted luminance times the player colour, blended in linear light.
//!
//! The damage mask is not blended here; [`align_layer`] positions it for callers that apply
//! their own formula.

use crate::error::{CodecResult, DimensionMismatchKind};
use sld_codec_common::{color_8888::Color8888, raster::Raster};

/// Luminance is scaled up by this before tinting, so mid greys saturate the player colour.
const LUMINANCE_BOOST: f32 = 5.0;

/// Options for [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// sRGB player colour applied through the player colour mask.
    pub player_color: [u8; 3],
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            player_color: [255, 0, 0],
        }
    }
}

/// Composites `main` over an optional shadow, tinted by an optional player colour mask.
///
/// `shadow` carries the shadow raster and its offset from `main`'s origin. `mask` must be
/// `main`'s size; see [`align_layer`] for masks stored with a different rectangle.
///
/// With no optional layers the result equals `main`. Pixels where the mask is 0 keep their
/// colour, and pixels where the main layer is opaque ignore the shadow.
///
/// # Errors
///
/// [`DimensionMismatchKind::LayerSize`] if `mask` is not `main`'s size.
pub fn render(
    main: &Raster,
    shadow: Option<(&Raster, (i32, i32))>,
    mask: Option<&Raster>,
    options: &RenderOptions,
) -> CodecResult<Raster> {
    if let Some(mask) = mask {
        check_same_size(main, mask)?;
    }

    let mut output = main.clone();
    if shadow.is_none() && mask.is_none() {
        return Ok(output);
    }

    let player_color = options.player_color.map(srgb_to_linear);
    for y in 0..main.height() {
        for x in 0..main.width() {
            let Some(mut pixel) = main.get_pixel(x, y) else {
                continue;
            };

            if let Some(weight) = mask.and_then(|mask| mask.get_pixel(x, y)).map(|p| p.r) {
                if weight != 0 {
                    pixel = tint(pixel, weight, &player_color);
                }
            }

            if let Some((shadow, (dx, dy))) = shadow {
                let coverage = shadow
                    .pixel_or_transparent(x as i64 - dx as i64, y as i64 - dy as i64)
                    .r;
                if coverage != 0 {
                    pixel = over_shadow(pixel, coverage);
                }
            }

            output.set_pixel(x, y, pixel);
        }
    }

    Ok(output)
}

/// Translates `layer` by `offset` into a `main_size` frame, clipping what falls outside and
/// leaving uncovered pixels transparent.
///
/// `offset` is the layer's origin minus the main layer's origin.
pub fn align_layer(layer: &Raster, offset: (i32, i32), main_size: (u32, u32)) -> CodecResult<Raster> {
    if offset == (0, 0) && layer.dimensions() == main_size {
        return Ok(layer.clone());
    }

    let (width, height) = main_size;
    let mut output = Raster::new(width, height)?;
    let (dx, dy) = (offset.0 as i64, offset.1 as i64);
    for y in 0..height {
        for x in 0..width {
            let pixel = layer.pixel_or_transparent(x as i64 - dx, y as i64 - dy);
            if pixel != Color8888::TRANSPARENT {
                output.set_pixel(x, y, pixel);
            }
        }
    }

    Ok(output)
}

fn check_same_size(main: &Raster, layer: &Raster) -> CodecResult<()> {
    if main.dimensions() != layer.dimensions() {
        return Err(DimensionMismatchKind::LayerSize {
            expected_width: main.width(),
            expected_height: main.height(),
            actual_width: layer.width(),
            actual_height: layer.height(),
        }
        .into());
    }
    Ok(())
}

/// Blends `pixel` towards its tinted colour by `weight / 255`. Alpha is kept.
fn tint(pixel: Color8888, weight: u8, player_color: &[f32; 3]) -> Color8888 {
    let linear = [pixel.r, pixel.g, pixel.b].map(srgb_to_linear);
    let luminance =
        (0.2126 * linear[0] + 0.7152 * linear[1] + 0.0722 * linear[2]) * LUMINANCE_BOOST;

    let weight = weight as f32 / 255.0;
    let blend = |c: usize| {
        linear_to_srgb(weight * luminance * player_color[c] + (1.0 - weight) * linear[c])
    };
    Color8888::new(blend(0), blend(1), blend(2), pixel.a)
}

/// `pixel` composited over black with `coverage / 255` alpha, using straight alpha.
fn over_shadow(pixel: Color8888, coverage: u8) -> Color8888 {
    if pixel.a == u8::MAX {
        return pixel;
    }

    let main_alpha = pixel.a as f32 / 255.0;
    let shadow_alpha = coverage as f32 / 255.0;
    let alpha = main_alpha + shadow_alpha * (1.0 - main_alpha);

    // Black contributes no colour, so the main colour is only diluted.
    let scale = main_alpha / alpha;
    let channel = |c: u8| (c as f32 * scale).round() as u8;
    Color8888::new(
        channel(pixel.r),
        channel(pixel.g),
        channel(pixel.b),
        (alpha * 255.0).round() as u8,
    )
}

#[inline]
fn srgb_to_linear(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb(c: f32) -> u8 {
    let c = if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}
