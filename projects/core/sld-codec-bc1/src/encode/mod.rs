//! BC1 block encoding.
//!
//! The encoder works on a [`Decoded4x4Block`] plus a `valid_mask` selecting which of its 16
//! pixels belong to the image. Pixels outside the mask are padding and are ignored.
//!
//! Depending on the valid pixels, a block is stored in one of four shapes:
//!
//! - No opaque pixels: the canonical transparent block [`BC1_TRANSPARENT_BLOCK`].
//! - Some transparent pixels: 3-colour mode (`c0 <= c1`), with index 3 (transparent black)
//!   on every transparent and padding pixel.
//! - A single colour after RGB565 quantization: `c0 == c1` with every index 0.
//! - Anything else: 4-colour mode (`c0 > c1`).
//!
//! [`BcQuality`] only changes how the two endpoints are chosen; see
//! [`encode_bc1_block`] for the per-level heuristics.
//!
//! Whatever the heuristic picks, the returned block re-encodes to itself: encoding a
//! decoded block again at the same quality gives back the same bytes.

mod endpoints;

use crate::util::{bc1_palette, decode_bc1_block};
use endpoints::{
    bounding_box_endpoints, diagonal_endpoints, nearest_index, principal_axis_endpoints,
    refine_endpoints,
};
use likely_stable::unlikely;
use sld_codec_common::{
    color_565::Color565,
    color_8888::Color8888,
    decoded_4x4_block::Decoded4x4Block,
    format::{BcQuality, BC1_TRANSPARENT_BLOCK},
};

/// Pixels with an alpha below this value are stored as transparent.
pub const ALPHA_THRESHOLD: u8 = 128;

/// Re-encodes of the encoder's own output tried before settling for an endpoints-only block.
const MAX_SETTLE_PASSES: usize = 4;

/// Encodes a 4x4 tile into an 8 byte BC1 block.
///
/// # Parameters
///
/// - `block`: The pixels of the tile, in row-major order.
/// - `valid_mask`: Bit `i` is set if `block.pixels[i]` lies inside the image.
/// - `quality`: How much effort is spent choosing endpoints.
///     - [`BcQuality::Fast`]: the bounding box corners of the opaque pixels, along the
///       diagonal their channel covariances point in.
///     - [`BcQuality::Normal`]: the opaque pixels at both extremes of their principal axis.
///     - [`BcQuality::Slow`]: [`BcQuality::Normal`], then a greedy search that nudges each
///       endpoint channel by one step while the squared error keeps dropping.
///
/// # Example
///
/// ```
/// use sld_codec_bc1::{decode_bc1_block_from_slice, encode_bc1_block};
/// use sld_codec_common::color_8888::Color8888;
/// use sld_codec_common::decoded_4x4_block::{Decoded4x4Block, ALL_PIXELS_VALID};
/// use sld_codec_common::format::BcQuality;
///
/// let tile = Decoded4x4Block::new(Color8888::new(255, 0, 0, 255));
/// let encoded = encode_bc1_block(&tile, ALL_PIXELS_VALID, BcQuality::Normal);
/// let decoded = decode_bc1_block_from_slice(&encoded).unwrap();
/// assert_eq!(decoded, tile);
///
/// let again = encode_bc1_block(&decoded, ALL_PIXELS_VALID, BcQuality::Normal);
/// assert_eq!(again, encoded);
/// ```
pub fn encode_bc1_block(block: &Decoded4x4Block, valid_mask: u16, quality: BcQuality) -> [u8; 8] {
    let first = encode_tile(block, valid_mask, quality);

    // Settle on a block that survives a decode and re-encode unchanged.
    let mut current = first;
    for _ in 0..MAX_SETTLE_PASSES {
        // SAFETY: `current` is an 8 byte array.
        let decoded = unsafe { decode_bc1_block(current.as_ptr()) };
        let next = encode_tile(&decoded, valid_mask, quality);
        if next == current {
            return current;
        }
        current = next;
    }

    endpoints_only_block(block, valid_mask, &first)
}

fn encode_tile(block: &Decoded4x4Block, valid_mask: u16, quality: BcQuality) -> [u8; 8] {
    let mut opaque = [Color8888::TRANSPARENT; 16];
    let mut opaque_count = 0;
    let mut opaque_mask = 0u16;
    for (i, pixel) in block.masked_pixels(valid_mask) {
        if pixel.a >= ALPHA_THRESHOLD {
            opaque[opaque_count] = pixel;
            opaque_count += 1;
            opaque_mask |= 1 << i;
        }
    }

    if unlikely(opaque_count == 0) {
        return BC1_TRANSPARENT_BLOCK;
    }

    let pixels = &opaque[..opaque_count];
    if opaque_mask != valid_mask {
        encode_punch_through(block, opaque_mask, pixels, quality)
    } else {
        encode_opaque(block, valid_mask, pixels, quality)
    }
}

fn encode_opaque(
    block: &Decoded4x4Block,
    valid_mask: u16,
    pixels: &[Color8888],
    quality: BcQuality,
) -> [u8; 8] {
    // Quantization is monotonic, so equal bounding box endpoints mean every pixel
    // quantizes to the same colour.
    let bbox = bounding_box_endpoints(pixels);
    if bbox.0 == bbox.1 {
        return pack_block(bbox.0, bbox.0, 0);
    }

    let endpoints = select_endpoints(pixels, bbox, quality);
    let (c0, c1) = match quality {
        BcQuality::Slow => refine_endpoints(pixels, endpoints, four_color_order, 4, false),
        _ => four_color_order(endpoints.0, endpoints.1),
    };

    let palette = bc1_palette(c0, c1);
    let mut indices = 0u32;
    for (i, pixel) in block.masked_pixels(valid_mask) {
        indices |= nearest_index(&palette, &pixel).0 << (i * 2);
    }

    pack_block(c0, c1, indices)
}

fn encode_punch_through(
    block: &Decoded4x4Block,
    opaque_mask: u16,
    pixels: &[Color8888],
    quality: BcQuality,
) -> [u8; 8] {
    let bbox = bounding_box_endpoints(pixels);
    let (c0, c1) = if bbox.0 == bbox.1 {
        (bbox.0, bbox.0)
    } else {
        let endpoints = select_endpoints(pixels, bbox, quality);
        match quality {
            BcQuality::Slow => refine_endpoints(pixels, endpoints, three_color_order, 3, true),
            _ => three_color_order(endpoints.0, endpoints.1),
        }
    };

    // Index 3 everywhere, then overwrite the opaque pixels.
    let palette = bc1_palette(c0, c1);
    let mut indices = u32::MAX;
    for (i, pixel) in block.masked_pixels(opaque_mask) {
        let (index, _) = nearest_index(&palette[..3], &pixel);
        indices &= !(0b11 << (i * 2));
        indices |= index << (i * 2);
    }

    pack_block(c0, c1, indices)
}

/// Restricts the opaque pixels of `block` to the two endpoints of `encoded`, collapsing to a
/// single colour when only one of them is nearest to any pixel.
///
/// The result decodes to at most two colours, both exact 565 colours, and every quality
/// re-encodes such a tile to these same bytes.
fn endpoints_only_block(block: &Decoded4x4Block, valid_mask: u16, encoded: &[u8; 8]) -> [u8; 8] {
    let mut opaque_mask = 0u16;
    for (i, pixel) in block.masked_pixels(valid_mask) {
        if pixel.a >= ALPHA_THRESHOLD {
            opaque_mask |= 1 << i;
        }
    }
    if opaque_mask == 0 {
        return BC1_TRANSPARENT_BLOCK;
    }

    let punch_through = opaque_mask != valid_mask;
    let c0 = Color565::from_raw(u16::from_le_bytes([encoded[0], encoded[1]]));
    let c1 = Color565::from_raw(u16::from_le_bytes([encoded[2], encoded[3]]));
    let (c0, c1) = if punch_through {
        three_color_order(c0, c1)
    } else {
        four_color_order(c0, c1)
    };

    let palette = bc1_palette(c0, c1);
    let mut indices = 0u32;
    let mut used = [false; 2];
    for (i, pixel) in block.masked_pixels(opaque_mask) {
        let (index, _) = nearest_index(&palette[..2], &pixel);
        used[index as usize] = true;
        indices |= index << (i * 2);
    }

    let (c0, c1) = match used {
        [true, true] => (c0, c1),
        [false, true] => {
            indices = 0;
            (c1, c1)
        }
        _ => {
            indices = 0;
            (c0, c0)
        }
    };

    if punch_through {
        for i in 0..16 {
            if opaque_mask & (1 << i) == 0 {
                indices |= 0b11 << (i * 2);
            }
        }
    }

    pack_block(c0, c1, indices)
}

/// Picks the initial endpoint pair for `quality`, never returning two equal endpoints when
/// the bounding box has a spread.
fn select_endpoints(
    pixels: &[Color8888],
    bbox: (Color565, Color565),
    quality: BcQuality,
) -> (Color565, Color565) {
    match quality {
        BcQuality::Fast => diagonal_endpoints(pixels),
        BcQuality::Normal | BcQuality::Slow => match principal_axis_endpoints(pixels) {
            Some((a, b)) if a != b => (a, b),
            _ => bbox,
        },
    }
}

/// Orders a pair so that `c0 > c1`, selecting 4-colour mode.
fn four_color_order(a: Color565, b: Color565) -> (Color565, Color565) {
    if a.greater_than(&b) {
        (a, b)
    } else {
        (b, a)
    }
}

/// Orders a pair so that `c0 <= c1`, selecting 3-colour mode.
fn three_color_order(a: Color565, b: Color565) -> (Color565, Color565) {
    if a.greater_than(&b) {
        (b, a)
    } else {
        (a, b)
    }
}

#[inline]
fn pack_block(c0: Color565, c1: Color565, indices: u32) -> [u8; 8] {
    let c0 = c0.raw_value().to_le_bytes();
    let c1 = c1.raw_value().to_le_bytes();
    let idx = indices.to_le_bytes();
    [c0[0], c0[1], c1[0], c1[1], idx[0], idx[1], idx[2], idx[3]]
}
