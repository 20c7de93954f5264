//! BC4 block encoding.
//!
//! Only the red channel of the valid pixels is read. A flat tile is stored with both endpoints
//! equal; anything else uses 8-value mode with the tile's maximum and minimum as endpoints.
//! At [`BcQuality::Slow`] tiles containing pure 0 or 255 also try 6-value mode, where those
//! two values are exact, and keep whichever mode has the lower squared error.

use crate::util::bc4_palette;
use likely_stable::unlikely;
use sld_codec_common::{
    decoded_4x4_block::Decoded4x4Block,
    format::{BcQuality, BC4_TRANSPARENT_BLOCK},
};

/// Encodes the red channel of a 4x4 tile into an 8 byte BC4 block.
///
/// Bit `i` of `valid_mask` is set if `block.pixels[i]` lies inside the image. Pixels outside
/// the mask are ignored and get index 0.
///
/// # Example
///
/// ```
/// use sld_codec_bc4::{decode_bc4_block_from_slice, encode_bc4_block};
/// use sld_codec_common::color_8888::Color8888;
/// use sld_codec_common::decoded_4x4_block::{Decoded4x4Block, ALL_PIXELS_VALID};
/// use sld_codec_common::format::BcQuality;
///
/// let tile = Decoded4x4Block::new(Color8888::splat(93));
/// let encoded = encode_bc4_block(&tile, ALL_PIXELS_VALID, BcQuality::Normal);
/// assert_eq!(encoded, [93, 93, 0, 0, 0, 0, 0, 0]);
/// assert_eq!(decode_bc4_block_from_slice(&encoded).unwrap(), tile);
/// ```
pub fn encode_bc4_block(block: &Decoded4x4Block, valid_mask: u16, quality: BcQuality) -> [u8; 8] {
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut any = false;
    for (_, pixel) in block.masked_pixels(valid_mask) {
        min = min.min(pixel.r);
        max = max.max(pixel.r);
        any = true;
    }

    if unlikely(!any) {
        return BC4_TRANSPARENT_BLOCK;
    }

    if min == max {
        return [min, min, 0, 0, 0, 0, 0, 0];
    }

    let eight = encode_with_endpoints(block, valid_mask, max, min);
    if quality != BcQuality::Slow || (min != 0 && max != 255) {
        return eight.0;
    }

    let (a0, a1) = six_value_endpoints(block, valid_mask);
    let six = encode_with_endpoints(block, valid_mask, a0, a1);
    if six.1 < eight.1 {
        six.0
    } else {
        eight.0
    }
}

/// Endpoints for 6-value mode: the range of the values that are neither 0 nor 255, which
/// 6-value mode represents exactly.
fn six_value_endpoints(block: &Decoded4x4Block, valid_mask: u16) -> (u8, u8) {
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    for (_, pixel) in block.masked_pixels(valid_mask) {
        if pixel.r != 0 && pixel.r != 255 {
            min = min.min(pixel.r);
            max = max.max(pixel.r);
        }
    }

    if min > max {
        // Only 0 and 255 present.
        (0, 0)
    } else {
        (min, max)
    }
}

/// Packs a block for the given endpoints, returning it with its squared error.
fn encode_with_endpoints(block: &Decoded4x4Block, valid_mask: u16, a0: u8, a1: u8) -> ([u8; 8], u32) {
    let values = bc4_palette(a0, a1);
    let mut indices = 0u64;
    let mut error = 0u32;

    for (i, pixel) in block.masked_pixels(valid_mask) {
        let (index, dist) = nearest_value(&values, pixel.r);
        indices |= (index as u64) << (i * 3);
        error += dist;
    }

    let idx = indices.to_le_bytes();
    ([a0, a1, idx[0], idx[1], idx[2], idx[3], idx[4], idx[5]], error)
}

/// Index and squared distance of the table entry closest to `value`.
/// Ties resolve to the lowest index.
#[inline]
fn nearest_value(values: &[u8; 8], value: u8) -> (u32, u32) {
    let mut best = 0;
    let mut best_dist = u32::MAX;
    for (i, candidate) in values.iter().enumerate() {
        let diff = *candidate as i32 - value as i32;
        let dist = (diff * diff) as u32;
        if dist < best_dist {
            best = i as u32;
            best_dist = dist;
        }
    }
    (best, best_dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::decode_bc4_block;
    use rstest::rstest;
    use sld_codec_common::{color_8888::Color8888, decoded_4x4_block::ALL_PIXELS_VALID};

    fn decode(block: &[u8; 8]) -> Decoded4x4Block {
        unsafe { decode_bc4_block(block.as_ptr()) }
    }

    fn tile_from(values: [u8; 16]) -> Decoded4x4Block {
        let mut tile = Decoded4x4Block::new(Color8888::TRANSPARENT);
        for (pixel, value) in tile.pixels.iter_mut().zip(values) {
            *pixel = Color8888::splat(value);
        }
        tile
    }

    fn squared_error(tile: &Decoded4x4Block, encoded: &[u8; 8]) -> u32 {
        let decoded = decode(encoded);
        tile.pixels
            .iter()
            .zip(decoded.pixels.iter())
            .map(|(a, b)| {
                let d = a.r as i32 - b.r as i32;
                (d * d) as u32
            })
            .sum()
    }

    #[rstest]
    #[case(BcQuality::Fast)]
    #[case(BcQuality::Normal)]
    #[case(BcQuality::Slow)]
    fn empty_mask_gives_zero_block(#[case] quality: BcQuality) {
        let tile = Decoded4x4Block::new(Color8888::splat(180));
        assert_eq!(encode_bc4_block(&tile, 0, quality), BC4_TRANSPARENT_BLOCK);
    }

    #[test]
    fn uses_eight_value_mode_for_ranges() {
        let tile = tile_from([10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120, 130, 140, 150, 160]);
        let encoded = encode_bc4_block(&tile, ALL_PIXELS_VALID, BcQuality::Normal);
        assert_eq!(encoded[0], 160);
        assert_eq!(encoded[1], 10);
    }

    #[rstest]
    #[case([0, 17, 34, 51, 68, 85, 102, 119, 136, 153, 170, 187, 204, 221, 238, 255])]
    #[case([3, 3, 3, 3, 9, 9, 9, 9, 200, 200, 200, 200, 201, 201, 201, 201])]
    #[case([128, 129, 130, 131, 132, 133, 134, 135, 136, 137, 138, 139, 140, 141, 142, 143])]
    fn round_trip_error_is_within_one_step(#[case] values: [u8; 16]) {
        let tile = tile_from(values);
        let min = *values.iter().min().unwrap() as i32;
        let max = *values.iter().max().unwrap() as i32;
        let bound = (max - min) / 7 + 1;

        for quality in [BcQuality::Fast, BcQuality::Normal, BcQuality::Slow] {
            let decoded = decode(&encode_bc4_block(&tile, ALL_PIXELS_VALID, quality));
            for (source, result) in tile.pixels.iter().zip(decoded.pixels.iter()) {
                assert!(
                    (source.r as i32 - result.r as i32).abs() <= bound,
                    "{quality:?}: {} decoded as {}",
                    source.r,
                    result.r
                );
                assert_eq!(result.a, 255);
            }
        }
    }

    #[test]
    fn slow_prefers_six_value_mode_for_mask_edges() {
        // Hard mask edges plus a soft ramp in the middle: 0 and 255 should stay exact.
        let tile = tile_from([0, 0, 0, 0, 0, 100, 110, 120, 130, 140, 150, 255, 255, 255, 255, 255]);

        let normal = encode_bc4_block(&tile, ALL_PIXELS_VALID, BcQuality::Normal);
        let slow = encode_bc4_block(&tile, ALL_PIXELS_VALID, BcQuality::Slow);

        assert!(slow[0] <= slow[1], "6-value mode expected");
        assert!(squared_error(&tile, &slow) < squared_error(&tile, &normal));

        let decoded = decode(&slow);
        assert_eq!(decoded.pixels[0].r, 0);
        assert_eq!(decoded.pixels[15].r, 255);
    }

    #[test]
    fn padding_is_ignored() {
        let mut values = [250u8; 16];
        values[0] = 40;
        values[1] = 40;
        let tile = tile_from(values);

        // Only the first two pixels are inside the image.
        let encoded = encode_bc4_block(&tile, 0b11, BcQuality::Normal);
        assert_eq!(encoded, [40, 40, 0, 0, 0, 0, 0, 0]);
    }

    #[rstest]
    #[case([0, 17, 34, 51, 68, 85, 102, 119, 136, 153, 170, 187, 204, 221, 238, 255])]
    #[case([3, 3, 3, 3, 9, 9, 9, 9, 200, 200, 200, 200, 201, 201, 201, 201])]
    fn encoding_is_idempotent(#[case] values: [u8; 16]) {
        let tile = tile_from(values);
        for quality in [BcQuality::Fast, BcQuality::Normal] {
            let once = encode_bc4_block(&tile, ALL_PIXELS_VALID, quality);
            let twice = encode_bc4_block(&decode(&once), ALL_PIXELS_VALID, quality);
            assert_eq!(once, twice);
        }
    }
}
