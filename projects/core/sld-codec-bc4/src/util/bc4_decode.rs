//! BC4 decoding implementation, following the interpolation used by the alpha half of BC3
//! <https://learn.microsoft.com/en-us/windows/win32/direct3d10/d3d10-graphics-programming-guide-resources-block-compression#bc4>

use sld_codec_common::{color_8888::Color8888, decoded_4x4_block::Decoded4x4Block};

/// Builds the 8 entry value table selected by a pair of BC4 endpoints.
///
/// If `a0 > a1` there are 8 interpolated values, otherwise 6 interpolated values plus
/// 0 and 255. Interpolation truncates.
#[inline]
#[allow(clippy::identity_op)]
pub fn bc4_palette(a0: u8, a1: u8) -> [u8; 8] {
    let mut values = [0u8; 8];
    values[0] = a0; // bit code 000
    values[1] = a1; // bit code 001

    let a0 = a0 as u16;
    let a1 = a1 as u16;
    if a0 > a1 {
        // 8 interpolated values
        values[2] = ((6 * a0 + 1 * a1) / 7) as u8; // bit code 010
        values[3] = ((5 * a0 + 2 * a1) / 7) as u8; // bit code 011
        values[4] = ((4 * a0 + 3 * a1) / 7) as u8; // bit code 100
        values[5] = ((3 * a0 + 4 * a1) / 7) as u8; // bit code 101
        values[6] = ((2 * a0 + 5 * a1) / 7) as u8; // bit code 110
        values[7] = ((1 * a0 + 6 * a1) / 7) as u8; // bit code 111
    } else {
        // 6 interpolated values + 0 and 255
        values[2] = ((4 * a0 + 1 * a1) / 5) as u8; // bit code 010
        values[3] = ((3 * a0 + 2 * a1) / 5) as u8; // bit code 011
        values[4] = ((2 * a0 + 3 * a1) / 5) as u8; // bit code 100
        values[5] = ((1 * a0 + 4 * a1) / 5) as u8; // bit code 101
        values[6] = 0; // bit code 110
        values[7] = 255; // bit code 111
    }

    values
}

/// Decodes a BC4 block into opaque grey pixels.
///
/// # Parameters
///
/// - `src`: Pointer to the source BC4 block (must point to at least 8 bytes of valid memory)
///
/// # Safety
///
/// The caller must ensure that `src` points to at least 8 bytes of valid memory.
///
/// # Example
///
/// ```
/// use sld_codec_bc4::util::decode_bc4_block;
/// use sld_codec_common::color_8888::Color8888;
///
/// let bc4_block = [200u8, 200, 0, 0, 0, 0, 0, 0];
/// let decoded = unsafe { decode_bc4_block(bc4_block.as_ptr()) };
/// assert!(decoded.pixels.iter().all(|p| *p == Color8888::splat(200)));
/// ```
#[inline(always)]
pub unsafe fn decode_bc4_block(src: *const u8) -> Decoded4x4Block {
    let values = bc4_palette(*src, *src.add(1));

    // 48 bits of 3-bit indices, little endian.
    let indices = u64::from_le_bytes([
        *src.add(2),
        *src.add(3),
        *src.add(4),
        *src.add(5),
        *src.add(6),
        *src.add(7),
        0,
        0,
    ]);

    let mut result = Decoded4x4Block::new(Color8888::TRANSPARENT);
    for (i, pixel) in result.pixels.iter_mut().enumerate() {
        let index = (indices >> (i * 3)) & 0b111;
        *pixel = Color8888::splat(*values.get_unchecked(index as usize));
    }

    result
}

/// Safely wraps the unsafe [`decode_bc4_block`] function for use with slices
///
/// # Returns
///
/// A decoded block, else [`None`] if the slice is not exactly 8 bytes long.
#[inline(always)]
pub fn decode_bc4_block_from_slice(src: &[u8]) -> Option<Decoded4x4Block> {
    if src.len() != 8 {
        return None;
    }
    unsafe { Some(decode_bc4_block(src.as_ptr())) }
}
