//! BC1 (DXT1) decoding implementation; based on etcpak
//! <https://github.com/wolfpld/etcpak> and MSDN
//! <https://learn.microsoft.com/en-us/windows/win32/direct3d9/opaque-and-1-bit-alpha-textures>
//!
//! Uses the 'ideal' rounding/computing method described in the DX9 docs, as opposed to DX10, AMD or Nvidia
//! method.

use sld_codec_common::{
    color_565::Color565, color_8888::Color8888, decoded_4x4_block::Decoded4x4Block,
};

/// Builds the 4 entry colour dictionary selected by a pair of BC1 endpoints.
///
/// When `c0 > c1` the block is in 4-colour mode, with two interpolated colours at 1/3 and
/// 2/3 of the way between the endpoints. Otherwise the block is in 3-colour mode: entry 2
/// is the midpoint and entry 3 is transparent black.
///
/// The encoder picks indices against this same dictionary, so whatever it chooses decodes
/// to exactly the colour it measured.
#[inline]
pub fn bc1_palette(c0: Color565, c1: Color565) -> [Color8888; 4] {
    let r0 = c0.red() as u32;
    let g0 = c0.green() as u32;
    let b0 = c0.blue() as u32;

    let r1 = c1.red() as u32;
    let g1 = c1.green() as u32;
    let b1 = c1.blue() as u32;

    let mut dict = [Color8888::TRANSPARENT; 4];
    dict[0] = c0.to_color_8888();
    dict[1] = c1.to_color_8888();

    if c0.greater_than(&c1) {
        // Four-color block
        let r = (2 * r0 + r1) / 3;
        let g = (2 * g0 + g1) / 3;
        let b = (2 * b0 + b1) / 3;
        dict[2] = Color8888::new(r as u8, g as u8, b as u8, 255);

        let r = (r0 + 2 * r1) / 3;
        let g = (g0 + 2 * g1) / 3;
        let b = (b0 + 2 * b1) / 3;
        dict[3] = Color8888::new(r as u8, g as u8, b as u8, 255);
    } else {
        // Three-color block
        let r = (r0 + r1) / 2;
        let g = (g0 + g1) / 2;
        let b = (b0 + b1) / 2;
        dict[2] = Color8888::new(r as u8, g as u8, b as u8, 255);
        // dict[3] stays transparent black
    }

    dict
}

/// Decodes a BC1 block into a structured representation of pixels
///
/// # Parameters
///
/// - `src`: Pointer to the source BC1 block (must point to at least 8 bytes of valid memory)
///
/// # Returns
///
/// A [`Decoded4x4Block`] containing all 16 decoded pixels
///
/// # Safety
///
/// The caller must ensure that `src` points to at least 8 bytes of valid memory.
///
/// # Example
///
/// ```
/// use sld_codec_bc1::util::decode_bc1_block;
///
/// let bc1_block = [0u8; 8]; // Compressed BC1 block
///
/// unsafe {
///     let decoded = decode_bc1_block(bc1_block.as_ptr());
///     let pixel_at_0_0 = decoded.get_pixel(0, 0);
///     assert_eq!(pixel_at_0_0.a, 255);
/// }
/// ```
#[inline(always)]
pub unsafe fn decode_bc1_block(src: *const u8) -> Decoded4x4Block {
    // Extract color endpoints and index data
    let c0 = Color565::from_raw(u16::from_le_bytes([*src, *src.add(1)]));
    let c1 = Color565::from_raw(u16::from_le_bytes([*src.add(2), *src.add(3)]));
    let idx: u32 = u32::from_le_bytes([*src.add(4), *src.add(5), *src.add(6), *src.add(7)]);

    let dict = bc1_palette(c0, c1);
    let mut result = Decoded4x4Block::new(Color8888::TRANSPARENT);

    // Compiler unrolls this!
    let mut index_pos = 0;
    for y in 0..4 {
        for x in 0..4 {
            let pixel_idx = (idx >> index_pos) & 0x3;
            result.set_pixel_unchecked(x, y, *dict.get_unchecked(pixel_idx as usize));
            index_pos += 2;
        }
    }

    result
}

/// Safely wraps the unsafe [`decode_bc1_block`] function for use with slices
///
/// # Returns
///
/// A decoded block, else [`None`] if the slice is not exactly 8 bytes long.
#[inline(always)]
pub fn decode_bc1_block_from_slice(src: &[u8]) -> Option<Decoded4x4Block> {
    if src.len() != 8 {
        return None;
    }
    unsafe { Some(decode_bc1_block(src.as_ptr())) }
}
