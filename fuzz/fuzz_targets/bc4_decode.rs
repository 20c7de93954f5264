#![no_main]

// Compares the BC4 decoder against rgbcx-sys. Only the value channel is compared; rgbcx
// writes one byte per pixel.

use libfuzzer_sys::{arbitrary, fuzz_target};
use rgbcx_sys::root::rgbcx;
use sld_codec_bc4::decode_bc4_block;

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct Bc4Block {
    pub bytes: [u8; 8],
}

fuzz_target!(|block: Bc4Block| {
    let ours = unsafe { decode_bc4_block(block.bytes.as_ptr()) };

    let mut reference = [0u8; 16];
    unsafe {
        rgbcx::unpack_bc4(
            block.bytes.as_ptr() as *const core::ffi::c_void,
            reference.as_mut_ptr(),
            1,
        );
    }

    for (index, (pixel, expected)) in ours.pixels.iter().zip(reference).enumerate() {
        assert_eq!(pixel.r, expected, "Pixel {index} doesn't match");
    }
});
