#![no_main]

// Compares the BC1 decoder against rgbcx-sys using the Ideal method.

use core::mem;
use libfuzzer_sys::{arbitrary, fuzz_target};
use rgbcx_sys::root::rgbcx;
use sld_codec_bc1::decode_bc1_block;
use sld_codec_common::color_8888::Color8888;
use sld_codec_common::decoded_4x4_block::Decoded4x4Block;

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct Bc1Block {
    pub bytes: [u8; 8],
}

fuzz_target!(|block: Bc1Block| {
    let ours = unsafe { decode_bc1_block(block.bytes.as_ptr()) };
    let reference = rgbcx_decode_bc1(&block.bytes);
    assert_eq!(ours, reference, "Decoded blocks don't match");
});

fn rgbcx_decode_bc1(block: &[u8; 8]) -> Decoded4x4Block {
    let mut rgba = [0u8; 4 * 16];
    unsafe {
        rgbcx::unpack_bc1(
            block.as_ptr() as *const core::ffi::c_void,
            rgba.as_mut_ptr() as *mut core::ffi::c_void,
            true, // set_alpha
            rgbcx::bc1_approx_mode::cBC1Ideal,
        );

        // RGBA byte order matches Color8888.
        let pixels: [Color8888; 16] = mem::transmute(rgba);
        Decoded4x4Block { pixels }
    }
}
