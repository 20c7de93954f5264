//! Common test imports and utilities for BC1 tests
//!
//! This module provides a common prelude for test modules to avoid
//! duplicate imports across the codebase.

// External crates commonly used in tests
pub use rstest::rstest;

// Common types from sld_codec_common
pub use sld_codec_common::color_565::Color565;
pub use sld_codec_common::color_8888::Color8888;
pub use sld_codec_common::decoded_4x4_block::{Decoded4x4Block, ALL_PIXELS_VALID};
pub use sld_codec_common::format::BcQuality;

/// Decodes a block produced by the encoder under test.
pub(crate) fn decode(block: &[u8; 8]) -> Decoded4x4Block {
    unsafe { crate::util::decode_bc1_block(block.as_ptr()) }
}
