#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

pub mod encode;
pub mod util;

pub use encode::encode_bc1_block;
pub use util::{decode_bc1_block, decode_bc1_block_from_slice};

/// Common test prelude for avoiding duplicate imports in test modules
#[cfg(test)]
pub(crate) mod test_prelude;
