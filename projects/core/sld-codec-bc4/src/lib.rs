#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

pub mod encode;
pub mod util;

pub use encode::encode_bc4_block;
pub use util::{decode_bc4_block, decode_bc4_block_from_slice};
