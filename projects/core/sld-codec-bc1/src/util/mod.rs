//! Block level helpers shared by the encoder and by callers decoding BC1 data.

mod bc1_decode;
pub use bc1_decode::*;
