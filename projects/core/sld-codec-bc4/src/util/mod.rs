//! Block level helpers shared by the encoder and by callers decoding BC4 data.

mod bc4_decode;
pub use bc4_decode::*;
