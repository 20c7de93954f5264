#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![warn(missing_docs)]

pub mod block;
pub mod delta;
pub mod draw_command;
pub mod error;
pub mod frame;
pub mod layer;
pub mod png;
pub mod preprocess;
pub mod render;

// Re-export main functionality at crate root
pub use block::{decode_block, decode_surface, encode_block, encode_surface, BlockGrid};
pub use delta::{
    decode_layer, encode_layer, CommandStream, DecodeSettings, DecodedLayer, EncodeSettings,
    EncodeSettingsBuilder, EncodedLayer, PreviousFrameContext, SkipFill,
};
pub use draw_command::DrawCommand;
pub use error::{CodecError, CodecResult};
pub use frame::{DecodedFrame, EncodedFrameLayer, Frame, FrameDecoder, SequenceEncoder};
pub use layer::{Layer, LayerKind, LayerRect, StorageScheme};
pub use preprocess::{preprocess_frames, FrameSource, PositionedFrame, PreprocessedSequence};
pub use render::{align_layer, render, RenderOptions};

/// Common test prelude for avoiding duplicate imports in test modules
#[cfg(test)]
pub(crate) mod test_prelude;
