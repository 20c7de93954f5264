//! Error types for block, delta, preprocessing and rendering operations.

use sld_codec_common::raster::RasterError;
use thiserror::Error;

/// Result type used throughout this crate.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding, decoding or compositing sprite layers.
///
/// All of these are input validation errors detected at the call boundary. None are
/// transient; retrying with the same input fails the same way. When a call fails it
/// produces no output, so a caller threading a previous frame's block grid through a
/// sequence can keep using the grid it already had.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Block data does not have a valid length or does not match the draw commands.
    #[error("Malformed block data: {0}")]
    MalformedBlock(#[from] MalformedBlockKind),

    /// A skip was requested against a previous frame whose offset is not block aligned.
    #[error("Delta offset ({dx}, {dy}) is not a multiple of the 4 pixel block size.")]
    Alignment {
        /// Horizontal offset between the previous and current layer origin, in pixels
        dx: i32,
        /// Vertical offset between the previous and current layer origin, in pixels
        dy: i32,
    },

    /// A skip needs a block from the previous frame that is not available.
    #[error("Missing previous frame context: {0}")]
    MissingContext(#[from] MissingContextKind),

    /// Dimensions are not positive, or do not agree with each other.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(#[from] DimensionMismatchKind),

    /// An operation that needs at least one input was given none.
    #[error("No input provided.")]
    EmptyInput,

    /// A raster could not be constructed.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// A PNG could not be decoded or encoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Details of a [`CodecError::MalformedBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedBlockKind {
    /// The data length is not a multiple of the 8 byte block size.
    #[error("{0} bytes is not a multiple of the 8 byte block size.")]
    InvalidLength(usize),

    /// The draw commands reference more blocks than the stream holds.
    #[error("draw commands need {needed} bytes of block data, but only {actual} bytes were provided.")]
    Truncated {
        /// Bytes required by the draw commands
        needed: usize,
        /// Bytes available
        actual: usize,
    },

    /// Block data is left over after every draw command was applied.
    #[error("draw commands use {used} bytes of block data, but {actual} bytes were provided.")]
    TrailingData {
        /// Bytes consumed by the draw commands
        used: usize,
        /// Bytes available
        actual: usize,
    },

    /// A full (command-less) block grid has the wrong size for its dimensions.
    #[error("expected {expected} bytes of block data for the layer dimensions, got {actual} bytes.")]
    SizeMismatch {
        /// Bytes required by the dimensions
        expected: usize,
        /// Bytes available
        actual: usize,
    },
}

/// Details of a [`CodecError::MissingContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingContextKind {
    /// A skip or delta layer was decoded without a previous frame.
    #[error("a skip was requested but no previous frame was supplied.")]
    NoPreviousFrame,

    /// A skip maps to a block outside of the previous frame's grid.
    #[error("skipped block maps to ({block_x}, {block_y}), outside of the previous {blocks_wide}x{blocks_high} block grid.")]
    OutOfBounds {
        /// Column in the previous grid
        block_x: i64,
        /// Row in the previous grid
        block_y: i64,
        /// Width of the previous grid in blocks
        blocks_wide: u32,
        /// Height of the previous grid in blocks
        blocks_high: u32,
    },

    /// The previous frame's blocks are stored in a different format.
    #[error("previous frame is stored as {previous:?}, but the current layer is {current:?}.")]
    FormatMismatch {
        /// Format of the previous grid
        previous: sld_codec_common::format::BcFormat,
        /// Format of the current layer
        current: sld_codec_common::format::BcFormat,
    },
}

/// Details of a [`CodecError::DimensionMismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DimensionMismatchKind {
    /// Width or height is zero.
    #[error("{width}x{height} is not a valid layer size. Both dimensions must be positive.")]
    ZeroSize {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },

    /// The draw commands do not cover the layer's block grid exactly.
    #[error("draw commands cover {actual} blocks, but the layer has {expected} blocks.")]
    CommandTotal {
        /// Blocks in the layer
        expected: usize,
        /// Blocks covered by the commands
        actual: usize,
    },

    /// Two rasters that must be the same size are not.
    #[error("expected a {expected_width}x{expected_height} layer, got {actual_width}x{actual_height}.")]
    LayerSize {
        /// Required width
        expected_width: u32,
        /// Required height
        expected_height: u32,
        /// Actual width
        actual_width: u32,
        /// Actual height
        actual_height: u32,
    },

    /// A layer has no rectangle of its own and there is no main layer to inherit one from.
    #[error("layer has no bounding rectangle and the frame has no main layer to inherit one from.")]
    MissingRect,
}
