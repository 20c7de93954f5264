//! Aligns a sequence of frames to a shared anchor.
//!
//! Every frame is cropped to the box around its content, padded so the distance from the
//! anchor to each edge is a multiple of 4. With all anchors on the same shared point, the
//! offset between any two frames is then a whole number of blocks, which is what the delta
//! engine needs to reuse blocks across frames.

use crate::error::{CodecError, CodecResult};
use crate::layer::LayerRect;
use log::debug;
use sld_codec_common::{color_8888::Color8888, format::BcFormat, raster::Raster};

/// A source frame and its anchor in the frame's own pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSource {
    /// Uncropped frame.
    pub raster: Raster,
    /// Anchor point; may lie outside the raster.
    pub anchor: (i32, i32),
}

/// A cropped frame placed in the shared coordinate space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedFrame {
    /// Cropped frame. Area outside the source raster is transparent.
    pub raster: Raster,
    /// Where [`Self::raster`] lies in the shared space. Always the raster's size.
    pub rect: LayerRect,
    /// Anchor in the cropped raster's coordinates.
    pub anchor: (i32, i32),
}

/// Output of [`preprocess_frames`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessedSequence {
    /// Frames, in input order.
    pub frames: Vec<PositionedFrame>,
    /// The anchor's position in the shared space.
    pub shared_anchor: (i32, i32),
    /// Size of the shared space; the smallest box at `(0, 0)` containing every frame.
    pub shared_size: (u32, u32),
}

/// Distances from the anchor to the left, top, right and bottom edges of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extent {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl Extent {
    fn around((ax, ay): (i32, i32), bounds: &LayerRect) -> Self {
        Self {
            left: ax - bounds.x1,
            top: ay - bounds.y1,
            right: bounds.x2 - ax,
            bottom: bounds.y2 - ay,
        }
    }

    /// Rounds each distance up to a multiple of 4.
    fn padded(self) -> Self {
        Self {
            left: round_up_to_block(self.left),
            top: round_up_to_block(self.top),
            right: round_up_to_block(self.right),
            bottom: round_up_to_block(self.bottom),
        }
    }

    fn max(self, other: Self) -> Self {
        Self {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    fn bounds(&self, (ax, ay): (i32, i32)) -> LayerRect {
        LayerRect::new(ax - self.left, ay - self.top, ax + self.right, ay + self.bottom)
    }
}

/// Crops `sources` around their content and places them in one shared space, where all
/// anchors coincide.
///
/// Content is determined per `format`: pixels with alpha of at least 128 for BC1, and
/// pixels that are not pure black for BC4. A frame without content keeps a single block
/// at its origin.
///
/// # Errors
///
/// [`CodecError::EmptyInput`] if `sources` is empty.
pub fn preprocess_frames(sources: &[FrameSource], format: BcFormat) -> CodecResult<PreprocessedSequence> {
    let mut extents = Vec::with_capacity(sources.len());
    for source in sources {
        let bounds = content_bounds(&source.raster, format);
        extents.push(Extent::around(source.anchor, &bounds).padded());
    }

    let shared = extents
        .iter()
        .copied()
        .reduce(Extent::max)
        .ok_or(CodecError::EmptyInput)?;
    let shared_anchor = (shared.left, shared.top);

    let mut frames = Vec::with_capacity(sources.len());
    for (source, extent) in sources.iter().zip(&extents) {
        let crop = extent.bounds(source.anchor);
        let raster = crop_raster(&source.raster, &crop)?;
        let anchor = (extent.left, extent.top);
        let rect = LayerRect::from_origin_size(
            (shared_anchor.0 - anchor.0, shared_anchor.1 - anchor.1),
            raster.dimensions(),
        );
        frames.push(PositionedFrame { raster, rect, anchor });
    }

    let shared_size = (
        (shared.left + shared.right) as u32,
        (shared.top + shared.bottom) as u32,
    );
    debug!(
        "Preprocessed {} {:?} frames: shared anchor {:?}, shared size {:?}",
        frames.len(),
        format,
        shared_anchor,
        shared_size
    );

    Ok(PreprocessedSequence {
        frames,
        shared_anchor,
        shared_size,
    })
}

/// Tight box around the pixels that count as content for `format`.
fn content_bounds(raster: &Raster, format: BcFormat) -> LayerRect {
    let mut bounds: Option<LayerRect> = None;
    for y in 0..raster.height() {
        for x in 0..raster.width() {
            let Some(pixel) = raster.get_pixel(x, y) else {
                continue;
            };
            if !is_content(pixel, format) {
                continue;
            }

            let pixel_rect = LayerRect::new(x as i32, y as i32, x as i32 + 1, y as i32 + 1);
            bounds = Some(match bounds {
                Some(bounds) => bounds.union(&pixel_rect),
                None => pixel_rect,
            });
        }
    }

    bounds.unwrap_or(LayerRect::new(0, 0, 4, 4))
}

#[inline]
fn is_content(pixel: Color8888, format: BcFormat) -> bool {
    match format {
        BcFormat::Bc1 => pixel.a >= 128,
        BcFormat::Bc4 => pixel.r != 0 || pixel.g != 0 || pixel.b != 0,
    }
}

/// Copies `rect` out of `raster`; pixels outside the raster are transparent.
fn crop_raster(raster: &Raster, rect: &LayerRect) -> CodecResult<Raster> {
    let mut cropped = Raster::new(rect.width(), rect.height())?;
    for y in 0..rect.height() {
        for x in 0..rect.width() {
            let pixel = raster.pixel_or_transparent(
                rect.x1 as i64 + x as i64,
                rect.y1 as i64 + y as i64,
            );
            cropped.set_pixel(x, y, pixel);
        }
    }
    Ok(cropped)
}

#[inline]
fn round_up_to_block(distance: i32) -> i32 {
    (distance + 3).div_euclid(4) * 4
}
