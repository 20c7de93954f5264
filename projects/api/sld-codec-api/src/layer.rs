//! Stored layers of a frame and their headers.

use crate::draw_command::DrawCommand;
use bitfield::bitfield;
use derive_enum_all_values::AllValues;
use sld_codec_common::format::BcFormat;

bitfield! {
    /// The storage scheme byte of a layer header.
    ///
    /// Bit layout:
    /// - Bit 0: Blocks are BC4 rather than BC1
    /// - Bits 1-6: Reserved
    /// - Bit 7: Skips refer to the previous frame's layer (delta layer)
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StorageScheme(u8);
    impl Debug;
    u8;

    /// Whether the layer's blocks are BC4
    pub is_bc4, set_is_bc4: 0;
    /// Reserved bits
    pub reserved, set_reserved: 6, 1;
    /// Whether skips refer to the previous frame
    pub is_delta, set_is_delta: 7;
}

impl StorageScheme {
    /// Creates a storage scheme for `format`, optionally marked as a delta layer.
    pub fn new(format: BcFormat, delta: bool) -> Self {
        let mut scheme = Self::default();
        scheme.set_is_bc4(format == BcFormat::Bc4);
        scheme.set_is_delta(delta);
        scheme
    }

    /// Wraps a raw storage scheme byte. Reserved bits are kept as is.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// The raw storage scheme byte.
    #[inline]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Block format selected by bit 0.
    #[inline]
    pub fn format(&self) -> BcFormat {
        if self.is_bc4() {
            BcFormat::Bc4
        } else {
            BcFormat::Bc1
        }
    }
}

/// A layer's bounding rectangle, `(x1, y1)` inclusive to `(x2, y2)` exclusive, in the
/// frame's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayerRect {
    /// Left edge
    pub x1: i32,
    /// Top edge
    pub y1: i32,
    /// Right edge, exclusive
    pub x2: i32,
    /// Bottom edge, exclusive
    pub y2: i32,
}

impl LayerRect {
    /// Creates a rectangle from its edges.
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Creates a rectangle from its top left corner and size.
    pub const fn from_origin_size((x, y): (i32, i32), (width, height): (u32, u32)) -> Self {
        Self::new(x, y, x + width as i32, y + height as i32)
    }

    /// Width in pixels; zero if the edges are inverted.
    #[inline]
    pub fn width(&self) -> u32 {
        (self.x2 - self.x1).max(0) as u32
    }

    /// Height in pixels; zero if the edges are inverted.
    #[inline]
    pub fn height(&self) -> u32 {
        (self.y2 - self.y1).max(0) as u32
    }

    /// Width and height in pixels.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Top left corner.
    #[inline]
    pub fn origin(&self) -> (i32, i32) {
        (self.x1, self.y1)
    }

    /// Whether the rectangle covers no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Whether `other` lies entirely within this rectangle.
    pub fn contains(&self, other: &LayerRect) -> bool {
        other.x1 >= self.x1 && other.y1 >= self.y1 && other.x2 <= self.x2 && other.y2 <= self.y2
    }

    /// The overlap of both rectangles, or [`None`] if they do not overlap.
    pub fn intersect(&self, other: &LayerRect) -> Option<LayerRect> {
        let rect = LayerRect::new(
            self.x1.max(other.x1),
            self.y1.max(other.y1),
            self.x2.min(other.x2),
            self.y2.min(other.y2),
        );
        (!rect.is_empty()).then_some(rect)
    }

    /// The smallest rectangle containing both rectangles.
    pub fn union(&self, other: &LayerRect) -> LayerRect {
        LayerRect::new(
            self.x1.min(other.x1),
            self.y1.min(other.y1),
            self.x2.max(other.x2),
            self.y2.max(other.y2),
        )
    }

    /// The rectangle moved by `(dx, dy)`.
    pub fn translate(&self, (dx, dy): (i32, i32)) -> LayerRect {
        LayerRect::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Offset of `self`'s origin from `other`'s origin.
    #[inline]
    pub fn offset_from(&self, other: &LayerRect) -> (i32, i32) {
        (self.x1 - other.x1, self.y1 - other.y1)
    }
}

/// The four layers a frame can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AllValues)]
pub enum LayerKind {
    /// Colour layer.
    Main,
    /// Shadow coverage, drawn behind the main layer.
    Shadow,
    /// Where the player colour tint applies, and how strongly.
    PlayerColorMask,
    /// Where damage is drawn, and how strongly.
    DamageMask,
}

impl LayerKind {
    /// Number of layer kinds.
    pub const COUNT: usize = LayerKind::all_values().len();

    /// Stable index of the kind, for per-layer state tables.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            LayerKind::Main => 0,
            LayerKind::Shadow => 1,
            LayerKind::PlayerColorMask => 2,
            LayerKind::DamageMask => 3,
        }
    }

    /// Whether the layer shares the main layer's rectangle when it has none of its own.
    #[inline]
    pub const fn inherits_main_rect(self) -> bool {
        matches!(self, LayerKind::PlayerColorMask | LayerKind::DamageMask)
    }
}

/// One stored layer of a frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layer {
    /// Bounding rectangle. Mask layers may omit it and use the main layer's.
    pub rect: Option<LayerRect>,
    /// Storage scheme byte of the header.
    pub storage: StorageScheme,
    /// Block stream.
    pub blocks: Vec<u8>,
    /// Draw commands. Empty if `blocks` holds the full grid.
    pub commands: Vec<DrawCommand>,
}

impl Layer {
    /// Block format of the layer.
    #[inline]
    pub fn format(&self) -> BcFormat {
        self.storage.format()
    }

    /// Whether skips refer to the previous frame.
    #[inline]
    pub fn is_delta(&self) -> bool {
        self.storage.is_delta()
    }

    /// The draw commands, or [`None`] if the layer stores its full grid.
    #[inline]
    pub fn commands(&self) -> Option<&[DrawCommand]> {
        (!self.commands.is_empty()).then_some(self.commands.as_slice())
    }
}
