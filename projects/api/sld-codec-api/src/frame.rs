//! Frame level sequencing.
//!
//! [`FrameDecoder`] and [`SequenceEncoder`] hold the previous frame's block grid for each
//! layer, so callers walking an animation do not have to thread
//! [`PreviousFrameContext`] values by hand. Each layer forms its own chain; a frame that
//! lacks a layer leaves that layer's chain untouched.

use crate::block::BlockGrid;
use crate::delta::{
    decode_layer, encode_layer, DecodeSettings, DecodedLayer, EncodeSettings, PreviousFrameContext,
};
use crate::error::{CodecError, CodecResult, DimensionMismatchKind, MissingContextKind};
use crate::layer::{Layer, LayerKind, LayerRect, StorageScheme};
use crate::render::{align_layer, render, RenderOptions};
use log::trace;
use sld_codec_common::raster::Raster;

/// The stored layers of one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Colour layer.
    pub main: Option<Layer>,
    /// Shadow layer.
    pub shadow: Option<Layer>,
    /// Player colour mask.
    pub player_color_mask: Option<Layer>,
    /// Damage mask.
    pub damage_mask: Option<Layer>,
}

impl Frame {
    /// The layer of the given kind, if present.
    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        match kind {
            LayerKind::Main => self.main.as_ref(),
            LayerKind::Shadow => self.shadow.as_ref(),
            LayerKind::PlayerColorMask => self.player_color_mask.as_ref(),
            LayerKind::DamageMask => self.damage_mask.as_ref(),
        }
    }

    /// Bounding rectangle of a layer, falling back to the main layer's rectangle for masks
    /// stored without one.
    pub fn resolve_rect(&self, kind: LayerKind) -> CodecResult<LayerRect> {
        let own = self.layer(kind).and_then(|layer| layer.rect);
        let inherited = || {
            kind.inherits_main_rect()
                .then(|| self.main.as_ref().and_then(|main| main.rect))
                .flatten()
        };
        own.or_else(inherited)
            .ok_or(DimensionMismatchKind::MissingRect.into())
    }
}

/// A decoded layer placed in frame coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedLayer {
    /// The layer's pixels.
    pub raster: Raster,
    /// Where the layer sits in the frame.
    pub rect: LayerRect,
}

/// The decoded layers of one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedFrame {
    layers: [Option<PositionedLayer>; LayerKind::COUNT],
}

impl DecodedFrame {
    /// The decoded layer of the given kind, if the frame carried it.
    pub fn layer(&self, kind: LayerKind) -> Option<&PositionedLayer> {
        self.layers[kind.index()].as_ref()
    }

    /// A layer translated and clipped into the main layer's frame, for callers applying
    /// their own blend (e.g. for the damage mask).
    ///
    /// Returns [`None`] if either the layer or the main layer is absent.
    pub fn aligned_layer(&self, kind: LayerKind) -> CodecResult<Option<Raster>> {
        let (Some(main), Some(layer)) = (self.layer(LayerKind::Main), self.layer(kind)) else {
            return Ok(None);
        };
        align_layer(&layer.raster, layer.rect.offset_from(&main.rect), main.raster.dimensions()).map(Some)
    }

    /// Composites the frame's main layer over its shadow, tinted by the player colour mask.
    ///
    /// # Errors
    ///
    /// [`CodecError::EmptyInput`] if the frame has no main layer.
    pub fn render(&self, options: &RenderOptions) -> CodecResult<Raster> {
        let main = self.layer(LayerKind::Main).ok_or(CodecError::EmptyInput)?;
        let shadow = self
            .layer(LayerKind::Shadow)
            .map(|shadow| (&shadow.raster, shadow.rect.offset_from(&main.rect)));

        let mask = match self.layer(LayerKind::PlayerColorMask) {
            Some(mask) if mask.rect == main.rect => Some(mask.raster.clone()),
            Some(_) => self.aligned_layer(LayerKind::PlayerColorMask)?,
            None => None,
        };

        render(&main.raster, shadow, mask.as_ref(), options)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LayerState {
    grid: BlockGrid,
    rect: LayerRect,
}

impl LayerState {
    fn context_for(&self, rect: &LayerRect) -> PreviousFrameContext<'_> {
        PreviousFrameContext::new(&self.grid, self.rect.offset_from(rect))
    }
}

/// Decodes a sequence of frames, keeping each layer's previous block grid.
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder {
    settings: DecodeSettings,
    states: [Option<LayerState>; LayerKind::COUNT],
    frames: usize,
}

impl FrameDecoder {
    /// Creates a decoder at the start of a sequence.
    pub fn new(settings: DecodeSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Settings used for every layer.
    pub fn settings(&self) -> &DecodeSettings {
        &self.settings
    }

    /// Number of frames decoded so far.
    pub fn frames_decoded(&self) -> usize {
        self.frames
    }

    /// Block grid the next delta layer of `kind` will be decoded against.
    pub fn previous_grid(&self, kind: LayerKind) -> Option<&BlockGrid> {
        self.states[kind.index()].as_ref().map(|state| &state.grid)
    }

    /// Forgets every previous frame.
    pub fn reset(&mut self) {
        self.states = Default::default();
        self.frames = 0;
    }

    /// Decodes the next frame of the sequence.
    ///
    /// Delta layers are decoded against the same layer of the last frame that carried it.
    /// If any layer fails, no state is updated and the decoder can continue as if this
    /// frame was never passed.
    ///
    /// # Errors
    ///
    /// - [`MissingContextKind::NoPreviousFrame`] for a delta layer with no earlier frame.
    /// - [`DimensionMismatchKind::MissingRect`] for a layer without a usable rectangle.
    /// - Any error of [`decode_layer`].
    pub fn decode_frame(&mut self, frame: &Frame) -> CodecResult<DecodedFrame> {
        let mut decoded = DecodedFrame::default();
        let mut grids: [Option<BlockGrid>; LayerKind::COUNT] = Default::default();

        for &kind in LayerKind::all_values() {
            let Some(layer) = frame.layer(kind) else {
                continue;
            };
            let rect = frame.resolve_rect(kind)?;

            let previous = if layer.is_delta() {
                let state = self.states[kind.index()]
                    .as_ref()
                    .ok_or(MissingContextKind::NoPreviousFrame)?;
                Some(state.context_for(&rect))
            } else {
                None
            };

            trace!(
                "Frame {}: {kind:?} layer at {rect:?}, storage {:#04x}",
                self.frames,
                layer.storage.bits()
            );
            let DecodedLayer { raster, grid } = decode_layer(
                &layer.blocks,
                rect.width(),
                rect.height(),
                layer.format(),
                layer.commands(),
                previous,
                &self.settings,
            )?;

            decoded.layers[kind.index()] = Some(PositionedLayer { raster, rect });
            grids[kind.index()] = Some(grid);
        }

        for (index, grid) in grids.into_iter().enumerate() {
            if let (Some(grid), Some(layer)) = (grid, &decoded.layers[index]) {
                self.states[index] = Some(LayerState {
                    grid,
                    rect: layer.rect,
                });
            }
        }
        self.frames += 1;

        Ok(decoded)
    }
}

/// An encoded layer ready to be stored, plus its full block grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrameLayer {
    /// The layer as it would be stored in a frame.
    pub layer: Layer,
    /// Every block of the layer.
    pub grid: BlockGrid,
}

/// Encodes one layer of a frame sequence, emitting delta layers where possible.
#[derive(Debug, Clone, Default)]
pub struct SequenceEncoder {
    settings: EncodeSettings,
    state: Option<LayerState>,
}

impl SequenceEncoder {
    /// Creates an encoder at the start of a sequence.
    ///
    /// Commands are always generated, whatever `settings.generate_commands` says.
    pub fn new(settings: EncodeSettings) -> Self {
        Self {
            settings: EncodeSettings {
                generate_commands: true,
                ..settings
            },
            state: None,
        }
    }

    /// Settings used for every frame.
    pub fn settings(&self) -> &EncodeSettings {
        &self.settings
    }

    /// Forgets the previous frame.
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Encodes the next frame of this layer, placed at `rect`.
    ///
    /// The layer is stored as a delta against the previous frame when that frame's offset
    /// is block aligned. Otherwise the full layer is stored; its commands then only skip
    /// transparent blocks, and only under [`SkipFill::Transparent`].
    ///
    /// # Errors
    ///
    /// [`DimensionMismatchKind::LayerSize`] if `rect` is not the size of `raster`.
    ///
    /// [`SkipFill::Transparent`]: crate::delta::SkipFill::Transparent
    pub fn encode_next(&mut self, raster: &Raster, rect: LayerRect) -> CodecResult<EncodedFrameLayer> {
        if rect.size() != raster.dimensions() {
            return Err(DimensionMismatchKind::LayerSize {
                expected_width: rect.width(),
                expected_height: rect.height(),
                actual_width: raster.width(),
                actual_height: raster.height(),
            }
            .into());
        }

        let previous = self
            .state
            .as_ref()
            .map(|state| state.context_for(&rect))
            .filter(|context| context.is_aligned() && context.grid().format() == self.settings.format);
        let delta = previous.is_some();

        let encoded = encode_layer(raster, previous, &self.settings)?;
        let stream = encoded.commands.unwrap_or_default();
        trace!(
            "Encoded {} layer at {rect:?}: {} commands, {} bytes",
            if delta { "delta" } else { "full" },
            stream.commands.len(),
            stream.blocks.len()
        );

        let layer = Layer {
            rect: Some(rect),
            storage: StorageScheme::new(self.settings.format, delta),
            blocks: stream.blocks,
            commands: stream.commands,
        };

        self.state = Some(LayerState {
            grid: encoded.grid.clone(),
            rect,
        });

        Ok(EncodedFrameLayer {
            layer,
            grid: encoded.grid,
        })
    }
}
