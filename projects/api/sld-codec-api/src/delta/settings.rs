//! Settings for the delta engine.

use derive_enum_all_values::AllValues;
use sld_codec_common::format::{BcFormat, BcQuality};

/// What a skipped block becomes when the previous frame has no block at its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AllValues)]
pub enum SkipFill {
    /// A skip without a previous block is an error.
    Strict,

    /// A skip without a previous block produces the format's transparent block.
    ///
    /// Container files use skip runs in non-delta layers to mean "empty", so this is the mode
    /// to decode them with. When encoding, transparent blocks without a previous block are
    /// skipped.
    Transparent,
}

impl Default for SkipFill {
    fn default() -> Self {
        SkipFill::Strict
    }
}

/// Settings for [`encode_layer`](crate::delta::encode_layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    /// Block format of the layer.
    pub format: BcFormat,
    /// Endpoint search effort.
    pub quality: BcQuality,
    /// Whether to produce draw commands and a delta block stream alongside the full grid.
    pub generate_commands: bool,
    /// Handling of blocks with no counterpart in the previous frame.
    pub skip_fill: SkipFill,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            format: BcFormat::Bc1,
            quality: BcQuality::default(),
            generate_commands: true,
            skip_fill: SkipFill::default(),
        }
    }
}

/// Settings for [`decode_layer`](crate::delta::decode_layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeSettings {
    /// Handling of skips with no counterpart in the previous frame.
    pub skip_fill: SkipFill,
}

impl DecodeSettings {
    /// Decode settings that accept the streams produced with `settings`.
    pub fn matching(settings: &EncodeSettings) -> Self {
        Self {
            skip_fill: settings.skip_fill,
        }
    }
}

/// Builder for [`EncodeSettings`] with convenient configuration methods.
#[derive(Debug, Clone, Copy)]
pub struct EncodeSettingsBuilder {
    format: Option<BcFormat>,
    quality: Option<BcQuality>,
    generate_commands: Option<bool>,
    skip_fill: Option<SkipFill>,
}

impl EncodeSettingsBuilder {
    /// Create a new settings builder.
    pub fn new() -> Self {
        Self {
            format: None,
            quality: None,
            generate_commands: None,
            skip_fill: None,
        }
    }

    /// Set the block format.
    pub fn format(mut self, format: BcFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Set the endpoint search effort.
    ///
    /// Slower levels only change which endpoints are picked; every level produces standard
    /// blocks.
    pub fn quality(mut self, quality: BcQuality) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Set whether draw commands are generated.
    pub fn generate_commands(mut self, generate: bool) -> Self {
        self.generate_commands = Some(generate);
        self
    }

    /// Set how blocks without a previous counterpart are treated.
    pub fn skip_fill(mut self, skip_fill: SkipFill) -> Self {
        self.skip_fill = Some(skip_fill);
        self
    }

    /// Build the settings using the configured values.
    pub fn build(self) -> EncodeSettings {
        let defaults = EncodeSettings::default();
        EncodeSettings {
            format: self.format.unwrap_or(defaults.format),
            quality: self.quality.unwrap_or(defaults.quality),
            generate_commands: self.generate_commands.unwrap_or(defaults.generate_commands),
            skip_fill: self.skip_fill.unwrap_or(defaults.skip_fill),
        }
    }
}

impl Default for EncodeSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
