//! PNG input and output for the codec entry points.
//!
//! The core works on [`Raster`]s; these wrappers accept and return PNG bytes, for callers
//! that keep frames as image files.

use crate::block::BlockGrid;
use crate::delta::{
    decode_layer, encode_layer, DecodeSettings, EncodeSettings, EncodedLayer, PreviousFrameContext,
};
use crate::draw_command::DrawCommand;
use crate::error::CodecResult;
use crate::render::{render, RenderOptions};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat};
use sld_codec_common::{format::BcFormat, raster::Raster};

/// Decodes PNG bytes into a [`Raster`], converting to RGBA8.
///
/// # Errors
///
/// [`CodecError::Image`] if the bytes are not a valid PNG.
///
/// [`CodecError::Image`]: crate::error::CodecError::Image
pub fn decode_png(bytes: &[u8]) -> CodecResult<Raster> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8();
    let (width, height) = image.dimensions();
    Ok(Raster::from_rgba8(width, height, image.as_raw())?)
}

/// Encodes a [`Raster`] as an RGBA8 PNG.
pub fn encode_png(raster: &Raster) -> CodecResult<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        &raster.to_rgba8(),
        raster.width(),
        raster.height(),
        ColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// [`encode_layer`] with a PNG source frame.
pub fn encode_layer_png(
    png: &[u8],
    previous: Option<PreviousFrameContext<'_>>,
    settings: &EncodeSettings,
) -> CodecResult<EncodedLayer> {
    let raster = decode_png(png)?;
    encode_layer(&raster, previous, settings)
}

/// [`decode_layer`] returning the layer as PNG bytes, along with the grid for the next frame.
pub fn decode_layer_png(
    blocks: &[u8],
    width: u32,
    height: u32,
    format: BcFormat,
    commands: Option<&[DrawCommand]>,
    previous: Option<PreviousFrameContext<'_>>,
    settings: &DecodeSettings,
) -> CodecResult<(Vec<u8>, BlockGrid)> {
    let decoded = decode_layer(blocks, width, height, format, commands, previous, settings)?;
    Ok((encode_png(&decoded.raster)?, decoded.grid))
}

/// [`render`] with PNG inputs and output.
pub fn render_png(
    main: &[u8],
    shadow: Option<(&[u8], (i32, i32))>,
    mask: Option<&[u8]>,
    options: &RenderOptions,
) -> CodecResult<Vec<u8>> {
    let main = decode_png(main)?;
    let shadow = shadow
        .map(|(png, offset)| decode_png(png).map(|raster| (raster, offset)))
        .transpose()?;
    let mask = mask.map(decode_png).transpose()?;

    let output = render(
        &main,
        shadow.as_ref().map(|(raster, offset)| (raster, *offset)),
        mask.as_ref(),
        options,
    )?;
    encode_png(&output)
}
