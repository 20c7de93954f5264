//! Endpoint selection for the BC1 encoder.
//!
//! All functions here operate on the opaque pixels of a tile only; transparent and padding
//! pixels never influence the chosen colours.

use crate::util::bc1_palette;
use sld_codec_common::{color_565::Color565, color_8888::Color8888};

/// Upper bound on passes of [`refine_endpoints`] over the 6 endpoint channels.
const MAX_REFINE_PASSES: usize = 8;

/// Number of power iterations used to find the principal axis.
const POWER_ITERATIONS: usize = 8;

/// Per-channel bounding box of `pixels`, as `(max, min)` quantized endpoints.
pub(crate) fn bounding_box_endpoints(pixels: &[Color8888]) -> (Color565, Color565) {
    let mut min = [u8::MAX; 3];
    let mut max = [u8::MIN; 3];
    for pixel in pixels {
        let rgb = [pixel.r, pixel.g, pixel.b];
        for c in 0..3 {
            min[c] = min[c].min(rgb[c]);
            max[c] = max[c].max(rgb[c]);
        }
    }

    (
        Color565::from_rgb_rounded(max[0], max[1], max[2]),
        Color565::from_rgb_rounded(min[0], min[1], min[2]),
    )
}

/// Bounding box corners of `pixels` on the diagonal that follows their colour spread, as
/// `(high, low)` quantized endpoints.
///
/// The channel with the widest range fixes the direction. Any other channel that moves
/// against it (negative covariance) has its minimum and maximum swapped, so a tile blending
/// red into blue gets red and blue endpoints rather than magenta and black.
pub(crate) fn diagonal_endpoints(pixels: &[Color8888]) -> (Color565, Color565) {
    let mut min = [u8::MAX; 3];
    let mut max = [u8::MIN; 3];
    let mut sum = [0i32; 3];
    for pixel in pixels {
        let rgb = [pixel.r, pixel.g, pixel.b];
        for c in 0..3 {
            min[c] = min[c].min(rgb[c]);
            max[c] = max[c].max(rgb[c]);
            sum[c] += rgb[c] as i32;
        }
    }

    let mut reference = 0;
    for c in 1..3 {
        if max[c].saturating_sub(min[c]) > max[reference].saturating_sub(min[reference]) {
            reference = c;
        }
    }

    // Scaled by n twice to stay in integers; only the sign is used.
    let n = pixels.len() as i32;
    let mut covariance = [0i64; 3];
    for pixel in pixels {
        let rgb = [pixel.r, pixel.g, pixel.b];
        let d_ref = (n * rgb[reference] as i32 - sum[reference]) as i64;
        for c in 0..3 {
            covariance[c] += d_ref * (n * rgb[c] as i32 - sum[c]) as i64;
        }
    }

    let (mut high, mut low) = (max, min);
    for c in 0..3 {
        if covariance[c] < 0 {
            core::mem::swap(&mut high[c], &mut low[c]);
        }
    }

    (
        Color565::from_rgb_rounded(high[0], high[1], high[2]),
        Color565::from_rgb_rounded(low[0], low[1], low[2]),
    )
}

/// Endpoints at the two extremes of `pixels` along their principal axis.
///
/// Returns [`None`] when the pixels have no spread, in which case the caller should fall
/// back to [`bounding_box_endpoints`].
pub(crate) fn principal_axis_endpoints(pixels: &[Color8888]) -> Option<(Color565, Color565)> {
    let axis = principal_axis(pixels)?;

    let project = |p: &Color8888| p.r as f32 * axis[0] + p.g as f32 * axis[1] + p.b as f32 * axis[2];
    let mut min_pixel = pixels[0];
    let mut max_pixel = pixels[0];
    let mut min_proj = project(&pixels[0]);
    let mut max_proj = min_proj;
    for pixel in &pixels[1..] {
        let proj = project(pixel);
        if proj < min_proj {
            min_proj = proj;
            min_pixel = *pixel;
        }
        if proj > max_proj {
            max_proj = proj;
            max_pixel = *pixel;
        }
    }

    Some((max_pixel.to_color_565(), min_pixel.to_color_565()))
}

/// Dominant direction of the colour distribution, found by power iteration over the
/// covariance matrix. The returned vector is scaled so its largest component is 1.
fn principal_axis(pixels: &[Color8888]) -> Option<[f32; 3]> {
    if pixels.is_empty() {
        return None;
    }

    let n = pixels.len() as f32;
    let mut mean = [0f32; 3];
    for p in pixels {
        mean[0] += p.r as f32;
        mean[1] += p.g as f32;
        mean[2] += p.b as f32;
    }
    for m in &mut mean {
        *m /= n;
    }

    // Symmetric, so only the upper triangle is accumulated.
    let mut cov = [[0f32; 3]; 3];
    for p in pixels {
        let d = [p.r as f32 - mean[0], p.g as f32 - mean[1], p.b as f32 - mean[2]];
        for i in 0..3 {
            for j in i..3 {
                cov[i][j] += d[i] * d[j];
            }
        }
    }
    for i in 0..3 {
        for j in 0..i {
            cov[i][j] = cov[j][i];
        }
    }

    // Start from the column with the largest variance; it is never orthogonal to the
    // principal axis unless that variance is zero.
    let mut start = 0;
    for c in 1..3 {
        if cov[c][c] > cov[start][start] {
            start = c;
        }
    }
    if cov[start][start] <= f32::EPSILON {
        return None;
    }

    let mut axis = cov[start];
    for _ in 0..POWER_ITERATIONS {
        let next = [
            cov[0][0] * axis[0] + cov[0][1] * axis[1] + cov[0][2] * axis[2],
            cov[1][0] * axis[0] + cov[1][1] * axis[1] + cov[1][2] * axis[2],
            cov[2][0] * axis[0] + cov[2][1] * axis[1] + cov[2][2] * axis[2],
        ];
        let scale = next.iter().fold(0f32, |acc, v| acc.max(*v).max(-*v));
        if scale <= f32::EPSILON {
            return None;
        }
        axis = [next[0] / scale, next[1] / scale, next[2] / scale];
    }

    Some(axis)
}

/// Squared error of `pixels` against the palette of `(c0, c1)`, using the first
/// `usable_entries` palette entries.
pub(crate) fn palette_error(
    pixels: &[Color8888],
    c0: Color565,
    c1: Color565,
    usable_entries: usize,
) -> u32 {
    let palette = bc1_palette(c0, c1);
    pixels
        .iter()
        .map(|p| nearest_index(&palette[..usable_entries], p).1)
        .sum()
}

/// Index and squared distance of the palette entry closest to `pixel`.
/// Ties resolve to the lowest index.
#[inline]
pub(crate) fn nearest_index(palette: &[Color8888], pixel: &Color8888) -> (u32, u32) {
    let mut best = 0;
    let mut best_dist = u32::MAX;
    for (i, entry) in palette.iter().enumerate() {
        let dist = entry.distance_sq_rgb(pixel);
        if dist < best_dist {
            best = i as u32;
            best_dist = dist;
        }
    }
    (best, best_dist)
}

/// Greedily nudges each 565 channel of both endpoints by one step, keeping any change that
/// lowers the squared error, until a full pass finds no improvement.
///
/// `order` puts a candidate pair into the orientation the block will be stored in, which
/// decides between 4-colour and 3-colour mode. Candidates whose endpoints collapse into one
/// colour are skipped when `allow_equal` is false.
pub(crate) fn refine_endpoints(
    pixels: &[Color8888],
    endpoints: (Color565, Color565),
    order: fn(Color565, Color565) -> (Color565, Color565),
    usable_entries: usize,
    allow_equal: bool,
) -> (Color565, Color565) {
    let mut best = order(endpoints.0, endpoints.1);
    let mut best_error = palette_error(pixels, best.0, best.1, usable_entries);

    for _ in 0..MAX_REFINE_PASSES {
        if best_error == 0 {
            break;
        }

        let mut improved = false;
        for endpoint in 0..2 {
            for channel in 0..3 {
                for delta in [-1i16, 1] {
                    let current = if endpoint == 0 { best.0 } else { best.1 };
                    let Some(nudged) = nudge_channel(current, channel, delta) else {
                        continue;
                    };

                    let candidate = if endpoint == 0 {
                        order(nudged, best.1)
                    } else {
                        order(best.0, nudged)
                    };
                    if !allow_equal && candidate.0 == candidate.1 {
                        continue;
                    }

                    let error = palette_error(pixels, candidate.0, candidate.1, usable_entries);
                    if error < best_error {
                        best = candidate;
                        best_error = error;
                        improved = true;
                    }
                }
            }
        }

        if !improved {
            break;
        }
    }

    best
}

/// Moves one raw channel of `color` by `delta`, or returns [`None`] if that would leave the
/// channel's 5 or 6 bit range.
fn nudge_channel(color: Color565, channel: usize, delta: i16) -> Option<Color565> {
    let (r, g, b) = color.channels();
    let mut channels = [r as i16, g as i16, b as i16];
    let limit = if channel == 1 { 63 } else { 31 };

    channels[channel] += delta;
    if channels[channel] < 0 || channels[channel] > limit {
        return None;
    }

    Some(Color565::from_channels(
        channels[0] as u8,
        channels[1] as u8,
        channels[2] as u8,
    ))
}
