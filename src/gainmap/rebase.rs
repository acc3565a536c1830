//! Gain map recomputation against a replacement SDR base.

use super::decode::nearest;
use super::math::{apply_gain_rgb, apply_gain_single, gain_from_factor, max3, srgb_inverse_oetf};
use super::pixels::{GainMapPixels, PixelSource};
use crate::error::{Result, UltraHdrError};
use crate::types::GainMapMetadata;

const MIN_DENOMINATOR: f32 = 1e-6;

/// Builds a full-resolution gain map that reproduces, on top of `new_sdr`,
/// the HDR rendition that `gain_map` produced on top of `old_sdr`.
///
/// The map layout (gray or RGB) and `metadata` are kept.
pub fn rebase_gain_map(
    old_sdr: &PixelSource,
    new_sdr: &PixelSource,
    gain_map: &GainMapPixels,
    metadata: &GainMapMetadata,
) -> Result<GainMapPixels> {
    let (width, height) = old_sdr.dimensions();
    let (new_w, new_h) = new_sdr.dimensions();
    if (width, height) != (new_w, new_h) {
        return Err(UltraHdrError::DimensionMismatch(width, height, new_w, new_h));
    }
    if width == 0 || height == 0 || gain_map.width == 0 || gain_map.height == 0 {
        return Err(UltraHdrError::InvalidDimensions("empty image".into()));
    }

    let scale_x = width as f32 / gain_map.width as f32;
    let scale_y = height as f32 / gain_map.height as f32;
    let old_rgb = old_sdr.to_rgb_f32();
    let new_rgb = new_sdr.to_rgb_f32();
    let linear = |buf: &[f32], i: usize| {
        [
            srgb_inverse_oetf(buf[i]),
            srgb_inverse_oetf(buf[i + 1]),
            srgb_inverse_oetf(buf[i + 2]),
        ]
    };

    let mut out = GainMapPixels::new(width, height, gain_map.channels);
    for y in 0..height {
        let gy = nearest(y, scale_y, gain_map.height);
        for x in 0..width {
            let gx = nearest(x, scale_x, gain_map.width);
            let i = (y as usize * width as usize + x as usize) * 3;
            let old = linear(&old_rgb, i);
            let new = linear(&new_rgb, i);
            let gain = gain_map.sample(gx, gy);

            let value = if gain_map.is_gray() {
                let hdr = apply_gain_single(old, gain[0], metadata, 1.0);
                let factor = target_factor(max3(hdr), max3(new), metadata, 0);
                [gain_from_factor(
                    factor,
                    metadata.min_content_boost[0],
                    metadata.max_content_boost[0],
                    metadata.gamma[0],
                ); 3]
            } else {
                let hdr = apply_gain_rgb(old, gain, metadata, 1.0);
                let mut v = [0u8; 3];
                for c in 0..3 {
                    let factor = target_factor(hdr[c], new[c], metadata, c);
                    v[c] = gain_from_factor(
                        factor,
                        metadata.min_content_boost[c],
                        metadata.max_content_boost[c],
                        metadata.gamma[c],
                    );
                }
                v
            };
            out.set(x, y, value);
        }
    }
    Ok(out)
}

fn target_factor(hdr: f32, sdr: f32, meta: &GainMapMetadata, c: usize) -> f32 {
    let mut denom = sdr + meta.offset_sdr[c];
    if denom <= 0.0 {
        denom = MIN_DENOMINATOR;
    }
    (hdr + meta.offset_hdr[c]) / denom
}
