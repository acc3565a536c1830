//! Gain map generation from an HDR/SDR image pair.

use super::math::{encode_gain, log2f, luminance, max3, srgb_inverse_oetf, SDR_WHITE_NITS};
use super::pixels::{GainMapPixels, PixelSource};
use crate::error::{Result, UltraHdrError};
use crate::types::{ColorGamut, EncodeOptions, GainMapMetadata, HdrImage};
use log::debug;

/// Fills in defaults for unset or out-of-range encode options.
pub fn effective_options(opts: &EncodeOptions) -> EncodeOptions {
    let defaults = EncodeOptions::default();
    EncodeOptions {
        base_quality: if opts.base_quality == 0 {
            defaults.base_quality
        } else {
            opts.base_quality
        },
        gain_map_quality: if opts.gain_map_quality == 0 {
            defaults.gain_map_quality
        } else {
            opts.gain_map_quality
        },
        gain_map_scale: opts.gain_map_scale.max(1),
        gain_map_gamma: if opts.gain_map_gamma > 0.0 {
            opts.gain_map_gamma
        } else {
            1.0
        },
        hdr_white_nits: if opts.hdr_white_nits > 0.0 {
            opts.hdr_white_nits
        } else {
            defaults.hdr_white_nits
        },
        ..*opts
    }
}

/// Metadata describing a map generated with `opts`: content boost from 1 to
/// the HDR white level relative to SDR white, zero offsets.
pub fn metadata_for_encode(opts: &EncodeOptions) -> GainMapMetadata {
    let max_boost = opts.hdr_white_nits / SDR_WHITE_NITS;
    let capacity_max = if opts.target_display_nits > 0.0 {
        opts.target_display_nits / SDR_WHITE_NITS
    } else {
        max_boost
    };
    GainMapMetadata {
        version: "1.0".to_string(),
        min_content_boost: [1.0; 3],
        max_content_boost: [max_boost; 3],
        gamma: [opts.gain_map_gamma; 3],
        offset_sdr: [0.0; 3],
        offset_hdr: [0.0; 3],
        hdr_capacity_min: 1.0,
        hdr_capacity_max: capacity_max,
        use_base_color_space: true,
    }
}

/// Computes a gain map for `hdr` against `sdr`.
///
/// `hdr` samples are linear with 1.0 at `opts.hdr_white_nits`; `sdr` is
/// sRGB-encoded. The map is `1/scale` of the image size in each direction
/// (1x1 when that rounds to zero) and samples the top-left pixel of each
/// block.
pub fn generate_gain_map(
    hdr: &HdrImage,
    sdr: &PixelSource,
    meta: &GainMapMetadata,
    opts: &EncodeOptions,
) -> Result<GainMapPixels> {
    let (width, height) = sdr.dimensions();
    if width != hdr.width || height != hdr.height {
        return Err(UltraHdrError::DimensionMismatch(
            hdr.width, hdr.height, width, height,
        ));
    }
    if width == 0 || height == 0 {
        return Err(UltraHdrError::InvalidDimensions(format!(
            "{}x{}",
            width, height
        )));
    }
    let pixel_count = width as usize * height as usize;
    if hdr.pixels.len() != pixel_count * 3 {
        return Err(UltraHdrError::InvalidDimensions(format!(
            "HDR buffer size {} doesn't match {}x{}x3",
            hdr.pixels.len(),
            width,
            height
        )));
    }

    let scale = opts.gain_map_scale.max(1) as u32;
    let (mut map_w, mut map_h) = (width / scale, height / scale);
    if map_w == 0 || map_h == 0 {
        map_w = 1;
        map_h = 1;
    }
    let channels = if opts.multi_channel { 3 } else { 1 };
    debug!(
        "generating {}x{} gain map, {} channel(s)",
        map_w, map_h, channels
    );

    let sdr_rgb = sdr.to_rgb_f32();
    let log2_min = log2f(meta.min_content_boost[0]);
    let log2_max = log2f(meta.max_content_boost[0]);
    let hdr_white = opts.hdr_white_nits;

    let mut out = GainMapPixels::new(map_w, map_h, channels);
    for y in 0..map_h {
        let sy = (y * scale).min(height - 1) as usize;
        for x in 0..map_w {
            let sx = (x * scale).min(width - 1) as usize;
            let i = (sy * width as usize + sx) * 3;
            let sdr_lin = [
                srgb_inverse_oetf(sdr_rgb[i]),
                srgb_inverse_oetf(sdr_rgb[i + 1]),
                srgb_inverse_oetf(sdr_rgb[i + 2]),
            ];
            let hdr_lin = [hdr.pixels[i], hdr.pixels[i + 1], hdr.pixels[i + 2]];

            let value = if opts.multi_channel {
                let mut v = [0u8; 3];
                for c in 0..3 {
                    v[c] = encode_gain(
                        sdr_lin[c] * SDR_WHITE_NITS,
                        hdr_lin[c] * hdr_white,
                        meta,
                        log2_min,
                        log2_max,
                        c,
                    );
                }
                v
            } else {
                let (sdr_y, hdr_y) = if opts.use_luminance {
                    (
                        luminance(sdr_lin, ColorGamut::Srgb),
                        luminance(hdr_lin, ColorGamut::Srgb),
                    )
                } else {
                    (max3(sdr_lin), max3(hdr_lin))
                };
                let v = encode_gain(
                    sdr_y * SDR_WHITE_NITS,
                    hdr_y * hdr_white,
                    meta,
                    log2_min,
                    log2_max,
                    0,
                );
                [v; 3]
            };
            out.set(x, y, value);
        }
    }
    Ok(out)
}
