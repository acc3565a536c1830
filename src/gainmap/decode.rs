//! Gain map application (HDR reconstruction).

use super::math::{apply_gain_rgb, apply_gain_single, compute_weight, srgb_inverse_oetf};
use super::pixels::{GainMapPixels, PixelSource};
use crate::error::{Result, UltraHdrError};
use crate::types::{ColorGamut, GainMapMetadata, HdrImage};

/// Nearest gain map texel for image pixel `x` along an axis scaled by
/// `scale` (image size / map size).
#[inline]
pub(crate) fn nearest(x: u32, scale: f32, len: u32) -> u32 {
    ((x as f32 / scale + 0.5) as u32).min(len - 1)
}

/// Applies a gain map to a decoded SDR image.
///
/// The result is linear RGB relative to SDR white. `max_display_boost`
/// scales the boost down for displays with less headroom than
/// `hdr_capacity_max`; 0 applies the map fully.
pub fn apply_gain_map(
    sdr: &PixelSource,
    gain_map: &GainMapPixels,
    metadata: &GainMapMetadata,
    max_display_boost: f32,
) -> Result<HdrImage> {
    let (width, height) = sdr.dimensions();
    if width == 0 || height == 0 || gain_map.width == 0 || gain_map.height == 0 {
        return Err(UltraHdrError::InvalidDimensions(format!(
            "image {}x{}, gain map {}x{}",
            width, height, gain_map.width, gain_map.height
        )));
    }

    let weight = compute_weight(metadata, max_display_boost);
    let scale_x = width as f32 / gain_map.width as f32;
    let scale_y = height as f32 / gain_map.height as f32;
    let sdr_rgb = sdr.to_rgb_f32();
    let mut pixels = vec![0.0f32; sdr_rgb.len()];

    for y in 0..height {
        let gy = nearest(y, scale_y, gain_map.height);
        for x in 0..width {
            let gx = nearest(x, scale_x, gain_map.width);
            let i = (y as usize * width as usize + x as usize) * 3;
            let linear = [
                srgb_inverse_oetf(sdr_rgb[i]),
                srgb_inverse_oetf(sdr_rgb[i + 1]),
                srgb_inverse_oetf(sdr_rgb[i + 2]),
            ];
            let gain = gain_map.sample(gx, gy);
            let hdr = if gain_map.is_gray() {
                apply_gain_single(linear, gain[0], metadata, weight)
            } else {
                apply_gain_rgb(linear, gain, metadata, weight)
            };
            pixels[i..i + 3].copy_from_slice(&hdr);
        }
    }

    Ok(HdrImage {
        width,
        height,
        pixels,
        gamut: ColorGamut::Srgb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    fn gray_sdr(w: u32, h: u32, v: u8) -> PixelSource {
        PixelSource::from_dynamic(DynamicImage::ImageLuma8(GrayImage::from_pixel(w, h, Luma([v]))))
    }

    fn plain_meta(max: f32) -> GainMapMetadata {
        GainMapMetadata {
            offset_sdr: [0.0; 3],
            offset_hdr: [0.0; 3],
            ..GainMapMetadata::for_sdr_base(max)
        }
    }

    #[test]
    fn test_nearest_sampling() {
        assert_eq!(nearest(0, 4.0, 2), 0);
        assert_eq!(nearest(1, 4.0, 2), 0);
        assert_eq!(nearest(2, 4.0, 2), 1);
        assert_eq!(nearest(7, 4.0, 2), 1);
        assert_eq!(nearest(100, 1.0, 3), 2);
    }

    #[test]
    fn test_full_boost() {
        let sdr = gray_sdr(4, 4, 255);
        let mut map = GainMapPixels::new(2, 2, 1);
        map.data.fill(255);
        let hdr = apply_gain_map(&sdr, &map, &plain_meta(4.0), 0.0).unwrap();
        assert_eq!(hdr.pixels.len(), 48);
        for v in &hdr.pixels {
            assert!((v - 4.0).abs() < 1e-4, "{}", v);
        }
    }

    #[test]
    fn test_display_boost_limits_output() {
        let sdr = gray_sdr(2, 2, 255);
        let mut map = GainMapPixels::new(1, 1, 3);
        map.data.fill(255);
        let hdr = apply_gain_map(&sdr, &map, &plain_meta(4.0), 2.0).unwrap();
        assert!((hdr.pixel(1, 1).unwrap()[0] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_identity_map() {
        let sdr = gray_sdr(2, 2, 100);
        let map = GainMapPixels::new(2, 2, 1);
        let meta = GainMapMetadata::for_sdr_base(1.0);
        let hdr = apply_gain_map(&sdr, &map, &meta, 0.0).unwrap();
        let expected = srgb_inverse_oetf(100.0 / 255.0);
        assert_eq!(hdr.pixel(0, 0).unwrap(), [expected; 3]);
    }
}
