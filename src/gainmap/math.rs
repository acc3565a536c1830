//! Transfer functions and per-pixel gain map math.
//!
//! Boost values are linear in [`GainMapMetadata`]; interpolation between
//! min and max boost happens in log2 space. All intermediate logarithms and
//! powers are evaluated in `f64` and rounded back to `f32`.

use crate::types::{ColorGamut, GainMapMetadata, TransferFunction};

/// Small epsilon value to avoid division by zero.
pub const EPSILON: f32 = 1e-6;

/// sRGB transfer function threshold.
const SRGB_THRESHOLD: f32 = 0.04045;
const SRGB_LINEAR_SCALE: f32 = 12.92;
const SRGB_GAMMA: f32 = 2.4;
const SRGB_A: f32 = 0.055;

/// Adobe RGB (1998) exponent, 563/256.
const GAMMA_22: f64 = 2.19921875;

/// Reference white luminance in nits for SDR.
pub const SDR_WHITE_NITS: f32 = 203.0;

#[inline]
pub fn log2f(v: f32) -> f32 {
    (v as f64).log2() as f32
}

#[inline]
pub fn exp2f(v: f32) -> f32 {
    (v as f64).exp2() as f32
}

#[inline]
fn powf(v: f32, e: f32) -> f32 {
    (v as f64).powf(e as f64) as f32
}

#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

// ============================================================================
// Transfer Functions
// ============================================================================

/// Applies the sRGB OETF (Opto-Electronic Transfer Function) - linear to sRGB.
#[inline]
pub fn srgb_oetf(linear: f32) -> f32 {
    if linear <= 0.0031308 {
        linear * SRGB_LINEAR_SCALE
    } else {
        (1.0 + SRGB_A) * powf(linear, 1.0 / SRGB_GAMMA) - SRGB_A
    }
}

/// Applies the inverse sRGB OETF (sRGB to linear).
#[inline]
pub fn srgb_inverse_oetf(srgb: f32) -> f32 {
    if srgb <= SRGB_THRESHOLD {
        srgb / SRGB_LINEAR_SCALE
    } else {
        powf((srgb + SRGB_A) / (1.0 + SRGB_A), SRGB_GAMMA)
    }
}

/// Converts sRGB color to linear RGB.
#[inline]
pub fn srgb_to_linear(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(srgb_inverse_oetf)
}

/// Encodes a linear value with `tf`.
pub fn oetf(linear: f32, tf: TransferFunction) -> f32 {
    match tf {
        TransferFunction::Srgb => srgb_oetf(linear),
        TransferFunction::Linear => linear,
        TransferFunction::Gamma22 => (linear.max(0.0) as f64).powf(1.0 / GAMMA_22) as f32,
    }
}

/// Decodes a `tf`-encoded value to linear.
pub fn inverse_oetf(encoded: f32, tf: TransferFunction) -> f32 {
    match tf {
        TransferFunction::Srgb => srgb_inverse_oetf(encoded),
        TransferFunction::Linear => encoded,
        TransferFunction::Gamma22 => (encoded.max(0.0) as f64).powf(GAMMA_22) as f32,
    }
}

// ============================================================================
// Luminance Calculations
// ============================================================================

/// BT.709 luminance coefficients (also used for sRGB).
pub const LUMA_BT709: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// BT.2020 luminance coefficients.
pub const LUMA_BT2020: [f32; 3] = [0.2627, 0.6780, 0.0593];

/// Display P3 luminance coefficients (same primaries as DCI-P3 but D65 white).
pub const LUMA_P3: [f32; 3] = [0.2289, 0.6917, 0.0793];

/// Adobe RGB (1998) luminance coefficients.
pub const LUMA_ADOBE_RGB: [f32; 3] = [0.2974, 0.6273, 0.0753];

/// Calculates luminance from linear RGB for the given gamut.
#[inline]
pub fn luminance(rgb: [f32; 3], gamut: ColorGamut) -> f32 {
    let k = match gamut {
        ColorGamut::Srgb => LUMA_BT709,
        ColorGamut::DisplayP3 => LUMA_P3,
        ColorGamut::Bt2100 => LUMA_BT2020,
        ColorGamut::AdobeRgb => LUMA_ADOBE_RGB,
    };
    k[0] * rgb[0] + k[1] * rgb[1] + k[2] * rgb[2]
}

#[inline]
pub fn max3(rgb: [f32; 3]) -> f32 {
    rgb[0].max(rgb[1]).max(rgb[2])
}

// ============================================================================
// Gain Map Specific Math
// ============================================================================

/// Encodes the ratio between an HDR and an SDR sample as an 8-bit gain.
///
/// The ratio is clamped to channel `idx`'s content boost range and then
/// normalized against the global `log2_min..log2_max` range.
pub fn encode_gain(
    sdr: f32,
    hdr: f32,
    meta: &GainMapMetadata,
    log2_min: f32,
    log2_max: f32,
    idx: usize,
) -> u8 {
    let gain = if sdr > 0.0 {
        hdr / sdr
    } else if hdr > 0.0 {
        f32::INFINITY
    } else {
        1.0
    };
    let gain = gain
        .max(meta.min_content_boost[idx])
        .min(meta.max_content_boost[idx]);

    let range = log2_max - log2_min;
    if range == 0.0 {
        return 0;
    }
    let mut normalized = (log2f(gain) - log2_min) / range;
    if meta.gamma[idx] != 1.0 {
        normalized = powf(normalized, meta.gamma[idx]);
    }
    if !normalized.is_finite() {
        return 0;
    }
    (clamp01(normalized) * 255.0 + 0.5) as u8
}

/// Normalized gain in [0, 1] for a stored byte, with gamma removed.
#[inline]
pub fn decode_gain_value(v: u8, gamma: f32) -> f32 {
    let mut g = v as f32 / 255.0;
    if gamma != 1.0 {
        g = powf(g, 1.0 / gamma);
    }
    clamp01(g)
}

/// Multiplicative boost for a normalized gain on channel `c`, scaled by
/// `weight`.
#[inline]
pub fn gain_factor(g: f32, meta: &GainMapMetadata, c: usize, weight: f32) -> f32 {
    let log_boost =
        log2f(meta.min_content_boost[c]) * (1.0 - g) + log2f(meta.max_content_boost[c]) * g;
    exp2f(log_boost * weight)
}

#[inline]
fn boost(sdr: f32, factor: f32, offset_sdr: f32, offset_hdr: f32) -> f32 {
    if factor == 1.0 {
        return sdr;
    }
    (sdr + offset_sdr) * factor - offset_hdr
}

/// Applies a single-channel gain byte to a linear SDR pixel using channel 0
/// parameters for R, G and B.
pub fn apply_gain_single(sdr: [f32; 3], gain: u8, meta: &GainMapMetadata, weight: f32) -> [f32; 3] {
    let g = decode_gain_value(gain, meta.gamma[0]);
    let factor = gain_factor(g, meta, 0, weight);
    sdr.map(|v| boost(v, factor, meta.offset_sdr[0], meta.offset_hdr[0]))
}

/// Applies a three-channel gain to a linear SDR pixel, each channel with
/// its own parameters.
pub fn apply_gain_rgb(sdr: [f32; 3], gain: [u8; 3], meta: &GainMapMetadata, weight: f32) -> [f32; 3] {
    let mut out = [0.0; 3];
    for c in 0..3 {
        let g = decode_gain_value(gain[c], meta.gamma[c]);
        let factor = gain_factor(g, meta, c, weight);
        out[c] = boost(sdr[c], factor, meta.offset_sdr[c], meta.offset_hdr[c]);
    }
    out
}

/// Fraction of the gain map to apply on a display with `max_display_boost`
/// headroom; 0 or less means "as much as the content asks for".
pub fn compute_weight(meta: &GainMapMetadata, max_display_boost: f32) -> f32 {
    let display = if max_display_boost > 0.0 {
        max_display_boost
    } else {
        meta.hdr_capacity_max
    };
    if display >= meta.hdr_capacity_max {
        return 1.0;
    }
    let log_min = log2f(meta.hdr_capacity_min);
    let log_max = log2f(meta.hdr_capacity_max);
    if log_max <= log_min {
        return 1.0;
    }
    clamp01((log2f(display) - log_min) / (log_max - log_min))
}

/// Inverse of [`gain_factor`] at full weight: the byte that reproduces
/// `factor` within `min_boost..max_boost`.
pub fn gain_from_factor(factor: f32, min_boost: f32, max_boost: f32, gamma: f32) -> u8 {
    let factor = factor.max(min_boost).min(max_boost);
    let log_min = log2f(min_boost);
    let log_max = log2f(max_boost);
    let mut g = if log_max != log_min {
        (log2f(factor) - log_min) / (log_max - log_min)
    } else {
        0.0
    };
    g = clamp01(g);
    if gamma != 1.0 {
        g = powf(g, gamma);
    }
    if !g.is_finite() {
        return 0;
    }
    (clamp01(g) * 255.0 + 0.5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn plain_meta(max: f32) -> GainMapMetadata {
        GainMapMetadata {
            offset_sdr: [0.0; 3],
            offset_hdr: [0.0; 3],
            ..GainMapMetadata::for_sdr_base(max)
        }
    }

    #[test]
    fn test_srgb_roundtrip() {
        for i in 0..=100 {
            let linear = i as f32 / 100.0;
            let back = srgb_inverse_oetf(srgb_oetf(linear));
            assert!(approx_eq(linear, back), "Failed at {}: {}", linear, back);
        }
    }

    #[test]
    fn test_gamma22_roundtrip() {
        for i in 0..=20 {
            let v = i as f32 / 20.0;
            let back = inverse_oetf(oetf(v, TransferFunction::Gamma22), TransferFunction::Gamma22);
            assert!((v - back).abs() < 1e-4);
        }
    }

    #[test]
    fn test_luminance_white() {
        for gamut in [ColorGamut::Srgb, ColorGamut::DisplayP3, ColorGamut::Bt2100] {
            assert!((luminance([1.0; 3], gamut) - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_full_gain_doubles() {
        let meta = plain_meta(4.0);
        let out = apply_gain_single([0.5; 3], 255, &meta, 1.0);
        for v in out {
            assert!(approx_eq(v, 2.0), "{}", v);
        }
    }

    #[test]
    fn test_identity_map_keeps_samples() {
        let mut meta = GainMapMetadata::for_sdr_base(1.0);
        meta.offset_sdr = [0.1; 3];
        meta.offset_hdr = [0.3; 3];
        let sdr = [0.123, 0.456, 0.789];
        for byte in [0u8, 128, 255] {
            assert_eq!(apply_gain_single(sdr, byte, &meta, 1.0), sdr);
            assert_eq!(apply_gain_rgb(sdr, [byte; 3], &meta, 0.5), sdr);
        }
    }

    #[test]
    fn test_zero_weight_is_identity() {
        let meta = plain_meta(8.0);
        assert_eq!(apply_gain_single([0.25; 3], 200, &meta, 0.0), [0.25; 3]);
    }

    #[test]
    fn test_encode_gain() {
        let meta = plain_meta(4.0);
        let (lo, hi) = (log2f(1.0), log2f(4.0));
        assert_eq!(encode_gain(0.5, 1.0, &meta, lo, hi, 0), 128);
        assert_eq!(encode_gain(0.5, 0.5, &meta, lo, hi, 0), 0);
        assert_eq!(encode_gain(0.5, 100.0, &meta, lo, hi, 0), 255);
        assert_eq!(encode_gain(0.0, 1.0, &meta, lo, hi, 0), 255);
        assert_eq!(encode_gain(0.0, 0.0, &meta, lo, hi, 0), 0);
        assert_eq!(encode_gain(0.5, 1.0, &meta, hi, hi, 0), 0);
    }

    #[test]
    fn test_multi_channel_uses_own_offsets() {
        let mut meta = plain_meta(4.0);
        meta.offset_sdr = [0.0, 0.5, 1.0];
        let out = apply_gain_rgb([0.5; 3], [255; 3], &meta, 1.0);
        assert!(approx_eq(out[0], 2.0));
        assert!(approx_eq(out[1], 4.0));
        assert!(approx_eq(out[2], 6.0));
    }

    #[test]
    fn test_compute_weight() {
        let meta = GainMapMetadata::for_sdr_base(4.0);
        assert_eq!(compute_weight(&meta, 0.0), 1.0);
        assert_eq!(compute_weight(&meta, 8.0), 1.0);
        assert!(approx_eq(compute_weight(&meta, 2.0), 0.5));
        assert_eq!(compute_weight(&meta, 1.0), 0.0);

        let mut flat = meta.clone();
        flat.hdr_capacity_min = 4.0;
        assert_eq!(compute_weight(&flat, 2.0), 1.0);
    }

    #[test]
    fn test_gain_from_factor_inverts_decode() {
        let meta = plain_meta(4.0);
        for byte in [0u8, 17, 128, 254, 255] {
            let factor = gain_factor(decode_gain_value(byte, 1.0), &meta, 0, 1.0);
            assert_eq!(gain_from_factor(factor, 1.0, 4.0, 1.0), byte);
        }
        assert_eq!(gain_from_factor(3.0, 2.0, 2.0, 1.0), 0);
    }
}
