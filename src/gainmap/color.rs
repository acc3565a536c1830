//! Coarse color management: gamut detection from ICC bytes and linear
//! gamut conversion through XYZ.

use super::math::{clamp01, inverse_oetf, oetf};
use crate::types::{ColorGamut, TransferFunction};
use image::RgbImage;

/// Gamut and transfer of an encoded SDR image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorProfile {
    pub gamut: ColorGamut,
    pub transfer: TransferFunction,
}

impl ColorProfile {
    pub const SRGB: ColorProfile = ColorProfile {
        gamut: ColorGamut::Srgb,
        transfer: TransferFunction::Srgb,
    };

    pub fn is_wide_gamut(&self) -> bool {
        self.gamut != ColorGamut::Srgb
    }
}

/// Guesses the profile from the assembled ICC bytes by looking for the
/// profile description. Unknown or empty profiles are treated as sRGB.
pub fn detect_color_profile(icc: &[u8]) -> ColorProfile {
    if icc.is_empty() {
        return ColorProfile::SRGB;
    }
    let lower = icc.to_ascii_lowercase();
    let contains = |needle: &[u8]| lower.windows(needle.len()).any(|w| w == needle);

    if contains(b"display p3") || contains(b"dci-p3") {
        ColorProfile {
            gamut: ColorGamut::DisplayP3,
            transfer: TransferFunction::Srgb,
        }
    } else if contains(b"adobe rgb") || contains(b"adobergb") {
        ColorProfile {
            gamut: ColorGamut::AdobeRgb,
            transfer: TransferFunction::Gamma22,
        }
    } else {
        ColorProfile::SRGB
    }
}

type Matrix = [[f32; 3]; 3];

// D65 linear RGB -> XYZ.
const SRGB_TO_XYZ: Matrix = [
    [0.4123908, 0.35758433, 0.1804808],
    [0.212639, 0.71516865, 0.07219232],
    [0.019330818, 0.11919478, 0.95053214],
];
const XYZ_TO_SRGB: Matrix = [
    [3.24097, -1.5373832, -0.49861076],
    [-0.96924365, 1.8759675, 0.041555058],
    [0.05563008, -0.20397696, 1.0569715],
];

const P3_TO_XYZ: Matrix = [
    [0.48657095, 0.2656677, 0.19821729],
    [0.22897457, 0.69173855, 0.07928691],
    [0.0, 0.04511338, 1.0439444],
];
const XYZ_TO_P3: Matrix = [
    [2.493497, -0.9313836, -0.4027108],
    [-0.829489, 1.7626641, 0.023624685],
    [0.03584583, -0.07617239, 0.9568845],
];

const ADOBE_TO_XYZ: Matrix = [
    [0.5767309, 0.185554, 0.1881852],
    [0.2973769, 0.6273491, 0.0752741],
    [0.0270343, 0.0706872, 0.9911085],
];
const XYZ_TO_ADOBE: Matrix = [
    [2.041369, -0.5649464, -0.3446944],
    [-0.969266, 1.8760108, 0.041556],
    [0.0134474, -0.1183897, 1.0154096],
];

const BT2020_TO_XYZ: Matrix = [
    [0.636958, 0.1446169, 0.168881],
    [0.2627002, 0.6779981, 0.0593017],
    [0.0, 0.0280727, 1.0609851],
];
const XYZ_TO_BT2020: Matrix = [
    [1.7166512, -0.3556708, -0.2533663],
    [-0.6666844, 1.6164812, 0.0157685],
    [0.0176399, -0.0427706, 0.9421031],
];

#[inline]
fn mul(m: &Matrix, v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

pub fn rgb_to_xyz(rgb: [f32; 3], gamut: ColorGamut) -> [f32; 3] {
    let m = match gamut {
        ColorGamut::Srgb => &SRGB_TO_XYZ,
        ColorGamut::DisplayP3 => &P3_TO_XYZ,
        ColorGamut::AdobeRgb => &ADOBE_TO_XYZ,
        ColorGamut::Bt2100 => &BT2020_TO_XYZ,
    };
    mul(m, rgb)
}

pub fn xyz_to_rgb(xyz: [f32; 3], gamut: ColorGamut) -> [f32; 3] {
    let m = match gamut {
        ColorGamut::Srgb => &XYZ_TO_SRGB,
        ColorGamut::DisplayP3 => &XYZ_TO_P3,
        ColorGamut::AdobeRgb => &XYZ_TO_ADOBE,
        ColorGamut::Bt2100 => &XYZ_TO_BT2020,
    };
    mul(m, xyz)
}

/// Converts linear RGB between gamuts.
pub fn convert_linear_gamut(rgb: [f32; 3], from: ColorGamut, to: ColorGamut) -> [f32; 3] {
    if from == to {
        return rgb;
    }
    xyz_to_rgb(rgb_to_xyz(rgb, from), to)
}

/// Re-encodes 8-bit pixels from one profile to another. Out-of-gamut values
/// are clipped.
pub fn convert_image_profile(img: &RgbImage, from: ColorProfile, to: ColorProfile) -> RgbImage {
    if from == to {
        return img.clone();
    }
    let mut out = RgbImage::new(img.width(), img.height());
    for (src, dst) in img.pixels().zip(out.pixels_mut()) {
        let linear = src.0.map(|v| inverse_oetf(v as f32 / 255.0, from.transfer));
        let converted = convert_linear_gamut(linear, from.gamut, to.gamut);
        dst.0 = converted.map(|v| (clamp01(oetf(v, to.transfer)) * 255.0 + 0.5) as u8);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_detect_profiles() {
        assert_eq!(detect_color_profile(&[]), ColorProfile::SRGB);
        assert_eq!(detect_color_profile(b"....sRGB IEC61966-2.1...."), ColorProfile::SRGB);

        let p3 = detect_color_profile(b"desc\0\0Display P3\0");
        assert_eq!(p3.gamut, ColorGamut::DisplayP3);
        assert_eq!(p3.transfer, TransferFunction::Srgb);
        assert!(p3.is_wide_gamut());

        let adobe = detect_color_profile(b"xxADOBE RGB (1998)xx");
        assert_eq!(adobe.gamut, ColorGamut::AdobeRgb);
        assert_eq!(adobe.transfer, TransferFunction::Gamma22);
    }

    #[test]
    fn test_white_maps_to_white() {
        for gamut in [ColorGamut::DisplayP3, ColorGamut::AdobeRgb, ColorGamut::Bt2100] {
            let out = convert_linear_gamut([1.0; 3], gamut, ColorGamut::Srgb);
            for v in out {
                assert!((v - 1.0).abs() < 2e-3, "{:?}: {:?}", gamut, out);
            }
        }
    }

    #[test]
    fn test_p3_red_is_outside_srgb() {
        let out = convert_linear_gamut([1.0, 0.0, 0.0], ColorGamut::DisplayP3, ColorGamut::Srgb);
        assert!(out[0] > 1.0);
        assert!(out[1] < 0.0);
    }

    #[test]
    fn test_convert_image_profile() {
        let img = RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]));
        let same = convert_image_profile(&img, ColorProfile::SRGB, ColorProfile::SRGB);
        assert_eq!(same, img);

        let p3 = detect_color_profile(b"Display P3");
        let out = convert_image_profile(&img, p3, ColorProfile::SRGB);
        for p in out.pixels() {
            assert!(p.0.iter().all(|&v| v >= 254));
        }
    }
}
