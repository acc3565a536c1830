//! Boundary to the JPEG codec and resampler.
//!
//! Pixel decoding and encoding go through `image` (backed by `zune-jpeg`);
//! header-only probes use `zune-jpeg` directly so no pixels are decoded.

use crate::error::{Result, UltraHdrError};
use crate::types::Interpolation;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageFormat, RgbImage};
use std::io::Cursor;

/// Decodes a JPEG stream to pixels.
pub fn decode_jpeg(data: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory_with_format(data, ImageFormat::Jpeg)?)
}

/// Encodes raw interleaved samples as a baseline JPEG.
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    color: ExtendedColorType,
    quality: u8,
) -> Result<Vec<u8>> {
    validate_quality(quality)?;
    if width == 0 || height == 0 {
        return Err(UltraHdrError::InvalidDimensions(format!(
            "{}x{}",
            width, height
        )));
    }
    let mut output = Cursor::new(Vec::new());
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
    encoder.encode(pixels, width, height, color)?;
    Ok(output.into_inner())
}

pub fn encode_rgb(img: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    encode_jpeg(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::Rgb8,
        quality,
    )
}

pub fn encode_gray(img: &GrayImage, quality: u8) -> Result<Vec<u8>> {
    encode_jpeg(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::L8,
        quality,
    )
}

/// Encodes a decoded image, keeping grayscale images single-component.
pub fn encode_dynamic(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    match img {
        DynamicImage::ImageLuma8(gray) => encode_gray(gray, quality),
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA8(_) => {
            encode_gray(&img.to_luma8(), quality)
        }
        other => encode_rgb(&other.to_rgb8(), quality),
    }
}

/// Reads `(width, height)` from the frame header without decoding pixels.
pub fn probe_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    let mut decoder = zune_jpeg::JpegDecoder::new(data);
    decoder.decode_headers()?;
    let (width, height) = decoder
        .dimensions()
        .ok_or_else(|| UltraHdrError::InvalidJpeg("no frame header".into()))?;
    Ok((width as u32, height as u32))
}

/// Resampling filter used for an [`Interpolation`] mode.
///
/// `image` has no Mitchell or Lanczos2 kernel; the nearest available
/// kernels stand in.
pub fn filter_type(interpolation: Interpolation) -> FilterType {
    match interpolation {
        Interpolation::Nearest => FilterType::Nearest,
        Interpolation::Bilinear => FilterType::Triangle,
        Interpolation::Bicubic | Interpolation::Mitchell => FilterType::CatmullRom,
        Interpolation::Lanczos2 | Interpolation::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Resamples to exactly `width` x `height`.
pub fn resample(
    img: &DynamicImage,
    width: u32,
    height: u32,
    interpolation: Interpolation,
) -> Result<DynamicImage> {
    if width == 0 || height == 0 {
        return Err(UltraHdrError::InvalidDimensions(format!(
            "resize target {}x{}",
            width, height
        )));
    }
    if img.width() == width && img.height() == height {
        return Ok(img.clone());
    }
    Ok(img.resize_exact(width, height, filter_type(interpolation)))
}

/// Rejects qualities outside 1..=100.
pub fn validate_quality(quality: u8) -> Result<()> {
    if quality == 0 || quality > 100 {
        return Err(UltraHdrError::InvalidQuality(quality));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_encode_decode_rgb() {
        let img = RgbImage::from_fn(16, 8, |x, y| Rgb([(x * 16) as u8, (y * 32) as u8, 128]));
        let jpeg = encode_rgb(&img, 90).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(probe_dimensions(&jpeg).unwrap(), (16, 8));

        let decoded = decode_jpeg(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn test_gray_stays_single_component() {
        let img = GrayImage::from_pixel(4, 4, Luma([200]));
        let jpeg = encode_dynamic(&DynamicImage::ImageLuma8(img), 85).unwrap();
        let frame = crate::jpeg::parser::frame_header(&jpeg).unwrap();
        assert_eq!(frame.components, 1);
        assert!(frame.is_baseline());
    }

    #[test]
    fn test_invalid_quality() {
        let img = GrayImage::new(2, 2);
        assert!(matches!(
            encode_gray(&img, 0),
            Err(UltraHdrError::InvalidQuality(0))
        ));
        assert!(encode_gray(&img, 101).is_err());
    }

    #[test]
    fn test_resample() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([10])));
        let out = resample(&img, 3, 5, Interpolation::Lanczos3).unwrap();
        assert_eq!((out.width(), out.height()), (3, 5));
        assert!(resample(&img, 0, 5, Interpolation::Nearest).is_err());
        assert_eq!(filter_type(Interpolation::Bilinear), FilterType::Triangle);
    }

    #[test]
    fn test_probe_rejects_garbage() {
        assert!(probe_dimensions(&[0x00, 0x01, 0x02]).is_err());
    }
}
