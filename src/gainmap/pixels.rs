//! Pixel buffers consumed and produced by the gain map routines.

use crate::error::{Result, UltraHdrError};
use crate::jpeg::codec;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageBuffer, Luma, Pixel, RgbImage, RgbaImage, Rgba};

/// Decoded SDR pixels in one of the layouts the codec produces.
#[derive(Debug, Clone)]
pub enum PixelSource {
    Gray8(GrayImage),
    Gray16(ImageBuffer<Luma<u16>, Vec<u16>>),
    Rgb8(RgbImage),
    Rgba8(RgbaImage),
    Rgba16(ImageBuffer<Rgba<u16>, Vec<u16>>),
}

impl PixelSource {
    /// Wraps a decoded image; alpha-carrying gray keeps its luma only and
    /// float or 16-bit RGB widens to RGBA16.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageLuma8(i) => PixelSource::Gray8(i),
            DynamicImage::ImageLumaA8(_) => PixelSource::Gray8(img.into_luma8()),
            DynamicImage::ImageLuma16(i) => PixelSource::Gray16(i),
            DynamicImage::ImageLumaA16(_) => PixelSource::Gray16(img.into_luma16()),
            DynamicImage::ImageRgb8(i) => PixelSource::Rgb8(i),
            DynamicImage::ImageRgba8(i) => PixelSource::Rgba8(i),
            DynamicImage::ImageRgba16(i) => PixelSource::Rgba16(i),
            DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgb32F(_)
            | DynamicImage::ImageRgba32F(_) => PixelSource::Rgba16(img.into_rgba16()),
            other => PixelSource::Rgb8(other.into_rgb8()),
        }
    }

    /// Decodes JPEG bytes.
    pub fn decode(jpeg: &[u8]) -> Result<Self> {
        Ok(Self::from_dynamic(codec::decode_jpeg(jpeg)?))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PixelSource::Gray8(i) => i.dimensions(),
            PixelSource::Gray16(i) => i.dimensions(),
            PixelSource::Rgb8(i) => i.dimensions(),
            PixelSource::Rgba8(i) => i.dimensions(),
            PixelSource::Rgba16(i) => i.dimensions(),
        }
    }

    pub fn is_gray(&self) -> bool {
        matches!(self, PixelSource::Gray8(_) | PixelSource::Gray16(_))
    }

    /// Interleaved RGB in [0, 1], still in the source's transfer encoding.
    /// Gray broadcasts to all three channels; alpha is dropped.
    pub fn to_rgb_f32(&self) -> Vec<f32> {
        match self {
            PixelSource::Gray8(i) => normalized(i, 255.0),
            PixelSource::Gray16(i) => normalized(i, 65535.0),
            PixelSource::Rgb8(i) => normalized(i, 255.0),
            PixelSource::Rgba8(i) => normalized(i, 255.0),
            PixelSource::Rgba16(i) => normalized(i, 65535.0),
        }
    }

    /// Converts to 8-bit RGB for re-encoding.
    pub fn to_rgb8(&self) -> RgbImage {
        match self {
            PixelSource::Rgb8(i) => i.clone(),
            PixelSource::Gray8(i) => DynamicImage::ImageLuma8(i.clone()).into_rgb8(),
            PixelSource::Gray16(i) => DynamicImage::ImageLuma16(i.clone()).into_rgb8(),
            PixelSource::Rgba8(i) => DynamicImage::ImageRgba8(i.clone()).into_rgb8(),
            PixelSource::Rgba16(i) => DynamicImage::ImageRgba16(i.clone()).into_rgb8(),
        }
    }
}

fn normalized<P>(img: &ImageBuffer<P, Vec<P::Subpixel>>, scale: f32) -> Vec<f32>
where
    P: Pixel,
    P::Subpixel: Into<f32>,
{
    let mut out = Vec::with_capacity(img.width() as usize * img.height() as usize * 3);
    for p in img.pixels() {
        let c = p.channels();
        if c.len() < 3 {
            let v: f32 = c[0].into();
            let v = v / scale;
            out.extend_from_slice(&[v, v, v]);
        } else {
            for &s in &c[..3] {
                let v: f32 = s.into();
                out.push(v / scale);
            }
        }
    }
    out
}

/// 8-bit gain map pixels, one (gray) or three (RGB) bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct GainMapPixels {
    pub width: u32,
    pub height: u32,
    pub channels: usize,
    pub data: Vec<u8>,
}

impl GainMapPixels {
    pub fn new(width: u32, height: u32, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0; width as usize * height as usize * channels],
        }
    }

    /// Gray JPEGs stay single-channel; everything else becomes RGB.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        match img {
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLumaA16(_) => Self {
                width,
                height,
                channels: 1,
                data: img.into_luma8().into_raw(),
            },
            other => Self {
                width,
                height,
                channels: 3,
                data: other.into_rgb8().into_raw(),
            },
        }
    }

    pub fn decode(jpeg: &[u8]) -> Result<Self> {
        let pixels = Self::from_dynamic(codec::decode_jpeg(jpeg)?);
        if pixels.width == 0 || pixels.height == 0 {
            return Err(UltraHdrError::InvalidDimensions("empty gain map".into()));
        }
        Ok(pixels)
    }

    pub fn is_gray(&self) -> bool {
        self.channels == 1
    }

    /// Gain bytes at `(x, y)`; gray maps repeat the single value.
    #[inline]
    pub fn sample(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * self.channels;
        if self.channels == 1 {
            [self.data[i]; 3]
        } else {
            [self.data[i], self.data[i + 1], self.data[i + 2]]
        }
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: [u8; 3]) {
        let i = (y as usize * self.width as usize + x as usize) * self.channels;
        self.data[i..i + self.channels].copy_from_slice(&value[..self.channels]);
    }

    /// Encodes as a baseline JPEG at `quality`.
    pub fn encode(&self, quality: u8) -> Result<Vec<u8>> {
        let color = if self.is_gray() {
            ExtendedColorType::L8
        } else {
            ExtendedColorType::Rgb8
        };
        codec::encode_jpeg(&self.data, self.width, self.height, color, quality)
    }
}
