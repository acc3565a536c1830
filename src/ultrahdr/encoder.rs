//! UltraHDR JPEG encoder.
//!
//! Creates UltraHDR JPEG files from SDR + HDR image pairs.

use super::container::assemble_with_metadata;
use crate::error::{Result, UltraHdrError};
use crate::gainmap::encode::{effective_options, generate_gain_map, metadata_for_encode};
use crate::gainmap::pixels::PixelSource;
use crate::jpeg::codec::{encode_rgb, validate_quality};
use crate::jpeg::parser::ensure_baseline;
use crate::types::{EncodeOptions, GainMapMetadata, HdrImage};
use log::info;

/// Output of an encode: the container and the metadata written into it.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub container: Vec<u8>,
    pub metadata: GainMapMetadata,
}

/// Encodes an UltraHDR JPEG around an existing SDR JPEG.
///
/// The SDR JPEG is embedded as the primary image (its EXIF and ICC profile
/// are kept); its pixels are only decoded to compute the gain map.
///
/// # Arguments
/// * `sdr_jpeg` - SDR JPEG image bytes (baseline, sRGB)
/// * `hdr` - HDR image, linear, 1.0 at `options.hdr_white_nits`
/// * `options` - Encoding options
pub fn encode(sdr_jpeg: &[u8], hdr: &HdrImage, options: &EncodeOptions) -> Result<Encoded> {
    let options = validate_options(options)?;
    ensure_baseline(sdr_jpeg)?;
    let sdr = PixelSource::decode(sdr_jpeg)?;
    build(sdr_jpeg, &sdr, hdr, &options)
}

/// Encodes an UltraHDR JPEG from decoded SDR pixels, compressing them at
/// `options.base_quality`.
pub fn encode_pixels(sdr: &PixelSource, hdr: &HdrImage, options: &EncodeOptions) -> Result<Encoded> {
    let options = validate_options(options)?;
    let primary = encode_rgb(&sdr.to_rgb8(), options.base_quality)?;
    build(&primary, sdr, hdr, &options)
}

fn build(primary: &[u8], sdr: &PixelSource, hdr: &HdrImage, options: &EncodeOptions) -> Result<Encoded> {
    let metadata = metadata_for_encode(options);
    let gain_map = generate_gain_map(hdr, sdr, &metadata, options)?;
    let gain_map_jpeg = gain_map.encode(options.gain_map_quality)?;
    let container = assemble_with_metadata(primary, &gain_map_jpeg, &metadata)?;
    info!(
        "encoded {}x{} UltraHDR, gain map {}x{}, {} bytes",
        hdr.width,
        hdr.height,
        gain_map.width,
        gain_map.height,
        container.len()
    );
    Ok(Encoded {
        container,
        metadata,
    })
}

/// Fills defaults and rejects options that cannot be encoded.
fn validate_options(options: &EncodeOptions) -> Result<EncodeOptions> {
    let options = effective_options(options);
    validate_quality(options.base_quality)?;
    validate_quality(options.gain_map_quality)?;
    if options.hdr_white_nits < crate::gainmap::math::SDR_WHITE_NITS {
        return Err(UltraHdrError::MetadataError(format!(
            "HDR white {} nits is below SDR white",
            options.hdr_white_nits
        )));
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColorGamut;
    use crate::ultrahdr::split::split;
    use image::{DynamicImage, Rgb, RgbImage};

    fn inputs(w: u32, h: u32) -> (PixelSource, HdrImage) {
        let sdr = RgbImage::from_fn(w, h, |x, _| Rgb([(x * 16) as u8, 128, 200]));
        let hdr = HdrImage {
            width: w,
            height: h,
            pixels: vec![0.5; (w * h * 3) as usize],
            gamut: ColorGamut::Srgb,
        };
        (PixelSource::from_dynamic(DynamicImage::ImageRgb8(sdr)), hdr)
    }

    #[test]
    fn test_encode_pixels() {
        let (sdr, hdr) = inputs(16, 16);
        let encoded = encode_pixels(&sdr, &hdr, &EncodeOptions::default()).unwrap();
        let parts = split(&encoded.container).unwrap();
        assert!((parts.metadata.max_content_boost[0] - 1000.0 / 203.0).abs() < 1e-3);
        assert_eq!(parts.metadata.offset_sdr, [0.0; 3]);
        assert_eq!(crate::jpeg::codec::probe_dimensions(&parts.gainmap_jpeg).unwrap(), (4, 4));
    }

    #[test]
    fn test_encode_keeps_given_primary_body() {
        let (sdr, hdr) = inputs(8, 8);
        let sdr_jpeg = encode_rgb(&sdr.to_rgb8(), 90).unwrap();
        let encoded = encode(&sdr_jpeg, &hdr, &EncodeOptions::default()).unwrap();
        let parts = split(&encoded.container).unwrap();
        let stripped = crate::jpeg::parser::strip_app_segments(&sdr_jpeg).unwrap();
        assert!(parts.primary_jpeg.ends_with(&stripped[2..]));
    }

    #[test]
    fn test_rejects_bad_options() {
        let (sdr, hdr) = inputs(4, 4);
        let opts = EncodeOptions {
            base_quality: 101,
            ..EncodeOptions::default()
        };
        assert!(encode_pixels(&sdr, &hdr, &opts).is_err());

        let opts = EncodeOptions {
            hdr_white_nits: 100.0,
            ..EncodeOptions::default()
        };
        assert!(encode_pixels(&sdr, &hdr, &opts).is_err());
    }

    #[test]
    fn test_dimension_mismatch() {
        let (sdr, _) = inputs(4, 4);
        let (_, hdr) = inputs(8, 4);
        let err = encode_pixels(&sdr, &hdr, &EncodeOptions::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DimensionMismatch);
    }
}
