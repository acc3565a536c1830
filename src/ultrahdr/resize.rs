//! Resizing UltraHDR containers and plain JPEGs.

use super::container::assemble_container;
use super::split::split;
use crate::error::{Result, UltraHdrError};
use crate::gainmap::color::{convert_image_profile, detect_color_profile, ColorProfile};
use crate::gainmap::iso21496::build_iso_payload;
use crate::jpeg::codec::{decode_jpeg, encode_dynamic, encode_rgb, resample, validate_quality};
use crate::jpeg::parser::{collect_icc_profile, extract_exif_and_icc, insert_app_segments, AppSegment, APP1, APP2};
use crate::types::{Interpolation, ResizeOptions};
use log::{debug, warn};

/// A resized container and its two re-encoded streams.
#[derive(Debug, Clone)]
pub struct Resized {
    pub container: Vec<u8>,
    pub primary: Vec<u8>,
    pub gainmap: Vec<u8>,
}

fn check_target(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(UltraHdrError::InvalidDimensions(format!(
            "resize target {}x{}",
            width, height
        )));
    }
    Ok(())
}

/// Gain map size for a resized image: the old map-to-image ratio applied to
/// the new size, at least one pixel.
fn scaled_gain_map_size(old_image: (u32, u32), old_map: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let scale = |map: u32, image: u32, target: u32| {
        let v = (target as u64 * map as u64 + image as u64 / 2) / image.max(1) as u64;
        (v as u32).max(1)
    };
    (
        scale(old_map.0, old_image.0, target.0),
        scale(old_map.1, old_image.1, target.1),
    )
}

/// Resizes a container's primary image to `width` x `height` and its gain
/// map proportionally, keeping the metadata.
pub fn resize_ultrahdr(data: &[u8], width: u32, height: u32, options: &ResizeOptions) -> Result<Resized> {
    check_target(width, height)?;
    validate_quality(options.primary_quality)?;
    validate_quality(options.gain_map_quality)?;

    let parts = split(data)?;
    let primary_img = decode_jpeg(&parts.primary_jpeg)?;
    let gainmap_img = decode_jpeg(&parts.gainmap_jpeg)?;

    let (map_w, map_h) = scaled_gain_map_size(
        (primary_img.width(), primary_img.height()),
        (gainmap_img.width(), gainmap_img.height()),
        (width, height),
    );
    debug!(
        "resizing {}x{} -> {}x{}, gain map -> {}x{}",
        primary_img.width(),
        primary_img.height(),
        width,
        height,
        map_w,
        map_h
    );

    let primary = encode_dynamic(
        &resample(&primary_img, width, height, options.interpolation)?,
        options.primary_quality,
    )?;
    let gainmap = encode_dynamic(
        &resample(&gainmap_img, map_w, map_h, options.interpolation)?,
        options.gain_map_quality,
    )?;

    let (exif, icc) = extract_exif_and_icc(&parts.primary_jpeg)?;
    let secondary_iso = match &parts.segments.secondary_iso {
        Some(iso) => iso.clone(),
        None => build_iso_payload(&parts.metadata)?,
    };
    let container = assemble_container(
        &primary,
        &gainmap,
        exif.as_deref(),
        &icc,
        parts.segments.primary_xmp.as_deref(),
        parts.segments.secondary_xmp.as_deref(),
        Some(&secondary_iso),
    )?;

    Ok(Resized {
        container,
        primary,
        gainmap,
    })
}

/// Resizes a plain JPEG.
///
/// With `keep_meta` the EXIF and ICC segments are copied over. Without it
/// the output carries no metadata, so wide-gamut sources are converted to
/// sRGB first.
pub fn resize_jpeg(
    data: &[u8],
    width: u32,
    height: u32,
    quality: u8,
    interpolation: Interpolation,
    keep_meta: bool,
) -> Result<Vec<u8>> {
    check_target(width, height)?;
    validate_quality(quality)?;

    let (exif, icc) = match extract_exif_and_icc(data) {
        Ok(found) => found,
        Err(e) => {
            warn!("ignoring unreadable metadata: {}", e);
            (None, Vec::new())
        }
    };
    let profile = detect_color_profile(&collect_icc_profile(&icc));

    let img = decode_jpeg(data)?;
    let resized = resample(&img, width, height, interpolation)?;

    if keep_meta {
        let out = encode_dynamic(&resized, quality)?;
        let mut segments = Vec::with_capacity(1 + icc.len());
        if let Some(exif) = exif {
            segments.push(AppSegment::new(APP1, exif));
        }
        segments.extend(icc.into_iter().map(|chunk| AppSegment::new(APP2, chunk)));
        if segments.is_empty() {
            return Ok(out);
        }
        return insert_app_segments(&out, &segments);
    }

    if profile.is_wide_gamut() {
        debug!("converting {:?} to sRGB", profile.gamut);
        let converted = convert_image_profile(&resized.to_rgb8(), profile, ColorProfile::SRGB);
        return encode_rgb(&converted, quality);
    }
    encode_dynamic(&resized, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::codec::{encode_gray, probe_dimensions};
    use crate::jpeg::parser::{extract_app_segments, EXIF_SIGNATURE, ICC_SIGNATURE};
    use crate::types::GainMapMetadata;
    use crate::ultrahdr::split::join;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn gray_jpeg(w: u32, h: u32) -> Vec<u8> {
        encode_gray(&GrayImage::from_fn(w, h, |x, y| Luma([(x + y) as u8])), 90).unwrap()
    }

    #[test]
    fn test_scaled_gain_map_size() {
        assert_eq!(scaled_gain_map_size((400, 300), (100, 75), (200, 150)), (50, 38));
        assert_eq!(scaled_gain_map_size((400, 300), (400, 300), (10, 5)), (10, 5));
        assert_eq!(scaled_gain_map_size((400, 300), (4, 3), (10, 10)), (1, 1));
    }

    #[test]
    fn test_resize_container() {
        let data = join(&gray_jpeg(64, 32), &gray_jpeg(16, 8), &GainMapMetadata::default()).unwrap();
        let out = resize_ultrahdr(&data, 32, 16, &ResizeOptions::default()).unwrap();
        assert_eq!(probe_dimensions(&out.primary).unwrap(), (32, 16));
        assert_eq!(probe_dimensions(&out.gainmap).unwrap(), (8, 4));

        let parts = split(&out.container).unwrap();
        assert_eq!(parts.metadata, split(&data).unwrap().metadata);
        assert!(parts.segments.primary_xmp.is_some());
    }

    #[test]
    fn test_resize_rejects_zero_target() {
        let data = join(&gray_jpeg(8, 8), &gray_jpeg(8, 8), &GainMapMetadata::default()).unwrap();
        assert!(resize_ultrahdr(&data, 0, 8, &ResizeOptions::default()).is_err());
        assert!(resize_jpeg(&gray_jpeg(8, 8), 8, 0, 80, Interpolation::Nearest, true).is_err());
    }

    #[test]
    fn test_resize_jpeg_metadata() {
        let mut exif = EXIF_SIGNATURE.to_vec();
        exif.extend_from_slice(b"II*\0");
        let mut icc = ICC_SIGNATURE.to_vec();
        icc.extend_from_slice(&[1, 1]);
        icc.extend_from_slice(b"....Display P3....");
        let src = encode_rgb(&RgbImage::from_pixel(16, 16, Rgb([250, 10, 10])), 95).unwrap();
        let src = insert_app_segments(
            &src,
            &[AppSegment::new(APP1, exif.clone()), AppSegment::new(APP2, icc.clone())],
        )
        .unwrap();

        let kept = resize_jpeg(&src, 8, 8, 90, Interpolation::Bilinear, true).unwrap();
        let segments = extract_app_segments(&kept).unwrap();
        assert!(segments.iter().any(|s| s.payload == exif));
        assert!(segments.iter().any(|s| s.payload == icc));

        let dropped = resize_jpeg(&src, 8, 8, 90, Interpolation::Bilinear, false).unwrap();
        assert!(extract_app_segments(&dropped).unwrap().is_empty());
        assert_eq!(probe_dimensions(&dropped).unwrap(), (8, 8));
        // P3 red lies outside sRGB and clips to full red.
        let px = decode_jpeg(&dropped).unwrap().to_rgb8().get_pixel(4, 4).0;
        assert!(px[0] > 240, "{:?}", px);
    }
}
