//! Splitting a container into its streams and joining them back.

use super::bundle::MetadataBundle;
use super::container::{assemble_container, assemble_with_metadata};
use crate::error::{Result, UltraHdrError};
use crate::gainmap::iso21496::decode_iso_payload;
use crate::jpeg::parser::{
    extract_app_segments, extract_container_header_segments, extract_exif_and_icc, find_iso,
    find_xmp,
};
use crate::jpeg::scanner::scan_jpegs;
use crate::jpeg::xmp::parse_xmp;
use crate::types::GainMapMetadata;
use log::debug;

/// Raw metadata APP payloads, signatures included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataSegments {
    pub primary_xmp: Option<Vec<u8>>,
    pub primary_iso: Option<Vec<u8>>,
    pub secondary_xmp: Option<Vec<u8>>,
    pub secondary_iso: Option<Vec<u8>>,
}

impl MetadataSegments {
    /// Decodes the gain map metadata, preferring ISO 21496-1 over XMP.
    pub fn metadata(&self) -> Result<GainMapMetadata> {
        if let Some(iso) = &self.secondary_iso {
            debug!("gain map metadata from ISO 21496-1 segment");
            return decode_iso_payload(iso);
        }
        if let Some(xmp) = &self.secondary_xmp {
            debug!("gain map metadata from XMP segment");
            return parse_xmp(xmp);
        }
        Err(UltraHdrError::MissingMetadata)
    }
}

/// A container taken apart. Buffers are owned copies.
#[derive(Debug, Clone)]
pub struct SplitResult {
    pub primary_jpeg: Vec<u8>,
    pub gainmap_jpeg: Vec<u8>,
    pub metadata: GainMapMetadata,
    pub segments: MetadataSegments,
}

impl SplitResult {
    /// Reassembles the container from the split parts without touching
    /// pixel data.
    pub fn join(&self) -> Result<Vec<u8>> {
        join_with_segments(&self.primary_jpeg, &self.gainmap_jpeg, &self.segments)
    }

    /// Metadata needed to rebuild the container around new pixel data.
    pub fn bundle(&self) -> Result<MetadataBundle> {
        MetadataBundle::from_split(self)
    }
}

/// Splits a container into primary and gain map JPEG streams plus metadata.
pub fn split(data: &[u8]) -> Result<SplitResult> {
    let ranges = scan_jpegs(data)?;
    if ranges.len() < 2 {
        return Err(UltraHdrError::NoGainMap);
    }
    let primary_jpeg = data[ranges[0].clone()].to_vec();
    let gainmap_jpeg = data[ranges[1].clone()].to_vec();

    let header = extract_container_header_segments(data)?;
    let gainmap_segments = extract_app_segments(&gainmap_jpeg)?;
    let segments = MetadataSegments {
        primary_xmp: find_xmp(&header).map(<[u8]>::to_vec),
        primary_iso: find_iso(&header).map(<[u8]>::to_vec),
        secondary_xmp: find_xmp(&gainmap_segments).map(<[u8]>::to_vec),
        secondary_iso: find_iso(&gainmap_segments).map(<[u8]>::to_vec),
    };
    let metadata = segments.metadata()?;

    Ok(SplitResult {
        primary_jpeg,
        gainmap_jpeg,
        metadata,
        segments,
    })
}

/// Decodes just the gain map metadata.
pub fn extract_metadata(data: &[u8]) -> Result<GainMapMetadata> {
    let ranges = scan_jpegs(data)?;
    if ranges.len() < 2 {
        return Err(UltraHdrError::NoGainMap);
    }
    let segments = extract_app_segments(&data[ranges[1].clone()])?;
    MetadataSegments {
        secondary_xmp: find_xmp(&segments).map(<[u8]>::to_vec),
        secondary_iso: find_iso(&segments).map(<[u8]>::to_vec),
        ..MetadataSegments::default()
    }
    .metadata()
}

/// Builds a container from two JPEG streams and typed metadata.
pub fn join(primary: &[u8], gainmap: &[u8], metadata: &GainMapMetadata) -> Result<Vec<u8>> {
    assemble_with_metadata(primary, gainmap, metadata)
}

/// Builds a container from two JPEG streams and raw metadata payloads,
/// keeping the primary image's EXIF and ICC profile.
pub fn join_with_segments(
    primary: &[u8],
    gainmap: &[u8],
    segments: &MetadataSegments,
) -> Result<Vec<u8>> {
    if segments.secondary_xmp.as_ref().map_or(true, Vec::is_empty)
        && segments.secondary_iso.as_ref().map_or(true, Vec::is_empty)
    {
        return Err(UltraHdrError::MissingMetadata);
    }
    let (exif, icc) = extract_exif_and_icc(primary)?;
    assemble_container(
        primary,
        gainmap,
        exif.as_deref(),
        &icc,
        segments.primary_xmp.as_deref(),
        segments.secondary_xmp.as_deref(),
        segments.secondary_iso.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::gainmap::iso21496::build_iso_payload;
    use crate::jpeg::codec::encode_gray;
    use crate::jpeg::xmp::build_gainmap_xmp;
    use image::{GrayImage, Luma};

    fn small_jpeg(v: u8) -> Vec<u8> {
        encode_gray(&GrayImage::from_pixel(8, 8, Luma([v])), 90).unwrap()
    }

    fn container(meta: &GainMapMetadata) -> Vec<u8> {
        join(&small_jpeg(40), &small_jpeg(220), meta).unwrap()
    }

    #[test]
    fn test_split_join_roundtrip() {
        let mut meta = GainMapMetadata::for_sdr_base(6.0);
        meta.gamma = [1.0, 1.5, 2.0];
        let data = container(&meta);

        let first = split(&data).unwrap();
        assert_eq!(first.metadata.gamma, [1.0, 1.5, 2.0]);
        assert!(first.segments.primary_xmp.is_some());
        assert!(first.segments.primary_iso.is_some());

        let rejoined = first.join().unwrap();
        assert_eq!(rejoined, data);
        let second = split(&rejoined).unwrap();
        assert_eq!(second.primary_jpeg, first.primary_jpeg);
        assert_eq!(second.gainmap_jpeg, first.gainmap_jpeg);
        assert_eq!(second.segments, first.segments);
    }

    #[test]
    fn test_iso_preferred_over_xmp() {
        let iso_meta = GainMapMetadata::for_sdr_base(8.0);
        let xmp_meta = GainMapMetadata::for_sdr_base(2.0);
        let segments = MetadataSegments {
            secondary_xmp: Some(build_gainmap_xmp(&xmp_meta).unwrap()),
            secondary_iso: Some(build_iso_payload(&iso_meta).unwrap()),
            ..MetadataSegments::default()
        };
        let data = join_with_segments(&small_jpeg(1), &small_jpeg(2), &segments).unwrap();
        let meta = extract_metadata(&data).unwrap();
        assert!((meta.max_content_boost[0] - 8.0).abs() < 1e-4);

        let xmp_only = MetadataSegments {
            secondary_iso: None,
            ..segments
        };
        let data = join_with_segments(&small_jpeg(1), &small_jpeg(2), &xmp_only).unwrap();
        let meta = extract_metadata(&data).unwrap();
        assert!((meta.max_content_boost[0] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_plain_jpeg_has_no_gain_map() {
        let err = split(&small_jpeg(5)).unwrap_err();
        assert!(matches!(err, UltraHdrError::NoGainMap));
        assert_eq!(err.kind(), ErrorKind::MetadataMissing);
    }

    #[test]
    fn test_missing_metadata() {
        let mut data = small_jpeg(1);
        data.extend(small_jpeg(2));
        assert!(matches!(split(&data), Err(UltraHdrError::MissingMetadata)));
        assert!(join_with_segments(&small_jpeg(1), &small_jpeg(2), &MetadataSegments::default())
            .is_err());
    }

    #[test]
    fn test_empty_gain_map_payloads_rejected() {
        let segments = MetadataSegments {
            secondary_xmp: Some(Vec::new()),
            ..MetadataSegments::default()
        };
        let err = join_with_segments(&small_jpeg(1), &small_jpeg(2), &segments).unwrap_err();
        assert!(matches!(err, UltraHdrError::MissingMetadata));

        let both_empty = MetadataSegments {
            secondary_iso: Some(Vec::new()),
            ..segments
        };
        assert!(join_with_segments(&small_jpeg(1), &small_jpeg(2), &both_empty).is_err());
    }
}
