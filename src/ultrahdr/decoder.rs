//! UltraHDR decoding and inspection.

use super::split::split;
use crate::error::{Result, UltraHdrError};
use crate::gainmap::decode::apply_gain_map;
use crate::gainmap::pixels::{GainMapPixels, PixelSource};
use crate::jpeg::codec::probe_dimensions;
use crate::jpeg::parser::{
    ensure_baseline, extract_app_segments, extract_container_header_segments, find_iso, find_xmp,
};
use crate::jpeg::scanner::scan_jpegs;
use crate::types::{DecodeOptions, GainMapMetadata, HdrImage, UltraHdrProbeResult, UltraHdrSplitResult};
use log::debug;

/// HDR reconstruction of a container.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub hdr: HdrImage,
    pub metadata: GainMapMetadata,
}

/// Decodes a container and applies its gain map.
pub fn decode(data: &[u8], options: &DecodeOptions) -> Result<Decoded> {
    if data.len() < 4 {
        return Err(UltraHdrError::Truncated("input too small".into()));
    }
    let parts = split(data)?;
    let sdr = PixelSource::decode(&parts.primary_jpeg)?;
    let gain_map = GainMapPixels::decode(&parts.gainmap_jpeg)?;
    debug!(
        "decoding {:?} base with {}x{} gain map ({} channel)",
        sdr.dimensions(),
        gain_map.width,
        gain_map.height,
        gain_map.channels
    );
    let hdr = apply_gain_map(&sdr, &gain_map, &parts.metadata, options.max_display_boost)?;
    Ok(Decoded {
        hdr,
        metadata: parts.metadata,
    })
}

/// Splits a container and reports the dimensions of both streams.
pub fn split_with_dimensions(data: &[u8]) -> Result<UltraHdrSplitResult> {
    let parts = split(data)?;
    let (width, height) = probe_dimensions(&parts.primary_jpeg)?;
    let (gain_map_width, gain_map_height) = probe_dimensions(&parts.gainmap_jpeg)?;
    Ok(UltraHdrSplitResult {
        primary_image: parts.primary_jpeg,
        gain_map: parts.gainmap_jpeg,
        metadata: parts.metadata,
        width,
        height,
        gain_map_width,
        gain_map_height,
    })
}

/// Returns the primary stream alone, as a plain JPEG.
pub fn extract_base(data: &[u8]) -> Result<Vec<u8>> {
    let ranges = scan_jpegs(data)?;
    Ok(data[ranges[0].clone()].to_vec())
}

/// Inspects a buffer without decoding pixels.
///
/// Never fails: anything that cannot be read is reported as absent.
pub fn probe(data: &[u8]) -> UltraHdrProbeResult {
    let mut result = UltraHdrProbeResult::default();
    let Ok(ranges) = scan_jpegs(data) else {
        return result;
    };

    let primary = &data[ranges[0].clone()];
    if ensure_baseline(primary).is_ok() {
        if let Ok((w, h)) = probe_dimensions(primary) {
            result.has_primary_image = true;
            result.width = w;
            result.height = h;
        }
    }
    if let Ok(header) = extract_container_header_segments(data) {
        result.has_xmp_metadata = find_xmp(&header).is_some();
    }

    let Some(range) = ranges.get(1) else {
        return result;
    };
    let gainmap = &data[range.clone()];
    if let Ok((w, h)) = probe_dimensions(gainmap) {
        result.has_gain_map = true;
        result.gain_map_width = w;
        result.gain_map_height = h;
    }
    if let Ok(segments) = extract_app_segments(gainmap) {
        result.has_xmp_metadata |= find_xmp(&segments).is_some();
        result.has_iso_metadata = find_iso(&segments).is_some();
    }

    if let Ok(parts) = split(data) {
        result.hdr_capacity = parts.metadata.hdr_capacity_max;
        result.metadata_version = parts.metadata.version;
    }
    result.is_valid = result.has_primary_image
        && result.has_gain_map
        && (result.has_xmp_metadata || result.has_iso_metadata)
        && !result.metadata_version.is_empty();
    result
}
