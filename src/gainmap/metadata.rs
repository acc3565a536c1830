//! Sanity checks and summaries over gain map metadata.

use super::math::log2f;
use crate::error::{Result, UltraHdrError};
use crate::types::GainMapMetadata;

/// Headroom (in stops) below which a gain map is not worth applying.
const MEANINGFUL_HEADROOM_STOPS: f32 = 0.5;

/// Validates gain map metadata for correctness.
pub fn validate_metadata(metadata: &GainMapMetadata) -> Result<()> {
    if metadata.version.is_empty() {
        return Err(UltraHdrError::MetadataError("missing version".into()));
    }

    for i in 0..3 {
        let (min, max) = (metadata.min_content_boost[i], metadata.max_content_boost[i]);
        if !(min > 0.0 && min.is_finite() && max.is_finite()) {
            return Err(UltraHdrError::MetadataError(format!(
                "content boost [{}] must be positive and finite, got {}..{}",
                i, min, max
            )));
        }
        if min > max {
            return Err(UltraHdrError::MetadataError(format!(
                "min_content_boost[{}] ({}) > max_content_boost[{}] ({})",
                i, min, i, max
            )));
        }
    }

    for (i, &g) in metadata.gamma.iter().enumerate() {
        if !(g > 0.0 && g.is_finite()) {
            return Err(UltraHdrError::MetadataError(format!(
                "gamma[{}] must be positive, got {}",
                i, g
            )));
        }
    }

    if metadata
        .offset_sdr
        .iter()
        .chain(metadata.offset_hdr.iter())
        .any(|v| !v.is_finite())
    {
        return Err(UltraHdrError::MetadataError("offsets must be finite".into()));
    }

    if !(metadata.hdr_capacity_min > 0.0) || metadata.hdr_capacity_min > metadata.hdr_capacity_max {
        return Err(UltraHdrError::MetadataError(format!(
            "invalid HDR capacity range {}..{}",
            metadata.hdr_capacity_min, metadata.hdr_capacity_max
        )));
    }

    Ok(())
}

/// Headroom of the rendition, in stops above SDR white.
pub fn estimate_hdr_headroom(metadata: &GainMapMetadata) -> f32 {
    log2f(metadata.hdr_capacity_max.max(1.0))
}

/// Whether the gain map adds enough headroom to matter.
pub fn is_meaningful_hdr(metadata: &GainMapMetadata) -> bool {
    estimate_hdr_headroom(metadata) > MEANINGFUL_HEADROOM_STOPS
}
