//! Replacing the SDR base of a container.

use super::container::assemble_container;
use super::split::split;
use crate::error::Result;
use crate::gainmap::pixels::{GainMapPixels, PixelSource};
use crate::gainmap::rebase::rebase_gain_map;
use crate::jpeg::codec::{encode_rgb, validate_quality};
use crate::jpeg::parser::{ensure_baseline, extract_exif_and_icc};
use crate::types::RebaseOptions;
use log::info;

/// A rebased container and its two streams.
#[derive(Debug, Clone)]
pub struct Rebased {
    pub container: Vec<u8>,
    pub primary: Vec<u8>,
    pub gainmap: Vec<u8>,
}

/// Swaps in `new_sdr` as the primary image and recomputes the gain map so
/// the HDR rendition stays as close as possible to the original.
///
/// The new base must have the same dimensions as the old one. Its bytes are
/// embedded as given unless `options.reencode_base` is set. EXIF and ICC
/// come from the new base, or from the old primary when the new base has
/// neither.
pub fn rebase_ultrahdr(data: &[u8], new_sdr: &[u8], options: &RebaseOptions) -> Result<Rebased> {
    validate_quality(options.gain_map_quality)?;
    if options.reencode_base {
        validate_quality(options.base_quality)?;
    } else {
        ensure_baseline(new_sdr)?;
    }

    let parts = split(data)?;
    let old_sdr = PixelSource::decode(&parts.primary_jpeg)?;
    let new_pixels = PixelSource::decode(new_sdr)?;
    let gain_map = GainMapPixels::decode(&parts.gainmap_jpeg)?;

    let rebased = rebase_gain_map(&old_sdr, &new_pixels, &gain_map, &parts.metadata)?;
    let gainmap = rebased.encode(options.gain_map_quality)?;

    let primary = if options.reencode_base {
        encode_rgb(&new_pixels.to_rgb8(), options.base_quality)?
    } else {
        new_sdr.to_vec()
    };

    let (mut exif, mut icc) = extract_exif_and_icc(&primary)?;
    if exif.is_none() && icc.is_empty() {
        (exif, icc) = extract_exif_and_icc(&parts.primary_jpeg)?;
    }

    let container = assemble_container(
        &primary,
        &gainmap,
        exif.as_deref(),
        &icc,
        parts.segments.primary_xmp.as_deref(),
        parts.segments.secondary_xmp.as_deref(),
        parts.segments.secondary_iso.as_deref(),
    )?;
    info!(
        "rebased {}x{} container onto a new base",
        rebased.width, rebased.height
    );

    Ok(Rebased {
        container,
        primary,
        gainmap,
    })
}
