//! Container assembly.
//!
//! Output layout:
//!
//! ```text
//! SOI [EXIF] [primary XMP] ISO-version MPF [ICC...] <primary body>
//! SOI [gain map XMP] [gain map ISO] <gain map body>
//! ```
//!
//! APP and COM segments of both input streams are dropped before the
//! metadata above is written; the MPF directory is written as a placeholder
//! and patched once the final byte positions are known.

use crate::error::{Result, UltraHdrError};
use crate::gainmap::iso21496::{build_iso_payload, iso_version_only_payload};
use crate::jpeg::mpf;
use crate::jpeg::parser::{extract_exif_and_icc, strip_app_segments, APP1, APP2, ISO_NAMESPACE, MARKER_PREFIX, SOI};
use crate::jpeg::writer::{app_size, JpegWriter};
use crate::jpeg::xmp::{build_gainmap_xmp, build_primary_xmp, update_item_length};
use crate::types::GainMapMetadata;
use log::debug;

/// Length of the ISO payload prefix kept in the primary image: namespace,
/// NUL, `min_version` and `writer_version`.
const ISO_VERSION_PREFIX_LEN: usize = ISO_NAMESPACE.len() + 4;

fn check_soi(jpeg: &[u8], what: &str) -> Result<()> {
    if jpeg.len() < 2 || jpeg[0] != MARKER_PREFIX || jpeg[1] != SOI {
        return Err(UltraHdrError::InvalidJpeg(format!("{} is not a JPEG", what)));
    }
    Ok(())
}

/// Version-only ISO payload for the primary header, derived from the gain
/// map's ISO payload when there is one.
fn primary_iso_payload(secondary_iso: Option<&[u8]>) -> Vec<u8> {
    match secondary_iso {
        Some(iso) if iso.len() > ISO_VERSION_PREFIX_LEN => iso[..ISO_VERSION_PREFIX_LEN].to_vec(),
        Some(iso) if !iso.is_empty() => iso.to_vec(),
        _ => iso_version_only_payload(),
    }
}

/// Assembles a container from two JPEG streams and raw APP payloads.
///
/// Payloads include their signatures (`Exif\0\0`, XMP namespace, ...). A
/// primary XMP payload gets its `Item:Length` rewritten to the size of the
/// gain map stream as written.
pub fn assemble_container(
    primary: &[u8],
    gainmap: &[u8],
    exif: Option<&[u8]>,
    icc: &[Vec<u8>],
    primary_xmp: Option<&[u8]>,
    secondary_xmp: Option<&[u8]>,
    secondary_iso: Option<&[u8]>,
) -> Result<Vec<u8>> {
    check_soi(primary, "primary image")?;
    check_soi(gainmap, "gain map")?;

    let primary_body = strip_app_segments(primary)?;
    let gainmap_body = strip_app_segments(gainmap)?;

    let secondary_size = gainmap_body.len() + app_size(secondary_xmp) + app_size(secondary_iso);
    let primary_xmp = match primary_xmp {
        Some(xmp) if !xmp.is_empty() => Some(update_item_length(xmp, secondary_size)?),
        _ => None,
    };
    let primary_iso = primary_iso_payload(secondary_iso);

    let icc_len: usize = icc.iter().map(|c| c.len() + 4).sum();
    let capacity = primary_body.len()
        + secondary_size
        + app_size(exif)
        + app_size(primary_xmp.as_deref())
        + primary_iso.len()
        + mpf::MPF_PAYLOAD_SIZE
        + icc_len
        + 16;
    let mut out = JpegWriter::with_capacity(capacity);

    out.write_soi();
    out.write_optional_segment(APP1, exif)?;
    out.write_optional_segment(APP1, primary_xmp.as_deref())?;
    out.write_app_segment(APP2, &primary_iso)?;
    out.write_app_segment(APP2, &mpf::generate(0, 0, 0, 0))?;
    for chunk in icc {
        out.write_optional_segment(APP2, Some(chunk))?;
    }
    out.write_raw(&primary_body[2..]);

    out.write_soi();
    out.write_optional_segment(APP1, secondary_xmp)?;
    out.write_optional_segment(APP2, secondary_iso)?;
    out.write_raw(&gainmap_body[2..]);

    let mut container = out.into_inner();
    mpf::patch_in_place(&mut container)?;
    debug!(
        "assembled container: {} bytes, gain map stream {} bytes",
        container.len(),
        secondary_size
    );
    Ok(container)
}

/// Assembles a container from typed metadata, keeping the primary image's
/// EXIF and ICC profile.
pub fn assemble_with_metadata(
    primary: &[u8],
    gainmap: &[u8],
    metadata: &GainMapMetadata,
) -> Result<Vec<u8>> {
    let (exif, icc) = extract_exif_and_icc(primary)?;
    let primary_xmp = build_primary_xmp(metadata, 0)?;
    let secondary_xmp = build_gainmap_xmp(metadata)?;
    let secondary_iso = build_iso_payload(metadata)?;
    assemble_container(
        primary,
        gainmap,
        exif.as_deref(),
        &icc,
        Some(&primary_xmp),
        Some(&secondary_xmp),
        Some(&secondary_iso),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::codec::encode_gray;
    use crate::jpeg::parser::{extract_app_segments, find_iso, find_xmp, EXIF_SIGNATURE, ICC_SIGNATURE};
    use crate::jpeg::scanner::scan_jpegs;
    use image::{GrayImage, Luma};

    fn small_jpeg(v: u8) -> Vec<u8> {
        encode_gray(&GrayImage::from_pixel(8, 8, Luma([v])), 90).unwrap()
    }

    fn exif() -> Vec<u8> {
        let mut p = EXIF_SIGNATURE.to_vec();
        p.extend_from_slice(b"MM\0*\0\0\0\x08\0\0");
        p
    }

    fn icc_chunk(seq: u8) -> Vec<u8> {
        let mut p = ICC_SIGNATURE.to_vec();
        p.extend_from_slice(&[seq, 2]);
        p.extend_from_slice(b"profile");
        p
    }

    #[test]
    fn test_marker_order() {
        let meta = GainMapMetadata::default();
        let primary_xmp = build_primary_xmp(&meta, 0).unwrap();
        let gm_xmp = build_gainmap_xmp(&meta).unwrap();
        let gm_iso = build_iso_payload(&meta).unwrap();
        let icc = vec![icc_chunk(1), icc_chunk(2)];
        let exif = exif();

        let out = assemble_container(
            &small_jpeg(10),
            &small_jpeg(200),
            Some(&exif),
            &icc,
            Some(&primary_xmp),
            Some(&gm_xmp),
            Some(&gm_iso),
        )
        .unwrap();

        let ranges = scan_jpegs(&out).unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].end, out.len());

        let primary = extract_app_segments(&out[ranges[0].clone()]).unwrap();
        assert!(primary[0].is_exif());
        assert!(primary[1].is_xmp());
        assert!(primary[2].is_iso());
        assert_eq!(primary[2].payload.len(), ISO_VERSION_PREFIX_LEN);
        assert!(primary[3].is_mpf());
        assert!(primary[4].is_icc_profile());
        assert!(primary[5].is_icc_profile());

        let secondary = extract_app_segments(&out[ranges[1].clone()]).unwrap();
        assert_eq!(find_xmp(&secondary), Some(gm_xmp.as_slice()));
        assert_eq!(find_iso(&secondary), Some(gm_iso.as_slice()));

        let xmp = String::from_utf8_lossy(&primary[1].payload).into_owned();
        let expected = format!("Item:Length=\"{}\"", ranges[1].len());
        assert!(xmp.contains(&expected), "{}", xmp);
    }

    #[test]
    fn test_mpf_matches_layout() {
        let meta = GainMapMetadata::default();
        let out = assemble_with_metadata(&small_jpeg(1), &small_jpeg(2), &meta).unwrap();
        let loc = mpf::find(&out).unwrap().unwrap();
        let info = mpf::parse(&out[loc.payload_offset..loc.payload_offset + loc.payload_len]).unwrap();
        let ranges = crate::jpeg::scanner::scan_linear(&out).unwrap();
        assert_eq!(info.primary_size, ranges[0].len());
        assert_eq!(info.secondary_size, ranges[1].len());
        assert_eq!(loc.tiff_header_offset() + info.secondary_offset, ranges[1].start);
    }

    #[test]
    fn test_input_app_segments_replaced() {
        let meta = GainMapMetadata::default();
        let once = assemble_with_metadata(&small_jpeg(1), &small_jpeg(2), &meta).unwrap();
        let ranges = scan_jpegs(&once).unwrap();
        // Feeding a container's own streams back in must not duplicate segments.
        let twice = assemble_with_metadata(
            &once[ranges[0].clone()],
            &once[ranges[1].clone()],
            &meta,
        )
        .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_primary_iso_payload() {
        assert_eq!(primary_iso_payload(None), iso_version_only_payload());
        let full = build_iso_payload(&GainMapMetadata::default()).unwrap();
        assert_eq!(primary_iso_payload(Some(&full)), full[..ISO_VERSION_PREFIX_LEN].to_vec());
    }

    #[test]
    fn test_rejects_non_jpeg() {
        let err = assemble_with_metadata(b"nope", &small_jpeg(1), &GainMapMetadata::default())
            .unwrap_err();
        assert!(err.kind().is_malformed_container());
    }
}
