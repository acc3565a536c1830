//! Multi-Picture Format (CIPA DC-007) APP2 directory.
//!
//! The directory is a miniature big-endian TIFF IFD with three tags and two
//! 16-byte picture entries. Offsets inside it are relative to the TIFF
//! header, which starts right after the `MPF\0` signature.

use super::parser::{header_segments, APP2};
use super::scanner;
use crate::error::{Result, UltraHdrError};
use log::debug;

pub const MPF_SIGNATURE: &[u8] = b"MPF\0";

const NUM_PICTURES: usize = 2;
const TAG_COUNT: usize = 3;
const TAG_SIZE: usize = 12;
const ENTRY_SIZE: usize = 16;

const TYPE_LONG: u16 = 0x4;
const TYPE_UNDEFINED: u16 = 0x7;

const VERSION_TAG: u16 = 0xB000;
const NUMBER_OF_IMAGES_TAG: u16 = 0xB001;
const ENTRY_TAG: u16 = 0xB002;

const ATTR_FORMAT_JPEG: u32 = 0x0000000;
const ATTR_TYPE_PRIMARY: u32 = 0x030000;

/// Byte length of a generated MPF payload, signature included.
pub const MPF_PAYLOAD_SIZE: usize =
    MPF_SIGNATURE.len() + 4 + 4 + 2 + TAG_COUNT * TAG_SIZE + 4 + NUM_PICTURES * ENTRY_SIZE;

// Offset of the first picture entry from the TIFF header start.
const ENTRY_OFFSET: u32 = (8 + 2 + TAG_COUNT * TAG_SIZE + 4) as u32;

/// Picture sizes and secondary offset read from an MPF directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpfInfo {
    pub primary_size: usize,
    pub secondary_size: usize,
    /// Relative to the TIFF header inside the MPF payload
    pub secondary_offset: usize,
}

/// Builds an MPF payload describing a primary image and one secondary image.
pub fn generate(
    primary_size: u32,
    primary_offset: u32,
    secondary_size: u32,
    secondary_offset: u32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MPF_PAYLOAD_SIZE);
    buf.extend_from_slice(MPF_SIGNATURE);
    buf.extend_from_slice(&[0x4D, 0x4D, 0x00, 0x2A]);
    buf.extend_from_slice(&8u32.to_be_bytes());

    buf.extend_from_slice(&(TAG_COUNT as u16).to_be_bytes());

    buf.extend_from_slice(&VERSION_TAG.to_be_bytes());
    buf.extend_from_slice(&TYPE_UNDEFINED.to_be_bytes());
    buf.extend_from_slice(&4u32.to_be_bytes());
    buf.extend_from_slice(b"0100");

    buf.extend_from_slice(&NUMBER_OF_IMAGES_TAG.to_be_bytes());
    buf.extend_from_slice(&TYPE_LONG.to_be_bytes());
    buf.extend_from_slice(&1u32.to_be_bytes());
    buf.extend_from_slice(&(NUM_PICTURES as u32).to_be_bytes());

    buf.extend_from_slice(&ENTRY_TAG.to_be_bytes());
    buf.extend_from_slice(&TYPE_UNDEFINED.to_be_bytes());
    buf.extend_from_slice(&((ENTRY_SIZE * NUM_PICTURES) as u32).to_be_bytes());
    buf.extend_from_slice(&ENTRY_OFFSET.to_be_bytes());

    // next IFD
    buf.extend_from_slice(&0u32.to_be_bytes());

    for (attr, size, offset) in [
        (ATTR_FORMAT_JPEG | ATTR_TYPE_PRIMARY, primary_size, primary_offset),
        (ATTR_FORMAT_JPEG, secondary_size, secondary_offset),
    ] {
        buf.extend_from_slice(&attr.to_be_bytes());
        buf.extend_from_slice(&size.to_be_bytes());
        buf.extend_from_slice(&offset.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes());
    }

    buf
}

#[derive(Clone, Copy)]
enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    fn u16(self, b: &[u8], at: usize) -> u16 {
        let raw = [b[at], b[at + 1]];
        match self {
            ByteOrder::Big => u16::from_be_bytes(raw),
            ByteOrder::Little => u16::from_le_bytes(raw),
        }
    }

    fn u32(self, b: &[u8], at: usize) -> u32 {
        let raw = [b[at], b[at + 1], b[at + 2], b[at + 3]];
        match self {
            ByteOrder::Big => u32::from_be_bytes(raw),
            ByteOrder::Little => u32::from_le_bytes(raw),
        }
    }
}

fn malformed(msg: &str) -> UltraHdrError {
    UltraHdrError::MalformedMpf(msg.to_string())
}

/// Parses an MPF payload (signature included).
pub fn parse(payload: &[u8]) -> Result<MpfInfo> {
    if payload.len() < MPF_SIGNATURE.len() + 8 || !payload.starts_with(MPF_SIGNATURE) {
        return Err(malformed("signature missing"));
    }
    let tiff = &payload[MPF_SIGNATURE.len()..];

    let order = match (tiff[0], tiff[1]) {
        (0x4D, 0x4D) => ByteOrder::Big,
        (0x49, 0x49) => ByteOrder::Little,
        _ => return Err(malformed("invalid byte order")),
    };
    if order.u16(tiff, 2) != 0x002A {
        return Err(malformed("invalid TIFF magic"));
    }

    let ifd_offset = order.u32(tiff, 4) as usize;
    if ifd_offset.saturating_add(2) > tiff.len() {
        return Err(malformed("IFD offset out of bounds"));
    }
    let tag_count = order.u16(tiff, ifd_offset) as usize;

    let mut pos = ifd_offset + 2;
    let mut entry_offset = None;
    for _ in 0..tag_count {
        if pos + TAG_SIZE > tiff.len() {
            return Err(malformed("IFD truncated"));
        }
        let tag = order.u16(tiff, pos);
        let typ = order.u16(tiff, pos + 2);
        let count = order.u32(tiff, pos + 4) as usize;
        if tag == ENTRY_TAG && typ == TYPE_UNDEFINED && count >= ENTRY_SIZE {
            entry_offset = Some(order.u32(tiff, pos + 8) as usize);
            break;
        }
        pos += TAG_SIZE;
    }

    let entry_offset = entry_offset.ok_or_else(|| malformed("MP entry tag missing"))?;
    if entry_offset.saturating_add(ENTRY_SIZE * NUM_PICTURES) > tiff.len() {
        return Err(malformed("MP entries out of bounds"));
    }

    let mut info = MpfInfo {
        primary_size: 0,
        secondary_size: 0,
        secondary_offset: 0,
    };
    for i in 0..NUM_PICTURES {
        let at = entry_offset + i * ENTRY_SIZE;
        let attr = order.u32(tiff, at);
        let size = order.u32(tiff, at + 4) as usize;
        let offset = order.u32(tiff, at + 8) as usize;
        if attr & ATTR_TYPE_PRIMARY != 0 {
            info.primary_size = size;
        } else {
            info.secondary_size = size;
            info.secondary_offset = offset;
        }
    }

    if info.primary_size == 0 || info.secondary_size == 0 {
        return Err(malformed("picture size is zero"));
    }
    Ok(info)
}

/// Location of an MPF payload inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpfLocation {
    /// Offset of the first payload byte (the `M` of the signature)
    pub payload_offset: usize,
    pub payload_len: usize,
}

impl MpfLocation {
    /// Absolute offset of the TIFF header the directory offsets refer to.
    pub fn tiff_header_offset(&self) -> usize {
        self.payload_offset + MPF_SIGNATURE.len()
    }
}

/// Finds the first MPF APP2 segment in the header of `data`.
pub fn find(data: &[u8]) -> Result<Option<MpfLocation>> {
    for seg in header_segments(data)? {
        let seg = seg?;
        if seg.marker == APP2 && seg.payload.starts_with(MPF_SIGNATURE) {
            return Ok(Some(MpfLocation {
                payload_offset: seg.payload_offset(),
                payload_len: seg.payload.len(),
            }));
        }
    }
    Ok(None)
}

fn to_u32(v: usize, what: &str) -> Result<u32> {
    u32::try_from(v).map_err(|_| malformed(&format!("{} does not fit in 32 bits", what)))
}

/// Rewrites the MPF directory of a finished container with the true stream
/// sizes and secondary offset.
///
/// Ranges come from the linear marker scan, never from the directory being
/// replaced. The regenerated payload must be exactly as long as the one it
/// overwrites.
pub fn patch_in_place(container: &mut [u8]) -> Result<()> {
    let loc = find(container)?.ok_or_else(|| malformed("MPF segment not found"))?;

    let ranges = scanner::scan_linear(container)?;
    if ranges.len() < 2 {
        return Err(malformed("secondary image not found"));
    }
    let primary = &ranges[0];
    let secondary = &ranges[1];

    let tiff = loc.tiff_header_offset();
    if secondary.start < tiff {
        return Err(malformed("secondary image precedes MPF directory"));
    }

    let payload = generate(
        to_u32(primary.end - primary.start, "primary size")?,
        0,
        to_u32(secondary.end - secondary.start, "secondary size")?,
        to_u32(secondary.start - tiff, "secondary offset")?,
    );
    if payload.len() != loc.payload_len {
        return Err(malformed(&format!(
            "regenerated MPF is {} bytes, placeholder is {}",
            payload.len(),
            loc.payload_len
        )));
    }

    container[loc.payload_offset..loc.payload_offset + loc.payload_len].copy_from_slice(&payload);
    debug!(
        "patched MPF: primary {} bytes, secondary {} bytes at +{}",
        primary.end - primary.start,
        secondary.end - secondary.start,
        secondary.start - tiff
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::writer::JpegWriter;

    #[test]
    fn test_generate_layout() {
        let data = generate(1000, 0, 500, 900);
        assert_eq!(data.len(), MPF_PAYLOAD_SIZE);
        assert_eq!(MPF_PAYLOAD_SIZE, 86);
        assert!(data.starts_with(b"MPF\0MM\x00\x2A"));

        let info = parse(&data).unwrap();
        assert_eq!(info.primary_size, 1000);
        assert_eq!(info.secondary_size, 500);
        assert_eq!(info.secondary_offset, 900);
    }

    #[test]
    fn test_parse_little_endian() {
        let mut data = Vec::new();
        data.extend_from_slice(b"MPF\0II\x2A\x00");
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&ENTRY_TAG.to_le_bytes());
        data.extend_from_slice(&TYPE_UNDEFINED.to_le_bytes());
        data.extend_from_slice(&32u32.to_le_bytes());
        data.extend_from_slice(&26u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        for (attr, size, offset) in [(0x20030000u32, 10u32, 0u32), (0, 20, 30)] {
            data.extend_from_slice(&attr.to_le_bytes());
            data.extend_from_slice(&size.to_le_bytes());
            data.extend_from_slice(&offset.to_le_bytes());
            data.extend_from_slice(&[0; 4]);
        }
        let info = parse(&data).unwrap();
        assert_eq!(info.primary_size, 10);
        assert_eq!(info.secondary_size, 20);
        assert_eq!(info.secondary_offset, 30);
    }

    #[test]
    fn test_zero_primary_size_is_malformed() {
        let data = generate(0, 0, 500, 900);
        assert!(matches!(parse(&data), Err(UltraHdrError::MalformedMpf(_))));
    }

    #[test]
    fn test_bad_headers() {
        let mut data = generate(10, 0, 20, 30);
        data[4] = b'X';
        assert!(parse(&data).is_err());

        let mut data = generate(10, 0, 20, 30);
        data[11] = 0xFF;
        assert!(parse(&data).is_err());

        assert!(parse(b"MPF\0MM").is_err());
    }

    #[test]
    fn test_patch_in_place() {
        let mut w = JpegWriter::new();
        w.write_soi();
        w.write_app_segment(APP2, &generate(0, 0, 0, 0)).unwrap();
        w.write_raw(&[0xFF, 0xD9]);
        let primary_len = w.len();
        w.write_raw(&[0xFF, 0xD8, 0xFF, 0xD9]);
        let mut container = w.into_inner();

        patch_in_place(&mut container).unwrap();

        let loc = find(&container).unwrap().unwrap();
        let info = parse(&container[loc.payload_offset..loc.payload_offset + loc.payload_len])
            .unwrap();
        assert_eq!(info.primary_size, primary_len);
        assert_eq!(info.secondary_size, 4);
        assert_eq!(loc.tiff_header_offset() + info.secondary_offset, primary_len);
    }

    #[test]
    fn test_patch_size_mismatch() {
        let mut short = generate(0, 0, 0, 0);
        short.extend_from_slice(&[0, 0]);
        let mut w = JpegWriter::new();
        w.write_soi();
        w.write_app_segment(APP2, &short).unwrap();
        w.write_raw(&[0xFF, 0xD9, 0xFF, 0xD8, 0xFF, 0xD9]);
        let mut container = w.into_inner();
        assert!(matches!(
            patch_in_place(&mut container),
            Err(UltraHdrError::MalformedMpf(_))
        ));
    }
}
