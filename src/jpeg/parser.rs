//! JPEG header segment walker.
//!
//! Walks the marker segments that precede the first scan of a JPEG stream
//! and provides the APP segment helpers the container codec is built on.

use super::mpf::MPF_SIGNATURE;
use super::writer::JpegWriter;
use crate::error::{Result, UltraHdrError};

pub const MARKER_PREFIX: u8 = 0xFF;
pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOS: u8 = 0xDA;
pub const APP0: u8 = 0xE0;
pub const APP1: u8 = 0xE1;
pub const APP2: u8 = 0xE2;
pub const COM: u8 = 0xFE;

/// XMP APP1 prefix, including the terminating NUL.
pub const XMP_NAMESPACE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
/// ISO 21496-1 APP2 prefix, including the terminating NUL.
pub const ISO_NAMESPACE: &[u8] = b"urn:iso:std:iso:ts:21496:-1\0";
pub const EXIF_SIGNATURE: &[u8] = b"Exif\0\0";
pub const ICC_SIGNATURE: &[u8] = b"ICC_PROFILE\0";

/// JPEG marker types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerType {
    /// Start of Image
    Soi,
    /// End of Image
    Eoi,
    /// Start of Scan
    Sos,
    /// APP0-APP15
    App(u8),
    /// Comment
    Com,
    /// Restart markers RST0-RST7
    Rst(u8),
    /// Temporary private use marker (0x01)
    Tem,
    /// Start of Frame (SOF0-SOF15 except DHT, JPG and DAC)
    Sof(u8),
    /// Other marker
    Other(u8),
}

impl MarkerType {
    /// Creates a MarkerType from a byte value.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            SOI => MarkerType::Soi,
            EOI => MarkerType::Eoi,
            SOS => MarkerType::Sos,
            0xE0..=0xEF => MarkerType::App(byte - APP0),
            COM => MarkerType::Com,
            0xD0..=0xD7 => MarkerType::Rst(byte - 0xD0),
            0x01 => MarkerType::Tem,
            0xC0..=0xCF if !matches!(byte, 0xC4 | 0xC8 | 0xCC) => MarkerType::Sof(byte),
            _ => MarkerType::Other(byte),
        }
    }

    /// Converts the marker type to its byte value.
    pub fn to_byte(self) -> u8 {
        match self {
            MarkerType::Soi => SOI,
            MarkerType::Eoi => EOI,
            MarkerType::Sos => SOS,
            MarkerType::App(n) => APP0 + n,
            MarkerType::Com => COM,
            MarkerType::Rst(n) => 0xD0 + n,
            MarkerType::Tem => 0x01,
            MarkerType::Sof(b) | MarkerType::Other(b) => b,
        }
    }

    /// Returns true if this marker has an associated length field.
    pub fn has_length(self) -> bool {
        !matches!(
            self,
            MarkerType::Soi
                | MarkerType::Eoi
                | MarkerType::Rst(_)
                | MarkerType::Tem
                | MarkerType::Other(0x00)
        )
    }

    /// APP0-APP15 and COM: the segments the container assembler strips.
    pub fn is_app_or_com(self) -> bool {
        matches!(self, MarkerType::App(_) | MarkerType::Com)
    }
}

/// A length-prefixed marker segment borrowed from the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Marker byte (the byte after 0xFF)
    pub marker: u8,
    /// Offset of the 0xFF that introduces the marker
    pub offset: usize,
    /// Payload, excluding marker and length bytes
    pub payload: &'a [u8],
}

impl<'a> Segment<'a> {
    /// Offset one past the last payload byte.
    pub fn end(&self) -> usize {
        self.offset + 4 + self.payload.len()
    }

    /// Offset of the first payload byte.
    pub fn payload_offset(&self) -> usize {
        self.offset + 4
    }

    pub fn marker_type(&self) -> MarkerType {
        MarkerType::from_byte(self.marker)
    }
}

/// One step of a header walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderItem<'a> {
    /// Length-prefixed segment
    Segment(Segment<'a>),
    /// Marker without a length field (SOI, RSTn, TEM)
    Standalone { offset: usize, marker: u8 },
    /// Non-marker byte between segments
    Stray(usize),
    /// SOS or EOI; the walk ends here
    End { offset: usize, marker: u8 },
}

/// Iterator over the header of a JPEG stream, from after SOI up to the
/// first SOS or EOI.
///
/// Runs of 0xFF fill bytes are skipped. Fewer than four remaining bytes end
/// the walk without an `End` item.
pub struct HeaderSegments<'a> {
    data: &'a [u8],
    pos: usize,
    finished: bool,
}

impl<'a> HeaderSegments<'a> {
    /// Starts a walk over `data`, which must begin with SOI.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < 4 || data[0] != MARKER_PREFIX || data[1] != SOI {
            return Err(UltraHdrError::InvalidJpeg("missing SOI marker".into()));
        }
        Ok(Self {
            data,
            pos: 2,
            finished: false,
        })
    }

    fn fail(&mut self, err: UltraHdrError) -> Option<Result<HeaderItem<'a>>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl<'a> Iterator for HeaderSegments<'a> {
    type Item = Result<HeaderItem<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let data = self.data;

        if self.pos + 3 >= data.len() {
            self.finished = true;
            return None;
        }
        if data[self.pos] != MARKER_PREFIX {
            let offset = self.pos;
            self.pos += 1;
            return Some(Ok(HeaderItem::Stray(offset)));
        }
        while self.pos < data.len() && data[self.pos] == MARKER_PREFIX {
            self.pos += 1;
        }
        if self.pos >= data.len() {
            self.finished = true;
            return None;
        }

        let offset = self.pos - 1;
        let marker = data[self.pos];
        self.pos += 1;

        let marker_type = MarkerType::from_byte(marker);
        if matches!(marker_type, MarkerType::Sos | MarkerType::Eoi) {
            self.finished = true;
            return Some(Ok(HeaderItem::End { offset, marker }));
        }
        if !marker_type.has_length() {
            return Some(Ok(HeaderItem::Standalone { offset, marker }));
        }

        if self.pos + 1 >= data.len() {
            return self.fail(UltraHdrError::Truncated(format!(
                "marker 0x{:02X} at offset {} has no length",
                marker, offset
            )));
        }
        let length = u16::from_be_bytes([data[self.pos], data[self.pos + 1]]) as usize;
        if length < 2 || self.pos + length > data.len() {
            return self.fail(UltraHdrError::InvalidLength { offset, length });
        }

        let payload = &data[self.pos + 2..self.pos + length];
        self.pos += length;
        Some(Ok(HeaderItem::Segment(Segment {
            marker,
            offset,
            payload,
        })))
    }
}

/// Iterates only the length-prefixed segments of a header walk.
pub fn header_segments(data: &[u8]) -> Result<impl Iterator<Item = Result<Segment<'_>>>> {
    Ok(HeaderSegments::new(data)?.filter_map(|item| match item {
        Ok(HeaderItem::Segment(seg)) => Some(Ok(seg)),
        Ok(_) => None,
        Err(e) => Some(Err(e)),
    }))
}

/// An owned APP segment: marker byte plus payload (signature included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSegment {
    pub marker: u8,
    pub payload: Vec<u8>,
}

impl AppSegment {
    pub fn new(marker: u8, payload: Vec<u8>) -> Self {
        Self { marker, payload }
    }

    /// Checks if this segment contains XMP data.
    pub fn is_xmp(&self) -> bool {
        self.marker == APP1 && self.payload.starts_with(XMP_NAMESPACE)
    }

    /// Checks if this segment contains ISO 21496-1 gain map metadata.
    pub fn is_iso(&self) -> bool {
        self.marker == APP2 && self.payload.starts_with(ISO_NAMESPACE)
    }

    /// Checks if this segment contains Exif data.
    pub fn is_exif(&self) -> bool {
        self.marker == APP1 && self.payload.starts_with(EXIF_SIGNATURE)
    }

    /// Checks if this segment is an ICC profile chunk with its sequence bytes.
    pub fn is_icc_profile(&self) -> bool {
        self.marker == APP2
            && self.payload.starts_with(ICC_SIGNATURE)
            && self.payload.len() >= ICC_SIGNATURE.len() + 2
    }

    /// Checks if this segment contains an MPF directory.
    pub fn is_mpf(&self) -> bool {
        self.marker == APP2 && self.payload.starts_with(MPF_SIGNATURE)
    }

    /// Sequence number of an ICC profile chunk.
    pub fn icc_sequence(&self) -> Option<u8> {
        if self.is_icc_profile() {
            Some(self.payload[ICC_SIGNATURE.len()])
        } else {
            None
        }
    }
}

impl From<Segment<'_>> for AppSegment {
    fn from(seg: Segment<'_>) -> Self {
        AppSegment::new(seg.marker, seg.payload.to_vec())
    }
}

/// Collects the APP1 and APP2 payloads of a JPEG header, in file order.
pub fn extract_app_segments(jpeg: &[u8]) -> Result<Vec<AppSegment>> {
    let mut out = Vec::new();
    for seg in header_segments(jpeg)? {
        let seg = seg?;
        if seg.marker == APP1 || seg.marker == APP2 {
            out.push(seg.into());
        }
    }
    Ok(out)
}

/// Like [`extract_app_segments`], but stops after the MPF APP2 segment so
/// that only the container header is inspected.
pub fn extract_container_header_segments(data: &[u8]) -> Result<Vec<AppSegment>> {
    let mut out = Vec::new();
    for seg in header_segments(data)? {
        let seg = seg?;
        if seg.marker == APP1 || seg.marker == APP2 {
            let app = AppSegment::from(seg);
            let is_mpf = app.is_mpf();
            out.push(app);
            if is_mpf {
                break;
            }
        }
    }
    Ok(out)
}

/// First XMP segment payload.
pub fn find_xmp(segments: &[AppSegment]) -> Option<&[u8]> {
    segments
        .iter()
        .find(|s| s.is_xmp())
        .map(|s| s.payload.as_slice())
}

/// First ISO 21496-1 segment payload.
pub fn find_iso(segments: &[AppSegment]) -> Option<&[u8]> {
    segments
        .iter()
        .find(|s| s.is_iso())
        .map(|s| s.payload.as_slice())
}

/// Returns the first EXIF APP1 payload and all ICC APP2 payloads, the latter
/// ordered by their sequence byte.
pub fn extract_exif_and_icc(jpeg: &[u8]) -> Result<(Option<Vec<u8>>, Vec<Vec<u8>>)> {
    let segments = extract_app_segments(jpeg)?;

    let exif = segments
        .iter()
        .find(|s| s.is_exif())
        .map(|s| s.payload.clone());

    let mut icc: Vec<&AppSegment> = segments.iter().filter(|s| s.is_icc_profile()).collect();
    icc.sort_by_key(|s| s.icc_sequence());

    Ok((exif, icc.into_iter().map(|s| s.payload.clone()).collect()))
}

/// Concatenates the profile bytes of ICC APP2 chunks in sequence order.
pub fn collect_icc_profile(chunks: &[Vec<u8>]) -> Vec<u8> {
    let header = ICC_SIGNATURE.len() + 2;
    let mut parts: Vec<(u8, &[u8])> = chunks
        .iter()
        .filter(|p| p.len() > header && p.starts_with(ICC_SIGNATURE))
        .map(|p| (p[ICC_SIGNATURE.len()], &p[header..]))
        .collect();
    parts.sort_by_key(|(seq, _)| *seq);
    parts
        .into_iter()
        .flat_map(|(_, data)| data.iter().copied())
        .collect()
}

/// Removes APP0-APP15 and COM segments from a JPEG, keeping every other byte
/// of the header and everything from the first SOS/EOI onward verbatim.
pub fn strip_app_segments(jpeg: &[u8]) -> Result<Vec<u8>> {
    let mut out = JpegWriter::with_capacity(jpeg.len());
    out.write_soi();
    for item in HeaderSegments::new(jpeg)? {
        match item? {
            HeaderItem::Segment(seg) => {
                if !seg.marker_type().is_app_or_com() {
                    out.write_raw(&jpeg[seg.offset..seg.end()]);
                }
            }
            HeaderItem::Standalone { offset, .. } => out.write_raw(&jpeg[offset..offset + 2]),
            HeaderItem::Stray(offset) => out.write_raw(&jpeg[offset..=offset]),
            HeaderItem::End { offset, .. } => {
                out.write_raw(&jpeg[offset..]);
                break;
            }
        }
    }
    Ok(out.into_inner())
}

/// Inserts APP segments directly after SOI.
pub fn insert_app_segments(jpeg: &[u8], segments: &[AppSegment]) -> Result<Vec<u8>> {
    if jpeg.len() < 2 || jpeg[0] != MARKER_PREFIX || jpeg[1] != SOI {
        return Err(UltraHdrError::InvalidJpeg("missing SOI marker".into()));
    }
    let extra: usize = segments.iter().map(|s| s.payload.len() + 4).sum();
    let mut out = JpegWriter::with_capacity(jpeg.len() + extra);
    out.write_soi();
    for seg in segments {
        out.write_app_segment(seg.marker, &seg.payload)?;
    }
    out.write_raw(&jpeg[2..]);
    Ok(out.into_inner())
}

/// Frame header fields read from the first SOFn segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub marker: u8,
    pub precision: u8,
    pub width: u32,
    pub height: u32,
    pub components: u8,
}

impl FrameHeader {
    /// Huffman-coded sequential 8-bit frame (SOF0 or SOF1).
    pub fn is_baseline(&self) -> bool {
        matches!(self.marker, 0xC0 | 0xC1) && self.precision == 8
    }

    pub fn coding_name(&self) -> &'static str {
        match self.marker {
            0xC0 => "baseline",
            0xC1 => "extended sequential",
            0xC2 => "progressive",
            0xC3 => "lossless",
            0xC9..=0xCB | 0xCD..=0xCF => "arithmetic",
            _ => "hierarchical",
        }
    }
}

/// Reads the frame header of a JPEG stream.
pub fn frame_header(jpeg: &[u8]) -> Result<FrameHeader> {
    for seg in header_segments(jpeg)? {
        let seg = seg?;
        if let MarkerType::Sof(marker) = seg.marker_type() {
            let p = seg.payload;
            if p.len() < 6 {
                return Err(UltraHdrError::Truncated("SOF segment".into()));
            }
            return Ok(FrameHeader {
                marker,
                precision: p[0],
                height: u16::from_be_bytes([p[1], p[2]]) as u32,
                width: u16::from_be_bytes([p[3], p[4]]) as u32,
                components: p[5],
            });
        }
    }
    Err(UltraHdrError::InvalidJpeg("no SOF segment before scan".into()))
}

/// Rejects frames this crate does not handle: progressive, arithmetic,
/// lossless, or anything other than 8-bit precision.
pub fn ensure_baseline(jpeg: &[u8]) -> Result<FrameHeader> {
    let frame = frame_header(jpeg)?;
    if !frame.is_baseline() {
        return Err(UltraHdrError::Unsupported(format!(
            "{} JPEG with {}-bit precision",
            frame.coding_name(),
            frame.precision
        )));
    }
    Ok(frame)
}
