//! JPEG segment writer.
//!
//! Byte-level builder used by the container assembler and the segment
//! helpers. It never reorders anything: segments land in call order.

use super::parser::{MARKER_PREFIX, SOI};
use crate::error::{Result, UltraHdrError};

/// Largest payload that fits in one marker segment (length field is 16-bit
/// and counts itself).
pub const MAX_SEGMENT_PAYLOAD: usize = 65533;

/// Append-only JPEG byte writer.
#[derive(Debug, Default)]
pub struct JpegWriter {
    buf: Vec<u8>,
}

impl JpegWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Writes an SOI marker.
    pub fn write_soi(&mut self) {
        self.buf.extend_from_slice(&[MARKER_PREFIX, SOI]);
    }

    /// Writes a marker segment: `FF marker len_hi len_lo payload`.
    pub fn write_app_segment(&mut self, marker: u8, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_SEGMENT_PAYLOAD {
            return Err(UltraHdrError::SegmentTooLarge(payload.len()));
        }
        let len = (payload.len() + 2) as u16;
        self.buf.extend_from_slice(&[MARKER_PREFIX, marker]);
        self.buf.extend_from_slice(&len.to_be_bytes());
        self.buf.extend_from_slice(payload);
        Ok(())
    }

    /// Writes an optional segment; `None` and empty payloads write nothing.
    pub fn write_optional_segment(&mut self, marker: u8, payload: Option<&[u8]>) -> Result<()> {
        match payload {
            Some(p) if !p.is_empty() => self.write_app_segment(marker, p),
            _ => Ok(()),
        }
    }

    /// Copies bytes verbatim.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Size a payload occupies once written as a segment (marker + length +
/// payload), or 0 when absent.
pub fn app_size(payload: Option<&[u8]>) -> usize {
    match payload {
        Some(p) if !p.is_empty() => 4 + p.len(),
        _ => 0,
    }
}
