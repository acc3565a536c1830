//! Locates the JPEG streams embedded in a buffer.
//!
//! A container is a primary JPEG followed by one or more further JPEGs. When
//! the primary carries an MPF directory its sizes and offsets are trusted
//! (after bounds checks); otherwise the buffer is walked marker by marker.

use super::mpf;
use super::parser::{MarkerType, EOI, MARKER_PREFIX, SOI, SOS};
use crate::error::{Result, UltraHdrError};
use log::{debug, trace};
use std::ops::Range;

/// Returns the byte ranges (SOI..=EOI) of the JPEG streams in `data`, in
/// file order.
pub fn scan_jpegs(data: &[u8]) -> Result<Vec<Range<usize>>> {
    if let Some(ranges) = scan_by_mpf(data) {
        debug!("stream boundaries taken from MPF directory");
        return Ok(ranges);
    }
    debug!("no usable MPF directory, scanning markers");
    scan_linear(data)
}

/// Marker-walk every stream in `data` without consulting any MPF directory.
pub fn scan_linear(data: &[u8]) -> Result<Vec<Range<usize>>> {
    let mut ranges = Vec::new();
    let mut i = 0;
    while i + 1 < data.len() {
        if data[i] == MARKER_PREFIX && data[i + 1] == SOI {
            let end = find_jpeg_end(data, i)?;
            trace!("JPEG stream at {}..{}", i, end);
            ranges.push(i..end);
            i = end;
            continue;
        }
        i += 1;
    }
    if ranges.is_empty() {
        return Err(UltraHdrError::InvalidJpeg("no JPEG images found".into()));
    }
    Ok(ranges)
}

fn scan_by_mpf(data: &[u8]) -> Option<Vec<Range<usize>>> {
    if data.len() < 4 || data[0] != MARKER_PREFIX || data[1] != SOI {
        return None;
    }
    let loc = mpf::find(data).ok().flatten()?;
    let payload = &data[loc.payload_offset..loc.payload_offset + loc.payload_len];
    let info = match mpf::parse(payload) {
        Ok(info) => info,
        Err(e) => {
            debug!("ignoring MPF directory: {}", e);
            return None;
        }
    };

    let primary_end = info.primary_size;
    let secondary_start = loc.tiff_header_offset().checked_add(info.secondary_offset)?;
    let secondary_end = secondary_start.checked_add(info.secondary_size)?;

    if primary_end > data.len() || secondary_end > data.len() {
        return None;
    }
    if secondary_start + 1 >= data.len()
        || data[secondary_start] != MARKER_PREFIX
        || data[secondary_start + 1] != SOI
    {
        return None;
    }
    Some(vec![0..primary_end, secondary_start..secondary_end])
}

fn read_length(data: &[u8], pos: usize, marker_offset: usize) -> Result<usize> {
    if pos + 1 >= data.len() {
        return Err(UltraHdrError::Truncated(format!(
            "segment length at offset {}",
            pos
        )));
    }
    let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
    if length < 2 || pos + length > data.len() {
        return Err(UltraHdrError::InvalidLength {
            offset: marker_offset,
            length,
        });
    }
    Ok(length)
}

/// Returns the offset one past the EOI of the JPEG stream starting at `start`.
///
/// Inside entropy-coded data `FF 00` is a stuffed byte and `FF D0..D7` are
/// restart markers; any other marker there is treated as a segment
/// (multi-scan images interleave DHT/SOS between scans).
pub fn find_jpeg_end(data: &[u8], start: usize) -> Result<usize> {
    if start + 1 >= data.len() || data[start] != MARKER_PREFIX || data[start + 1] != SOI {
        return Err(UltraHdrError::InvalidJpeg("not a JPEG SOI".into()));
    }
    let mut pos = start + 2;
    let mut in_scan = false;

    while pos + 1 < data.len() {
        if !in_scan {
            if data[pos] != MARKER_PREFIX {
                pos += 1;
                continue;
            }
            while pos < data.len() && data[pos] == MARKER_PREFIX {
                pos += 1;
            }
            if pos >= data.len() {
                break;
            }
            let marker_offset = pos - 1;
            let marker = data[pos];
            pos += 1;

            match MarkerType::from_byte(marker) {
                MarkerType::Soi | MarkerType::Rst(_) | MarkerType::Tem => {}
                MarkerType::Eoi => return Ok(pos),
                MarkerType::Sos => {
                    pos += read_length(data, pos, marker_offset)?;
                    in_scan = true;
                }
                _ => pos += read_length(data, pos, marker_offset)?,
            }
            continue;
        }

        if data[pos] == MARKER_PREFIX {
            let next = data[pos + 1];
            match next {
                0x00 | 0xD0..=0xD7 => pos += 2,
                EOI => return Ok(pos + 2),
                MARKER_PREFIX => pos += 1,
                _ => {
                    let marker_offset = pos;
                    pos += 2;
                    pos += read_length(data, pos, marker_offset)?;
                    if next == SOS {
                        trace!("additional scan at offset {}", marker_offset);
                    }
                }
            }
            continue;
        }
        pos += 1;
    }

    Err(UltraHdrError::Truncated(format!(
        "no EOI for JPEG stream starting at offset {}",
        start
    )))
}
