//! Streaming UltraHDR detection.
//!
//! Reads only as far as the gain map's header: the primary stream is
//! skipped marker by marker and its entropy-coded data is discarded.

use crate::error::{Result, UltraHdrError};
use crate::jpeg::parser::{APP1, APP2, EOI, ISO_NAMESPACE, MARKER_PREFIX, SOI, SOS, XMP_NAMESPACE};
use std::io::{self, BufRead, BufReader, Read};

struct MarkerReader<R> {
    inner: R,
}

impl<R: BufRead> MarkerReader<R> {
    fn next_byte(&mut self) -> Result<Option<u8>> {
        let buf = self.inner.fill_buf()?;
        let Some(&b) = buf.first() else {
            return Ok(None);
        };
        self.inner.consume(1);
        Ok(Some(b))
    }

    fn byte(&mut self) -> Result<u8> {
        self.next_byte()?
            .ok_or_else(|| UltraHdrError::Truncated("stream ended inside a JPEG".into()))
    }

    /// Advances past the next SOI; `false` at end of stream.
    fn find_soi(&mut self) -> Result<bool> {
        let mut prev = 0u8;
        while let Some(b) = self.next_byte()? {
            if prev == MARKER_PREFIX && b == SOI {
                return Ok(true);
            }
            prev = b;
        }
        Ok(false)
    }

    /// Next marker code, skipping anything before it and fill bytes.
    fn marker(&mut self) -> Result<u8> {
        while self.byte()? != MARKER_PREFIX {}
        loop {
            let m = self.byte()?;
            if m != MARKER_PREFIX {
                return Ok(m);
            }
        }
    }

    fn length(&mut self) -> Result<usize> {
        let length = u16::from_be_bytes([self.byte()?, self.byte()?]) as usize;
        if length < 2 {
            return Err(UltraHdrError::InvalidLength { offset: 0, length });
        }
        Ok(length - 2)
    }

    fn discard(&mut self, n: usize) -> Result<()> {
        let copied = io::copy(&mut (&mut self.inner).take(n as u64), &mut io::sink())?;
        if copied < n as u64 {
            return Err(UltraHdrError::Truncated("segment runs past end of stream".into()));
        }
        Ok(())
    }

    fn skip_segment(&mut self) -> Result<()> {
        let n = self.length()?;
        self.discard(n)
    }

    /// Skips entropy-coded data up to and including EOI.
    fn skip_scan(&mut self) -> Result<()> {
        loop {
            if self.byte()? != MARKER_PREFIX {
                continue;
            }
            let mut m = self.byte()?;
            while m == MARKER_PREFIX {
                m = self.byte()?;
            }
            if m == EOI {
                return Ok(());
            }
        }
    }

    /// Skips the rest of a JPEG whose SOI was just read.
    fn skip_jpeg(&mut self) -> Result<()> {
        loop {
            match self.marker()? {
                EOI => return Ok(()),
                SOS => return self.skip_scan(),
                0xD0..=0xD7 | 0x01 => {}
                _ => self.skip_segment()?,
            }
        }
    }

    /// Looks for an XMP or ISO payload prefix among the header segments.
    fn gain_map_header_has_metadata(&mut self) -> Result<bool> {
        loop {
            let marker = self.marker()?;
            match marker {
                EOI | SOS => return Ok(false),
                APP1 | APP2 => {
                    let prefix = if marker == APP1 {
                        XMP_NAMESPACE
                    } else {
                        ISO_NAMESPACE
                    };
                    let len = self.length()?;
                    let take = len.min(prefix.len());
                    let mut head = vec![0u8; take];
                    self.inner.read_exact(&mut head)?;
                    self.discard(len - take)?;
                    if head == prefix {
                        return Ok(true);
                    }
                }
                0xD0..=0xD7 | 0x01 => {}
                _ => self.skip_segment()?,
            }
        }
    }
}

/// Reports whether `reader` holds an UltraHDR container: a first JPEG
/// followed by a second whose header carries XMP or ISO 21496-1 metadata.
///
/// Input that simply ends early is `Ok(false)` only when no second SOI was
/// reached; truncation inside a stream is an error.
pub fn is_ultra_hdr<R: Read>(reader: R) -> Result<bool> {
    let mut r = MarkerReader {
        inner: BufReader::new(reader),
    };
    if !r.find_soi()? {
        return Ok(false);
    }
    r.skip_jpeg()?;
    if !r.find_soi()? {
        return Ok(false);
    }
    r.gain_map_header_has_metadata()
}

/// In-memory convenience over [`is_ultra_hdr`]; malformed input is `false`.
pub fn has_gainmap_metadata(data: &[u8]) -> bool {
    is_ultra_hdr(data).unwrap_or(false)
}
