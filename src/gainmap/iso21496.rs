//! ISO 21496-1 binary gain map metadata.
//!
//! The record is big-endian: `u16 min_version`, `u16 writer_version`,
//! `u8 flags`, then either one shared denominator followed by numerators
//! only, or explicit `(numerator, denominator)` pairs. Headroom comes first,
//! then per channel min, max, gamma, base offset, alternate offset.

use super::fraction::{float_to_signed_fraction, float_to_unsigned_fraction};
use super::math::{exp2f, log2f};
use crate::error::{Result, UltraHdrError};
use crate::jpeg::parser::ISO_NAMESPACE;
use crate::types::GainMapMetadata;
use log::trace;

const FLAG_MULTI_CHANNEL: u8 = 1 << 7;
const FLAG_USE_BASE_COLOR_SPACE: u8 = 1 << 6;
const FLAG_COMMON_DENOMINATOR: u8 = 1 << 3;
const FLAG_BACKWARD_DIRECTION: u8 = 1 << 2;

const MIN_VERSION: u16 = 0;
const WRITER_VERSION: u16 = 0;

/// Signed rational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignedFraction {
    pub n: i32,
    pub d: u32,
}

/// Unsigned rational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnsignedFraction {
    pub n: u32,
    pub d: u32,
}

impl SignedFraction {
    fn from_f32(v: f32) -> Result<Self> {
        let (n, d) = float_to_signed_fraction(v)?;
        Ok(Self { n, d })
    }

    fn to_f32(self, field: &str) -> Result<f32> {
        if self.d == 0 {
            return Err(zero_denominator(field));
        }
        Ok(self.n as f32 / self.d as f32)
    }
}

impl UnsignedFraction {
    fn from_f32(v: f32) -> Result<Self> {
        let (n, d) = float_to_unsigned_fraction(v)?;
        Ok(Self { n, d })
    }

    fn to_f32(self, field: &str) -> Result<f32> {
        if self.d == 0 {
            return Err(zero_denominator(field));
        }
        Ok(self.n as f32 / self.d as f32)
    }
}

fn zero_denominator(field: &str) -> UltraHdrError {
    UltraHdrError::IsoError(format!("zero denominator in {}", field))
}

/// Per-channel parameters in wire form (boosts already log2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelFrac {
    pub gain_map_min: SignedFraction,
    pub gain_map_max: SignedFraction,
    pub gamma: UnsignedFraction,
    pub base_offset: SignedFraction,
    pub alternate_offset: SignedFraction,
}

impl ChannelFrac {
    fn denominators(&self) -> [u32; 5] {
        [
            self.gain_map_min.d,
            self.gain_map_max.d,
            self.gamma.d,
            self.base_offset.d,
            self.alternate_offset.d,
        ]
    }
}

/// Gain map metadata as carried in the ISO record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GainMapMetadataFrac {
    pub channels: [ChannelFrac; 3],
    pub base_hdr_headroom: UnsignedFraction,
    pub alternate_hdr_headroom: UnsignedFraction,
    pub backward_direction: bool,
    pub use_base_color_space: bool,
}

impl GainMapMetadataFrac {
    /// Converts canonical metadata; single-channel metadata fills all three
    /// channels with channel 0.
    pub fn from_metadata(meta: &GainMapMetadata) -> Result<Self> {
        let channel_count = if meta.is_single_channel() { 1 } else { 3 };
        let mut channels = [ChannelFrac::default(); 3];
        for (c, channel) in channels.iter_mut().enumerate().take(channel_count) {
            *channel = ChannelFrac {
                gain_map_max: SignedFraction::from_f32(log2f(meta.max_content_boost[c]))?,
                gain_map_min: SignedFraction::from_f32(log2f(meta.min_content_boost[c]))?,
                gamma: UnsignedFraction::from_f32(meta.gamma[c])?,
                base_offset: SignedFraction::from_f32(meta.offset_sdr[c])?,
                alternate_offset: SignedFraction::from_f32(meta.offset_hdr[c])?,
            };
        }
        if channel_count == 1 {
            channels[1] = channels[0];
            channels[2] = channels[0];
        }

        Ok(Self {
            channels,
            base_hdr_headroom: UnsignedFraction::from_f32(log2f(meta.hdr_capacity_min))?,
            alternate_hdr_headroom: UnsignedFraction::from_f32(log2f(meta.hdr_capacity_max))?,
            backward_direction: false,
            use_base_color_space: meta.use_base_color_space,
        })
    }

    /// Converts back to canonical metadata.
    pub fn to_metadata(&self) -> Result<GainMapMetadata> {
        let mut meta = GainMapMetadata {
            version: "1.0".to_string(),
            use_base_color_space: self.use_base_color_space,
            hdr_capacity_min: exp2f(self.base_hdr_headroom.to_f32("base headroom")?),
            hdr_capacity_max: exp2f(self.alternate_hdr_headroom.to_f32("alternate headroom")?),
            ..GainMapMetadata::default()
        };
        for (c, ch) in self.channels.iter().enumerate() {
            meta.min_content_boost[c] = exp2f(ch.gain_map_min.to_f32("gain map min")?);
            meta.max_content_boost[c] = exp2f(ch.gain_map_max.to_f32("gain map max")?);
            meta.gamma[c] = ch.gamma.to_f32("gamma")?;
            meta.offset_sdr[c] = ch.base_offset.to_f32("base offset")?;
            meta.offset_hdr[c] = ch.alternate_offset.to_f32("alternate offset")?;
        }
        Ok(meta)
    }

    fn all_channels_identical(&self) -> bool {
        self.channels[0] == self.channels[1] && self.channels[0] == self.channels[2]
    }

    /// Serializes the record.
    pub fn encode(&self) -> Vec<u8> {
        let channel_count = if self.all_channels_identical() { 1 } else { 3 };
        let channels = &self.channels[..channel_count];

        let mut flags = 0u8;
        if channel_count == 3 {
            flags |= FLAG_MULTI_CHANNEL;
        }
        if self.use_base_color_space {
            flags |= FLAG_USE_BASE_COLOR_SPACE;
        }
        if self.backward_direction {
            flags |= FLAG_BACKWARD_DIRECTION;
        }

        let denom = self.base_hdr_headroom.d;
        let common = self.alternate_hdr_headroom.d == denom
            && channels
                .iter()
                .all(|ch| ch.denominators().iter().all(|&d| d == denom));
        if common {
            flags |= FLAG_COMMON_DENOMINATOR;
        }
        trace!(
            "ISO record: {} channel(s), {} form",
            channel_count,
            if common { "common denominator" } else { "general" }
        );

        let mut out = Vec::with_capacity(128);
        out.extend_from_slice(&MIN_VERSION.to_be_bytes());
        out.extend_from_slice(&WRITER_VERSION.to_be_bytes());
        out.push(flags);

        if common {
            out.extend_from_slice(&denom.to_be_bytes());
            out.extend_from_slice(&self.base_hdr_headroom.n.to_be_bytes());
            out.extend_from_slice(&self.alternate_hdr_headroom.n.to_be_bytes());
            for ch in channels {
                out.extend_from_slice(&ch.gain_map_min.n.to_be_bytes());
                out.extend_from_slice(&ch.gain_map_max.n.to_be_bytes());
                out.extend_from_slice(&ch.gamma.n.to_be_bytes());
                out.extend_from_slice(&ch.base_offset.n.to_be_bytes());
                out.extend_from_slice(&ch.alternate_offset.n.to_be_bytes());
            }
            return out;
        }

        for f in [self.base_hdr_headroom, self.alternate_hdr_headroom] {
            out.extend_from_slice(&f.n.to_be_bytes());
            out.extend_from_slice(&f.d.to_be_bytes());
        }
        for ch in channels {
            for f in [ch.gain_map_min, ch.gain_map_max] {
                out.extend_from_slice(&f.n.to_be_bytes());
                out.extend_from_slice(&f.d.to_be_bytes());
            }
            out.extend_from_slice(&ch.gamma.n.to_be_bytes());
            out.extend_from_slice(&ch.gamma.d.to_be_bytes());
            for f in [ch.base_offset, ch.alternate_offset] {
                out.extend_from_slice(&f.n.to_be_bytes());
                out.extend_from_slice(&f.d.to_be_bytes());
            }
        }
        out
    }

    /// Parses a record (without the namespace prefix).
    ///
    /// Single-channel records are broadcast to all three channels.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);

        let min_version = r.u16()?;
        if min_version != MIN_VERSION {
            return Err(UltraHdrError::IsoError(format!(
                "unsupported min_version {}",
                min_version
            )));
        }
        let _writer_version = r.u16()?;

        let flags = r.u8()?;
        let channel_count = if flags & FLAG_MULTI_CHANNEL != 0 { 3 } else { 1 };
        let mut frac = GainMapMetadataFrac {
            use_base_color_space: flags & FLAG_USE_BASE_COLOR_SPACE != 0,
            backward_direction: flags & FLAG_BACKWARD_DIRECTION != 0,
            ..Self::default()
        };

        if flags & FLAG_COMMON_DENOMINATOR != 0 {
            let d = r.u32()?;
            frac.base_hdr_headroom = UnsignedFraction { n: r.u32()?, d };
            frac.alternate_hdr_headroom = UnsignedFraction { n: r.u32()?, d };
            for c in 0..channel_count {
                frac.channels[c] = ChannelFrac {
                    gain_map_min: SignedFraction { n: r.i32()?, d },
                    gain_map_max: SignedFraction { n: r.i32()?, d },
                    gamma: UnsignedFraction { n: r.u32()?, d },
                    base_offset: SignedFraction { n: r.i32()?, d },
                    alternate_offset: SignedFraction { n: r.i32()?, d },
                };
            }
        } else {
            frac.base_hdr_headroom = r.unsigned()?;
            frac.alternate_hdr_headroom = r.unsigned()?;
            for c in 0..channel_count {
                frac.channels[c] = ChannelFrac {
                    gain_map_min: r.signed()?,
                    gain_map_max: r.signed()?,
                    gamma: r.unsigned()?,
                    base_offset: r.signed()?,
                    alternate_offset: r.signed()?,
                };
            }
        }

        if channel_count == 1 {
            frac.channels[1] = frac.channels[0];
            frac.channels[2] = frac.channels[0];
        }
        Ok(frac)
    }
}

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .ok_or_else(|| UltraHdrError::IsoError("iso metadata truncated".into()))?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take()?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take()?))
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.take()?))
    }

    fn signed(&mut self) -> Result<SignedFraction> {
        Ok(SignedFraction {
            n: self.i32()?,
            d: self.u32()?,
        })
    }

    fn unsigned(&mut self) -> Result<UnsignedFraction> {
        Ok(UnsignedFraction {
            n: self.u32()?,
            d: self.u32()?,
        })
    }
}

/// Encodes metadata as an ISO 21496-1 record.
pub fn encode_iso(meta: &GainMapMetadata) -> Result<Vec<u8>> {
    Ok(GainMapMetadataFrac::from_metadata(meta)?.encode())
}

/// Decodes an ISO 21496-1 record (namespace prefix already removed).
pub fn decode_iso(data: &[u8]) -> Result<GainMapMetadata> {
    GainMapMetadataFrac::decode(data)?.to_metadata()
}

/// Decodes an APP2 payload that starts with the ISO namespace.
pub fn decode_iso_payload(payload: &[u8]) -> Result<GainMapMetadata> {
    let record = payload
        .strip_prefix(ISO_NAMESPACE)
        .ok_or_else(|| UltraHdrError::IsoError("missing ISO namespace prefix".into()))?;
    decode_iso(record)
}

/// APP2 payload: namespace, NUL and the encoded record.
pub fn build_iso_payload(meta: &GainMapMetadata) -> Result<Vec<u8>> {
    let record = encode_iso(meta)?;
    let mut payload = Vec::with_capacity(ISO_NAMESPACE.len() + record.len());
    payload.extend_from_slice(ISO_NAMESPACE);
    payload.extend_from_slice(&record);
    Ok(payload)
}

/// APP2 payload for the primary image: namespace, NUL and four zero bytes
/// (`min_version` and `writer_version` only).
pub fn iso_version_only_payload() -> Vec<u8> {
    let mut payload = ISO_NAMESPACE.to_vec();
    payload.extend_from_slice(&[0u8; 4]);
    payload
}
