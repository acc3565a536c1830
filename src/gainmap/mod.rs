//! Gain map processing module.
//!
//! Pixel math, metadata codecs (ISO 21496-1 binary) and the whole-image
//! passes that generate, apply and rebase gain maps.

pub mod color;
pub mod decode;
pub mod encode;
pub mod fraction;
pub mod iso21496;
pub mod math;
pub mod metadata;
pub mod pixels;
pub mod rebase;

pub use decode::apply_gain_map;
pub use encode::{generate_gain_map, metadata_for_encode};
pub use iso21496::{decode_iso, encode_iso};
pub use metadata::{estimate_hdr_headroom, is_meaningful_hdr, validate_metadata};
pub use pixels::{GainMapPixels, PixelSource};
pub use rebase::rebase_gain_map;
