//! UltraHDR Container Library
//!
//! Reads, writes and edits UltraHDR (JPEG/R) images: a baseline JPEG
//! primary image followed by a JPEG gain map, tied together by an MPF
//! directory and described by XMP and ISO 21496-1 metadata. Compiled to
//! WebAssembly for client-side media processing, usable natively as an rlib.
//!
//! # Features
//!
//! - **Detection**: Check if a JPEG carries a gain map, without decoding pixels
//! - **Split/Join**: Separate a container into its two streams and put them back
//! - **Decoding**: Reconstruct linear HDR pixels from base + gain map
//! - **Encoding**: Build a container from an SDR base and an HDR rendition
//! - **Resize/Rebase**: Resample both streams, or swap the SDR base
//!
//! # Standards Support
//!
//! - ISO 21496-1 (Gain map metadata)
//! - Google UltraHDR v1 (hdrgm XMP namespace)
//! - CIPA DC-007 Multi-Picture Format
//!
//! # License
//!
//! GPL-2.0-or-later

#![allow(clippy::unused_unit)]

use wasm_bindgen::prelude::*;

pub mod error;
pub mod gainmap;
pub mod jpeg;
pub mod logger;
pub mod types;
pub mod ultrahdr;

pub use error::{ErrorKind, Result, UltraHdrError};
pub use types::{
    ColorGamut, DecodeOptions, EncodeOptions, GainMapMetadata, HdrImage, Interpolation,
    RebaseOptions, ResizeOptions, TransferFunction, UltraHdrProbeResult, UltraHdrSplitResult,
};

fn to_js(e: UltraHdrError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Initializes the WASM module.
///
/// Installs the panic hook and the console logger at `warn` level.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logger::init(log::LevelFilter::Warn);
}

/// Sets the console log level.
///
/// # Arguments
/// * `level` - One of "off", "error", "warn", "info", "debug", "trace"
///
/// # Errors
/// Returns an error for an unknown level name.
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> std::result::Result<(), JsValue> {
    let filter = logger::parse_level(level)
        .ok_or_else(|| JsValue::from_str(&format!("unknown log level: {}", level)))?;
    logger::init(filter);
    Ok(())
}

/// Checks if a JPEG buffer is an UltraHDR container.
///
/// Streams through the markers looking for a second JPEG whose header
/// carries XMP or ISO 21496-1 gain map metadata. No pixels are decoded.
///
/// # Arguments
/// * `buffer` - JPEG file contents as bytes
///
/// # Returns
/// `true` if the image carries a gain map, `false` otherwise (including
/// for buffers that are not JPEG at all)
///
/// # Example (JavaScript)
/// ```js
/// const buffer = await file.arrayBuffer();
/// const isHdr = isUltraHdr(new Uint8Array(buffer));
/// ```
#[wasm_bindgen(js_name = isUltraHdr)]
pub fn is_ultra_hdr(buffer: &[u8]) -> bool {
    ultrahdr::has_gainmap_metadata(buffer)
}

/// Reports what a buffer contains without decoding pixels.
///
/// Never throws; missing parts show up as `false` / 0 fields.
#[wasm_bindgen(js_name = probeUltraHdr)]
pub fn probe_ultra_hdr(buffer: &[u8]) -> UltraHdrProbeResult {
    ultrahdr::probe(buffer)
}

/// Splits an UltraHDR JPEG into primary image, gain map and metadata.
///
/// # Returns
/// An `UltraHdrSplitResult` containing:
/// - `primaryImage`: The primary JPEG exactly as stored in the container
/// - `gainMap`: The gain map JPEG exactly as stored
/// - `metadata`: Gain map metadata (ISO 21496-1 preferred over XMP)
/// - `width`, `height`, `gainMapWidth`, `gainMapHeight`
///
/// # Errors
/// Returns an error if the buffer is malformed or has no gain map.
#[wasm_bindgen(js_name = splitUltraHdr)]
pub fn split_ultra_hdr(buffer: &[u8]) -> std::result::Result<UltraHdrSplitResult, JsValue> {
    ultrahdr::split_with_dimensions(buffer).map_err(to_js)
}

/// Joins a primary JPEG and a gain map JPEG into a container.
///
/// XMP and ISO 21496-1 metadata are generated from `metadata`; EXIF and ICC
/// are taken from the primary image.
///
/// # Example (JavaScript)
/// ```js
/// const parts = splitUltraHdr(input);
/// const output = joinUltraHdr(parts.primaryImage, parts.gainMap, parts.metadata);
/// ```
#[wasm_bindgen(js_name = joinUltraHdr)]
pub fn join_ultra_hdr(
    primary: &[u8],
    gain_map: &[u8],
    metadata: &GainMapMetadata,
) -> std::result::Result<Vec<u8>, JsValue> {
    ultrahdr::join(primary, gain_map, metadata).map_err(to_js)
}

/// Decodes an UltraHDR JPEG to linear HDR pixels.
///
/// # Arguments
/// * `buffer` - UltraHDR JPEG file contents as bytes
/// * `options` - `maxDisplayBoost` limits the gain applied; 0 applies it fully
///
/// # Returns
/// An `HdrImage` with 1.0 at SDR white.
#[wasm_bindgen(js_name = decodeUltraHdr)]
pub fn decode_ultra_hdr(
    buffer: &[u8],
    options: &DecodeOptions,
) -> std::result::Result<HdrImage, JsValue> {
    ultrahdr::decode(buffer, options)
        .map(|decoded| decoded.hdr)
        .map_err(to_js)
}

/// Encodes an UltraHDR JPEG from an SDR JPEG and an HDR rendition.
///
/// The SDR JPEG is embedded as given; only the gain map is encoded.
///
/// # Arguments
/// * `sdr_buffer` - Baseline SDR JPEG bytes
/// * `hdr` - Linear HDR pixels, 1.0 at `options.hdrWhiteNits`
/// * `options` - Encoding options
///
/// # Errors
/// Returns an error if:
/// - The SDR buffer is not a baseline JPEG
/// - The HDR image size doesn't match the SDR dimensions
/// - An option is out of range
///
/// # Example (JavaScript)
/// ```js
/// const options = new EncodeOptions();
/// options.gainMapScale = 2;
/// options.hdrWhiteNits = 1600;
///
/// const hdr = new HdrImage(width, height, linearPixels, ColorGamut.Srgb);
/// const ultraHdr = encodeUltraHdr(new Uint8Array(sdrBuffer), hdr, options);
/// ```
#[wasm_bindgen(js_name = encodeUltraHdr)]
pub fn encode_ultra_hdr(
    sdr_buffer: &[u8],
    hdr: &HdrImage,
    options: &EncodeOptions,
) -> std::result::Result<Vec<u8>, JsValue> {
    ultrahdr::encode(sdr_buffer, hdr, options)
        .map(|encoded| encoded.container)
        .map_err(to_js)
}

/// Encodes an UltraHDR JPEG from raw RGBA SDR pixels.
///
/// The base image is encoded at `options.baseQuality`.
#[wasm_bindgen(js_name = encodeUltraHdrFromRgba)]
pub fn encode_ultra_hdr_from_rgba(
    rgba: &[u8],
    width: u32,
    height: u32,
    hdr: &HdrImage,
    options: &EncodeOptions,
) -> std::result::Result<Vec<u8>, JsValue> {
    let image = image::RgbaImage::from_raw(width, height, rgba.to_vec()).ok_or_else(|| {
        to_js(UltraHdrError::InvalidDimensions(format!(
            "{} bytes for {}x{} RGBA",
            rgba.len(),
            width,
            height
        )))
    })?;
    let sdr = gainmap::PixelSource::Rgba8(image);
    ultrahdr::encode_pixels(&sdr, hdr, options)
        .map(|encoded| encoded.container)
        .map_err(to_js)
}

/// Extracts just the SDR base image from an UltraHDR JPEG.
///
/// This produces the primary JPEG exactly as stored, which any viewer can
/// display. Its XMP still names the gain map that is no longer attached.
///
/// # Errors
/// Returns an error if the buffer is not a valid JPEG.
#[wasm_bindgen(js_name = extractSdrBase)]
pub fn extract_sdr_base(buffer: &[u8]) -> std::result::Result<Vec<u8>, JsValue> {
    ultrahdr::extract_base(buffer).map_err(to_js)
}

/// Gets gain map metadata from an UltraHDR JPEG without decoding pixels.
///
/// This is faster than `splitUltraHdr` when you only need the metadata.
///
/// # Errors
/// Returns an error if the buffer doesn't contain gain map metadata.
#[wasm_bindgen(js_name = getMetadata)]
pub fn get_metadata(buffer: &[u8]) -> std::result::Result<GainMapMetadata, JsValue> {
    ultrahdr::extract_metadata(buffer).map_err(to_js)
}

/// Captures every metadata segment of a container as a JSON bundle.
///
/// Binary payloads are base64 encoded. Feed the bundle back to
/// `assembleFromBundle` together with (possibly edited) image streams.
#[wasm_bindgen(js_name = getMetadataBundle)]
pub fn get_metadata_bundle(buffer: &[u8]) -> std::result::Result<String, JsValue> {
    ultrahdr::split(buffer)
        .and_then(|parts| parts.bundle())
        .and_then(|bundle| bundle.to_json())
        .map_err(to_js)
}

/// Reassembles a container from a JSON bundle and two JPEG streams.
#[wasm_bindgen(js_name = assembleFromBundle)]
pub fn assemble_from_bundle(
    bundle_json: &str,
    primary: &[u8],
    gain_map: &[u8],
) -> std::result::Result<Vec<u8>, JsValue> {
    ultrahdr::MetadataBundle::from_json(bundle_json)
        .and_then(|bundle| bundle.assemble(primary, gain_map))
        .map_err(to_js)
}

/// Resizes an UltraHDR JPEG, resampling the gain map in proportion.
///
/// # Arguments
/// * `buffer` - UltraHDR JPEG file contents as bytes
/// * `width`, `height` - Target size of the primary image
/// * `options` - Qualities and interpolation
#[wasm_bindgen(js_name = resizeUltraHdr)]
pub fn resize_ultra_hdr(
    buffer: &[u8],
    width: u32,
    height: u32,
    options: &ResizeOptions,
) -> std::result::Result<Vec<u8>, JsValue> {
    ultrahdr::resize_ultrahdr(buffer, width, height, options)
        .map(|resized| resized.container)
        .map_err(to_js)
}

/// Resizes a plain JPEG.
///
/// With `keepMetadata` EXIF and ICC are carried over; otherwise wide-gamut
/// input is converted to sRGB and the output has no metadata.
#[wasm_bindgen(js_name = resizeJpeg)]
pub fn resize_jpeg(
    buffer: &[u8],
    width: u32,
    height: u32,
    quality: u8,
    interpolation: Interpolation,
    keep_metadata: bool,
) -> std::result::Result<Vec<u8>, JsValue> {
    ultrahdr::resize_jpeg(buffer, width, height, quality, interpolation, keep_metadata)
        .map_err(to_js)
}

/// Replaces the SDR base of an UltraHDR JPEG, recomputing the gain map so
/// the HDR rendition is preserved.
///
/// # Errors
/// Returns an error if the new base has different dimensions.
#[wasm_bindgen(js_name = rebaseUltraHdr)]
pub fn rebase_ultra_hdr(
    buffer: &[u8],
    new_sdr: &[u8],
    options: &RebaseOptions,
) -> std::result::Result<Vec<u8>, JsValue> {
    ultrahdr::rebase_ultrahdr(buffer, new_sdr, options)
        .map(|rebased| rebased.container)
        .map_err(to_js)
}

/// Serializes metadata as an ISO 21496-1 binary block.
#[wasm_bindgen(js_name = encodeIsoMetadata)]
pub fn encode_iso_metadata(metadata: &GainMapMetadata) -> std::result::Result<Vec<u8>, JsValue> {
    gainmap::encode_iso(metadata).map_err(to_js)
}

/// Parses an ISO 21496-1 binary block.
#[wasm_bindgen(js_name = decodeIsoMetadata)]
pub fn decode_iso_metadata(data: &[u8]) -> std::result::Result<GainMapMetadata, JsValue> {
    gainmap::decode_iso(data).map_err(to_js)
}

/// Creates default encoding options.
///
/// # Returns
/// `EncodeOptions` with defaults:
/// - baseQuality: 95
/// - gainMapQuality: 85
/// - gainMapScale: 4
/// - hdrWhiteNits: 1000
#[wasm_bindgen(js_name = createDefaultOptions)]
pub fn create_default_options() -> EncodeOptions {
    EncodeOptions::default()
}

/// Creates high quality encoding options (full-size gain map).
#[wasm_bindgen(js_name = createHighQualityOptions)]
pub fn create_high_quality_options() -> EncodeOptions {
    EncodeOptions::high_quality()
}

/// Creates small size encoding options.
///
/// # Returns
/// `EncodeOptions` optimized for file size:
/// - baseQuality: 80
/// - gainMapQuality: 70
/// - gainMapScale: 8
#[wasm_bindgen(js_name = createSmallSizeOptions)]
pub fn create_small_size_options() -> EncodeOptions {
    EncodeOptions::small_size()
}

/// Creates default gain map metadata.
#[wasm_bindgen(js_name = createDefaultMetadata)]
pub fn create_default_metadata() -> GainMapMetadata {
    GainMapMetadata::default()
}

/// Validates gain map metadata.
///
/// # Returns
/// `true` if the metadata is valid, `false` otherwise
#[wasm_bindgen(js_name = validateMetadata)]
pub fn validate_metadata(metadata: &GainMapMetadata) -> bool {
    gainmap::validate_metadata(metadata).is_ok()
}

/// Estimates the HDR headroom from metadata.
///
/// # Returns
/// The additional stops of dynamic range above SDR at full application.
#[wasm_bindgen(js_name = estimateHdrHeadroom)]
pub fn estimate_hdr_headroom(metadata: &GainMapMetadata) -> f32 {
    gainmap::estimate_hdr_headroom(metadata)
}

/// Checks if metadata indicates a meaningful HDR image.
///
/// # Returns
/// `true` if the gain map extends dynamic range by more than half a stop.
#[wasm_bindgen(js_name = isMeaningfulHdr)]
pub fn is_meaningful_hdr(metadata: &GainMapMetadata) -> bool {
    gainmap::is_meaningful_hdr(metadata)
}
