//! Shared types for UltraHDR operations.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Gain map metadata in its canonical linear form.
///
/// Boost and capacity fields hold linear values; XMP and ISO 21496-1 carry
/// them as log2 on the wire and the codecs convert at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[wasm_bindgen(getter_with_clone)]
pub struct GainMapMetadata {
    /// Metadata version (e.g., "1.0")
    pub version: String,

    /// Minimum content boost per channel (linear)
    #[wasm_bindgen(skip)]
    pub min_content_boost: [f32; 3],

    /// Maximum content boost per channel (linear)
    #[wasm_bindgen(skip)]
    pub max_content_boost: [f32; 3],

    /// Gamma applied to the encoded gain per channel
    #[wasm_bindgen(skip)]
    pub gamma: [f32; 3],

    /// SDR offset per channel, added before the gain is applied
    #[wasm_bindgen(skip)]
    pub offset_sdr: [f32; 3],

    /// HDR offset per channel, subtracted after the gain is applied
    #[wasm_bindgen(skip)]
    pub offset_hdr: [f32; 3],

    /// Display boost at which the gain map starts to apply (linear)
    #[wasm_bindgen(js_name = hdrCapacityMin)]
    pub hdr_capacity_min: f32,

    /// Display boost at which the gain map applies fully (linear)
    #[wasm_bindgen(js_name = hdrCapacityMax)]
    pub hdr_capacity_max: f32,

    /// Whether the gain map is applied in the base image's color space
    #[wasm_bindgen(js_name = useBaseColorSpace)]
    pub use_base_color_space: bool,
}

#[wasm_bindgen]
impl GainMapMetadata {
    /// Creates a new GainMapMetadata with default values.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates single-channel metadata for an SDR base whose brightest
    /// content is `max_boost` times SDR white.
    #[wasm_bindgen(js_name = forSdrBase)]
    pub fn for_sdr_base(max_boost: f32) -> Self {
        Self {
            version: "1.0".to_string(),
            min_content_boost: [1.0; 3],
            max_content_boost: [max_boost; 3],
            gamma: [1.0; 3],
            offset_sdr: [1.0 / 64.0; 3],
            offset_hdr: [1.0 / 64.0; 3],
            hdr_capacity_min: 1.0,
            hdr_capacity_max: max_boost,
            use_base_color_space: true,
        }
    }

    /// True when all three channels carry identical parameters.
    #[wasm_bindgen(js_name = isSingleChannel)]
    pub fn is_single_channel(&self) -> bool {
        fn same(v: &[f32; 3]) -> bool {
            v[0] == v[1] && v[1] == v[2]
        }
        same(&self.min_content_boost)
            && same(&self.max_content_boost)
            && same(&self.gamma)
            && same(&self.offset_sdr)
            && same(&self.offset_hdr)
    }

    #[wasm_bindgen(getter = minContentBoost)]
    pub fn min_content_boost_js(&self) -> Vec<f32> {
        self.min_content_boost.to_vec()
    }

    #[wasm_bindgen(setter = minContentBoost)]
    pub fn set_min_content_boost_js(&mut self, values: Vec<f32>) {
        self.min_content_boost = to_channels(&values, self.min_content_boost);
    }

    #[wasm_bindgen(getter = maxContentBoost)]
    pub fn max_content_boost_js(&self) -> Vec<f32> {
        self.max_content_boost.to_vec()
    }

    #[wasm_bindgen(setter = maxContentBoost)]
    pub fn set_max_content_boost_js(&mut self, values: Vec<f32>) {
        self.max_content_boost = to_channels(&values, self.max_content_boost);
    }

    #[wasm_bindgen(getter = gamma)]
    pub fn gamma_js(&self) -> Vec<f32> {
        self.gamma.to_vec()
    }

    #[wasm_bindgen(setter = gamma)]
    pub fn set_gamma_js(&mut self, values: Vec<f32>) {
        self.gamma = to_channels(&values, self.gamma);
    }

    #[wasm_bindgen(getter = offsetSdr)]
    pub fn offset_sdr_js(&self) -> Vec<f32> {
        self.offset_sdr.to_vec()
    }

    #[wasm_bindgen(setter = offsetSdr)]
    pub fn set_offset_sdr_js(&mut self, values: Vec<f32>) {
        self.offset_sdr = to_channels(&values, self.offset_sdr);
    }

    #[wasm_bindgen(getter = offsetHdr)]
    pub fn offset_hdr_js(&self) -> Vec<f32> {
        self.offset_hdr.to_vec()
    }

    #[wasm_bindgen(setter = offsetHdr)]
    pub fn set_offset_hdr_js(&mut self, values: Vec<f32>) {
        self.offset_hdr = to_channels(&values, self.offset_hdr);
    }
}

impl Default for GainMapMetadata {
    fn default() -> Self {
        Self::for_sdr_base(4.0)
    }
}

// One value broadcasts, three values map per channel, anything else is ignored.
fn to_channels(values: &[f32], current: [f32; 3]) -> [f32; 3] {
    match values {
        [v] => [*v; 3],
        [r, g, b] => [*r, *g, *b],
        _ => current,
    }
}

/// Linear-light HDR image, interleaved RGB `f32`.
///
/// Decoder output has 1.0 at SDR white. Encoder input has 1.0 at the
/// encode options' `hdr_white_nits`.
#[derive(Debug, Clone, PartialEq)]
#[wasm_bindgen(getter_with_clone)]
pub struct HdrImage {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// RGB samples, `width * height * 3` values
    pub pixels: Vec<f32>,

    /// Color gamut of the samples
    pub gamut: ColorGamut,
}

#[wasm_bindgen]
impl HdrImage {
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<f32>, gamut: ColorGamut) -> Self {
        Self {
            width,
            height,
            pixels,
            gamut,
        }
    }

    /// Pixels as a typed array, without the intermediate `Array` copy.
    #[wasm_bindgen(js_name = pixelsArray)]
    pub fn pixels_array(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(self.pixels.as_slice())
    }
}

impl HdrImage {
    /// RGB triple at `(x, y)`, `None` outside the image or past the end of
    /// `pixels`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        let px = self.pixels.get(i..i + 3)?;
        Some([px[0], px[1], px[2]])
    }
}

/// Result of splitting an UltraHDR image into its parts.
#[derive(Debug, Clone)]
#[wasm_bindgen(getter_with_clone)]
pub struct UltraHdrSplitResult {
    /// The primary (SDR) image as JPEG bytes
    #[wasm_bindgen(js_name = primaryImage)]
    pub primary_image: Vec<u8>,

    /// The gain map as JPEG bytes
    #[wasm_bindgen(js_name = gainMap)]
    pub gain_map: Vec<u8>,

    /// Gain map metadata
    pub metadata: GainMapMetadata,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Gain map width in pixels (may differ from image width)
    #[wasm_bindgen(js_name = gainMapWidth)]
    pub gain_map_width: u32,

    /// Gain map height in pixels (may differ from image height)
    #[wasm_bindgen(js_name = gainMapHeight)]
    pub gain_map_height: u32,
}

/// Options for encoding UltraHDR images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[wasm_bindgen]
pub struct EncodeOptions {
    /// JPEG quality for the base image (1-100)
    #[wasm_bindgen(js_name = baseQuality)]
    pub base_quality: u8,

    /// JPEG quality for the gain map (1-100)
    #[wasm_bindgen(js_name = gainMapQuality)]
    pub gain_map_quality: u8,

    /// Downscale factor for the gain map (1 = same size, 4 = quarter)
    #[wasm_bindgen(js_name = gainMapScale)]
    pub gain_map_scale: u8,

    /// Write an RGB gain map instead of a grayscale one
    #[wasm_bindgen(js_name = multiChannel)]
    pub multi_channel: bool,

    /// Gamma applied to the encoded gain
    #[wasm_bindgen(js_name = gainMapGamma)]
    pub gain_map_gamma: f32,

    /// Luminance of HDR 1.0 in nits
    #[wasm_bindgen(js_name = hdrWhiteNits)]
    pub hdr_white_nits: f32,

    /// Peak luminance of the intended display, 0 to use the content peak
    #[wasm_bindgen(js_name = targetDisplayNits)]
    pub target_display_nits: f32,

    /// Use BT.709 luminance for single-channel maps, max(R,G,B) otherwise
    #[wasm_bindgen(js_name = useLuminance)]
    pub use_luminance: bool,
}

#[wasm_bindgen]
impl EncodeOptions {
    /// Creates encoding options with default values.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options optimized for high quality output.
    #[wasm_bindgen(js_name = highQuality)]
    pub fn high_quality() -> Self {
        Self {
            base_quality: 98,
            gain_map_quality: 92,
            gain_map_scale: 1,
            ..Self::default()
        }
    }

    /// Creates options optimized for smaller file size.
    #[wasm_bindgen(js_name = smallSize)]
    pub fn small_size() -> Self {
        Self {
            base_quality: 80,
            gain_map_quality: 70,
            gain_map_scale: 8,
            ..Self::default()
        }
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            base_quality: 95,
            gain_map_quality: 85,
            gain_map_scale: 4,
            multi_channel: false,
            gain_map_gamma: 1.0,
            hdr_white_nits: 1000.0,
            target_display_nits: 0.0,
            use_luminance: true,
        }
    }
}

/// Options for reconstructing HDR pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[wasm_bindgen]
pub struct DecodeOptions {
    /// Display boost available (1.0 = SDR only); 0 applies the full gain map
    #[wasm_bindgen(js_name = maxDisplayBoost)]
    pub max_display_boost: f32,
}

#[wasm_bindgen]
impl DecodeOptions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Resampling filter used by resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[wasm_bindgen]
pub enum Interpolation {
    Nearest = 0,
    Bilinear = 1,
    Bicubic = 2,
    Mitchell = 3,
    Lanczos2 = 4,
    Lanczos3 = 5,
}

impl Default for Interpolation {
    fn default() -> Self {
        Interpolation::Nearest
    }
}

/// Options for resizing an UltraHDR image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[wasm_bindgen]
pub struct ResizeOptions {
    /// JPEG quality for the resized primary image
    #[wasm_bindgen(js_name = primaryQuality)]
    pub primary_quality: u8,

    /// JPEG quality for the resized gain map
    #[wasm_bindgen(js_name = gainMapQuality)]
    pub gain_map_quality: u8,

    /// Resampling filter
    pub interpolation: Interpolation,
}

#[wasm_bindgen]
impl ResizeOptions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            primary_quality: 85,
            gain_map_quality: 75,
            interpolation: Interpolation::Nearest,
        }
    }
}

/// Options for replacing the SDR base of an UltraHDR image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[wasm_bindgen]
pub struct RebaseOptions {
    /// JPEG quality for the primary image when it is re-encoded
    #[wasm_bindgen(js_name = baseQuality)]
    pub base_quality: u8,

    /// JPEG quality for the recomputed gain map
    #[wasm_bindgen(js_name = gainMapQuality)]
    pub gain_map_quality: u8,

    /// Re-encode the new base instead of embedding its JPEG bytes as given
    #[wasm_bindgen(js_name = reencodeBase)]
    pub reencode_base: bool,
}

#[wasm_bindgen]
impl RebaseOptions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for RebaseOptions {
    fn default() -> Self {
        Self {
            base_quality: 95,
            gain_map_quality: 85,
            reencode_base: false,
        }
    }
}

/// Color gamut enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[wasm_bindgen]
pub enum ColorGamut {
    /// Standard sRGB color space (BT.709 primaries)
    Srgb = 0,
    /// Display P3 wide color gamut
    DisplayP3 = 1,
    /// BT.2100/BT.2020 wide color gamut (HDR)
    Bt2100 = 2,
    /// Adobe RGB (1998)
    AdobeRgb = 3,
}

impl Default for ColorGamut {
    fn default() -> Self {
        ColorGamut::Srgb
    }
}

/// Transfer function of an encoded SDR image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[wasm_bindgen]
pub enum TransferFunction {
    /// sRGB piecewise curve
    Srgb = 0,
    /// Linear (no gamma)
    Linear = 1,
    /// Pure power 2.2 (Adobe RGB)
    Gamma22 = 2,
}

impl Default for TransferFunction {
    fn default() -> Self {
        TransferFunction::Srgb
    }
}

/// Result of probing an image to check if it's UltraHDR.
///
/// This provides detailed information about what components were found
/// without decoding any pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[wasm_bindgen(getter_with_clone)]
pub struct UltraHdrProbeResult {
    /// Whether the image is a valid UltraHDR image (has all required components)
    #[wasm_bindgen(js_name = isValid)]
    pub is_valid: bool,

    /// Whether a primary JPEG image was found
    #[wasm_bindgen(js_name = hasPrimaryImage)]
    pub has_primary_image: bool,

    /// Whether a gain map image was found
    #[wasm_bindgen(js_name = hasGainMap)]
    pub has_gain_map: bool,

    /// Whether XMP gain map metadata was found
    #[wasm_bindgen(js_name = hasXmpMetadata)]
    pub has_xmp_metadata: bool,

    /// Whether ISO 21496-1 gain map metadata was found
    #[wasm_bindgen(js_name = hasIsoMetadata)]
    pub has_iso_metadata: bool,

    /// Primary image width in pixels (0 if not found)
    pub width: u32,

    /// Primary image height in pixels (0 if not found)
    pub height: u32,

    /// Gain map width in pixels (0 if not found)
    #[wasm_bindgen(js_name = gainMapWidth)]
    pub gain_map_width: u32,

    /// Gain map height in pixels (0 if not found)
    #[wasm_bindgen(js_name = gainMapHeight)]
    pub gain_map_height: u32,

    /// Maximum display boost the gain map targets, 0 if not found
    #[wasm_bindgen(js_name = hdrCapacity)]
    pub hdr_capacity: f32,

    /// Metadata version string (empty if not found)
    #[wasm_bindgen(js_name = metadataVersion)]
    pub metadata_version: String,
}

#[wasm_bindgen]
impl UltraHdrProbeResult {
    /// Creates a new probe result with default (invalid) values.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for UltraHdrProbeResult {
    fn default() -> Self {
        Self {
            is_valid: false,
            has_primary_image: false,
            has_gain_map: false,
            has_xmp_metadata: false,
            has_iso_metadata: false,
            width: 0,
            height: 0,
            gain_map_width: 0,
            gain_map_height: 0,
            hdr_capacity: 0.0,
            metadata_version: String::new(),
        }
    }
}
