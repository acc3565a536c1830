//! Error types for UltraHDR container operations.

use thiserror::Error;

/// Coarse classification of an [`UltraHdrError`].
///
/// Callers that only need to tell "broken file" apart from "file without
/// gain map" match on this instead of the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Buffer ended before a structure was complete
    Truncated,
    /// Segment length field below 2 or past the end of the buffer
    InvalidLength,
    /// Not a JPEG, or a segment layout that cannot be walked
    MalformedContainer,
    /// Bad MPF directory
    MalformedMpf,
    /// No gain map stream or no gain map metadata
    MetadataMissing,
    /// Gain map metadata present but unusable
    MetadataInvalid,
    /// Two images that must share dimensions do not
    DimensionMismatch,
    /// Valid input this crate does not handle
    UnsupportedInput,
    /// Failure inside the JPEG codec
    Codec,
}

impl ErrorKind {
    /// True for the container-level malformations (truncation, bad lengths,
    /// bad marker layout).
    pub fn is_malformed_container(self) -> bool {
        matches!(
            self,
            ErrorKind::Truncated | ErrorKind::InvalidLength | ErrorKind::MalformedContainer
        )
    }
}

/// Errors that can occur during UltraHDR operations.
#[derive(Error, Debug)]
pub enum UltraHdrError {
    /// Invalid JPEG format or corrupted data
    #[error("Invalid JPEG format: {0}")]
    InvalidJpeg(String),

    /// Data ended before the structure being read was complete
    #[error("Truncated data: {0}")]
    Truncated(String),

    /// Segment length field is out of range
    #[error("Invalid segment length {length} at offset {offset}")]
    InvalidLength { offset: usize, length: usize },

    /// APP payload does not fit in a single segment
    #[error("Segment payload too large: {0} bytes")]
    SegmentTooLarge(usize),

    /// Multi-Picture Format directory is malformed
    #[error("Malformed MPF: {0}")]
    MalformedMpf(String),

    /// No gain map image found in the container
    #[error("No gain map found in image")]
    NoGainMap,

    /// Neither XMP nor ISO 21496-1 gain map metadata present
    #[error("No gain map metadata found")]
    MissingMetadata,

    /// XMP parsing or validation error
    #[error("XMP error: {0}")]
    XmpError(String),

    /// ISO 21496-1 binary metadata error
    #[error("ISO 21496-1 metadata error: {0}")]
    IsoError(String),

    /// Gain map metadata error
    #[error("Gain map metadata error: {0}")]
    MetadataError(String),

    /// Metadata bundle error
    #[error("Metadata bundle error: {0}")]
    BundleError(String),

    /// Image dimension mismatch
    #[error("Image dimension mismatch: expected {0}x{1}, got {2}x{3}")]
    DimensionMismatch(u32, u32, u32, u32),

    /// Invalid dimensions (e.g., zero width)
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Invalid quality value
    #[error("Invalid quality value: {0} (must be 1-100)")]
    InvalidQuality(u8),

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Image decoding error
    #[error("Image decoding error: {0}")]
    DecodeError(String),

    /// Image encoding error
    #[error("Image encoding error: {0}")]
    EncodeError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),
}

impl UltraHdrError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UltraHdrError::Truncated(_) => ErrorKind::Truncated,
            UltraHdrError::InvalidLength { .. } => ErrorKind::InvalidLength,
            UltraHdrError::InvalidJpeg(_) | UltraHdrError::SegmentTooLarge(_) => {
                ErrorKind::MalformedContainer
            }
            UltraHdrError::MalformedMpf(_) => ErrorKind::MalformedMpf,
            UltraHdrError::NoGainMap | UltraHdrError::MissingMetadata => {
                ErrorKind::MetadataMissing
            }
            UltraHdrError::XmpError(_)
            | UltraHdrError::IsoError(_)
            | UltraHdrError::MetadataError(_)
            | UltraHdrError::BundleError(_) => ErrorKind::MetadataInvalid,
            UltraHdrError::DimensionMismatch(..) => ErrorKind::DimensionMismatch,
            UltraHdrError::InvalidDimensions(_)
            | UltraHdrError::InvalidQuality(_)
            | UltraHdrError::Unsupported(_) => ErrorKind::UnsupportedInput,
            UltraHdrError::DecodeError(_)
            | UltraHdrError::EncodeError(_)
            | UltraHdrError::IoError(_) => ErrorKind::Codec,
        }
    }
}

/// Result type alias for UltraHDR operations.
pub type Result<T> = std::result::Result<T, UltraHdrError>;

impl From<std::io::Error> for UltraHdrError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            UltraHdrError::Truncated(err.to_string())
        } else {
            UltraHdrError::IoError(err.to_string())
        }
    }
}

impl From<quick_xml::Error> for UltraHdrError {
    fn from(err: quick_xml::Error) -> Self {
        UltraHdrError::XmpError(err.to_string())
    }
}

impl From<image::ImageError> for UltraHdrError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Encoding(_) => UltraHdrError::EncodeError(err.to_string()),
            image::ImageError::Unsupported(_) => UltraHdrError::Unsupported(err.to_string()),
            _ => UltraHdrError::DecodeError(err.to_string()),
        }
    }
}

impl From<zune_jpeg::errors::DecodeErrors> for UltraHdrError {
    fn from(err: zune_jpeg::errors::DecodeErrors) -> Self {
        UltraHdrError::DecodeError(format!("{:?}", err))
    }
}

impl From<serde_json::Error> for UltraHdrError {
    fn from(err: serde_json::Error) -> Self {
        UltraHdrError::BundleError(err.to_string())
    }
}

impl From<base64::DecodeError> for UltraHdrError {
    fn from(err: base64::DecodeError) -> Self {
        UltraHdrError::BundleError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_container_grouping() {
        assert!(UltraHdrError::Truncated("eoi".into()).kind().is_malformed_container());
        assert!(UltraHdrError::InvalidLength { offset: 4, length: 1 }
            .kind()
            .is_malformed_container());
        assert!(UltraHdrError::InvalidJpeg("soi".into()).kind().is_malformed_container());
        assert!(!UltraHdrError::MalformedMpf("x".into()).kind().is_malformed_container());
        assert!(!UltraHdrError::NoGainMap.kind().is_malformed_container());
    }

    #[test]
    fn test_io_eof_is_truncated() {
        let err: UltraHdrError =
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short").into();
        assert_eq!(err.kind(), ErrorKind::Truncated);
    }

    #[test]
    fn test_metadata_kinds() {
        assert_eq!(UltraHdrError::MissingMetadata.kind(), ErrorKind::MetadataMissing);
        assert_eq!(UltraHdrError::IsoError("v".into()).kind(), ErrorKind::MetadataInvalid);
        assert_eq!(
            UltraHdrError::DimensionMismatch(1, 1, 2, 2).kind(),
            ErrorKind::DimensionMismatch
        );
    }
}
