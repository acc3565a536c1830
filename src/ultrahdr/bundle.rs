//! Portable metadata bundle.
//!
//! Holds every APP payload needed to rebuild a container around new pixel
//! data. In JSON the byte fields are standard base64.

use super::container::assemble_container;
use super::split::SplitResult;
use crate::error::{Result, UltraHdrError};
use crate::jpeg::parser::extract_exif_and_icc;
use serde::{Deserialize, Serialize};

/// Format tag written into every bundle.
pub const BUNDLE_FORMAT: &str = "ultrahdr-meta-1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataBundle {
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_opt")]
    pub primary_xmp: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_opt")]
    pub primary_iso: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_opt")]
    pub secondary_xmp: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_opt")]
    pub secondary_iso: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_opt")]
    pub exif: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "base64_list")]
    pub icc: Vec<Vec<u8>>,
}

impl MetadataBundle {
    /// Collects the split's metadata segments and the primary's EXIF/ICC.
    pub fn from_split(split: &SplitResult) -> Result<Self> {
        let (exif, icc) = extract_exif_and_icc(&split.primary_jpeg)?;
        let segments = &split.segments;
        Ok(Self {
            format: BUNDLE_FORMAT.to_string(),
            primary_xmp: segments.primary_xmp.clone(),
            primary_iso: segments.primary_iso.clone(),
            secondary_xmp: segments.secondary_xmp.clone(),
            secondary_iso: segments.secondary_iso.clone(),
            exif,
            icc,
        })
    }

    /// Checks the format tag and that gain map metadata is present.
    pub fn validate(&self) -> Result<()> {
        if self.format.is_empty() {
            return Err(UltraHdrError::BundleError("missing format".into()));
        }
        if self.format != BUNDLE_FORMAT {
            return Err(UltraHdrError::BundleError(format!(
                "unsupported format {:?}",
                self.format
            )));
        }
        if self.secondary_xmp.as_ref().map_or(true, Vec::is_empty)
            && self.secondary_iso.as_ref().map_or(true, Vec::is_empty)
        {
            return Err(UltraHdrError::BundleError(
                "missing gain map metadata".into(),
            ));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses and validates a bundle.
    pub fn from_json(json: &str) -> Result<Self> {
        let bundle: Self = serde_json::from_str(json)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Builds a container from new primary and gain map streams.
    pub fn assemble(&self, primary: &[u8], gainmap: &[u8]) -> Result<Vec<u8>> {
        self.validate()?;
        assemble_container(
            primary,
            gainmap,
            self.exif.as_deref(),
            &self.icc,
            self.primary_xmp.as_deref(),
            self.secondary_xmp.as_deref(),
            self.secondary_iso.as_deref(),
        )
    }
}

mod base64_opt {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_str(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(text) => STANDARD
                .decode(text)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

mod base64_list {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[Vec<u8>], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(value.len()))?;
        for bytes in value {
            seq.serialize_element(&STANDARD.encode(bytes))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(d)?
            .into_iter()
            .map(|text| STANDARD.decode(text).map_err(serde::de::Error::custom))
            .collect()
    }
}
