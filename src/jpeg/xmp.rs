//! XMP codec for gain map metadata.
//!
//! Reads the `hdrgm` namespace in both its attribute form and the older
//! `rdf:Seq` element form, and writes the compact single-line RDF packets
//! used for the primary and gain map images.

use super::parser::XMP_NAMESPACE;
use crate::error::{Result, UltraHdrError};
use crate::gainmap::math::{exp2f, log2f};
use crate::types::GainMapMetadata;
use log::trace;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::io::Cursor;

/// XMP namespace URIs
pub const HDRGM_NAMESPACE: &str = "http://ns.adobe.com/hdr-gain-map/1.0/";
pub const HDRGM_PREFIX: &str = "hdrgm";

pub const CONTAINER_NAMESPACE: &str = "http://ns.google.com/photos/1.0/container/";
pub const CONTAINER_ITEM_NAMESPACE: &str = "http://ns.google.com/photos/1.0/container/item/";

const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const XMP_TOOLKIT: &str = "Adobe XMP Core 5.1.2";
const ITEM_LENGTH_ATTR: &[u8] = b"Item:Length=\"";

/// `hdrgm` properties found in a packet, keyed by local name.
#[derive(Debug, Default)]
struct HdrgmProperties {
    scalars: HashMap<String, String>,
    sequences: HashMap<String, Vec<String>>,
}

impl HdrgmProperties {
    fn collect(xml: &str) -> Result<Self> {
        let mut props = HdrgmProperties::default();
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut current: Option<String> = None;
        let mut in_item = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    if is_hdrgm(name.as_ref()) {
                        current = Some(local_name(name.as_ref()).to_string());
                    } else if name.as_ref() == b"rdf:li" {
                        in_item = true;
                    }
                    props.read_attributes(&e)?;
                }
                Event::Empty(e) => props.read_attributes(&e)?,
                Event::Text(e) => {
                    if let Some(name) = &current {
                        let text = e.unescape()?.trim().to_string();
                        if in_item {
                            props.sequences.entry(name.clone()).or_default().push(text);
                        } else {
                            props.scalars.entry(name.clone()).or_insert(text);
                        }
                    }
                }
                Event::End(e) => {
                    let name = e.name();
                    if name.as_ref() == b"rdf:li" {
                        in_item = false;
                    } else if is_hdrgm(name.as_ref()) {
                        current = None;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(props)
    }

    fn read_attributes(&mut self, e: &BytesStart<'_>) -> Result<()> {
        for attr in e.attributes().flatten() {
            let key = attr.key.as_ref();
            if is_hdrgm(key) {
                let value = attr.unescape_value()?.trim().to_string();
                self.scalars.entry(local_name(key).to_string()).or_insert(value);
            }
        }
        Ok(())
    }

    fn scalar(&self, name: &str) -> Option<&str> {
        self.scalars.get(name).map(String::as_str)
    }

    fn sequence(&self, name: &str) -> Option<&[String]> {
        self.sequences
            .get(name)
            .map(Vec::as_slice)
            .filter(|s| !s.is_empty())
    }
}

fn is_hdrgm(name: &[u8]) -> bool {
    name.starts_with(b"hdrgm:")
}

fn local_name(name: &[u8]) -> &str {
    let name = std::str::from_utf8(name).unwrap_or("");
    name.rsplit(':').next().unwrap_or(name)
}

fn parse_number(field: &str, value: &str) -> Result<f32> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|_| UltraHdrError::XmpError(format!("invalid {} value: {:?}", field, value)))
}

// One value broadcasts; otherwise up to three values fill channels in order.
fn parse_sequence(field: &str, values: &[String]) -> Result<[f32; 3]> {
    let mut out = [0.0f32; 3];
    if values.len() == 1 {
        out = [parse_number(field, &values[0])?; 3];
    } else {
        for (slot, value) in out.iter_mut().zip(values) {
            *slot = parse_number(field, value)?;
        }
    }
    Ok(out)
}

/// Parses a gain map XMP APP1 payload (namespace prefix included).
pub fn parse_xmp(payload: &[u8]) -> Result<GainMapMetadata> {
    let body = payload
        .strip_prefix(XMP_NAMESPACE)
        .ok_or_else(|| UltraHdrError::XmpError("missing XMP namespace prefix".into()))?;
    let xml = std::str::from_utf8(body)
        .map_err(|e| UltraHdrError::XmpError(format!("Invalid UTF-8 in XMP: {}", e)))?;
    parse_xmp_str(xml)
}

/// Parses gain map metadata from the XML text of an XMP packet.
pub fn parse_xmp_str(xml: &str) -> Result<GainMapMetadata> {
    let props = HdrgmProperties::collect(xml)?;

    let mut meta = GainMapMetadata {
        version: String::new(),
        min_content_boost: [1.0, 0.0, 0.0],
        max_content_boost: [1.0, 0.0, 0.0],
        gamma: [1.0, 0.0, 0.0],
        offset_sdr: [1.0 / 64.0, 0.0, 0.0],
        offset_hdr: [1.0 / 64.0, 0.0, 0.0],
        hdr_capacity_min: 1.0,
        hdr_capacity_max: 1.0,
        use_base_color_space: true,
    };

    meta.version = props
        .scalar("Version")
        .ok_or_else(|| UltraHdrError::XmpError("missing hdrgm:Version".into()))?
        .to_string();

    if let Some(v) = props.scalar("GainMapMax") {
        meta.max_content_boost[0] = exp2f(parse_number("GainMapMax", v)?);
    } else if let Some(seq) = props.sequence("GainMapMax") {
        trace!("GainMapMax given as rdf:Seq");
        let logs = parse_sequence("GainMapMax", seq)?;
        meta.max_content_boost = logs.map(exp2f);
    } else {
        return Err(UltraHdrError::XmpError("missing hdrgm:GainMapMax".into()));
    }

    let cap_max = props
        .scalar("HDRCapacityMax")
        .ok_or_else(|| UltraHdrError::XmpError("missing hdrgm:HDRCapacityMax".into()))?;
    meta.hdr_capacity_max = exp2f(parse_number("HDRCapacityMax", cap_max)?);

    if let Some(v) = props.scalar("GainMapMin") {
        meta.min_content_boost[0] = exp2f(parse_number("GainMapMin", v)?);
    } else if let Some(seq) = props.sequence("GainMapMin") {
        meta.min_content_boost = parse_sequence("GainMapMin", seq)?.map(exp2f);
    }

    if let Some(v) = props.scalar("Gamma") {
        meta.gamma[0] = parse_number("Gamma", v)?;
    } else if let Some(seq) = props.sequence("Gamma") {
        meta.gamma = parse_sequence("Gamma", seq)?;
    }

    if let Some(v) = props.scalar("OffsetSDR") {
        meta.offset_sdr[0] = parse_number("OffsetSDR", v)?;
    }
    if let Some(v) = props.scalar("OffsetHDR") {
        meta.offset_hdr[0] = parse_number("OffsetHDR", v)?;
    }
    if let Some(v) = props.scalar("HDRCapacityMin") {
        meta.hdr_capacity_min = exp2f(parse_number("HDRCapacityMin", v)?);
    }

    if props.scalar("BaseRenditionIsHDR") == Some("True") {
        return Err(UltraHdrError::XmpError(
            "BaseRenditionIsHDR=True is not supported".into(),
        ));
    }

    for values in [
        &mut meta.min_content_boost,
        &mut meta.max_content_boost,
        &mut meta.gamma,
        &mut meta.offset_sdr,
        &mut meta.offset_hdr,
    ] {
        for c in 1..3 {
            if values[c] == 0.0 {
                values[c] = values[0];
            }
        }
    }

    Ok(meta)
}

fn xmpmeta_start() -> BytesStart<'static> {
    let mut xmpmeta = BytesStart::new("x:xmpmeta");
    xmpmeta.push_attribute(("xmlns:x", "adobe:ns:meta/"));
    xmpmeta.push_attribute(("x:xmptk", XMP_TOOLKIT));
    xmpmeta
}

fn rdf_start() -> BytesStart<'static> {
    let mut rdf = BytesStart::new("rdf:RDF");
    rdf.push_attribute(("xmlns:rdf", RDF_NAMESPACE));
    rdf
}

fn with_namespace(xml: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(XMP_NAMESPACE.len() + xml.len());
    out.extend_from_slice(XMP_NAMESPACE);
    out.extend_from_slice(&xml);
    out
}

/// Builds the gain map image's XMP APP1 payload.
///
/// Only channel 0 is written; multi-channel parameters travel in the ISO
/// record.
pub fn build_gainmap_xmp(meta: &GainMapMetadata) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Start(xmpmeta_start()))?;
    writer.write_event(Event::Start(rdf_start()))?;

    let min = format_g(log2f(meta.min_content_boost[0]) as f64);
    let max = format_g(log2f(meta.max_content_boost[0]) as f64);
    let gamma = format_g(meta.gamma[0] as f64);
    let offset_sdr = format_g(meta.offset_sdr[0] as f64);
    let offset_hdr = format_g(meta.offset_hdr[0] as f64);
    let cap_min = format_g(log2f(meta.hdr_capacity_min) as f64);
    let cap_max = format_g(log2f(meta.hdr_capacity_max) as f64);

    let mut desc = BytesStart::new("rdf:Description");
    desc.push_attribute(("xmlns:hdrgm", HDRGM_NAMESPACE));
    desc.push_attribute(("hdrgm:Version", meta.version.as_str()));
    desc.push_attribute(("hdrgm:GainMapMin", min.as_str()));
    desc.push_attribute(("hdrgm:GainMapMax", max.as_str()));
    desc.push_attribute(("hdrgm:Gamma", gamma.as_str()));
    desc.push_attribute(("hdrgm:OffsetSDR", offset_sdr.as_str()));
    desc.push_attribute(("hdrgm:OffsetHDR", offset_hdr.as_str()));
    desc.push_attribute(("hdrgm:HDRCapacityMin", cap_min.as_str()));
    desc.push_attribute(("hdrgm:HDRCapacityMax", cap_max.as_str()));
    desc.push_attribute(("hdrgm:BaseRenditionIsHDR", "False"));
    writer.write_event(Event::Empty(desc))?;

    writer.write_event(Event::End(BytesEnd::new("rdf:RDF")))?;
    writer.write_event(Event::End(BytesEnd::new("x:xmpmeta")))?;

    Ok(with_namespace(writer.into_inner().into_inner()))
}

/// Builds the primary image's XMP APP1 payload: the version plus a
/// container directory whose GainMap item records `gainmap_len`.
pub fn build_primary_xmp(meta: &GainMapMetadata, gainmap_len: usize) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Start(xmpmeta_start()))?;
    writer.write_event(Event::Start(rdf_start()))?;

    let mut desc = BytesStart::new("rdf:Description");
    desc.push_attribute(("xmlns:Container", CONTAINER_NAMESPACE));
    desc.push_attribute(("xmlns:Item", CONTAINER_ITEM_NAMESPACE));
    desc.push_attribute(("xmlns:hdrgm", HDRGM_NAMESPACE));
    desc.push_attribute(("hdrgm:Version", meta.version.as_str()));
    writer.write_event(Event::Start(desc))?;

    writer.write_event(Event::Start(BytesStart::new("Container:Directory")))?;
    writer.write_event(Event::Start(BytesStart::new("rdf:Seq")))?;

    let length = gainmap_len.to_string();
    let items: [&[(&str, &str)]; 2] = [
        &[("Item:Semantic", "Primary"), ("Item:Mime", "image/jpeg")],
        &[
            ("Item:Semantic", "GainMap"),
            ("Item:Mime", "image/jpeg"),
            ("Item:Length", length.as_str()),
        ],
    ];
    for attrs in items {
        let mut li = BytesStart::new("rdf:li");
        li.push_attribute(("rdf:parseType", "Resource"));
        writer.write_event(Event::Start(li))?;
        let mut item = BytesStart::new("Container:Item");
        for attr in attrs {
            item.push_attribute(*attr);
        }
        writer.write_event(Event::Empty(item))?;
        writer.write_event(Event::End(BytesEnd::new("rdf:li")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("rdf:Seq")))?;
    writer.write_event(Event::End(BytesEnd::new("Container:Directory")))?;
    writer.write_event(Event::End(BytesEnd::new("rdf:Description")))?;
    writer.write_event(Event::End(BytesEnd::new("rdf:RDF")))?;
    writer.write_event(Event::End(BytesEnd::new("x:xmpmeta")))?;

    Ok(with_namespace(writer.into_inner().into_inner()))
}

/// Rewrites every `Item:Length="<digits>"` in an XMP payload.
///
/// Payloads without the attribute come back unchanged.
pub fn update_item_length(payload: &[u8], new_len: usize) -> Result<Vec<u8>> {
    let namespace = &XMP_NAMESPACE[..XMP_NAMESPACE.len() - 1];
    if !contains(payload, namespace) {
        return Err(UltraHdrError::XmpError(
            "payload is not an XMP packet".into(),
        ));
    }

    let replacement = new_len.to_string();
    let mut out = Vec::with_capacity(payload.len() + 8);
    let mut pos = 0;
    while let Some(found) = find(&payload[pos..], ITEM_LENGTH_ATTR) {
        let value_start = pos + found + ITEM_LENGTH_ATTR.len();
        let digits = payload[value_start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        let value_end = value_start + digits;
        if digits == 0 || payload.get(value_end) != Some(&b'"') {
            out.extend_from_slice(&payload[pos..value_start]);
            pos = value_start;
            continue;
        }
        out.extend_from_slice(&payload[pos..value_start]);
        out.extend_from_slice(replacement.as_bytes());
        pos = value_end;
    }
    out.extend_from_slice(&payload[pos..]);
    Ok(out)
}

/// Cheap probe for gain map XMP: the namespace URI or the `hdrgm:` prefix.
pub fn has_gain_map_metadata(xmp: &[u8]) -> bool {
    contains(xmp, HDRGM_NAMESPACE.as_bytes()) || contains(xmp, b"hdrgm:")
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}

/// Formats a number with six significant digits, switching to exponent
/// notation below 1e-4 or from 1e6, and dropping trailing zeros.
pub fn format_g(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if v == 0.0 {
        return "0".to_string();
    }

    let sci = format!("{:.5e}", v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs());
    }

    let decimals = (5 - exp) as usize;
    trim_zeros(&format!("{:.*}", decimals, v)).to_string()
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(xml: &str) -> Vec<u8> {
        let mut out = XMP_NAMESPACE.to_vec();
        out.extend_from_slice(xml.as_bytes());
        out
    }

    #[test]
    fn test_parse_attribute_form() {
        let xml = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
            <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
                <rdf:Description xmlns:hdrgm="http://ns.adobe.com/hdr-gain-map/1.0/"
                    hdrgm:Version="1.0"
                    hdrgm:GainMapMin="0"
                    hdrgm:GainMapMax="3"
                    hdrgm:Gamma="1"
                    hdrgm:OffsetSDR="0"
                    hdrgm:OffsetHDR="0"
                    hdrgm:HDRCapacityMin="0"
                    hdrgm:HDRCapacityMax="3"
                    hdrgm:BaseRenditionIsHDR="False"/>
            </rdf:RDF>
        </x:xmpmeta>"#;

        let meta = parse_xmp(&packet(xml)).unwrap();
        assert_eq!(meta.version, "1.0");
        assert_eq!(meta.max_content_boost, [8.0; 3]);
        assert_eq!(meta.min_content_boost, [1.0; 3]);
        // explicit zero offsets inherit channel 0, which is itself zero
        assert_eq!(meta.offset_sdr, [0.0; 3]);
        assert_eq!(meta.hdr_capacity_max, 8.0);
        assert!(meta.use_base_color_space);
    }

    #[test]
    fn test_parse_sequence_form() {
        let xml = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
            <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
                <rdf:Description xmlns:hdrgm="http://ns.adobe.com/hdr-gain-map/1.0/"
                    hdrgm:Version="1.0" hdrgm:HDRCapacityMax="1.0">
                    <hdrgm:GainMapMax>
                        <rdf:Seq><rdf:li>1.0</rdf:li></rdf:Seq>
                    </hdrgm:GainMapMax>
                    <hdrgm:Gamma>
                        <rdf:Seq><rdf:li>1.0</rdf:li><rdf:li>2.0</rdf:li><rdf:li>3.0</rdf:li></rdf:Seq>
                    </hdrgm:Gamma>
                </rdf:Description>
            </rdf:RDF>
        </x:xmpmeta>"#;

        let meta = parse_xmp(&packet(xml)).unwrap();
        assert_eq!(meta.max_content_boost, [2.0, 2.0, 2.0]);
        assert_eq!(meta.gamma, [1.0, 2.0, 3.0]);
        assert_eq!(meta.offset_hdr, [1.0 / 64.0; 3]);
    }

    #[test]
    fn test_parse_missing_version() {
        let xml = r#"<rdf:Description xmlns:hdrgm="http://ns.adobe.com/hdr-gain-map/1.0/"
            hdrgm:GainMapMax="2" hdrgm:HDRCapacityMax="2"/>"#;
        let err = parse_xmp(&packet(xml)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MetadataInvalid);
    }

    #[test]
    fn test_parse_missing_gain_map_max() {
        let xml = r#"<rdf:Description hdrgm:Version="1.0" hdrgm:HDRCapacityMax="2"/>"#;
        assert!(parse_xmp(&packet(xml)).is_err());
    }

    #[test]
    fn test_parse_rejects_hdr_base() {
        let xml = r#"<rdf:Description hdrgm:Version="1.0" hdrgm:GainMapMax="2"
            hdrgm:HDRCapacityMax="2" hdrgm:BaseRenditionIsHDR="True"/>"#;
        assert!(parse_xmp(&packet(xml)).is_err());
    }

    #[test]
    fn test_parse_bad_number() {
        let xml = r#"<rdf:Description hdrgm:Version="1.0" hdrgm:GainMapMax="lots"
            hdrgm:HDRCapacityMax="2"/>"#;
        let err = parse_xmp(&packet(xml)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MetadataInvalid);
    }

    #[test]
    fn test_parse_requires_namespace_prefix() {
        assert!(parse_xmp(b"<x:xmpmeta/>").is_err());
    }

    #[test]
    fn test_build_gainmap_xmp_exact() {
        let meta = GainMapMetadata::default();
        let xmp = build_gainmap_xmp(&meta).unwrap();
        let expected = concat!(
            "http://ns.adobe.com/xap/1.0/\0",
            r#"<x:xmpmeta xmlns:x="adobe:ns:meta/" x:xmptk="Adobe XMP Core 5.1.2">"#,
            r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">"#,
            r#"<rdf:Description xmlns:hdrgm="http://ns.adobe.com/hdr-gain-map/1.0/""#,
            r#" hdrgm:Version="1.0" hdrgm:GainMapMin="0" hdrgm:GainMapMax="2""#,
            r#" hdrgm:Gamma="1" hdrgm:OffsetSDR="0.015625" hdrgm:OffsetHDR="0.015625""#,
            r#" hdrgm:HDRCapacityMin="0" hdrgm:HDRCapacityMax="2""#,
            r#" hdrgm:BaseRenditionIsHDR="False"/></rdf:RDF></x:xmpmeta>"#,
        );
        assert_eq!(std::str::from_utf8(&xmp).unwrap(), expected);
    }

    #[test]
    fn test_gainmap_xmp_roundtrip() {
        let mut meta = GainMapMetadata::for_sdr_base(6.5);
        meta.min_content_boost = [0.5; 3];
        meta.gamma = [1.25; 3];
        let parsed = parse_xmp(&build_gainmap_xmp(&meta).unwrap()).unwrap();
        assert_eq!(parsed.version, meta.version);
        for c in 0..3 {
            assert!((parsed.max_content_boost[c] - 6.5).abs() < 1e-4);
            assert!((parsed.min_content_boost[c] - 0.5).abs() < 1e-6);
            assert_eq!(parsed.gamma[c], 1.25);
        }
        assert!((parsed.hdr_capacity_max - 6.5).abs() < 1e-4);
    }

    #[test]
    fn test_primary_xmp_directory() {
        let xmp = build_primary_xmp(&GainMapMetadata::default(), 1234).unwrap();
        let text = std::str::from_utf8(&xmp).unwrap();
        assert!(text.starts_with("http://ns.adobe.com/xap/1.0/\0<x:xmpmeta"));
        assert!(text.contains(
            r#"<rdf:li rdf:parseType="Resource"><Container:Item Item:Semantic="Primary" Item:Mime="image/jpeg"/></rdf:li>"#
        ));
        assert!(text.contains(r#"Item:Semantic="GainMap" Item:Mime="image/jpeg" Item:Length="1234"/>"#));
        assert!(has_gain_map_metadata(&xmp));
    }

    #[test]
    fn test_update_item_length() {
        let xmp = build_primary_xmp(&GainMapMetadata::default(), 99).unwrap();
        let updated = update_item_length(&xmp, 123456).unwrap();
        let text = std::str::from_utf8(&updated).unwrap();
        assert!(text.contains(r#"Item:Length="123456""#));
        assert!(!text.contains(r#"Item:Length="99""#));
        assert_eq!(updated.len(), xmp.len() + 4);

        let plain = packet("<x:xmpmeta/>");
        assert_eq!(update_item_length(&plain, 5).unwrap(), plain);
        assert!(update_item_length(b"Exif\0\0", 5).is_err());
    }

    #[test]
    fn test_has_gain_map_metadata() {
        assert!(has_gain_map_metadata(
            b"<x:xmpmeta xmlns:hdrgm=\"http://ns.adobe.com/hdr-gain-map/1.0/\"/>"
        ));
        assert!(!has_gain_map_metadata(b"<x:xmpmeta></x:xmpmeta>"));
    }

    #[test]
    fn test_format_g() {
        assert_eq!(format_g(0.015625), "0.015625");
        assert_eq!(format_g(1e-5), "1e-05");
        assert_eq!(format_g(1234567.0), "1.23457e+06");
        assert_eq!(format_g(2.0), "2");
        assert_eq!(format_g(100000.0), "100000");
        assert_eq!(format_g(0.0001), "0.0001");
        assert_eq!(format_g(-2.5), "-2.5");
        assert_eq!(format_g(0.0), "0");
        assert_eq!(format_g(f64::INFINITY), "+Inf");
    }
}
