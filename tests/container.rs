//! Container-level behavior on synthetic images: split/join, bundles,
//! detection and malformed input.

use image::{GrayImage, Luma, Rgb, RgbImage};
use ultrahdr_container::error::ErrorKind;
use ultrahdr_container::jpeg::codec::{encode_gray, encode_rgb, probe_dimensions};
use ultrahdr_container::jpeg::mpf;
use ultrahdr_container::jpeg::parser::XMP_NAMESPACE;
use ultrahdr_container::ultrahdr::{self, assemble_container, MetadataBundle};
use ultrahdr_container::GainMapMetadata;

fn primary_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 4) as u8, (y * 4) as u8, 90])
    });
    encode_rgb(&img, 90).unwrap()
}

fn gain_map_jpeg(width: u32, height: u32, value: u8) -> Vec<u8> {
    encode_gray(&GrayImage::from_pixel(width, height, Luma([value])), 85).unwrap()
}

fn sample_container() -> Vec<u8> {
    ultrahdr::join(
        &primary_jpeg(64, 48),
        &gain_map_jpeg(16, 12, 128),
        &GainMapMetadata::for_sdr_base(4.0),
    )
    .unwrap()
}

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn test_split_join_is_identity() {
    let container = sample_container();
    let parts = ultrahdr::split(&container).unwrap();

    assert!(approx_eq(parts.metadata.max_content_boost[0], 4.0));
    assert!(approx_eq(parts.metadata.offset_sdr[2], 1.0 / 64.0));
    assert_eq!(probe_dimensions(&parts.primary_jpeg).unwrap(), (64, 48));
    assert_eq!(probe_dimensions(&parts.gainmap_jpeg).unwrap(), (16, 12));

    assert_eq!(parts.join().unwrap(), container);
}

#[test]
fn test_container_layout() {
    let container = sample_container();
    let ranges = ultrahdr_container::jpeg::scan_jpegs(&container).unwrap();
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0].start, 0);
    assert_eq!(ranges[0].end, ranges[1].start);
    assert_eq!(ranges[1].end, container.len());

    let loc = mpf::find(&container).unwrap().unwrap();
    let payload = &container[loc.payload_offset..loc.payload_offset + loc.payload_len];
    let info = mpf::parse(payload).unwrap();
    assert_eq!(info.primary_size, ranges[0].end);
    assert_eq!(info.secondary_size, ranges[1].len());
    assert_eq!(loc.tiff_header_offset() + info.secondary_offset, ranges[1].start);
}

#[test]
fn test_bundle_reassembles_same_bytes() {
    let container = sample_container();
    let parts = ultrahdr::split(&container).unwrap();

    let json = parts.bundle().unwrap().to_json().unwrap();
    let bundle = MetadataBundle::from_json(&json).unwrap();
    let rebuilt = bundle
        .assemble(&parts.primary_jpeg, &parts.gainmap_jpeg)
        .unwrap();
    assert_eq!(rebuilt, container);
}

#[test]
fn test_detection_and_probe() {
    let container = sample_container();
    assert!(ultrahdr::is_ultra_hdr(container.as_slice()).unwrap());
    assert!(!ultrahdr::is_ultra_hdr(primary_jpeg(8, 8).as_slice()).unwrap());

    let probe = ultrahdr::probe(&container);
    assert!(probe.is_valid);
    assert!(probe.has_xmp_metadata && probe.has_iso_metadata);
    assert_eq!((probe.width, probe.height), (64, 48));
    assert_eq!((probe.gain_map_width, probe.gain_map_height), (16, 12));
    assert!(approx_eq(probe.hdr_capacity, 4.0));
}

#[test]
fn test_extract_base_is_first_stream() {
    let container = sample_container();
    let base = ultrahdr::extract_base(&container).unwrap();
    assert_eq!(base, ultrahdr::split(&container).unwrap().primary_jpeg);
    assert!(ultrahdr::split(&base).is_err());
}

#[test]
fn test_plain_jpeg_has_no_gain_map() {
    let err = ultrahdr::split(&primary_jpeg(8, 8)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MetadataMissing);
}

#[test]
fn test_truncated_container() {
    let container = sample_container();
    let err = ultrahdr::split(&container[..container.len() - 10]).unwrap_err();
    assert!(err.kind().is_malformed_container());
}

#[test]
fn test_zero_primary_size_mpf_is_malformed() {
    let mut container = sample_container();
    let loc = mpf::find(&container).unwrap().unwrap();
    let zeroed = mpf::generate(0, 0, 100, 50);
    assert_eq!(zeroed.len(), loc.payload_len);
    container[loc.payload_offset..loc.payload_offset + zeroed.len()].copy_from_slice(&zeroed);

    let err = mpf::parse(&zeroed).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedMpf);

    // The marker walk still finds both streams.
    let parts = ultrahdr::split(&container).unwrap();
    assert_eq!(probe_dimensions(&parts.gainmap_jpeg).unwrap(), (16, 12));
}

#[test]
fn test_sequence_form_xmp_only() {
    let xml = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description xmlns:hdrgm="http://ns.adobe.com/hdr-gain-map/1.0/"
        hdrgm:Version="1.0" hdrgm:HDRCapacityMax="1.0">
      <hdrgm:GainMapMax>
        <rdf:Seq><rdf:li>1.0</rdf:li></rdf:Seq>
      </hdrgm:GainMapMax>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>"#;
    let mut xmp = XMP_NAMESPACE.to_vec();
    xmp.extend_from_slice(xml.as_bytes());

    let container = assemble_container(
        &primary_jpeg(32, 32),
        &gain_map_jpeg(8, 8, 200),
        None,
        &[],
        None,
        Some(&xmp),
        None,
    )
    .unwrap();

    let meta = ultrahdr::extract_metadata(&container).unwrap();
    assert_eq!(meta.max_content_boost, [2.0; 3]);
    assert!(ultrahdr::is_ultra_hdr(container.as_slice()).unwrap());
    assert!(!ultrahdr::probe(&container).has_iso_metadata);
}
