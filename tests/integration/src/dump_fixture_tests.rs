//! Parsing and round-tripping the dumps under `test-fixtures/dumps`.

use std::path::PathBuf;

use nvram_core::crc::CrcPlan;
use nvram_core::{BlockKind, Document, LineEnding, TextEncoding, writer};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/dumps")
        .join(name)
}

fn read_fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture(name)).unwrap_or_else(|e| panic!("Failed to read fixture {name}: {e}"))
}

#[rstest]
#[case("amisce_lf.txt")]
#[case("amisce_crlf_crc.txt")]
#[case("latin1.txt")]
fn fixture_round_trips_byte_for_byte(#[case] name: &str) {
    let bytes = read_fixture(name);
    let doc = Document::parse(&bytes).unwrap();
    assert_eq!(writer::serialize(&doc, &CrcPlan::default()), bytes);
}

#[test]
fn lf_dump_structure() {
    let doc = Document::parse(&read_fixture("amisce_lf.txt")).unwrap();
    assert_eq!(doc.line_ending(), LineEnding::Lf);
    assert_eq!(doc.crc_header().map(|m| m.value.as_str()), Some("9B2E4F10"));

    let names: Vec<&str> = doc.blocks().iter().map(|b| b.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Fast Boot",
            "Package Power Limit",
            "PCIe Link Speed",
            "PCIe Link Speed",
            "System Language",
            "Asset Tag",
        ]
    );

    let power = &doc.blocks()[1];
    assert_eq!(power.token.as_deref(), Some("2A"));
    assert!(matches!(
        power.kind,
        BlockKind::Value { value: 0, min: Some(0), max: Some(500), .. }
    ));
    assert!(matches!(doc.blocks()[5].kind, BlockKind::Text { .. }));
    assert!(
        doc.blocks()[0]
            .help_text
            .as_deref()
            .unwrap()
            .ends_with("BBS boot options.")
    );
}

#[test]
fn crlf_dump_structure() {
    let doc = Document::parse(&read_fixture("amisce_crlf_crc.txt")).unwrap();
    assert_eq!(doc.line_ending(), LineEnding::CrLf);
    assert!(doc.crc_header().is_none());

    let above_4g = &doc.blocks()[0];
    let marker = above_4g.crc_marker.as_ref().unwrap();
    assert_eq!((marker.value.as_str(), marker.suffix.as_str()), ("1C2D3E4F", ",ver=02"));

    let timeout = &doc.blocks()[1];
    assert!(timeout.crc_marker.as_ref().unwrap().is_empty());
    assert!(matches!(
        timeout.kind,
        BlockKind::Value { value: 5, min: Some(1), max: Some(65535), .. }
    ));

    assert_eq!(doc.blocks()[2].summary(), "On");
}

#[test]
fn latin1_dump_is_decoded() {
    let doc = Document::parse(&read_fixture("latin1.txt")).unwrap();
    assert_eq!(doc.encoding(), TextEncoding::Latin1);
    assert_eq!(doc.blocks()[0].name, "Langue Fran\u{e7}aise");
    assert_eq!(doc.blocks()[0].summary(), "Fran\u{e7}ais");
}
