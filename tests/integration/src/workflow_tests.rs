//! Load, edit and save workflows on copies of the fixture dumps.

use nvram_core::{
    BlockId, CrcMode, EditError, EditRequest, EditSession, EditorConfig, MatchQuery,
};
use nvram_test_utils::dump::TempDump;
use pretty_assertions::assert_eq;

fn fixture_dump(name: &str) -> TempDump {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/dumps")
        .join(name);
    let bytes = std::fs::read(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {e}", path.display()));
    TempDump::new(bytes)
}

fn load(dump: &TempDump) -> EditSession {
    EditSession::load(dump.path(), EditorConfig::default()).unwrap()
}

#[test]
fn second_pcie_port_by_token() {
    let dump = fixture_dump("amisce_lf.txt");
    let mut session = load(&dump);

    let ambiguous = session
        .find(&MatchQuery::new("PCIe Link Speed").exact(true))
        .unwrap();
    assert!(ambiguous.ambiguous);

    let id = session
        .find(&MatchQuery::new("PCIe Link Speed").exact(true).token("41"))
        .unwrap()
        .require_unique()
        .unwrap()
        .id;
    assert_eq!(id, BlockId(3));

    let outcome = session.apply_option_edit(id, "Gen3", false).unwrap();
    assert!(outcome.risky);
    session.save_in_place().unwrap();

    let written = dump.read_to_string();
    assert_eq!(written.matches("*[03]Gen3").count(), 1);
    assert_eq!(written.matches("Options\t=*[00]Auto").count(), 1);
    assert!(written.contains("HIICrc32= 9B2E4F10\n"));
}

#[test]
fn file_crc_header_gets_placeholder() {
    let dump = fixture_dump("amisce_lf.txt");
    let mut session = load(&dump);
    session.set_crc_policy(CrcMode::Placeholder, false);

    let id = session.find(&MatchQuery::new("Power")).unwrap().ids()[0];
    let outcome = session.apply_value_edit(id, "0x7d", false).unwrap();
    assert_eq!(outcome.after_summary.as_deref(), Some("125 (0x7D)"));
    session.save_in_place().unwrap();

    dump.assert_contains("HIICrc32= <bypassed by nvram-tweak ");
    dump.assert_contains("Value\t=<125>\n");
}

#[test]
fn file_crc_header_blocks_unforced_removal() {
    let dump = fixture_dump("amisce_lf.txt");
    let mut session = load(&dump);
    session.set_crc_policy(CrcMode::Empty, false);

    let id = session.find(&MatchQuery::new("Fast Boot")).unwrap().ids()[0];
    let err = session.apply_option_edit(id, "Enabled", false).unwrap_err();
    assert!(matches!(err, EditError::UnsafeCrcRemoval { mode: CrcMode::Empty, .. }));
    assert!(!session.has_changes());
}

#[test]
fn empty_block_marker_is_removed_without_force() {
    let dump = fixture_dump("amisce_crlf_crc.txt");
    let mut session = load(&dump);
    session.set_crc_policy(CrcMode::Remove, false);

    let id = session.find(&MatchQuery::new("Boot Timeout")).unwrap().ids()[0];
    let outcome = session.apply_value_edit(id, "30", false).unwrap();
    assert!(!outcome.unsafe_crc);
    let report = session.save_in_place().unwrap();
    assert!(report.unsafe_blocks.is_empty());

    let written = dump.read_to_string();
    assert!(!written.contains("HIICrc32=\r\n"));
    assert!(written.contains("HIICrc32=1C2D3E4F,ver=02\r\n"));
    assert!(written.contains("Value\t=<0x1e>\r\n"));
}

#[test]
fn below_minimum_is_rejected() {
    let dump = fixture_dump("amisce_crlf_crc.txt");
    let mut session = load(&dump);
    let id = session.find(&MatchQuery::new("Boot Timeout")).unwrap().ids()[0];

    let err = session.apply_value_edit(id, "0", false).unwrap_err();
    assert_eq!(
        err,
        EditError::OutOfRange {
            block: "Boot Timeout (token 0x22)".into(),
            min: Some(1),
            max: Some(65535),
            got: 0,
        }
    );
}

#[test]
fn batch_over_all_matches_then_rollback() {
    let dump = fixture_dump("amisce_lf.txt");
    let original = dump.read();
    let mut session = load(&dump);

    let ids = session
        .find(&MatchQuery::new("pcie").ignore_case(true).apply_to_all(true))
        .unwrap()
        .ids();
    let outcomes = session
        .apply_batch(&ids, &EditRequest::option("Gen2"))
        .unwrap();
    assert!(outcomes.iter().all(|o| o.applied));
    session.save_in_place().unwrap();
    assert_eq!(dump.read_to_string().matches("*[02]Gen2").count(), 2);

    session.rollback_last_save().unwrap();
    assert_eq!(dump.read(), original);
}

#[test]
fn latin1_edit_keeps_encoding() {
    let dump = fixture_dump("latin1.txt");
    let mut session = load(&dump);
    let id = session.find(&MatchQuery::new("Langue")).unwrap().ids()[0];
    session.apply_option_edit(id, "Anglais", false).unwrap();
    session.save_in_place().unwrap();

    let bytes = dump.read();
    assert!(bytes.windows(6).any(|w| w == b"Fran\xe7a"));
    assert!(bytes.ends_with(b"*[01]Anglais\n"));
}

#[test]
fn string_question_cannot_be_edited() {
    let dump = fixture_dump("amisce_lf.txt");
    let mut session = load(&dump);
    let id = session.find(&MatchQuery::new("Asset Tag")).unwrap().ids()[0];
    let err = session
        .apply(id, &EditRequest::option("x"))
        .unwrap_err();
    assert!(matches!(err, EditError::KindMismatch { expected: "option", found: "string", .. }));
}
