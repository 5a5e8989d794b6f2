//! Integration tests for guideline extraction from policy documents.

mod common;

use chlog::guidelines::{DEFAULT_GUIDELINES, DEFAULT_HEADING, extract_section, load_guidelines};

#[test]
fn test_extracts_commit_message_section() {
    let path = common::policy_fixture("CONTRIBUTE");
    let section = extract_section(&path, DEFAULT_HEADING).unwrap();

    assert_eq!(
        section,
        "Start with a one-line summary in imperative mood.\n\n\
         Then describe every changed file in ChangeLog format.\n\n\
         *** Details\n\n\
         Mention every changed function."
    );
}

#[test]
fn test_extracts_other_headings() {
    let path = common::policy_fixture("CONTRIBUTE");

    assert_eq!(
        extract_section(&path, "Coding style").as_deref(),
        Some("Indent with two spaces.")
    );
    assert_eq!(extract_section(&path, "Reviews").as_deref(), Some("Be kind."));
}

#[test]
fn test_top_level_heading_is_not_a_section() {
    let path = common::policy_fixture("CONTRIBUTE");
    assert_eq!(extract_section(&path, "Getting started"), None);
}

#[test]
fn test_missing_section_falls_back_to_defaults() {
    let path = common::policy_fixture("NO_COMMIT_SECTION");

    assert_eq!(extract_section(&path, DEFAULT_HEADING), None);
    assert_eq!(load_guidelines(Some(&path), DEFAULT_HEADING), DEFAULT_GUIDELINES);
}

#[test]
fn test_missing_document_falls_back_to_defaults() {
    let path = common::policy_fixture("DOES_NOT_EXIST");

    assert_eq!(extract_section(&path, DEFAULT_HEADING), None);
    assert_eq!(load_guidelines(Some(&path), DEFAULT_HEADING), DEFAULT_GUIDELINES);
    assert_eq!(load_guidelines(None, DEFAULT_HEADING), DEFAULT_GUIDELINES);
}
