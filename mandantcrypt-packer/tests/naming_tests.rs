use chrono::NaiveDate;
use mandantcrypt_packer::{BackendKind, SourceEntry, entry_names, suggested_file_name};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::path::PathBuf;

fn names(paths: &[&str]) -> Vec<String> {
    let set: BTreeSet<PathBuf> = paths.iter().map(PathBuf::from).collect();
    entry_names(&set)
        .unwrap()
        .into_iter()
        .map(|SourceEntry { name, .. }| name)
        .collect()
}

#[test]
fn distinct_base_names_are_kept() {
    assert_eq!(names(&["/a/one.txt", "/b/two.txt"]), vec!["one.txt", "two.txt"]);
}

#[test]
fn shared_base_names_get_a_suffix() {
    assert_eq!(
        names(&["/a/report.docx", "/b/report.docx", "/c/report.docx"]),
        vec!["report.docx", "report (2).docx", "report (3).docx"]
    );
}

#[test]
fn suffix_skips_names_owned_by_other_files() {
    assert_eq!(
        names(&["/a/report.docx", "/b/report.docx", "/c/report (2).docx"]),
        vec!["report.docx", "report (3).docx", "report (2).docx"]
    );
}

#[test]
fn names_without_extension_get_a_suffix_too() {
    assert_eq!(names(&["/a/README", "/b/README"]), vec!["README", "README (2)"]);
}

#[test]
fn suggested_name_uses_identity_date_and_extension() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
    assert_eq!(
        suggested_file_name("Mustermann GmbH", date, BackendKind::SevenZip).unwrap(),
        "Mustermann GmbH_20240307.7z"
    );
    assert_eq!(
        suggested_file_name("Müller", date, BackendKind::PdfAttachment).unwrap(),
        "Müller_20240307.pdf"
    );
}

#[test]
fn suggested_name_replaces_path_separators() {
    let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    assert_eq!(
        suggested_file_name("A/B: C", date, BackendKind::Zip).unwrap(),
        "A_B_ C_20241231.zip"
    );
}
