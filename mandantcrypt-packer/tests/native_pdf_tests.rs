//! Encrypted PDF output. These tests need a real qpdf build; point
//! MANDANTCRYPT_QPDF_LIB at it. Without it they return early.

use mandantcrypt_packer::{BackendKind, PackError, Packer, verify_container};
use mandantcrypt_qpdf::LIBRARY_PATH_ENV;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn real_library() -> Option<PathBuf> {
    std::env::var_os(LIBRARY_PATH_ENV).map(PathBuf::from)
}

#[test]
fn empty_file_set_produces_protected_template_copy() {
    let Some(library) = real_library() else { return };
    let dir = tempfile::tempdir().unwrap();

    let mut packer = Packer::new();
    packer.set_backend(BackendKind::PdfAttachment);
    packer.set_destination(dir.path().join("empty.pdf"));
    packer.set_native_library(&library);
    let outcome = packer.pack(Some("pw")).unwrap();
    assert!(outcome.encrypted);
    assert_eq!(outcome.entries, 0);

    let verified =
        verify_container(&outcome.path, BackendKind::PdfAttachment, Some("pw"), &library).unwrap();
    assert!(verified.encrypted);
    assert!(verified.entries.is_empty());
}

#[test]
fn encrypted_pdf_lists_attachments_only_with_password() {
    let Some(library) = real_library() else { return };
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("report.docx");
    let sheet = dir.path().join("Übersicht.xlsx");
    std::fs::write(&report, "numbers").unwrap();
    std::fs::write(&sheet, "more numbers").unwrap();

    let mut packer = Packer::new();
    packer.set_backend(BackendKind::PdfAttachment);
    packer.add_files([&report, &sheet]);
    packer.set_destination(dir.path().join("bundle.pdf"));
    packer.set_native_library(&library);
    let outcome = packer.pack(Some("Secret1")).unwrap();

    let verified = verify_container(
        &outcome.path,
        BackendKind::PdfAttachment,
        Some("Secret1"),
        &library,
    )
    .unwrap();
    assert!(verified.encrypted);
    assert_eq!(verified.entries, vec!["report.docx", "Übersicht.xlsx"]);

    let wrong = verify_container(
        &outcome.path,
        BackendKind::PdfAttachment,
        Some("wrong"),
        &library,
    )
    .unwrap_err();
    assert!(matches!(wrong, PackError::WrongPassword(_)));
}
