use mandantcrypt_packer::{
    BackendKind, PackError, capabilities, destination_with_resolved_extension, extension_for,
    supports_encryption,
};
use proptest::prelude::*;
use std::path::{Path, PathBuf};

#[test]
fn extension_table_is_fixed() {
    assert_eq!(extension_for(BackendKind::Zip).unwrap(), "zip");
    assert_eq!(extension_for(BackendKind::SevenZip).unwrap(), "7z");
    assert_eq!(extension_for(BackendKind::PdfAttachment).unwrap(), "pdf");
    assert_eq!(extension_for(BackendKind::PdfRewrite).unwrap(), "pdf");
}

#[test]
fn every_backend_supports_encryption() {
    for backend in BackendKind::ALL {
        assert!(supports_encryption(backend).unwrap(), "{backend}");
    }
    assert_eq!(capabilities().len(), BackendKind::ALL.len());
}

#[test]
fn parses_wire_and_short_names() {
    assert_eq!("ZIP".parse::<BackendKind>().unwrap(), BackendKind::Zip);
    assert_eq!("SEVEN_ZIP".parse::<BackendKind>().unwrap(), BackendKind::SevenZip);
    assert_eq!("QPDF".parse::<BackendKind>().unwrap(), BackendKind::PdfRewrite);
    assert_eq!("ITEXT7".parse::<BackendKind>().unwrap(), BackendKind::PdfAttachment);
    assert_eq!("7z".parse::<BackendKind>().unwrap(), BackendKind::SevenZip);
    assert_eq!("pdf".parse::<BackendKind>().unwrap(), BackendKind::PdfAttachment);
    assert_eq!(" zip ".parse::<BackendKind>().unwrap(), BackendKind::Zip);
    assert_eq!("pdf-rewrite".parse::<BackendKind>().unwrap(), BackendKind::PdfRewrite);
}

#[test]
fn unknown_backend_name_is_rejected() {
    match "rar".parse::<BackendKind>() {
        Err(PackError::UnknownBackend(name)) => assert_eq!(name, "rar"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn only_pdf_rewrite_is_unimplemented() {
    let unimplemented: Vec<_> = BackendKind::ALL
        .into_iter()
        .filter(|b| !b.is_implemented())
        .collect();
    assert_eq!(unimplemented, vec![BackendKind::PdfRewrite]);
}

#[test]
fn resolution_replaces_existing_extension() {
    let resolved =
        destination_with_resolved_extension(Path::new("/tmp/out.bin"), BackendKind::SevenZip).unwrap();
    assert_eq!(resolved, PathBuf::from("/tmp/out.7z"));
}

#[test]
fn resolution_adds_missing_extension() {
    let resolved =
        destination_with_resolved_extension(Path::new("/tmp/out"), BackendKind::Zip).unwrap();
    assert_eq!(resolved, PathBuf::from("/tmp/out.zip"));
}

#[test]
fn resolution_only_strips_the_last_extension() {
    let resolved =
        destination_with_resolved_extension(Path::new("backup.tar.gz"), BackendKind::Zip).unwrap();
    assert_eq!(resolved, PathBuf::from("backup.tar.zip"));
}

#[test]
fn resolution_rejects_paths_without_file_name() {
    for requested in ["/", "out/..", ""] {
        match destination_with_resolved_extension(Path::new(requested), BackendKind::Zip) {
            Err(PackError::FileWrite { path, source }) => {
                assert_eq!(path, PathBuf::from(requested));
                assert_eq!(source.kind(), std::io::ErrorKind::InvalidInput);
            }
            other => panic!("unexpected for {requested:?}: {other:?}"),
        }
    }
}

fn backend_strategy() -> impl Strategy<Value = BackendKind> {
    prop::sample::select(BackendKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn resolution_is_idempotent(
        dir in "[a-z]{1,8}",
        stem in "[A-Za-z0-9_-]{1,12}",
        ext in prop::option::of("[a-z0-9]{1,4}"),
        backend in backend_strategy(),
    ) {
        let name = match ext {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem,
        };
        let requested = PathBuf::from(dir).join(name);
        let once = destination_with_resolved_extension(&requested, backend).unwrap();
        let twice = destination_with_resolved_extension(&once, backend).unwrap();
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(
            once.extension().and_then(|e| e.to_str()),
            Some(extension_for(backend).unwrap())
        );
    }
}
