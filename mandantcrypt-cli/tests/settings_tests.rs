use mandantcrypt_cli::Settings;
use mandantcrypt_packer::BackendKind;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load_from(&dir.path().join("settings.json"));
    assert_eq!(settings, Settings::default());
}

#[test]
fn unreadable_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(Settings::load_from(&path), Settings::default());
}

#[test]
fn save_creates_parent_and_roundtrips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("mandantcrypt").join("settings.json");

    let mut settings = Settings::default();
    settings.directory.server_url = "http://localhost:8000".into();
    settings.directory.dev_mode = true;
    settings.last_identity = Some(233);
    settings.default_backend = BackendKind::SevenZip;
    settings.save_to(&path).unwrap();

    assert_eq!(Settings::load_from(&path), settings);
}

#[test]
fn partial_file_keeps_other_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"default_backend":"ITEXT7"}"#).unwrap();

    let settings = Settings::load_from(&path);
    assert_eq!(settings.default_backend, BackendKind::PdfAttachment);
    assert_eq!(settings.directory.server_url, "https://mandantcrypto");
    assert_eq!(settings.last_identity, None);
}

#[test]
fn redacted_hides_directory_password() {
    let mut settings = Settings::default();
    settings.directory.password = "hunter2".into();
    let json = serde_json::to_string(&settings.redacted()).unwrap();
    assert!(!json.contains("hunter2"));
    assert_eq!(settings.directory.password, "hunter2");
}

#[test]
fn redacted_keeps_empty_password_empty() {
    assert_eq!(Settings::default().redacted().directory.password, "");
}

#[test]
fn default_path_ends_in_settings_json() {
    let path = mandantcrypt_cli::settings::default_path();
    assert!(path.ends_with("mandantcrypt/settings.json"));
}
