use anyhow::{Context, Result};
use mandantcrypt_qpdf::{NativeDocumentSession, default_library_path};
use serde_json::json;

pub fn run(json: bool) -> Result<()> {
    let path = default_library_path();
    let session = NativeDocumentSession::open(&path)
        .with_context(|| format!("native PDF library at {} is unusable", path.display()))?;
    let version = session.library_version()?;

    if json {
        let report = json!({
            "library_path": path,
            "version": version.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("qpdf {version} loaded from {}", path.display());
    }
    Ok(())
}
