use crate::args::VerifyArgs;
use crate::settings::Settings;
use anyhow::{Context, Result};
use mandantcrypt_directory::DirectoryClient;
use mandantcrypt_packer::verify_container;
use mandantcrypt_qpdf::default_library_path;

pub async fn run(args: VerifyArgs, settings: &Settings, json: bool) -> Result<()> {
    let backend = match args.backend.as_deref() {
        Some(name) => super::parse_backend(name)?,
        None => super::backend_from_extension(&args.path).with_context(|| {
            format!(
                "cannot tell the backend of {}; pass --backend",
                args.path.display()
            )
        })?,
    };

    let client = super::connect(settings)?;
    let identities = client
        .list_active_identities()
        .await
        .context("listing identities")?;
    let identity = super::select_identity(&identities, args.identity, settings.last_identity)?;
    let password = client
        .decrypted_password(identity.id)
        .await
        .with_context(|| format!("fetching the password of {identity}"))?;

    let path = args.path;
    let verified = tokio::task::spawn_blocking(move || {
        verify_container(&path, backend, Some(password.as_str()), &default_library_path())
    })
    .await
    .context("verification task panicked")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&verified)?);
    } else {
        println!(
            "{} opens with the password of {identity} ({} entries)",
            verified.path.display(),
            verified.entries.len()
        );
        for entry in &verified.entries {
            println!("  {entry}");
        }
    }
    Ok(())
}
