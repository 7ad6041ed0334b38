use crate::args::PackArgs;
use crate::settings::Settings;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use mandantcrypt_directory::{DirectoryClient, Identity};
use mandantcrypt_packer::{BackendKind, Packer, suggested_file_name};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const MIB: u64 = 1024 * 1024;

pub async fn run(
    args: PackArgs,
    settings: &mut Settings,
    settings_path: &Path,
    json: bool,
) -> Result<()> {
    let client = super::connect(settings)?;
    let identities = client
        .list_active_identities()
        .await
        .context("listing identities")?;
    let identity =
        super::select_identity(&identities, args.identity, settings.last_identity)?.clone();
    let backend =
        super::resolve_backend(args.backend.as_deref(), &identity, settings.default_backend)?;
    let password = client
        .decrypted_password(identity.id)
        .await
        .with_context(|| format!("fetching the password of {identity}"))?;

    let destination = match args.output {
        Some(path) => path,
        None => default_destination(
            &std::env::current_dir()?,
            &identity,
            Local::now().date_naive(),
            backend,
        )?,
    };

    let mut packer = Packer::new();
    packer.add_files(&args.files);
    packer.set_backend(backend);
    packer.set_destination(destination);
    packer.set_overwrite(!args.no_overwrite);
    if let Some(template) = args.template.or_else(|| settings.template_document.clone()) {
        packer.set_template_document(template);
    }
    packer.set_max_input_bytes(max_input_bytes(args.max_input_mib));

    info!("packing {} files for {identity} as {backend}", args.files.len());
    let outcome = tokio::task::spawn_blocking(move || packer.pack(Some(password.as_str())))
        .await
        .context("packing task panicked")??;

    settings.last_identity = Some(identity.number);
    if let Err(e) = settings.save_to(settings_path) {
        warn!("could not remember the identity: {e:#}");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "{} ({}, {} entries, {})",
            outcome.path.display(),
            outcome.backend,
            outcome.entries,
            if outcome.encrypted { "encrypted" } else { "not encrypted" },
        );
    }
    Ok(())
}

/// `<dir>/<identity name>_<yyyyMMdd>.<ext>`
pub fn default_destination(
    dir: &Path,
    identity: &Identity,
    date: NaiveDate,
    backend: BackendKind,
) -> Result<PathBuf> {
    Ok(dir.join(suggested_file_name(&identity.name, date, backend)?))
}

/// `0` disables the limit.
pub fn max_input_bytes(mib: u64) -> Option<u64> {
    (mib > 0).then(|| mib.saturating_mul(MIB))
}
