//! Subcommand implementations.

pub mod config;
pub mod doctor;
pub mod identities;
pub mod pack;
pub mod verify;

use crate::args::{Cli, Command};
use crate::settings::{self, Settings};
use anyhow::{Context, Result, bail};
use mandantcrypt_directory::{DirectoryApiClient, Identity};
use mandantcrypt_packer::{BackendKind, capabilities};
use std::path::Path;
use tracing::warn;

pub async fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    let settings_path = cli.settings.unwrap_or_else(settings::default_path);
    let mut settings = Settings::load_from(&settings_path);

    match cli.command {
        Command::Identities => identities::run(&settings, json).await,
        Command::Pack(args) => pack::run(args, &mut settings, &settings_path, json).await,
        Command::Verify(args) => verify::run(args, &settings, json).await,
        Command::Config { action } => config::run(action, &mut settings, &settings_path, json),
        Command::Doctor => doctor::run(json),
    }
}

pub(crate) fn connect(settings: &Settings) -> Result<DirectoryApiClient> {
    DirectoryApiClient::new(settings.directory_config())
        .context("cannot reach the identity directory")
}

/// The identity with number `requested`; otherwise the last used one if it
/// is still active; otherwise the first.
pub fn select_identity(
    identities: &[Identity],
    requested: Option<i64>,
    last_used: Option<i64>,
) -> Result<&Identity> {
    if let Some(number) = requested {
        return identities
            .iter()
            .find(|i| i.number == number)
            .with_context(|| format!("no active identity with number {number}"));
    }
    last_used
        .and_then(|number| identities.iter().find(|i| i.number == number))
        .or_else(|| identities.first())
        .context("the directory has no active identities")
}

/// Parses a backend name given on the command line or in settings.
pub fn parse_backend(name: &str) -> Result<BackendKind> {
    let backend: BackendKind = name.parse()?;
    if !backend.is_implemented() {
        bail!("backend {backend} is not available");
    }
    Ok(backend)
}

/// An explicit backend wins; then the identity's preference if it names an
/// implemented backend; then `default`.
pub fn resolve_backend(
    explicit: Option<&str>,
    identity: &Identity,
    default: BackendKind,
) -> Result<BackendKind> {
    if let Some(name) = explicit {
        return parse_backend(name);
    }
    let Some(preferred) = identity.preferred_backend() else {
        return Ok(default);
    };
    match preferred.parse::<BackendKind>() {
        Ok(backend) if backend.is_implemented() => Ok(backend),
        Ok(backend) => {
            warn!("{identity} prefers {backend}, which is not available; using {default}");
            Ok(default)
        }
        Err(e) => {
            warn!("{identity} has an unusable backend preference: {e}; using {default}");
            Ok(default)
        }
    }
}

/// The implemented backend whose extension matches `path`.
pub fn backend_from_extension(path: &Path) -> Option<BackendKind> {
    let extension = path.extension()?.to_str()?;
    capabilities()
        .iter()
        .filter(|c| c.backend.is_implemented())
        .find(|c| c.extension.eq_ignore_ascii_case(extension))
        .map(|c| c.backend)
}
