//! Per-user settings, persisted as JSON.

use anyhow::{Context, Result};
use mandantcrypt_directory::DirectoryConfig;
use mandantcrypt_packer::BackendKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Overrides the directory password stored in the settings file.
pub const DIRECTORY_PASSWORD_ENV: &str = "MANDANTCRYPT_DIRECTORY_PASSWORD";

const SETTINGS_DIR: &str = "mandantcrypt";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub directory: DirectoryConfig,
    /// Number of the identity used by the last successful pack.
    pub last_identity: Option<i64>,
    /// Backend used when an identity has no usable preference.
    pub default_backend: BackendKind,
    pub template_document: Option<PathBuf>,
}

/// `<config dir>/mandantcrypt/settings.json`
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SETTINGS_DIR)
        .join(SETTINGS_FILE)
}

impl Settings {
    /// Reads settings from `path`. A missing or unreadable file yields
    /// defaults.
    pub fn load_from(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!("no settings at {}: {e}", path.display());
                return Self::default();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("ignoring unreadable settings file {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        debug!("saved settings to {}", path.display());
        Ok(())
    }

    /// The directory configuration, with the password taken from
    /// [`DIRECTORY_PASSWORD_ENV`] when it is set.
    pub fn directory_config(&self) -> DirectoryConfig {
        let mut config = self.directory.clone();
        if let Ok(password) = std::env::var(DIRECTORY_PASSWORD_ENV) {
            config.password = password;
        }
        config
    }

    /// A copy that is safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.directory.password.is_empty() {
            copy.directory.password = "<redacted>".to_string();
        }
        copy
    }
}
