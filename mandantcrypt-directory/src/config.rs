//! Directory service configuration.

use crate::error::{DirectoryError, DirectoryResult};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

const API_PATH: &str = "/api/v1/";

/// Where and how to reach the identity directory.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Base URL of the directory server (e.g., "https://mandantcrypto").
    pub server_url: String,

    /// HTTP basic auth user.
    pub username: String,

    /// HTTP basic auth password.
    pub password: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Allows plain `http` server URLs.
    pub dev_mode: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            server_url: "https://mandantcrypto".to_string(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 30,
            dev_mode: false,
        }
    }
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("dev_mode", &self.dev_mode)
            .finish()
    }
}

impl DirectoryConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    /// API root: the server URL without trailing slashes, plus `/api/v1/`.
    pub fn service_url(&self) -> String {
        format!("{}{API_PATH}", self.server_url.trim().trim_end_matches('/'))
    }

    /// Checks that the server URL is absolute and, outside developer mode,
    /// uses `https`.
    pub fn validate(&self) -> DirectoryResult<()> {
        let url = Url::parse(self.server_url.trim()).map_err(|e| {
            DirectoryError::Config(format!("server URL {:?} is not absolute: {e}", self.server_url))
        })?;
        match url.scheme() {
            "https" => Ok(()),
            "http" if self.dev_mode => Ok(()),
            "http" => Err(DirectoryError::Config(
                "server URL must use https unless developer mode is enabled".to_string(),
            )),
            other => Err(DirectoryError::Config(format!(
                "unsupported URL scheme {other:?}"
            ))),
        }
    }
}
