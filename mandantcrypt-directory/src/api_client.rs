//! HTTP client for the directory API.
//!
//! Authenticates with HTTP basic auth and speaks JSON.

use crate::DirectoryClient;
use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, DirectoryResult};
use crate::types::{Identity, PasswordRecord};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroizing;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// HTTP client for the identity directory.
#[derive(Debug, Clone)]
pub struct DirectoryApiClient {
    client: Client,
    config: DirectoryConfig,
    service_url: String,
}

impl DirectoryApiClient {
    /// Builds a client; the configuration is validated first.
    pub fn new(config: DirectoryConfig) -> DirectoryResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        let service_url = config.service_url();
        debug!("directory service at {service_url}");
        Ok(Self {
            client,
            config,
            service_url,
        })
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub async fn get_active_identities(&self) -> DirectoryResult<Vec<Identity>> {
        let identities: Vec<Identity> = self.get_json("activeMandantList/", &[]).await?;
        debug!("received {} active identities", identities.len());
        Ok(identities)
    }

    pub async fn get_password_record(&self, identity_id: i64) -> DirectoryResult<PasswordRecord> {
        self.get_json(
            "currentMandantPassword/",
            &[("mandant_id", identity_id.to_string())],
        )
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> DirectoryResult<T> {
        let url = format!("{}{resource}", self.service_url);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DirectoryError::AuthFailed(format!("{resource}: {status}")));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound(resource.to_string()));
        }

        let body = resp
            .error_for_status()
            .map_err(|e| DirectoryError::Api(e.to_string()))?
            .bytes()
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl DirectoryClient for DirectoryApiClient {
    async fn list_active_identities(&self) -> DirectoryResult<Vec<Identity>> {
        self.get_active_identities().await
    }

    async fn decrypted_password(&self, identity_id: i64) -> DirectoryResult<Zeroizing<String>> {
        let mut record = self.get_password_record(identity_id).await?;
        match record.password_decrypted.take() {
            Some(password) if !password.is_empty() => Ok(Zeroizing::new(password)),
            _ => Err(DirectoryError::PasswordUnavailable(identity_id)),
        }
    }
}
