use crate::settings::Settings;
use anyhow::{Context, Result};
use chrono::Local;
use mandantcrypt_directory::DirectoryClient;

pub async fn run(settings: &Settings, json: bool) -> Result<()> {
    let client = super::connect(settings)?;
    let identities = client
        .list_active_identities()
        .await
        .context("listing identities")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&identities)?);
        return Ok(());
    }

    let now = Local::now().naive_local();
    for identity in &identities {
        let age = identity
            .password_age_days(now)
            .map_or_else(|| "no password".to_string(), |days| format!("{days} days"));
        let marker = if settings.last_identity == Some(identity.number) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {:>10}  {:<30}  {:<12}  {}",
            identity.number,
            identity.name,
            age,
            identity.preferred_backend().unwrap_or("-"),
        );
    }
    Ok(())
}
