use crate::args::ConfigAction;
use crate::settings::Settings;
use anyhow::Result;
use std::path::Path;

pub fn run(action: ConfigAction, settings: &mut Settings, path: &Path, json: bool) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let shown = settings.redacted();
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("settings file:   {}", path.display());
                println!("server:          {}", shown.directory.server_url);
                println!("user:            {}", shown.directory.username);
                println!("developer mode:  {}", shown.directory.dev_mode);
                println!("default backend: {}", shown.default_backend);
                if let Some(number) = shown.last_identity {
                    println!("last identity:   {number}");
                }
            }
            Ok(())
        }
        ConfigAction::SetServer { url, dev, user } => {
            set_server(settings, url, dev, user)?;
            settings.save_to(path)
        }
        ConfigAction::SetBackend { name } => {
            settings.default_backend = super::parse_backend(&name)?;
            settings.save_to(path)
        }
    }
}

/// Applies a new server URL after validating it; `settings` is unchanged on
/// error.
pub fn set_server(
    settings: &mut Settings,
    url: String,
    dev: bool,
    user: Option<String>,
) -> Result<()> {
    let mut directory = settings.directory.clone();
    directory.server_url = url;
    directory.dev_mode = dev;
    if let Some(user) = user {
        directory.username = user;
    }
    directory.validate()?;
    settings.directory = directory;
    Ok(())
}
