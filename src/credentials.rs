use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Credentials file structure
///
/// Format:
/// ```toml
/// [google.profile_name]
/// client_secret = "your_oauth_client_secret_here"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Credentials {
    #[serde(default)]
    pub google: HashMap<String, OAuthClientProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthClientProfile {
    pub client_secret: String,
}

/// Get the default credentials file path: ~/.config/transcribe_backend/credentials.toml
pub fn get_credentials_path() -> Result<PathBuf, String> {
    let home = std::env::var("HOME").map_err(|_| "HOME environment variable not set".to_string())?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("transcribe_backend")
        .join("credentials.toml"))
}

/// Load credentials from the default location
/// Returns None if the file doesn't exist
pub fn load_credentials() -> Result<Option<Credentials>, Box<dyn std::error::Error + Send + Sync>> {
    let creds_path = get_credentials_path()?;

    if !creds_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&creds_path)?;
    let credentials: Credentials = toml::from_str(&content)?;

    Ok(Some(credentials))
}

/// Get the OAuth client secret for a Google credential profile
pub fn get_client_secret(credentials: &Option<Credentials>, profile: &str) -> Result<String, String> {
    match credentials {
        Some(creds) => creds
            .google
            .get(profile)
            .map(|p| p.client_secret.clone())
            .ok_or_else(|| {
                format!(
                    "Credential profile '[google.{}]' not found in credentials file",
                    profile
                )
            }),
        None => Err(format!(
            "Credentials file not found. Expected at: {}",
            get_credentials_path().unwrap_or_default().display()
        )),
    }
}
