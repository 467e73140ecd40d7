use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_LLM_PROVIDER;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    /// HTTP backend configuration
    Server,
}

fn default_api_port() -> u16 {
    3000
}

fn default_llm_provider() -> String {
    DEFAULT_LLM_PROVIDER.to_string()
}

/// Backend configuration file structure
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Configuration type (must be "server")
    pub config_type: ConfigType,
    /// Path of the SQLite database file (created if missing)
    pub database_path: PathBuf,
    /// API server port (default: 3000)
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Transcription backend tag for new recordings (default: requestyai)
    #[serde(default = "default_llm_provider")]
    pub llm_provider: String,
    /// Google login (maps to [google] section in TOML); login routes are
    /// disabled when absent
    pub google: Option<GoogleOAuthConfig>,
}

/// Google OAuth client configuration (maps to [google] section in TOML)
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleOAuthConfig {
    /// OAuth client id from the Google console
    pub client_id: String,
    /// Callback URL registered for the client, e.g. http://localhost:3000/auth/google/callback
    pub redirect_uri: String,
    /// Credential profile name to look up the client secret from
    /// ~/.config/transcribe_backend/credentials.toml
    pub credential_profile: String,
}

impl ServerConfig {
    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field values that serde cannot check
    pub fn validate(&self) -> Result<(), String> {
        if self.llm_provider.trim().is_empty() {
            return Err("llm_provider must not be empty".to_string());
        }

        if let Some(google) = &self.google {
            if google.client_id.trim().is_empty() {
                return Err("[google] client_id must not be empty".to_string());
            }
            url::Url::parse(&google.redirect_uri)
                .map_err(|e| format!("[google] redirect_uri is not a valid URL: {}", e))?;
        }

        Ok(())
    }
}
