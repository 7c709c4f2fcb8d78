use anyhow::{anyhow, Context, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_PREFIX: &str = "TRADEPILOT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Settings for talking to the bot's REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 10,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ClientSettings {
    /// Defaults, then the TOML file at `path` if it exists, then
    /// `TRADEPILOT_*` environment variables (a `.env` file is honoured).
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings: ClientSettings = Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("reading settings from {}", path))?
            .try_deserialize()?;

        settings.validate().map_err(|errors| anyhow!(errors.join(", ")))?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            errors.push("api_base_url must start with http:// or https://".to_string());
        }
        if self.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes these settings as a starter file. Refuses to overwrite.
    pub fn write_template(&self, path: &Path) -> Result<()> {
        if path.exists() {
            return Err(anyhow!("{} already exists", path.display()));
        }
        std::fs::write(path, self.to_toml()?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{}-{}.toml", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_defaults_validate() {
        assert!(ClientSettings::default().validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let settings = ClientSettings {
            api_base_url: "localhost:8000".to_string(),
            request_timeout_secs: 0,
            log_format: LogFormat::Json,
        };
        let errors = settings.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_load_file_and_env_override() {
        let path = temp_path("tradepilot-settings");
        std::fs::write(
            &path,
            "api_base_url = \"https://api.example.test/api\"\nlog_format = \"json\"\n",
        )
        .unwrap();

        std::env::set_var("TRADEPILOT_REQUEST_TIMEOUT_SECS", "30");
        let settings = ClientSettings::load(path.to_str().unwrap()).unwrap();
        std::env::remove_var("TRADEPILOT_REQUEST_TIMEOUT_SECS");
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.api_base_url, "https://api.example.test/api");
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_template_round_trip() {
        let path = temp_path("tradepilot-template");
        let settings = ClientSettings::default();
        settings.write_template(&path).unwrap();
        assert!(settings.write_template(&path).is_err());

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let parsed: ClientSettings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
