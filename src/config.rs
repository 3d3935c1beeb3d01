use std::env;

use crate::error::ConfigError;
use crate::utils::mask_api_key;

pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:9999";

/// Which binary is loading settings. Only the server authenticates inbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Server,
    Terminal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub places_api_key: String,
    pub ai_api_key: String,
    /// Inbound request key; always present for [`Surface::Server`].
    pub api_key: Option<String>,
    pub environment: String,
    pub debug: bool,
    pub bind_address: String,
    pub gemini_model: String,
    pub places_base_url: String,
    pub gemini_base_url: String,
    pub log_dir: String,
}

impl Settings {
    /// Load settings from the process environment. Call `dotenv()` first.
    pub fn load(surface: Surface) -> Result<Self, ConfigError> {
        Self::from_lookup(surface, |name| env::var(name).ok())
    }

    /// Build settings from any key lookup, reporting every missing required name at once.
    pub fn from_lookup<F>(surface: Surface, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut missing = Vec::new();
        let mut required = |name: &'static str| {
            let value = get(name);
            if value.is_none() {
                missing.push(name);
            }
            value
        };

        let places_api_key = required("GOOGLE_PLACES_API_KEY");
        let ai_api_key = required("GOOGLE_AI_API_KEY");
        let api_key = match surface {
            Surface::Server => required("API_KEY"),
            Surface::Terminal => None,
        };

        let (places_api_key, ai_api_key) = match (places_api_key, ai_api_key) {
            (Some(places), Some(ai)) if missing.is_empty() => (places, ai),
            _ => return Err(ConfigError::Missing { missing }),
        };

        let places_base_url = base_url(get("PLACES_BASE_URL"), "PLACES_BASE_URL", DEFAULT_PLACES_BASE_URL)?;
        let gemini_base_url = base_url(get("GEMINI_BASE_URL"), "GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL)?;

        Ok(Self {
            places_api_key,
            ai_api_key,
            api_key,
            environment: get("APP_ENV").unwrap_or_else(|| "development".to_string()),
            debug: get("DEBUG").map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false),
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            places_base_url,
            gemini_base_url,
            log_dir: get("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
        })
    }

    /// Settings rendered for the startup log, with every key masked.
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::json!({
            "GOOGLE_PLACES_API_KEY": mask_api_key(&self.places_api_key),
            "GOOGLE_AI_API_KEY": mask_api_key(&self.ai_api_key),
            "API_KEY": self.api_key.as_deref().map(mask_api_key),
            "APP_ENV": self.environment,
            "DEBUG": self.debug,
            "BIND_ADDRESS": self.bind_address,
            "GEMINI_MODEL": self.gemini_model,
            "PLACES_BASE_URL": self.places_base_url,
            "GEMINI_BASE_URL": self.gemini_base_url,
            "LOG_DIR": self.log_dir,
        })
    }
}

fn base_url(value: Option<String>, name: &'static str, default: &str) -> Result<String, ConfigError> {
    let value = value.unwrap_or_else(|| default.to_string());
    let parsed = url::Url::parse(&value).map_err(|e| ConfigError::Invalid {
        name,
        message: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            name,
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}
