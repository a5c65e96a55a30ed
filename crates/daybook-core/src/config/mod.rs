//! Client configuration.
//!
//! `ClientConfig` tells a front end where the API lives, which credential to
//! present, and how the list cache should page and age its collections. It is
//! read from a JSON file and then overridden by environment variables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_LIST_MAX_AGE_SECS: u64 = 5 * 60;
pub const DEFAULT_RECENT_MAX_AGE_SECS: u64 = 2 * 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Items shown in the "recent" summary.
pub const RECENT_LIMIT: u32 = 3;

pub const ENV_API_URL: &str = "DAYBOOK_API_URL";
pub const ENV_TOKEN: &str = "DAYBOOK_TOKEN";
pub const ENV_PAGE_SIZE: &str = "DAYBOOK_PAGE_SIZE";

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_list_max_age_secs")]
    pub list_max_age_secs: u64,
    #[serde(default = "default_recent_max_age_secs")]
    pub recent_max_age_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

const fn default_list_max_age_secs() -> u64 {
    DEFAULT_LIST_MAX_AGE_SECS
}

const fn default_recent_max_age_secs() -> u64 {
    DEFAULT_RECENT_MAX_AGE_SECS
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            access_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            list_max_age_secs: DEFAULT_LIST_MAX_AGE_SECS,
            recent_max_age_secs: DEFAULT_RECENT_MAX_AGE_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Parse a config file's JSON payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(payload)
            .map_err(|error| Error::Config(format!("invalid config JSON: {error}")))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw).map_err(|error| match error {
            Error::Config(message) => {
                Error::Config(format!("{} ({})", message, path.display()))
            }
            other => other,
        })
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut normalized = self.clone();
        normalized.normalize();
        std::fs::write(path, serde_json::to_string_pretty(&normalized)?)?;
        Ok(())
    }

    /// Apply `DAYBOOK_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup (the environment in
    /// production, a map in tests).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = normalize_text_option(lookup(ENV_API_URL)) {
            self.api_base_url = Some(url);
        }
        if let Some(token) = normalize_text_option(lookup(ENV_TOKEN)) {
            self.access_token = Some(token);
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_PAGE_SIZE)) {
            self.page_size = raw.parse().map_err(|_| {
                Error::Config(format!("{ENV_PAGE_SIZE} must be a positive integer, got '{raw}'"))
            })?;
        }
        self.normalize();
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.api_base_url {
            if !is_http_url(url) {
                return Err(Error::Config(
                    "api_base_url must include http:// or https://".to_string(),
                ));
            }
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub const fn list_max_age(&self) -> Duration {
        Duration::from_secs(self.list_max_age_secs)
    }

    pub const fn recent_max_age(&self) -> Duration {
        Duration::from_secs(self.recent_max_age_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn normalize(&mut self) {
        self.api_base_url = normalize_text_option(self.api_base_url.take())
            .map(|url| url.trim_end_matches('/').to_string());
        self.access_token = normalize_text_option(self.access_token.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn empty_object_yields_defaults() {
        assert_eq!(ClientConfig::from_json("{}").unwrap(), ClientConfig::default());
    }

    #[test]
    fn rejects_unknown_fields() {
        let error = ClientConfig::from_json(r#"{"page_size": 10, "pagesize": 3}"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn normalizes_url_and_token() {
        let config = ClientConfig::from_json(
            r#"{"api_base_url": " https://app.example.com/api/ ", "access_token": "   "}"#,
        )
        .unwrap();
        assert_eq!(
            config.api_base_url.as_deref(),
            Some("https://app.example.com/api")
        );
        assert_eq!(config.access_token, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ClientConfig::from_json(r#"{"api_base_url": "app.example.com"}"#).is_err());
        assert!(ClientConfig::from_json(r#"{"page_size": 0}"#).is_err());
        assert!(ClientConfig::from_json(r#"{"page_size": 1000}"#).is_err());
        assert!(ClientConfig::from_json(r#"{"request_timeout_secs": 0}"#).is_err());
    }

    #[test]
    fn overrides_take_precedence() {
        let vars = HashMap::from([
            (ENV_API_URL, "https://override.example.com"),
            (ENV_TOKEN, "tok"),
            (ENV_PAGE_SIZE, "50"),
        ]);
        let mut config = ClientConfig::from_json(
            r#"{"api_base_url": "https://file.example.com", "page_size": 10}"#,
        )
        .unwrap();
        config
            .apply_overrides(|name| vars.get(name).map(ToString::to_string))
            .unwrap();

        assert_eq!(
            config.api_base_url.as_deref(),
            Some("https://override.example.com")
        );
        assert_eq!(config.access_token.as_deref(), Some("tok"));
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn invalid_page_size_override_is_reported() {
        let mut config = ClientConfig::default();
        let error = config
            .apply_overrides(|name| (name == ENV_PAGE_SIZE).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(error.to_string().contains(ENV_PAGE_SIZE));
    }

    #[test]
    fn file_roundtrip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        assert_eq!(
            ClientConfig::load_from_path(&path).unwrap(),
            ClientConfig::default()
        );

        let config = ClientConfig {
            api_base_url: Some("https://app.example.com".to_string()),
            page_size: 15,
            ..ClientConfig::default()
        };
        config.save_to_path(&path).unwrap();
        assert_eq!(ClientConfig::load_from_path(&path).unwrap(), config);
    }

    #[test]
    fn durations() {
        let config = ClientConfig::default();
        assert_eq!(config.list_max_age(), Duration::from_secs(300));
        assert_eq!(config.recent_max_age(), Duration::from_secs(120));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }
}
