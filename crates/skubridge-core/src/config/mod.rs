//! Integration gateway connection settings.
//!
//! A `GatewayConfig` is usually loaded from a CLI profile and then adjusted by
//! environment variables, so the same profile can point at staging or
//! production without being edited.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{SyncDirection, SyncMode};
use crate::util::{is_http_url, normalize_text_option};

pub const ENV_API_BASE_URL: &str = "SKUBRIDGE_API_BASE_URL";
pub const ENV_API_TOKEN: &str = "SKUBRIDGE_API_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "SKUBRIDGE_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 600;

/// Where and how to reach the integration gateway.
///
/// The bearer token is the only secret and never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Direction given to items queued without an explicit one
    #[serde(default)]
    pub default_direction: SyncDirection,
    #[serde(default)]
    pub default_mode: SyncMode,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .field("default_direction", &self.default_direction)
            .field("default_mode", &self.default_mode)
            .finish()
    }
}

impl GatewayConfig {
    /// Config for `base_url` with default timeout, direction and mode
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let config = Self {
            base_url: base_url.into(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_direction: SyncDirection::default(),
            default_mode: SyncMode::default(),
        };
        config.normalized()
    }

    /// Build a config purely from the environment. Fails when no base URL is set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides on top of this config
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = normalize_text_option(lookup(ENV_API_BASE_URL))
            .ok_or_else(|| Error::Config(format!("{ENV_API_BASE_URL} is not set")))?;
        Self::new(base_url)?.with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(base_url) = normalize_text_option(lookup(ENV_API_BASE_URL)) {
            self.base_url = base_url;
        }
        if let Some(token) = normalize_text_option(lookup(ENV_API_TOKEN)) {
            self.api_token = Some(token);
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_TIMEOUT_SECS)) {
            self.timeout_secs = raw.parse().map_err(|_| {
                Error::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds"))
            })?;
        }
        self.normalized()
    }

    /// Trim values and check them; the base URL loses any trailing slash
    pub fn normalized(mut self) -> Result<Self> {
        let base_url = normalize_text_option(Some(self.base_url))
            .ok_or_else(|| Error::Config("gateway base_url must not be empty".to_string()))?;
        if !is_http_url(&base_url) {
            return Err(Error::Config(
                "gateway base_url must include http:// or https://".to_string(),
            ));
        }
        self.base_url = base_url.trim_end_matches('/').to_string();
        self.api_token = normalize_text_option(self.api_token);

        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(Error::Config(format!(
                "timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }
        Ok(self)
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn new_trims_trailing_slash() {
        let config = GatewayConfig::new(" https://gateway.example.com/api/ ").unwrap();
        assert_eq!(config.base_url, "https://gateway.example.com/api");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn new_rejects_non_http_urls() {
        assert!(GatewayConfig::new("").is_err());
        assert!(GatewayConfig::new("gateway.example.com").is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let mut config = GatewayConfig::new("https://gateway.example.com").unwrap();
        config.api_token = Some("secret-token".to_string());

        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn overrides_replace_profile_values() {
        let config = GatewayConfig::new("https://staging.example.com")
            .unwrap()
            .with_overrides(lookup(&[
                (ENV_API_BASE_URL, "https://prod.example.com/"),
                (ENV_API_TOKEN, "tok"),
                (ENV_TIMEOUT_SECS, "5"),
            ]))
            .unwrap();

        assert_eq!(config.base_url, "https://prod.example.com");
        assert_eq!(config.api_token.as_deref(), Some("tok"));
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn overrides_reject_bad_timeout() {
        let error = GatewayConfig::new("https://gateway.example.com")
            .unwrap()
            .with_overrides(lookup(&[(ENV_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(matches!(error, Error::Config(_)));

        let error = GatewayConfig::new("https://gateway.example.com")
            .unwrap()
            .with_overrides(lookup(&[(ENV_TIMEOUT_SECS, "0")]))
            .unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn from_lookup_requires_base_url() {
        assert!(GatewayConfig::from_lookup(lookup(&[])).is_err());

        let config =
            GatewayConfig::from_lookup(lookup(&[(ENV_API_BASE_URL, "http://localhost:8080")]))
                .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.default_direction, SyncDirection::SourceToTarget);
    }

    #[test]
    fn deserialize_rejects_unknown_fields() {
        let error = serde_json::from_str::<GatewayConfig>(
            r#"{"base_url": "https://gateway.example.com", "unexpected": true}"#,
        )
        .unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn deserialize_fills_defaults() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{"base_url": "https://gateway.example.com", "default_direction": "bidirectional"}"#,
        )
        .unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.default_direction, SyncDirection::Bidirectional);
        assert_eq!(config.default_mode, SyncMode::Delta);
    }
}
