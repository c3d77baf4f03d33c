//! Application configuration.
//!
//! Values come from the environment (a `.env` file is loaded first if present).
//! Every setting has a development default, so a bare checkout runs in mock mode.
//!
//! | Variable              | Default                           |
//! |-----------------------|-----------------------------------|
//! | `API_BASE_URL`        | `https://api.example.com`         |
//! | `API_KEY`             | (empty)                           |
//! | `FETCH_ENDPOINT`      | `/records`                        |
//! | `POST_ENDPOINT`       | `https://api.example.com/results` |
//! | `TIMEOUT`             | `30000` (ms)                      |
//! | `RETRY_ATTEMPTS`      | `3`                               |
//! | `RETRY_BASE_DELAY_MS` | `1000`                            |
//! | `MOCK_MODE`           | `true`                            |
//! | `APP_ENV`             | `development`                     |

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Upstream records API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.example.com";

/// Path appended to the base URL when fetching records.
pub const DEFAULT_FETCH_ENDPOINT: &str = "/records";

/// Where analysis results are posted.
pub const DEFAULT_POST_ENDPOINT: &str = "https://api.example.com/results";

/// Per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Attempts per upstream call, including the first.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// First backoff delay; doubles on every retry.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Runtime configuration shared by the server and the upstream clients.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: String,
    pub fetch_endpoint: String,
    pub post_endpoint: String,
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_base_delay: Duration,
    /// Serve built-in records and receipts instead of calling upstream.
    pub mock_mode: bool,
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            fetch_endpoint: DEFAULT_FETCH_ENDPOINT.to_string(),
            post_endpoint: DEFAULT_POST_ENDPOINT.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            mock_mode: true,
            environment: "development".to_string(),
        }
    }
}

// Keep the API key out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("fetch_endpoint", &self.fetch_endpoint)
            .field("post_endpoint", &self.post_endpoint)
            .field("timeout", &self.timeout)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_base_delay", &self.retry_base_delay)
            .field("mock_mode", &self.mock_mode)
            .field("environment", &self.environment)
            .finish()
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&'static str]| -> Option<(&'static str, String)> {
            keys.iter()
                .filter_map(|k| lookup(k).map(|v| (*k, v)))
                .find(|(_, v)| !v.trim().is_empty())
        };
        let defaults = Self::default();

        let timeout_ms = parse_or(get(&["TIMEOUT"]), DEFAULT_TIMEOUT_MS)?;
        let retry_attempts: u32 = parse_or(get(&["RETRY_ATTEMPTS"]), DEFAULT_RETRY_ATTEMPTS)?;
        let base_delay_ms = parse_or(get(&["RETRY_BASE_DELAY_MS"]), DEFAULT_RETRY_BASE_DELAY_MS)?;
        let mock_mode = match get(&["MOCK_MODE"]) {
            Some((key, value)) => parse_bool(key, &value)?,
            None => defaults.mock_mode,
        };

        Ok(Self {
            api_base_url: get(&["API_BASE_URL", "NEXT_PUBLIC_API_BASE_URL"])
                .map(|(_, v)| v)
                .unwrap_or(defaults.api_base_url),
            api_key: get(&["API_KEY"]).map(|(_, v)| v).unwrap_or_default(),
            fetch_endpoint: get(&["FETCH_ENDPOINT"])
                .map(|(_, v)| v)
                .unwrap_or(defaults.fetch_endpoint),
            post_endpoint: get(&["POST_ENDPOINT"])
                .map(|(_, v)| v)
                .unwrap_or(defaults.post_endpoint),
            timeout: Duration::from_millis(timeout_ms),
            retry_attempts: retry_attempts.max(1),
            retry_base_delay: Duration::from_millis(base_delay_ms),
            mock_mode,
            environment: get(&["APP_ENV", "NODE_ENV"])
                .map(|(_, v)| v)
                .unwrap_or(defaults.environment),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Fail when production would call upstream without credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_production() && !self.mock_mode && self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }

    /// Full URL of the records endpoint.
    pub fn fetch_url(&self) -> String {
        join_url(&self.api_base_url, &self.fetch_endpoint)
    }
}

/// Join a base URL and a path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn parse_or<T: FromStr>(entry: Option<(&str, String)>, default: T) -> Result<T, ConfigError> {
    match entry {
        Some((key, value)) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.mock_mode);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.fetch_url(), "https://api.example.com/records");
    }

    #[test]
    fn test_overrides_and_aliases() {
        let config = config_from(&[
            ("NEXT_PUBLIC_API_BASE_URL", "http://localhost:9000/"),
            ("API_KEY", "secret"),
            ("FETCH_ENDPOINT", "patients"),
            ("TIMEOUT", "5000"),
            ("RETRY_ATTEMPTS", "5"),
            ("RETRY_BASE_DELAY_MS", "10"),
            ("MOCK_MODE", "off"),
            ("NODE_ENV", "production"),
        ])
        .unwrap();

        assert_eq!(config.fetch_url(), "http://localhost:9000/patients");
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert_eq!(config.retry_attempts, 5);
        assert_eq!(config.retry_base_delay, Duration::from_millis(10));
        assert!(!config.mock_mode);
        assert!(config.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_number() {
        let err = config_from(&[("TIMEOUT", "thirty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "TIMEOUT".into(),
                value: "thirty".into()
            }
        );
        assert!(config_from(&[("MOCK_MODE", "maybe")]).is_err());
    }

    #[test]
    fn test_retry_attempts_floor() {
        let config = config_from(&[("RETRY_ATTEMPTS", "0")]).unwrap();
        assert_eq!(config.retry_attempts, 1);
    }

    #[test]
    fn test_production_requires_key_for_upstream() {
        let config = config_from(&[("APP_ENV", "production"), ("MOCK_MODE", "false")]).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::MissingApiKey));

        let mock = config_from(&[("APP_ENV", "production")]).unwrap();
        assert!(mock.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config {
            api_key: "top-secret".into(),
            ..Config::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("top-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://a/", "/b"), "http://a/b");
        assert_eq!(join_url("http://a", "b"), "http://a/b");
        assert_eq!(join_url("http://a", "https://other/x"), "https://other/x");
    }
}
