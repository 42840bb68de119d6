use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::DEFAULT_USER_AGENT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as number: {source}")]
    ParseFloat {
        name: String,
        #[source]
        source: std::num::ParseFloatError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Forum root, e.g. `https://www.uscardforum.com`. No trailing slash.
    pub base_url: String,
    /// How long a raw cache entry stays valid.
    pub cache_duration_hours: u64,
    /// Extra attempts allowed per page request after the first failure.
    pub max_retries: u32,
    /// Backoff scale in seconds for transient-failure retries.
    pub backoff_factor: f64,
    /// Root directory for raw cache and derived artifacts.
    pub cache_dir: PathBuf,
    /// User-Agent header sent with every page request.
    pub user_agent: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(required_env("BASE_URL")?),
            cache_duration_hours: parse_env_u64("CACHE_DURATION_HOURS", 24)?,
            max_retries: parse_env_u32("MAX_RETRIES", 5)?,
            backoff_factor: parse_env_f64("BACKOFF_FACTOR", 1.0)?,
            cache_dir: PathBuf::from(env_or_default("CACHE_DIR", "./cache")),
            user_agent: env_or_default("USER_AGENT", DEFAULT_USER_AGENT),
            request_timeout: Duration::from_secs(parse_env_u64("REQUEST_TIMEOUT_SECS", 15)?),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.base_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    name: "BASE_URL".to_string(),
                    message: "must be an absolute http(s) URL".to_string(),
                })
            }
        }
        if self.backoff_factor < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "BACKOFF_FACTOR".to_string(),
                message: "must not be negative".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "REQUEST_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// TTL for the raw cache.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_duration_hours.saturating_mul(3600))
    }

    /// Configuration suitable for unit and integration tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            cache_duration_hours: 24,
            max_retries: 2,
            backoff_factor: 0.0,
            cache_dir: PathBuf::from("./cache"),
            user_agent: "topic-harvester-tests".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Strip any trailing slashes so path joins stay predictable.
fn normalize_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_f64(name: &str, default: f64) -> Result<f64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseFloat {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_vars() {
        for name in [
            "BASE_URL",
            "CACHE_DURATION_HOURS",
            "MAX_RETRIES",
            "BACKOFF_FACTOR",
            "CACHE_DIR",
            "USER_AGENT",
            "REQUEST_TIMEOUT_SECS",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn defaults_applied_for_optional_vars() {
        clear_vars();
        std::env::set_var("BASE_URL", "https://forum.example.com/");

        let config = Config::from_env().expect("from_env failed");
        assert_eq!(config.base_url, "https://forum.example.com");
        assert_eq!(config.cache_duration_hours, 24);
        assert_eq!(config.max_retries, 5);
        assert!((config.backoff_factor - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.cache_dir, PathBuf::from("./cache"));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    #[serial]
    fn missing_base_url_is_an_error() {
        clear_vars();
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::MissingEnvVar(name)) if name == "BASE_URL"
        ));
    }

    #[test]
    #[serial]
    fn invalid_integer_rejected() {
        clear_vars();
        std::env::set_var("BASE_URL", "https://forum.example.com");
        std::env::set_var("MAX_RETRIES", "many");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::ParseInt { name, .. }) if name == "MAX_RETRIES"
        ));
        std::env::remove_var("MAX_RETRIES");
    }

    #[test]
    fn validate_rejects_non_http_base_url() {
        let config = Config {
            base_url: "not a url".to_string(),
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());

        let config = Config {
            base_url: "ftp://forum.example.com".to_string(),
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());

        assert!(Config::for_testing().validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_backoff() {
        let config = Config {
            backoff_factor: -1.0,
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn cache_ttl_converts_hours() {
        let config = Config {
            cache_duration_hours: 2,
            ..Config::for_testing()
        };
        assert_eq!(config.cache_ttl(), Duration::from_secs(7200));
    }
}
