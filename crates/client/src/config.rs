//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PORTFOLIO_API_URL` - Backend base URL (default: `http://localhost:5000`)
//! - `PORTFOLIO_SESSION_PATH` - Session file (default: `$HOME/.portfolio/session.json`)
//! - `PORTFOLIO_HTTP_TIMEOUT_SECS` - Request timeout (default: none)
//! - `PORTFOLIO_FORM_RESET_MS` - Delay before a submitted form clears (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_FORM_RESET_MS: &str = "3000";
const SESSION_DIR: &str = ".portfolio";
const SESSION_FILE: &str = "session.json";
const FALLBACK_SESSION_FILE: &str = ".portfolio-session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portfolio client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, always ending in `/`
    pub api_url: Url,
    /// Where the session is persisted between runs
    pub session_path: PathBuf,
    /// Per-request timeout; `None` keeps the transport default
    pub http_timeout: Option<Duration>,
    /// How long a succeeded form shows its confirmation before clearing
    pub form_reset_delay: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Build a configuration for `api_url` with every other setting at its
    /// default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` cannot serve as a
    /// base URL.
    pub fn new(api_url: &str, session_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_base_url("PORTFOLIO_API_URL", api_url)?,
            session_path: session_path.into(),
            http_timeout: None,
            form_reset_delay: Duration::from_millis(3000),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_url = parse_base_url(
            "PORTFOLIO_API_URL",
            &get_or_default("PORTFOLIO_API_URL", DEFAULT_API_URL),
        )?;

        let session_path = lookup("PORTFOLIO_SESSION_PATH").map_or_else(
            || default_session_path(lookup("HOME")),
            PathBuf::from,
        );

        let http_timeout = lookup("PORTFOLIO_HTTP_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| {
                        ConfigError::InvalidEnvVar(
                            "PORTFOLIO_HTTP_TIMEOUT_SECS".to_string(),
                            e.to_string(),
                        )
                    })
            })
            .transpose()?;

        let form_reset_delay = get_or_default("PORTFOLIO_FORM_RESET_MS", DEFAULT_FORM_RESET_MS)
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PORTFOLIO_FORM_RESET_MS".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_url,
            session_path,
            http_timeout,
            form_reset_delay,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }
}

/// Parse a base URL and make sure relative paths join beneath it.
fn parse_base_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("{raw} is not an http(s) base URL"),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_session_path(home: Option<String>) -> PathBuf {
    home.filter(|home| !home.is_empty()).map_or_else(
        || PathBuf::from(FALLBACK_SESSION_FILE),
        |home| PathBuf::from(home).join(SESSION_DIR).join(SESSION_FILE),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("HOME", "/home/ada")]).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:5000/");
        assert_eq!(
            config.session_path,
            PathBuf::from("/home/ada/.portfolio/session.json")
        );
        assert!(config.http_timeout.is_none());
        assert_eq!(config.form_reset_delay, Duration::from_secs(3));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_no_home_falls_back_to_working_directory() {
        let config = load(&[]).unwrap();
        assert_eq!(config.session_path, PathBuf::from(".portfolio-session.json"));
    }

    #[test]
    fn test_api_url_gets_trailing_slash() {
        let config = load(&[("PORTFOLIO_API_URL", "https://example.com/portfolio")]).unwrap();
        assert_eq!(config.api_url.as_str(), "https://example.com/portfolio/");
        assert_eq!(
            config.api_url.join("api/contact").unwrap().as_str(),
            "https://example.com/portfolio/api/contact"
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("PORTFOLIO_API_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(name, _)) if name == "PORTFOLIO_API_URL"
        ));
        assert!(matches!(
            load(&[("PORTFOLIO_API_URL", "mailto:someone@example.com")]),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            load(&[("PORTFOLIO_HTTP_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::InvalidEnvVar(name, _)) if name == "PORTFOLIO_HTTP_TIMEOUT_SECS"
        ));
    }

    #[test]
    fn test_optional_settings() {
        let config = load(&[
            ("PORTFOLIO_HTTP_TIMEOUT_SECS", "15"),
            ("PORTFOLIO_FORM_RESET_MS", "250"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
        ])
        .unwrap();
        assert_eq!(config.http_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.form_reset_delay, Duration::from_millis(250));
        assert!(config.sentry_dsn.is_some());
    }
}
