//! Configuration management

use std::{collections::HashMap, env, path::Path, path::PathBuf, sync::LazyLock, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::failsafe::DEFAULT_RETRY_DELAY;
use crate::{Error, Result};

/// Backend assumed when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Pattern: `${VAR}` or `${VAR:-default}`
static ENV_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}").expect("env pattern is valid")
});

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub base_url: String,
    /// Environment files to load before processing config.
    /// Paths support ~ expansion. Loaded in order, later files override earlier.
    pub env_files: Vec<String>,
    /// Per-request settings
    pub request: RequestConfig,
    /// Description document discovery settings
    pub discovery: DiscoveryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            env_files: Vec::new(),
            request: RequestConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

/// Settings applied to every backend call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Per-attempt timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Extra attempts after a transient failure
    pub retries: u32,
    /// Linear backoff unit
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
    /// Headers sent with every request (values support `${VAR}` expansion)
    pub headers: HashMap<String, String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            headers: HashMap::new(),
        }
    }
}

/// Where and how the API description document is fetched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Path of the description document relative to the base URL
    pub document_path: String,
    /// Extra attempts when fetching the document
    pub fetch_retries: u32,
    /// Cache the fetched document between runs
    pub cache_enabled: bool,
    /// How long a cached document stays fresh
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,
    /// Cache directory (defaults to the platform cache dir)
    pub cache_dir: Option<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            document_path: "/openapi.json".to_string(),
            fetch_retries: 1,
            cache_enabled: true,
            cache_ttl: Duration::from_secs(5 * 60),
            cache_dir: None,
        }
    }
}

impl DiscoveryConfig {
    /// Resolved cache directory
    #[must_use]
    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("vocab-client")))
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        // Load from file if provided
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (VOCAB_CLIENT_ prefix)
        figment = figment.merge(Env::prefixed("VOCAB_CLIENT_").split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        // Load env files into process environment (before env var expansion)
        config.load_env_files();

        // Expand ${VAR} in request headers
        config.expand_env_vars();

        config.validate()?;
        Ok(config)
    }

    /// Check values that would only fail later, at request time
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(Error::Config("base_url must not be empty".to_string()));
        }
        url::Url::parse(base)
            .map_err(|e| Error::Config(format!("Invalid base_url '{base}': {e}")))?;
        if self.request.timeout.is_zero() {
            return Err(Error::Config("request.timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Load environment files into the process environment.
    /// Supports ~ expansion. Files that don't exist are silently skipped.
    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let expanded = if path_str.starts_with('~') {
                if let Some(home) = dirs::home_dir() {
                    path_str.replacen('~', &home.display().to_string(), 1)
                } else {
                    path_str.clone()
                }
            } else {
                path_str.clone()
            };

            let path = Path::new(&expanded);
            if path.exists() {
                match dotenvy::from_path(path) {
                    Ok(()) => {
                        tracing::info!("Loaded env file: {expanded}");
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load env file {expanded}: {e}");
                    }
                }
            } else {
                tracing::debug!("Env file not found (skipped): {expanded}");
            }
        }
    }

    /// Expand ${VAR} and ${VAR:-default} patterns in config values
    fn expand_env_vars(&mut self) {
        for value in self.request.headers.values_mut() {
            *value = expand_string(value);
        }
        self.base_url = expand_string(&self.base_url);
    }
}

/// Expand environment variables in a string
fn expand_string(value: &str) -> String {
    ENV_PATTERN
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            let default = caps.get(2).map_or("", |m| m.as_str());
            env::var(var_name).unwrap_or_else(|_| default.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.request.retries, 0);
        assert_eq!(config.request.retry_delay, Duration::from_millis(300));
        assert_eq!(config.discovery.document_path, "/openapi.json");
        assert_eq!(config.discovery.fetch_retries, 1);
        assert_eq!(config.discovery.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
base_url: "https://srs.example.test/"
request:
  timeout: 5s
  retries: 2
  retry_delay: 50ms
  headers:
    X-Client: "${{VOCAB_CLIENT_TEST_UNSET_VAR:-cli}}"
discovery:
  cache_ttl: 1m
  cache_enabled: false
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.base_url, "https://srs.example.test/");
        assert_eq!(config.request.timeout, Duration::from_secs(5));
        assert_eq!(config.request.retries, 2);
        assert_eq!(config.request.retry_delay, Duration::from_millis(50));
        assert_eq!(config.request.headers["X-Client"], "cli");
        assert_eq!(config.discovery.cache_ttl, Duration::from_secs(60));
        assert!(!config.discovery.cache_enabled);
        // Untouched sections keep their defaults
        assert_eq!(config.discovery.document_path, "/openapi.json");
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let config = Config {
            base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_string_default() {
        assert_eq!(
            expand_string("Bearer ${VOCAB_CLIENT_TEST_NOPE:-anon}"),
            "Bearer anon"
        );
        assert_eq!(expand_string("plain"), "plain");
    }
}
