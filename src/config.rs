use crate::error::ConfigError;
use crate::log_debug;
use crate::tracker::{DEFAULT_CONCURRENCY, DEFAULT_FETCH_TIMEOUT};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Project configuration filename, looked up in the working directory
pub const PROJECT_CONFIG_FILENAME: &str = ".relnotes.toml";
/// Issue tracker API root
pub const TRACKER_URL_ENV: &str = "YOUTRACK_API_URL";
/// Issue tracker bearer token
pub const TRACKER_TOKEN_ENV: &str = "YOUTRACK_API_TOKEN";

/// Configuration for a relnotes run
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub format: FormatConfig,
}

/// Issue tracker connection and lookup settings
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// API root, only ever taken from the environment
    #[serde(skip)]
    pub base_url: String,
    /// Bearer token, only ever taken from the environment
    #[serde(skip)]
    pub token: String,
    /// Maximum lookups in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Upper bound for one lookup, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Restrict extraction to these project keys (empty accepts all)
    #[serde(default)]
    pub project_keys: Vec<String>,
}

/// Output settings
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatConfig {
    /// Render commit bodies under their subject line
    #[serde(default)]
    pub include_body: bool,
    /// Link template for issues, `{id}` is replaced
    #[serde(default)]
    pub issue_url: Option<String>,
    /// Link template for commits, `{hash}` is replaced
    #[serde(default)]
    pub commit_url: Option<String>,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT.as_secs()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            project_keys: Vec::new(),
        }
    }
}

// Keep the token out of debug logs
impl fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("base_url", &self.base_url)
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("concurrency", &self.concurrency)
            .field("timeout_secs", &self.timeout_secs)
            .field("project_keys", &self.project_keys)
            .finish()
    }
}

impl TrackerConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed API root
    pub fn url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(url)
    }
}

impl Config {
    /// Loads the project file (if any) and the tracker credentials from the
    /// process environment. Call [`Config::validate`] once CLI overrides are in.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(explicit_path)?;
        config.apply_env(|name| std::env::var(name).ok());
        log_debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Reads the project file. An explicit path must exist; the default one is optional.
    pub fn load_file(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match explicit_path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(PROJECT_CONFIG_FILENAME), false),
        };

        if !required && !path.exists() {
            log_debug!("No project config at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml(&content).map_err(|reason| ConfigError::Parse {
            path: path.display().to_string(),
            reason,
        })
    }

    /// Parses project file content
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Fills credentials from an environment lookup. Blank values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = read(TRACKER_URL_ENV) {
            self.tracker.base_url = url;
        }
        if let Some(token) = read(TRACKER_TOKEN_ENV) {
            self.tracker.token = token;
        }
    }

    /// Checks everything needed before any work starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.token.is_empty() {
            return Err(ConfigError::MissingEnv(TRACKER_TOKEN_ENV));
        }
        if self.tracker.base_url.is_empty() {
            return Err(ConfigError::MissingEnv(TRACKER_URL_ENV));
        }
        self.tracker.url()?;
        if self.tracker.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.tracker.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}
