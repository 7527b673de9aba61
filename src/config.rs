/// Service configuration loader - parses aqmon.toml
///
/// Keeps the upstream candidate list, timeouts and cache policy out of the
/// code, so operators can add or remove base URLs during an API migration
/// without recompiling the service.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "aqmon.toml";

/// Comma-separated override for `upstream.base_urls`.
pub const BASE_URLS_ENV: &str = "AQMON_BASE_URLS";

/// Root configuration structure for TOML parsing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub aggregator: AggregatorConfig,
}

/// Where and how to reach the air-quality API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Candidate base URLs, newest API version first.
    pub base_urls: Vec<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// `size` query parameter for the station list.
    pub station_page_size: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_urls: vec![
                "https://api.gios.gov.pl/pjp-api/v1/rest".to_string(),
                "https://api.gios.gov.pl/pjp-api/rest".to_string(),
            ],
            timeout_secs: 8,
            station_page_size: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Threads used for per-sensor reading fetches.
    pub worker_threads: usize,
    /// Wall-clock budget for the reading fan-out of one station. `0`
    /// disables the deadline.
    pub request_deadline_secs: Option<u64>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            request_deadline_secs: Some(20),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn request_deadline(&self) -> Option<Duration> {
        self.aggregator
            .request_deadline_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Replaces the candidate list with a comma-separated override.
    /// Blank entries are ignored; an override with no entries is ignored.
    pub fn apply_base_url_override(&mut self, raw: &str) {
        let urls: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if !urls.is_empty() {
            self.upstream.base_urls = urls;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.base_urls.is_empty() {
            return Err(ConfigError::Invalid("upstream.base_urls must not be empty".into()));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::Invalid("upstream.timeout_secs must be > 0".into()));
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::Invalid("cache.capacity must be > 0".into()));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache.ttl_secs must be > 0".into()));
        }
        if self.aggregator.worker_threads == 0 {
            return Err(ConfigError::Invalid("aggregator.worker_threads must be > 0".into()));
        }
        Ok(())
    }
}

/// Parses a configuration document. Missing tables and fields take their
/// defaults.
pub fn parse_config(contents: &str, origin: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from `path`, then applies `AQMON_BASE_URLS` from the
/// environment (or `.env`).
///
/// A missing file is not an error: the defaults point at the public API.
pub fn load_config_from<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    dotenv::dotenv().ok();

    let path = path.as_ref();
    let origin = path.display().to_string();

    let mut config = if path.exists() {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: origin.clone(),
            source,
        })?;
        parse_config(&contents, &origin)?
    } else {
        tracing::info!("{} not found, using built-in defaults", origin);
        ServiceConfig::default()
    };

    if let Ok(raw) = env::var(BASE_URLS_ENV) {
        config.apply_base_url_override(&raw);
    }

    config.validate()?;
    Ok(config)
}

/// Loads `aqmon.toml` from the working directory.
pub fn load_config() -> Result<ServiceConfig, ConfigError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}
