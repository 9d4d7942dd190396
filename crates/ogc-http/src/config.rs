//! HTTP client configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ogc_common::{OgcError, OgcResult};

/// Settings passed through unmodified to the HTTP client and response cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Proxy URL applied to all schemes.
    pub proxy: Option<String>,
    /// HTTP basic credentials.
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_agent: String,
    /// Upper bound on cached response bytes; `0` disables caching.
    pub cache_capacity_bytes: u64,
    pub cache_ttl_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            proxy: None,
            username: None,
            password: None,
            user_agent: format!("ogc-client/{}", env!("CARGO_PKG_VERSION")),
            cache_capacity_bytes: 64 * 1024 * 1024,
            cache_ttl_secs: 300,
        }
    }
}

impl HttpConfig {
    /// Load configuration from environment variables, defaulting unset ones.
    ///
    /// Reads `OGC_HTTP_TIMEOUT_SECS`, `OGC_HTTP_CONNECT_TIMEOUT_SECS`,
    /// `OGC_HTTP_PROXY`, `OGC_HTTP_USERNAME`, `OGC_HTTP_PASSWORD`,
    /// `OGC_HTTP_USER_AGENT`, `OGC_CACHE_MAX_BYTES` and `OGC_CACHE_TTL_SECS`.
    pub fn from_env() -> OgcResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> OgcResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            timeout_secs: parse_number(&get, "OGC_HTTP_TIMEOUT_SECS", defaults.timeout_secs)?,
            connect_timeout_secs: parse_number(
                &get,
                "OGC_HTTP_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            proxy: get("OGC_HTTP_PROXY"),
            username: get("OGC_HTTP_USERNAME"),
            password: get("OGC_HTTP_PASSWORD"),
            user_agent: get("OGC_HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
            cache_capacity_bytes: parse_number(
                &get,
                "OGC_CACHE_MAX_BYTES",
                defaults.cache_capacity_bytes,
            )?,
            cache_ttl_secs: parse_number(&get, "OGC_CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
        })
    }

    /// Load configuration from a YAML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> OgcResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            OgcError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: HttpConfig = serde_yaml::from_str(&content).map_err(|e| {
            OgcError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "Loaded HTTP configuration");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_capacity_bytes > 0
    }
}

fn parse_number<G>(get: &G, key: &str, default: u64) -> OgcResult<u64>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            OgcError::Configuration(format!("{} must be a non-negative integer, got '{}'", key, raw))
        }),
        None => Ok(default),
    }
}
