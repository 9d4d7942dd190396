//! CLI configuration: an optional YAML file, else environment variables.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ogc_common::{WfsVersion, WmsVersion};
use ogc_http::HttpConfig;

/// ```yaml
/// http:
///   timeout_secs: 60
///   proxy: http://proxy.internal:3128
/// wms_version: 1.1.1
/// wfs_version: 1.0.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    pub http: HttpConfig,
    /// Version requested when a command does not name one.
    pub wms_version: Option<WmsVersion>,
    pub wfs_version: Option<WfsVersion>,
}

impl InspectConfig {
    /// Load from `path` if given, otherwise from the `OGC_HTTP_*` and
    /// `OGC_CACHE_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self {
                http: HttpConfig::from_env().context("Invalid HTTP settings in environment")?,
                ..Self::default()
            }),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: InspectConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded inspector configuration");
        Ok(config)
    }
}
