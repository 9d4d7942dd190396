//! GetCapabilities, GetMap and legend URL construction.

use serde::{Deserialize, Serialize};
use url::Url;

use ogc_common::query::{append_missing_params, parse_url, set_params};
use ogc_common::{BoundingBox, OgcError, OgcResult, WmsVersion};

use crate::capabilities::{OnlineResource, OperationType, WmsCapabilities};
use crate::layer::LegendUrl;

pub const DEFAULT_MAP_FORMAT: &str = "image/png";

/// Layer selection and output settings for map requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WmsMapConfig {
    pub layers: Vec<String>,
    /// Style per layer; may be shorter than `layers` or empty for defaults.
    pub styles: Vec<String>,
    pub crs: Option<String>,
    pub format: String,
    /// Overrides the version advertised by the capabilities document.
    pub version: Option<WmsVersion>,
    /// Vendor parameters appended after the standard ones, unvalidated.
    pub extra_params: Vec<(String, String)>,
}

impl Default for WmsMapConfig {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            styles: Vec::new(),
            crs: None,
            format: DEFAULT_MAP_FORMAT.to_string(),
            version: None,
            extra_params: Vec::new(),
        }
    }
}

impl WmsMapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, name: impl Into<String>) -> Self {
        self.layers.push(name.into());
        self
    }

    pub fn style(mut self, name: impl Into<String>) -> Self {
        self.styles.push(name.into());
        self
    }

    pub fn crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn version(mut self, version: WmsVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.push((key.into(), value.into()));
        self
    }
}

/// Extent and pixel size of one map image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRequest {
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
}

impl MapRequest {
    pub fn new(bbox: BoundingBox, width: u32, height: u32) -> Self {
        Self { bbox, width, height }
    }
}

/// Legend resolved for one selected layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerLegend {
    pub layer: String,
    pub legend: Option<LegendUrl>,
}

/// GetCapabilities URL for `base`; parameters already present are kept.
pub fn capabilities_url(base: &str, version: Option<WmsVersion>) -> OgcResult<Url> {
    let mut url = parse_url(base)?;
    let mut params = vec![("SERVICE", "WMS"), ("REQUEST", "GetCapabilities")];
    if let Some(version) = version {
        params.push(("VERSION", version.as_str()));
    }
    append_missing_params(&mut url, &params);
    Ok(url)
}

/// Parameters shared by GetMap and GetFeatureInfo, in request order.
pub(crate) fn map_params(
    version: WmsVersion,
    config: &WmsMapConfig,
    request: &MapRequest,
) -> OgcResult<Vec<(String, String)>> {
    let crs = config
        .crs
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or(OgcError::NoCrsConfigured)?;

    Ok(vec![
        ("VERSION".to_string(), version.as_str().to_string()),
        ("LAYERS".to_string(), config.layers.join(",")),
        ("STYLES".to_string(), config.styles.join(",")),
        (version.crs_parameter().to_string(), crs.to_string()),
        ("BBOX".to_string(), request.bbox.to_kvp()),
        ("WIDTH".to_string(), request.width.to_string()),
        ("HEIGHT".to_string(), request.height.to_string()),
        ("FORMAT".to_string(), config.format.clone()),
        ("TRANSPARENT".to_string(), "true".to_string()),
    ])
}

/// GetMap URL against an explicit endpoint.
pub fn build_get_map_url(
    endpoint: &str,
    version: WmsVersion,
    config: &WmsMapConfig,
    request: &MapRequest,
) -> OgcResult<Url> {
    let mut params = vec![
        ("REQUEST".to_string(), "GetMap".to_string()),
        ("SERVICE".to_string(), "WMS".to_string()),
    ];
    params.extend(map_params(version, config, request)?);
    params.extend(config.extra_params.iter().cloned());

    let mut url = parse_url(endpoint)?;
    set_params(&mut url, &params);
    Ok(url)
}

pub(crate) fn endpoint<'c>(
    operation: &'c OperationType,
    which: &str,
) -> OgcResult<&'c OnlineResource> {
    operation
        .preferred_binding()
        .ok_or_else(|| OgcError::missing(format!("{} OnlineResource", which)))
}

/// Builds data request URLs from parsed capabilities and a map configuration.
#[derive(Debug, Clone, Copy)]
pub struct WmsRequestBuilder<'a> {
    pub(crate) capabilities: &'a WmsCapabilities,
    pub(crate) config: &'a WmsMapConfig,
}

impl<'a> WmsRequestBuilder<'a> {
    pub fn new(capabilities: &'a WmsCapabilities, config: &'a WmsMapConfig) -> Self {
        Self {
            capabilities,
            config,
        }
    }

    pub fn version(&self) -> WmsVersion {
        self.config.version.unwrap_or(self.capabilities.version)
    }

    /// GetMap binding chosen from the capabilities: GET, else POST, else first.
    pub fn get_map_endpoint(&self) -> OgcResult<&'a OnlineResource> {
        endpoint(&self.capabilities.get_map, "GetMap")
    }

    pub fn get_map_url(&self, request: &MapRequest) -> OgcResult<Url> {
        let binding = self.get_map_endpoint()?;
        build_get_map_url(&binding.url, self.version(), self.config, request)
    }

    /// Legend of the first declared style of each selected layer.
    ///
    /// Only the first style is considered even when another style is selected.
    pub fn legend_urls(&self) -> OgcResult<Vec<LayerLegend>> {
        self.config
            .layers
            .iter()
            .map(|name| {
                let layer = self.capabilities.find_layer(name)?;
                Ok(LayerLegend {
                    layer: name.clone(),
                    legend: layer.default_legend().cloned(),
                })
            })
            .collect()
    }
}
