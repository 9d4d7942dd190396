//! WMS GetFeatureInfo requests.
//!
//! A GetFeatureInfo request repeats the GetMap parameters of the map being
//! queried and adds the queried layers, the response format and the pixel
//! position. The pixel parameters are `I`/`J` in 1.3.0 and `X`/`Y` before.

use serde::{Deserialize, Serialize};
use url::Url;

use ogc_common::query::{parse_url, set_params};
use ogc_common::{BoundingBox, OgcError, OgcResult};

use crate::capabilities::OnlineResource;
use crate::request::{endpoint, map_params, MapRequest, WmsRequestBuilder};

/// Common GetFeatureInfo response formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum InfoFormat {
    /// application/json - Machine-readable JSON
    #[serde(rename = "application/json")]
    Json,
    /// application/vnd.ogc.gml - GML feature collection
    #[serde(rename = "application/vnd.ogc.gml")]
    Gml,
    /// text/html - Human-readable HTML for popups
    #[serde(rename = "text/html")]
    Html,
    /// text/xml - Generic XML
    #[serde(rename = "text/xml")]
    Xml,
    /// text/plain - Simple text format
    #[serde(rename = "text/plain")]
    #[default]
    Text,
}

impl InfoFormat {
    /// Preference order used by [`InfoFormat::negotiate`].
    const PREFERENCE: [InfoFormat; 5] = [
        InfoFormat::Json,
        InfoFormat::Gml,
        InfoFormat::Xml,
        InfoFormat::Html,
        InfoFormat::Text,
    ];

    /// Parse from MIME type string
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "application/json" => Some(InfoFormat::Json),
            "application/vnd.ogc.gml" => Some(InfoFormat::Gml),
            "text/html" => Some(InfoFormat::Html),
            "text/xml" => Some(InfoFormat::Xml),
            "text/plain" => Some(InfoFormat::Text),
            _ => None,
        }
    }

    /// Get MIME type string
    pub fn to_mime(&self) -> &'static str {
        match self {
            InfoFormat::Json => "application/json",
            InfoFormat::Gml => "application/vnd.ogc.gml",
            InfoFormat::Html => "text/html",
            InfoFormat::Xml => "text/xml",
            InfoFormat::Text => "text/plain",
        }
    }

    /// Most structured format among those a server advertises.
    pub fn negotiate(advertised: &[String]) -> Option<Self> {
        let known: Vec<InfoFormat> = advertised
            .iter()
            .filter_map(|mime| InfoFormat::from_mime(mime))
            .collect();
        Self::PREFERENCE
            .into_iter()
            .find(|format| known.contains(format))
    }
}

/// Pixel query against a map image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfoRequest {
    pub map: MapRequest,
    /// Layers to query; empty means every layer of the map configuration.
    pub query_layers: Vec<String>,
    /// Pixel column (0-based from left)
    pub i: u32,
    /// Pixel row (0-based from top)
    pub j: u32,
    pub info_format: InfoFormat,
    pub feature_count: Option<u32>,
}

impl FeatureInfoRequest {
    pub fn new(map: MapRequest, i: u32, j: u32) -> Self {
        Self {
            map,
            query_layers: Vec::new(),
            i,
            j,
            info_format: InfoFormat::default(),
            feature_count: None,
        }
    }

    pub fn query_layer(mut self, name: impl Into<String>) -> Self {
        self.query_layers.push(name.into());
        self
    }

    pub fn info_format(mut self, format: InfoFormat) -> Self {
        self.info_format = format;
        self
    }

    pub fn feature_count(mut self, count: u32) -> Self {
        self.feature_count = Some(count);
        self
    }

    /// Map coordinate at the centre of the queried pixel.
    pub fn map_position(&self) -> (f64, f64) {
        pixel_to_map(self.i, self.j, self.map.width, self.map.height, &self.map.bbox)
    }
}

impl<'a> WmsRequestBuilder<'a> {
    pub fn get_feature_info_endpoint(&self) -> OgcResult<&'a OnlineResource> {
        let operation = self
            .capabilities
            .get_feature_info
            .as_ref()
            .ok_or_else(|| OgcError::missing("GetFeatureInfo"))?;
        endpoint(operation, "GetFeatureInfo")
    }

    pub fn get_feature_info_url(&self, request: &FeatureInfoRequest) -> OgcResult<Url> {
        let version = self.version();
        let mut params = vec![
            ("REQUEST".to_string(), "GetFeatureInfo".to_string()),
            ("SERVICE".to_string(), "WMS".to_string()),
        ];
        params.extend(map_params(version, self.config, &request.map)?);

        let query_layers = if request.query_layers.is_empty() {
            self.config.layers.join(",")
        } else {
            request.query_layers.join(",")
        };
        let (column, row) = version.pixel_parameters();
        params.push(("QUERY_LAYERS".to_string(), query_layers));
        params.push((
            "INFO_FORMAT".to_string(),
            request.info_format.to_mime().to_string(),
        ));
        if let Some(count) = request.feature_count {
            params.push(("FEATURE_COUNT".to_string(), count.to_string()));
        }
        params.push((column.to_string(), request.i.to_string()));
        params.push((row.to_string(), request.j.to_string()));
        params.extend(self.config.extra_params.iter().cloned());

        let mut url = parse_url(&self.get_feature_info_endpoint()?.url)?;
        set_params(&mut url, &params);
        Ok(url)
    }
}

/// Convert a pixel position to map coordinates.
///
/// Uses the pixel centre; rows count down from the top of the image.
pub fn pixel_to_map(i: u32, j: u32, width: u32, height: u32, bbox: &BoundingBox) -> (f64, f64) {
    let x_ratio = (i as f64 + 0.5) / width.max(1) as f64;
    let y_ratio = (j as f64 + 0.5) / height.max(1) as f64;

    let x = bbox.min_x + x_ratio * bbox.width();
    let y = bbox.max_y - y_ratio * bbox.height();

    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_pixel_to_map() {
        let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
        let (x, y) = pixel_to_map(128, 128, 256, 256, &bbox);
        assert!(x.abs() < 1.0);
        assert!(y.abs() < 1.0);

        let (x, y) = pixel_to_map(0, 0, 360, 180, &bbox);
        assert_approx_eq!(x, -179.5, 1e-9);
        assert_approx_eq!(y, 89.5, 1e-9);
    }

    #[test]
    fn test_info_format_parsing() {
        assert_eq!(InfoFormat::from_mime("application/json"), Some(InfoFormat::Json));
        assert_eq!(InfoFormat::from_mime("TEXT/HTML"), Some(InfoFormat::Html));
        assert_eq!(InfoFormat::from_mime("image/png"), None);
        assert_eq!(InfoFormat::Gml.to_mime(), "application/vnd.ogc.gml");
    }

    #[test]
    fn test_negotiate_prefers_structured_formats() {
        let advertised = vec![
            "text/plain".to_string(),
            "application/vnd.ogc.gml".to_string(),
            "text/html".to_string(),
        ];
        assert_eq!(InfoFormat::negotiate(&advertised), Some(InfoFormat::Gml));
        assert_eq!(InfoFormat::negotiate(&["image/png".to_string()]), None);
    }
}
