//! Async WMS client over an injected [`HttpFetcher`].

use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use url::Url;

use ogc_common::query::parse_url;
use ogc_common::{OgcResult, WmsVersion};
use ogc_http::{fetch_bytes, fetch_xml, HttpFetcher};

use crate::capabilities::WmsCapabilities;
use crate::getfeatureinfo::FeatureInfoRequest;
use crate::layer::LegendUrl;
use crate::request::{capabilities_url, MapRequest, WmsMapConfig, WmsRequestBuilder};

/// A binary payload returned by GetMap or a legend request.
#[derive(Debug, Clone, Serialize)]
pub struct MapImage {
    pub url: String,
    pub content_type: Option<String>,
    #[serde(skip)]
    pub bytes: Bytes,
}

/// Raw GetFeatureInfo response.
#[derive(Debug, Clone)]
pub struct FeatureInfoResponse {
    pub url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FeatureInfoResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct WmsClient {
    fetcher: Arc<dyn HttpFetcher>,
    base_url: String,
}

impl WmsClient {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn capabilities_url(&self, version: Option<WmsVersion>) -> OgcResult<Url> {
        capabilities_url(&self.base_url, version)
    }

    /// Fetch and parse GetCapabilities.
    #[instrument(skip(self, cancel), fields(url = %self.base_url))]
    pub async fn fetch_capabilities(
        &self,
        version: Option<WmsVersion>,
        cancel: &CancellationToken,
    ) -> OgcResult<WmsCapabilities> {
        let url = self.capabilities_url(version)?;
        let document = fetch_xml(self.fetcher.as_ref(), &url, cancel).await?;
        let capabilities = WmsCapabilities::from_xml(document)?;
        info!(
            version = %capabilities.version,
            title = ?capabilities.service.title,
            "Fetched WMS capabilities"
        );
        Ok(capabilities)
    }

    #[instrument(skip_all, fields(layers = ?config.layers))]
    pub async fn get_map(
        &self,
        capabilities: &WmsCapabilities,
        config: &WmsMapConfig,
        request: &MapRequest,
        cancel: &CancellationToken,
    ) -> OgcResult<MapImage> {
        let url = WmsRequestBuilder::new(capabilities, config).get_map_url(request)?;
        self.fetch_image(url, cancel).await
    }

    /// One GetMap per request; failures are reported per entry.
    pub async fn get_maps(
        &self,
        capabilities: &WmsCapabilities,
        config: &WmsMapConfig,
        requests: &[MapRequest],
        cancel: &CancellationToken,
    ) -> Vec<OgcResult<MapImage>> {
        let results = join_all(
            requests
                .iter()
                .map(|request| self.get_map(capabilities, config, request, cancel)),
        )
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "Some map requests failed");
        }
        results
    }

    #[instrument(skip_all, fields(i = request.i, j = request.j))]
    pub async fn get_feature_info(
        &self,
        capabilities: &WmsCapabilities,
        config: &WmsMapConfig,
        request: &FeatureInfoRequest,
        cancel: &CancellationToken,
    ) -> OgcResult<FeatureInfoResponse> {
        let url = WmsRequestBuilder::new(capabilities, config).get_feature_info_url(request)?;
        let (content_type, body) = fetch_bytes(self.fetcher.as_ref(), &url, cancel).await?;
        Ok(FeatureInfoResponse {
            url: url.to_string(),
            content_type,
            body,
        })
    }

    pub async fn get_legend(
        &self,
        legend: &LegendUrl,
        cancel: &CancellationToken,
    ) -> OgcResult<MapImage> {
        self.fetch_image(parse_url(&legend.url)?, cancel).await
    }

    async fn fetch_image(&self, url: Url, cancel: &CancellationToken) -> OgcResult<MapImage> {
        let (content_type, bytes) = fetch_bytes(self.fetcher.as_ref(), &url, cancel).await?;
        Ok(MapImage {
            url: url.to_string(),
            content_type,
            bytes,
        })
    }
}
