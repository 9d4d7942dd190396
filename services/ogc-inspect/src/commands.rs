//! Command implementations shared by the binary and its tests.
//!
//! Every command takes the fetcher explicitly so tests can run against canned
//! responses.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use ogc_common::{BoundingBox, WmsVersion};
use ogc_http::HttpFetcher;
use wfs_client::{FeatureTypeRequest, WfsClient, WfsFeatureTypeInfo};
use wms_client::{MapRequest, WmsClient, WmsMapConfig, WmsRequestBuilder};

use crate::report::{CapabilitiesReport, FeaturesReport};

pub async fn wms_capabilities(
    fetcher: Arc<dyn HttpFetcher>,
    url: &str,
    version: Option<WmsVersion>,
    cancel: &CancellationToken,
) -> Result<CapabilitiesReport> {
    let client = WmsClient::new(fetcher, url);
    let capabilities = client
        .fetch_capabilities(version, cancel)
        .await
        .with_context(|| format!("Failed to load WMS capabilities from {}", url))?;
    Ok(CapabilitiesReport::from_capabilities(&capabilities))
}

/// GetMap URL for `config` against the endpoint advertised by the service.
pub async fn get_map_url(
    fetcher: Arc<dyn HttpFetcher>,
    url: &str,
    config: &WmsMapConfig,
    request: &MapRequest,
    cancel: &CancellationToken,
) -> Result<Url> {
    let client = WmsClient::new(fetcher, url);
    let capabilities = client
        .fetch_capabilities(config.version, cancel)
        .await
        .with_context(|| format!("Failed to load WMS capabilities from {}", url))?;

    for layer in &config.layers {
        capabilities
            .find_layer(layer)
            .with_context(|| format!("Layer '{}' is not advertised by {}", layer, url))?;
    }

    WmsRequestBuilder::new(&capabilities, config)
        .get_map_url(request)
        .context("Failed to build GetMap URL")
}

pub async fn wfs_describe(
    fetcher: Arc<dyn HttpFetcher>,
    request: &FeatureTypeRequest,
    cancel: &CancellationToken,
) -> Result<WfsFeatureTypeInfo> {
    WfsClient::new(fetcher)
        .describe(request, None, cancel)
        .await
        .with_context(|| format!("Failed to describe feature type {}", request.type_name))
}

/// Resolve the feature type, then fetch and decode its features.
///
/// Features that fail to decode are recorded as failures; the rest of the
/// response is still read.
pub async fn wfs_features(
    fetcher: Arc<dyn HttpFetcher>,
    request: &FeatureTypeRequest,
    bbox: Option<BoundingBox>,
    cancel: &CancellationToken,
) -> Result<FeaturesReport> {
    let client = WfsClient::new(fetcher);
    let info = client
        .describe(request, None, cancel)
        .await
        .with_context(|| format!("Failed to describe feature type {}", request.type_name))?;

    let stream = client
        .get_features(&info, request, bbox, cancel)
        .await
        .with_context(|| format!("GetFeature failed for {}", info.type_name))?;

    let mut report = FeaturesReport::new(&info.type_name, stream.decoder());
    for (index, feature) in stream.enumerate() {
        match feature {
            Ok(feature) => report.push(feature),
            Err(e) => {
                warn!(index, error = %e, "Skipping undecodable feature");
                report.push_failure(format!("feature {}: {}", index, e));
            }
        }
    }

    info!(
        feature_type = %info.type_name,
        count = report.count,
        failures = report.failures.len(),
        "Fetched features"
    );
    Ok(report)
}
