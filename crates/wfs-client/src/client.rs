//! Async WFS client: metadata resolution plus GetFeature dispatch.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use ogc_common::crs::AxisOrderRegistry;
use ogc_common::{BoundingBox, OgcResult};
use ogc_http::HttpFetcher;
use ogc_xml::CapabilitiesDocument;

use crate::dispatch::{FeatureStream, GeometryDispatch};
use crate::feature_type::{FeatureTypeRequest, WfsFeatureTypeInfo};
use crate::request::GetFeatureQuery;
use crate::resolver::WfsMetadataResolver;

pub struct WfsClient {
    resolver: WfsMetadataResolver,
    dispatch: GeometryDispatch,
}

impl WfsClient {
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            resolver: WfsMetadataResolver::new(fetcher),
            dispatch: GeometryDispatch::new(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn AxisOrderRegistry>) -> Self {
        self.resolver = WfsMetadataResolver::with_registry(self.resolver.fetcher().clone(), registry);
        self
    }

    pub fn with_dispatch(mut self, dispatch: GeometryDispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn resolver(&self) -> &WfsMetadataResolver {
        &self.resolver
    }

    pub fn dispatch(&self) -> &GeometryDispatch {
        &self.dispatch
    }

    pub async fn fetch_capabilities(
        &self,
        request: &FeatureTypeRequest,
        cancel: &CancellationToken,
    ) -> OgcResult<CapabilitiesDocument> {
        self.resolver.fetch_capabilities(request, cancel).await
    }

    /// Resolve feature type metadata, reusing `shared` capabilities if given.
    pub async fn describe(
        &self,
        request: &FeatureTypeRequest,
        shared: Option<&CapabilitiesDocument>,
        cancel: &CancellationToken,
    ) -> OgcResult<WfsFeatureTypeInfo> {
        self.resolver.resolve(request, shared, cancel).await
    }

    /// Features intersecting `bbox`, with the request's filter and limit.
    pub async fn get_features(
        &self,
        info: &WfsFeatureTypeInfo,
        request: &FeatureTypeRequest,
        bbox: Option<BoundingBox>,
        cancel: &CancellationToken,
    ) -> OgcResult<FeatureStream> {
        let mut query = GetFeatureQuery::from(request);
        query.bbox = bbox;
        self.dispatch
            .fetch_features(self.resolver.fetcher().as_ref(), info, request, &query, cancel)
            .await
    }
}
