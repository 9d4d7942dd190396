//! Fetcher wrapper that serves GET requests from a [`ResponseCache`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use ogc_common::OgcResult;

use crate::cache::ResponseCache;
use crate::fetcher::{HttpFetcher, HttpResponse};

/// Caches successful GET bodies by URL. POST requests always go to the network.
pub struct CachingFetcher {
    inner: Arc<dyn HttpFetcher>,
    cache: Arc<dyn ResponseCache>,
}

impl CachingFetcher {
    pub fn new(inner: Arc<dyn HttpFetcher>, cache: Arc<dyn ResponseCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<dyn ResponseCache> {
        &self.cache
    }
}

#[async_trait]
impl HttpFetcher for CachingFetcher {
    async fn get(&self, url: &Url) -> OgcResult<HttpResponse> {
        let key = url.as_str();
        if let Some(body) = self.cache.get(key).await {
            debug!(url = %url, "Response cache hit");
            return Ok(HttpResponse {
                url: key.to_string(),
                status: 200,
                content_type: None,
                body,
            });
        }

        debug!(url = %url, "Response cache miss");
        let response = self.inner.get(url).await?;
        if response.is_success() {
            self.cache.put(key, response.body.clone()).await;
        }
        Ok(response)
    }

    async fn post(&self, url: &Url, body: String, content_type: &str) -> OgcResult<HttpResponse> {
        self.inner.post(url, body, content_type).await
    }
}
