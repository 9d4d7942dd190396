//! HTTP collaborator for the OGC clients.
//!
//! - [`HttpFetcher`]: the injected GET/POST capability
//! - [`ReqwestFetcher`]: production implementation configured by [`HttpConfig`]
//! - [`ResponseCache`] / [`MemoryResponseCache`] / [`CachingFetcher`]: URL-keyed body cache
//! - [`fetch_xml`] / [`post_xml`]: cancellable XML exchanges that surface
//!   OGC exception reports as errors

use std::sync::Arc;

use ogc_common::OgcResult;

pub mod cache;
pub mod caching;
pub mod client;
pub mod config;
pub mod fetcher;
pub mod stub;
pub mod xml;

pub use cache::{CacheStats, MemoryResponseCache, ResponseCache};
pub use caching::CachingFetcher;
pub use client::ReqwestFetcher;
pub use config::HttpConfig;
pub use fetcher::{HttpFetcher, HttpResponse, XML_CONTENT_TYPE};
pub use stub::StaticFetcher;
pub use tokio_util::sync::CancellationToken;
pub use xml::{cancellable, decode_xml, fetch_bytes, fetch_xml, post_xml};

/// Build the default fetcher for a configuration.
///
/// The reqwest client is wrapped in a [`CachingFetcher`] unless caching is
/// disabled (`cache_capacity_bytes: 0`).
pub fn build_fetcher(config: &HttpConfig) -> OgcResult<Arc<dyn HttpFetcher>> {
    let client: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new(config)?);
    if !config.cache_enabled() {
        return Ok(client);
    }

    tracing::info!(
        max_bytes = config.cache_capacity_bytes,
        ttl_secs = config.cache_ttl_secs,
        "Response cache enabled"
    );
    let cache = Arc::new(MemoryResponseCache::new(
        config.cache_capacity_bytes,
        config.cache_ttl(),
    ));
    Ok(Arc::new(CachingFetcher::new(client, cache)))
}
