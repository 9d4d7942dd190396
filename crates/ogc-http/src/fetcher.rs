//! The injected HTTP collaborator.

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use ogc_common::{OgcError, OgcResult};

/// Content type used for XML POST bodies.
pub const XML_CONTENT_TYPE: &str = "text/xml";

/// A fully received HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the declared content type is an XML flavour.
    pub fn is_xml(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("xml"))
            .unwrap_or(false)
    }

    /// The body, or an `HttpStatus` error for non-2xx responses.
    pub fn into_body(self) -> OgcResult<Bytes> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(OgcError::HttpStatus {
                url: self.url,
                status: self.status,
            })
        }
    }
}

/// Point-to-point HTTP exchanges.
///
/// Implementations return responses for every status code; transport
/// failures (DNS, connect, timeout) are `OgcError::Transport`. Timeouts,
/// retries and backoff are the implementation's concern.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Issue a GET request.
    async fn get(&self, url: &Url) -> OgcResult<HttpResponse>;

    /// Issue a POST request with the given body and content type.
    async fn post(&self, url: &Url, body: String, content_type: &str) -> OgcResult<HttpResponse>;
}
