//! In-process fetcher serving canned responses.
//!
//! Used for offline replay of captured service responses and in tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use ogc_common::{query, OgcError, OgcResult};

use crate::fetcher::{HttpFetcher, HttpResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request seen by a [`StaticFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<String>,
}

type Matcher = Box<dyn Fn(&RecordedRequest) -> bool + Send + Sync>;

struct Route {
    matcher: Matcher,
    status: u16,
    content_type: String,
    body: Bytes,
}

/// Serves the first matching canned response; unmatched requests get a 404.
#[derive(Default)]
pub struct StaticFetcher {
    routes: Vec<Route>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests accepted by `matcher`.
    pub fn route<M>(
        mut self,
        matcher: M,
        status: u16,
        content_type: &str,
        body: impl Into<Bytes>,
    ) -> Self
    where
        M: Fn(&RecordedRequest) -> bool + Send + Sync + 'static,
    {
        self.routes.push(Route {
            matcher: Box::new(matcher),
            status,
            content_type: content_type.to_string(),
            body: body.into(),
        });
        self
    }

    /// Answer GET requests whose `REQUEST` parameter equals `request` (any case).
    pub fn on_get(self, request: &str, xml: impl Into<String>) -> Self {
        let xml: String = xml.into();
        let request = request.to_string();
        self.route(
            move |r| {
                r.method == Method::Get
                    && query::query_param(&r.url, "REQUEST")
                        .map(|v| v.eq_ignore_ascii_case(&request))
                        .unwrap_or(false)
            },
            200,
            "text/xml",
            Bytes::from(xml),
        )
    }

    /// Answer POST requests whose body contains `needle`.
    pub fn on_post(self, needle: &str, xml: impl Into<String>) -> Self {
        let xml: String = xml.into();
        let needle = needle.to_string();
        self.route(
            move |r| {
                r.method == Method::Post
                    && r.body.as_deref().map(|b| b.contains(&needle)).unwrap_or(false)
            },
            200,
            "text/xml",
            Bytes::from(xml),
        )
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn respond(&self, request: RecordedRequest) -> OgcResult<HttpResponse> {
        let response = match self.routes.iter().find(|route| (route.matcher)(&request)) {
            Some(route) => HttpResponse {
                url: request.url.to_string(),
                status: route.status,
                content_type: Some(route.content_type.clone()),
                body: route.body.clone(),
            },
            None => HttpResponse {
                url: request.url.to_string(),
                status: 404,
                content_type: None,
                body: Bytes::new(),
            },
        };

        self.requests
            .lock()
            .map_err(|_| OgcError::Transport {
                url: request.url.to_string(),
                message: "request log poisoned".to_string(),
            })?
            .push(request);
        Ok(response)
    }
}

#[async_trait]
impl HttpFetcher for StaticFetcher {
    async fn get(&self, url: &Url) -> OgcResult<HttpResponse> {
        self.respond(RecordedRequest {
            method: Method::Get,
            url: url.clone(),
            body: None,
        })
    }

    async fn post(&self, url: &Url, body: String, _content_type: &str) -> OgcResult<HttpResponse> {
        self.respond(RecordedRequest {
            method: Method::Post,
            url: url.clone(),
            body: Some(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_by_request_parameter() {
        let fetcher = StaticFetcher::new()
            .on_get("GetCapabilities", "<caps/>")
            .on_post("GetFeature", "<features/>");

        let url = Url::parse("http://x/wms?service=WMS&request=getcapabilities").unwrap();
        let response = fetcher.get(&url).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(&response.body[..], b"<caps/>");

        let other = Url::parse("http://x/wms?REQUEST=GetMap").unwrap();
        assert_eq!(fetcher.get(&other).await.unwrap().status, 404);

        let post = fetcher
            .post(&url, "<wfs:GetFeature/>".to_string(), "text/xml")
            .await
            .unwrap();
        assert_eq!(&post.body[..], b"<features/>");
        assert_eq!(fetcher.requests().len(), 3);
        assert_eq!(fetcher.requests()[2].method, Method::Post);
    }
}
