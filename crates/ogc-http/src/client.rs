//! `reqwest`-backed [`HttpFetcher`].

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Proxy, RequestBuilder};
use tracing::{debug, instrument};
use url::Url;

use ogc_common::{OgcError, OgcResult};

use crate::config::HttpConfig;
use crate::fetcher::{HttpFetcher, HttpResponse};

/// HTTP fetcher honoring the proxy, credentials and timeouts of an [`HttpConfig`].
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    credentials: Option<(String, Option<String>)>,
}

impl ReqwestFetcher {
    pub fn new(config: &HttpConfig) -> OgcResult<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .tcp_nodelay(true);

        if let Some(proxy) = &config.proxy {
            let proxy = Proxy::all(proxy.as_str()).map_err(|e| {
                OgcError::Configuration(format!("Invalid proxy '{}': {}", proxy, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| OgcError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let credentials = config
            .username
            .clone()
            .map(|user| (user, config.password.clone()));

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Wrap an existing client; no credentials are attached.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            credentials: None,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, password.as_ref()),
            None => request,
        }
    }

    async fn send(&self, url: &Url, request: RequestBuilder) -> OgcResult<HttpResponse> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| transport_error(url, e))?;

        debug!(url = %url, status, size = body.len(), "HTTP response received");
        Ok(HttpResponse {
            url: url.to_string(),
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn get(&self, url: &Url) -> OgcResult<HttpResponse> {
        self.send(url, self.client.get(url.clone())).await
    }

    #[instrument(skip(self, body), fields(url = %url, size = body.len()))]
    async fn post(&self, url: &Url, body: String, content_type: &str) -> OgcResult<HttpResponse> {
        let request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body);
        self.send(url, request).await
    }
}

fn transport_error(url: &Url, err: reqwest::Error) -> OgcError {
    let message = if err.is_timeout() {
        format!("timed out: {}", err)
    } else {
        err.to_string()
    };
    OgcError::Transport {
        url: url.to_string(),
        message,
    }
}
