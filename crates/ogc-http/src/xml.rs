//! XML request helpers with cancellation and exception-report detection.

use std::future::Future;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use ogc_common::{OgcError, OgcResult};
use ogc_xml::{exception_report, XmlDocument};

use crate::fetcher::{HttpFetcher, HttpResponse, XML_CONTENT_TYPE};

/// Await `future` unless `cancel` fires first.
pub async fn cancellable<T, F>(cancel: &CancellationToken, future: F) -> OgcResult<T>
where
    F: Future<Output = OgcResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OgcError::Cancelled),
        result = future => result,
    }
}

/// GET `url` and parse the body as XML.
pub async fn fetch_xml(
    fetcher: &dyn HttpFetcher,
    url: &Url,
    cancel: &CancellationToken,
) -> OgcResult<XmlDocument> {
    let response = cancellable(cancel, fetcher.get(url)).await?;
    decode_xml(response)
}

/// POST an XML body to `url` and parse the response as XML.
pub async fn post_xml(
    fetcher: &dyn HttpFetcher,
    url: &Url,
    body: String,
    cancel: &CancellationToken,
) -> OgcResult<XmlDocument> {
    let response = cancellable(cancel, fetcher.post(url, body, XML_CONTENT_TYPE)).await?;
    decode_xml(response)
}

/// GET `url` expecting a binary payload such as a map image.
///
/// An XML body in place of the payload is checked for an exception report,
/// whatever content type the server labelled it with.
pub async fn fetch_bytes(
    fetcher: &dyn HttpFetcher,
    url: &Url,
    cancel: &CancellationToken,
) -> OgcResult<(Option<String>, Bytes)> {
    let response = cancellable(cancel, fetcher.get(url)).await?;
    if response.is_xml() || !response.is_success() || looks_like_xml(&response.body) {
        if let Some(err) = parse_exception(&response.body) {
            warn!(url = %url, error = %err, "Server returned an exception report");
            return Err(err);
        }
    }
    let content_type = response.content_type.clone();
    Ok((content_type, response.into_body()?))
}

/// Parse a response body, surfacing exception reports and HTTP errors.
pub fn decode_xml(response: HttpResponse) -> OgcResult<XmlDocument> {
    if !response.is_success() {
        if let Some(err) = parse_exception(&response.body) {
            return Err(err);
        }
        return Err(OgcError::HttpStatus {
            url: response.url,
            status: response.status,
        });
    }

    let document = XmlDocument::parse(&response.body)?;
    if let Some(err) = exception_report(&document) {
        warn!(url = %response.url, error = %err, "Server returned an exception report");
        return Err(err);
    }
    debug!(url = %response.url, root = document.root().local_name(), "Parsed XML response");
    Ok(document)
}

/// First significant byte is `<`, after an optional UTF-8 BOM.
fn looks_like_xml(body: &[u8]) -> bool {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'<')
}

fn parse_exception(body: &[u8]) -> Option<OgcError> {
    XmlDocument::parse(body)
        .ok()
        .and_then(|document| exception_report(&document))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            url: "http://example.com/wms".to_string(),
            status,
            content_type: Some("text/xml".to_string()),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_decode_success() {
        let doc = decode_xml(response(200, test_utils::wms::WORLD_130)).unwrap();
        assert_eq!(doc.root().local_name(), "WMS_Capabilities");
    }

    #[test]
    fn test_decode_exception_report_with_200() {
        let err = decode_xml(response(200, test_utils::wms::EXCEPTION_REPORT)).unwrap_err();
        assert!(matches!(err, OgcError::ServiceException { .. }));
        assert!(err.is_transport());
    }

    #[test]
    fn test_decode_http_error() {
        let err = decode_xml(response(503, "Service Unavailable")).unwrap_err();
        assert!(matches!(err, OgcError::HttpStatus { status: 503, .. }));
    }

    #[test]
    fn test_decode_malformed_xml() {
        let err = decode_xml(response(200, "<a><b></a>")).unwrap_err();
        assert_eq!(err.kind(), ogc_common::ErrorKind::SchemaViolation);
    }

    #[test]
    fn test_looks_like_xml() {
        assert!(looks_like_xml(b"<ServiceExceptionReport/>"));
        assert!(looks_like_xml(b"\xEF\xBB\xBF\r\n  <?xml version=\"1.0\"?><a/>"));
        assert!(!looks_like_xml(b"\x89PNG\r\n\x1a\n"));
        assert!(!looks_like_xml(b"GIF89a"));
        assert!(!looks_like_xml(b"   "));
    }

    #[tokio::test]
    async fn test_cancellable_aborts() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: OgcResult<()> = cancellable(&cancel, std::future::pending()).await;
        assert!(matches!(result, Err(OgcError::Cancelled)));
    }

    #[test]
    fn test_cancellable_wakes_on_cancel() {
        let cancel = CancellationToken::new();
        let mut task = tokio_test::task::spawn(cancellable(
            &cancel,
            std::future::pending::<OgcResult<()>>(),
        ));
        tokio_test::assert_pending!(task.poll());

        cancel.cancel();
        assert!(task.is_woken());
        let result = tokio_test::assert_ready!(task.poll());
        assert!(matches!(result, Err(OgcError::Cancelled)));
    }
}
