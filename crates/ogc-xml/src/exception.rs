//! Detection of OGC exception reports returned in place of a response.
//!
//! Servers answer failed requests with HTTP 200 and an XML report:
//! - WMS / WFS 1.0.0: `ServiceExceptionReport/ServiceException[@code]`
//! - OWS (WFS 1.1.0): `ExceptionReport/Exception[@exceptionCode]/ExceptionText`
//!
//! Matching is by local name only; report namespaces vary between servers.

use ogc_common::OgcError;

use crate::document::{XmlDocument, XmlElement};

/// Convert an exception report into [`OgcError::ServiceException`].
///
/// Returns `None` when the document is not an exception report.
pub fn exception_report(document: &XmlDocument) -> Option<OgcError> {
    let root = document.root();
    match root.local_name() {
        "ServiceExceptionReport" => Some(first_exception(root, "ServiceException", |e| {
            (e.attribute("code"), e.text().to_string())
        })),
        "ExceptionReport" => Some(first_exception(root, "Exception", |e| {
            let message = e
                .children()
                .iter()
                .filter(|c| c.local_name() == "ExceptionText")
                .map(XmlElement::text)
                .collect::<Vec<_>>()
                .join("; ");
            (e.attribute("exceptionCode"), message)
        })),
        _ => None,
    }
}

fn first_exception<'a, F>(root: &'a XmlElement, name: &str, read: F) -> OgcError
where
    F: Fn(&'a XmlElement) -> (Option<&'a str>, String),
{
    match root.child_by_local_name(name) {
        Some(exception) => {
            let (code, message) = read(exception);
            OgcError::ServiceException {
                code: code.map(str::to_string),
                message,
            }
        }
        None => OgcError::ServiceException {
            code: None,
            message: "empty exception report".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wms_service_exception() {
        let doc = XmlDocument::parse_str(
            r#"<ServiceExceptionReport version="1.3.0" xmlns="http://www.opengis.net/ogc">
  <ServiceException code="LayerNotDefined">Unknown layer: foo</ServiceException>
</ServiceExceptionReport>"#,
        )
        .unwrap();
        match exception_report(&doc) {
            Some(OgcError::ServiceException { code, message }) => {
                assert_eq!(code.as_deref(), Some("LayerNotDefined"));
                assert_eq!(message, "Unknown layer: foo");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ows_exception_report() {
        let doc = XmlDocument::parse_str(
            r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows" version="1.0.0">
  <ows:Exception exceptionCode="InvalidParameterValue" locator="typeName">
    <ows:ExceptionText>Feature type topp:nope unknown</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#,
        )
        .unwrap();
        let err = exception_report(&doc).unwrap();
        assert_eq!(
            err.to_string(),
            "Service exception [InvalidParameterValue]: Feature type topp:nope unknown"
        );
    }

    #[test]
    fn test_regular_document_is_not_a_report() {
        let doc = XmlDocument::parse_str("<WMS_Capabilities version=\"1.3.0\"/>").unwrap();
        assert!(exception_report(&doc).is_none());
    }
}
