//! Error types for the OGC client crates.

use thiserror::Error;

/// Result type alias using OgcError.
pub type OgcResult<T> = Result<T, OgcError>;

/// Coarse classification of an [`OgcError`].
///
/// Callers that implement "continue on error" policies match on the kind
/// rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network or HTTP failure, or an exception report returned by the server.
    Transport,
    /// Unsupported or missing protocol version.
    ProtocolVersion,
    /// A required element is absent from a document.
    SchemaViolation,
    /// A coordinate or numeric value could not be parsed.
    MalformedValue,
    /// The caller supplied an unusable configuration.
    Configuration,
    /// The operation was aborted through its cancellation token.
    Cancelled,
}

/// Primary error type for WMS/WFS client operations.
#[derive(Debug, Error)]
pub enum OgcError {
    // === Transport Errors ===
    #[error("HTTP request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Service exception{}: {message}", format_code(.code))]
    ServiceException {
        code: Option<String>,
        message: String,
    },

    // === Protocol Version Errors ===
    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    #[error("Document does not declare a protocol version")]
    MissingVersion,

    // === Schema Violations ===
    #[error("Required element missing: {which}")]
    MissingElement { which: String },

    #[error("XML error: {0}")]
    Xml(String),

    // === Malformed Values ===
    #[error("Malformed bounding box in layer '{layer}'")]
    MalformedBoundingBox { layer: String },

    #[error("Invalid LatLonBoundingBox for layer '{layer}'")]
    InvalidLatLonBoundingBox { layer: String },

    #[error("Malformed {what}: '{value}'")]
    MalformedValue { what: String, value: String },

    // === Configuration Errors ===
    #[error("No CRS configured")]
    NoCrsConfigured,

    #[error("Invalid axis order {0:?}: expected [0, 1] or [1, 0]")]
    InvalidAxisOrder(Vec<usize>),

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Operation cancelled")]
    Cancelled,
}

fn format_code(code: &Option<String>) -> String {
    code.as_deref()
        .map(|c| format!(" [{}]", c))
        .unwrap_or_default()
}

impl OgcError {
    /// Shorthand for a missing-element error.
    pub fn missing(which: impl Into<String>) -> Self {
        OgcError::MissingElement {
            which: which.into(),
        }
    }

    /// Shorthand for a malformed-value error.
    pub fn malformed(what: impl Into<String>, value: impl Into<String>) -> Self {
        OgcError::MalformedValue {
            what: what.into(),
            value: value.into(),
        }
    }

    /// Get the taxonomy kind for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OgcError::Transport { .. }
            | OgcError::HttpStatus { .. }
            | OgcError::ServiceException { .. } => ErrorKind::Transport,

            OgcError::UnsupportedVersion(_) | OgcError::MissingVersion => {
                ErrorKind::ProtocolVersion
            }

            OgcError::MissingElement { .. } | OgcError::Xml(_) => ErrorKind::SchemaViolation,

            OgcError::MalformedBoundingBox { .. }
            | OgcError::InvalidLatLonBoundingBox { .. }
            | OgcError::MalformedValue { .. } => ErrorKind::MalformedValue,

            OgcError::NoCrsConfigured
            | OgcError::InvalidAxisOrder(_)
            | OgcError::InvalidUrl { .. }
            | OgcError::LayerNotFound(_)
            | OgcError::Configuration(_) => ErrorKind::Configuration,

            OgcError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// True for failures of a data request that a caller may skip and report.
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

impl From<url::ParseError> for OgcError {
    fn from(err: url::ParseError) -> Self {
        OgcError::InvalidUrl {
            url: String::new(),
            message: err.to_string(),
        }
    }
}

impl From<quick_xml::Error> for OgcError {
    fn from(err: quick_xml::Error) -> Self {
        OgcError::Xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            OgcError::UnsupportedVersion("2.0.0".into()).kind(),
            ErrorKind::ProtocolVersion
        );
        assert_eq!(OgcError::missing("Capability").kind(), ErrorKind::SchemaViolation);
        assert_eq!(
            OgcError::MalformedBoundingBox {
                layer: "roads".into()
            }
            .kind(),
            ErrorKind::MalformedValue
        );
        assert_eq!(OgcError::NoCrsConfigured.kind(), ErrorKind::Configuration);
        assert!(OgcError::HttpStatus {
            url: "http://x".into(),
            status: 500
        }
        .is_transport());
    }

    #[test]
    fn test_service_exception_display() {
        let err = OgcError::ServiceException {
            code: Some("LayerNotDefined".into()),
            message: "unknown layer".into(),
        };
        assert_eq!(
            err.to_string(),
            "Service exception [LayerNotDefined]: unknown layer"
        );

        let err = OgcError::ServiceException {
            code: None,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "Service exception: boom");
    }
}
