//! XML document model and query support for OGC service documents.
//!
//! Documents are parsed fully in memory into an immutable element tree.
//! Queries use a compact XPath subset:
//! - absolute (`/wms:WMS_Capabilities/wms:Service`) and relative steps
//! - descendant steps (`//xs:element`) and wildcards (`*`)
//! - attribute steps (`@name`, `@xlink:href`)
//! - predicates `[@a]`, `[@a='v']`, `[child='v']`, `[starts-with(@a,'v')]`,
//!   `[not(@a)]`

pub mod capabilities;
pub mod document;
pub mod exception;
pub mod namespaces;
pub mod path;

pub use capabilities::CapabilitiesDocument;
pub use document::{XmlAttribute, XmlDocument, XmlElement};
pub use exception::exception_report;
pub use namespaces::NamespaceTable;
pub use path::{NodePath, Selection};

/// GML namespace shared by GML 2 and GML 3.
pub const GML_NAMESPACE: &str = "http://www.opengis.net/gml";
/// XML Schema namespace.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
/// OWS 1.0 namespace (WFS 1.1.0 capabilities).
pub const OWS_NAMESPACE: &str = "http://www.opengis.net/ows";
/// WFS namespace.
pub const WFS_NAMESPACE: &str = "http://www.opengis.net/wfs";
/// OGC filter namespace.
pub const OGC_NAMESPACE: &str = "http://www.opengis.net/ogc";
