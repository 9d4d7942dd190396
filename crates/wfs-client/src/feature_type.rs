//! Feature type configuration and resolved metadata.

use serde::{Deserialize, Serialize};

use ogc_common::{AxisOrder, BoundingBox, OgcResult, WfsVersion};

use crate::dialect::VersionDialect;
use crate::filter::Filter;

/// SRID used when neither the caller nor the capabilities provide one.
pub const DEFAULT_SRID: &str = "4326";

/// Geometry element name used when the schema declares none.
pub const DEFAULT_GEOMETRY_NAME: &str = "geom";

/// What the caller wants from one feature type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTypeRequest {
    /// GetCapabilities endpoint of the service.
    pub service_url: String,
    pub version: WfsVersion,
    /// Feature type name, with or without its namespace prefix.
    pub type_name: String,
    pub namespace_prefix: Option<String>,
    pub namespace_uri: Option<String>,
    /// Replaces the SRID advertised by the service.
    pub srid_override: Option<String>,
    pub axis_order: Option<AxisOrder>,
    /// Properties concatenated into each feature's label.
    pub label_fields: Vec<String>,
    pub multi_geometries: bool,
    pub quick_geometries: bool,
    /// Send GetFeature as an XML POST instead of a KVP GET.
    pub use_post: bool,
    pub filter: Option<Filter>,
    pub max_features: Option<u32>,
}

impl FeatureTypeRequest {
    pub fn new(service_url: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            version: WfsVersion::default(),
            type_name: type_name.into(),
            namespace_prefix: None,
            namespace_uri: None,
            srid_override: None,
            axis_order: None,
            label_fields: Vec::new(),
            multi_geometries: true,
            quick_geometries: false,
            use_post: false,
            filter: None,
            max_features: None,
        }
    }

    pub fn version(mut self, version: WfsVersion) -> Self {
        self.version = version;
        self
    }

    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespace_prefix = Some(prefix.into());
        self.namespace_uri = Some(uri.into());
        self
    }

    pub fn srid(mut self, srid: impl Into<String>) -> Self {
        self.srid_override = Some(srid.into());
        self
    }

    /// Set the axis order from a permutation array such as `[1, 0]`.
    pub fn axis_order(mut self, order: &[usize]) -> OgcResult<Self> {
        self.axis_order = Some(AxisOrder::from_slice(order)?);
        Ok(self)
    }

    pub fn label_field(mut self, field: impl Into<String>) -> Self {
        self.label_fields.push(field.into());
        self
    }

    pub fn multi_geometries(mut self, allowed: bool) -> Self {
        self.multi_geometries = allowed;
        self
    }

    pub fn quick_geometries(mut self, quick: bool) -> Self {
        self.quick_geometries = quick;
        self
    }

    pub fn use_post(mut self, post: bool) -> Self {
        self.use_post = post;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn max_features(mut self, count: u32) -> Self {
        self.max_features = Some(count);
        self
    }

    /// Quick mode is off whenever labels are requested.
    pub fn effective_quick_geometries(&self) -> bool {
        self.quick_geometries && self.label_fields.is_empty()
    }

    /// Name without its namespace prefix.
    pub fn local_type_name(&self) -> &str {
        local_part(&self.type_name)
    }
}

/// Name and declared type of a schema element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub name: String,
    /// Declared type, `gml:` prefix normalized; empty when unknown.
    pub type_name: String,
}

/// Metadata resolved for one feature type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WfsFeatureTypeInfo {
    pub version: WfsVersion,
    pub capabilities_url: String,
    pub get_feature_url: String,
    pub get_feature_post_url: Option<String>,
    pub describe_url: String,
    pub namespace_prefix: Option<String>,
    pub namespace_uri: Option<String>,
    /// Qualified name as advertised, e.g. `topp:states`.
    pub type_name: String,
    pub title: Option<String>,
    /// EPSG code as text, e.g. `4326`.
    pub srid: String,
    /// Geographic extent in lon/lat.
    pub bounding_box: BoundingBox,
    pub geometry: ElementDescriptor,
    pub properties: Vec<ElementDescriptor>,
    pub label_fields: Vec<String>,
    pub axis_order: AxisOrder,
}

impl WfsFeatureTypeInfo {
    /// CRS identifier as sent in requests.
    pub fn srs_name(&self) -> String {
        VersionDialect::new(self.version).srs_name(&self.srid)
    }

    pub fn dialect(&self) -> VersionDialect {
        VersionDialect::new(self.version)
    }

    pub fn local_type_name(&self) -> &str {
        local_part(&self.type_name)
    }

    /// Whether a geometry element was found in the schema.
    pub fn has_declared_geometry(&self) -> bool {
        !self.geometry.type_name.is_empty()
    }
}

pub(crate) fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

pub(crate) fn prefix_part(name: &str) -> Option<&str> {
    name.split_once(':').map(|(prefix, _)| prefix)
}
