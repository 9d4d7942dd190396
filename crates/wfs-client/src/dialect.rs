//! Per-version query templates for WFS documents and requests.
//!
//! Every version-dependent expression, prefix and parameter lives in an
//! exhaustive match on [`WfsVersion`].

use ogc_common::version::XLINK_NAMESPACE;
use ogc_common::{BoundingBox, OgcResult, WfsVersion};
use ogc_xml::{
    CapabilitiesDocument, XmlElement, GML_NAMESPACE, OGC_NAMESPACE, OWS_NAMESPACE, WFS_NAMESPACE,
};

/// WFS operations whose endpoints are advertised in the capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WfsOperation {
    GetCapabilities,
    DescribeFeatureType,
    GetFeature,
}

impl WfsOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WfsOperation::GetCapabilities => "GetCapabilities",
            WfsOperation::DescribeFeatureType => "DescribeFeatureType",
            WfsOperation::GetFeature => "GetFeature",
        }
    }
}

/// Binding method for an operation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Get,
    Post,
}

impl Binding {
    fn element(&self) -> &'static str {
        match self {
            Binding::Get => "Get",
            Binding::Post => "Post",
        }
    }
}

/// Query templates for one WFS version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionDialect {
    version: WfsVersion,
}

impl VersionDialect {
    pub fn new(version: WfsVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> WfsVersion {
        self.version
    }

    /// Prefixes every capabilities query below relies on.
    pub fn namespaces(&self) -> [(&'static str, &'static str); 5] {
        [
            ("wfs", WFS_NAMESPACE),
            ("ows", OWS_NAMESPACE),
            ("ogc", OGC_NAMESPACE),
            ("gml", GML_NAMESPACE),
            ("xlink", XLINK_NAMESPACE),
        ]
    }

    pub fn bind(&self, mut document: CapabilitiesDocument) -> CapabilitiesDocument {
        for (prefix, uri) in self.namespaces() {
            document.bind_namespace(prefix, uri);
        }
        document
    }

    pub fn feature_types_path(&self) -> &'static str {
        "/*/wfs:FeatureTypeList/wfs:FeatureType"
    }

    /// Element holding the feature type CRS, relative to a `FeatureType`.
    pub fn srs_path(&self) -> &'static str {
        match self.version {
            WfsVersion::V1_0_0 => "wfs:SRS",
            WfsVersion::V1_1_0 => "wfs:DefaultSRS",
        }
    }

    /// Endpoint of `operation` for `binding`, as an attribute path.
    pub fn operation_url_path(&self, operation: WfsOperation, binding: Binding) -> String {
        match self.version {
            WfsVersion::V1_0_0 => format!(
                "/*/wfs:Capability/wfs:Request/wfs:{}/wfs:DCPType/wfs:HTTP/wfs:{}/@onlineResource",
                operation.as_str(),
                binding.element()
            ),
            WfsVersion::V1_1_0 => format!(
                "/*/ows:OperationsMetadata/ows:Operation[@name='{}']/ows:DCP/ows:HTTP/ows:{}/@xlink:href",
                operation.as_str(),
                binding.element()
            ),
        }
    }

    /// Geographic extent of a `FeatureType` node.
    ///
    /// A missing or unparseable ordinate reads as `0.0`.
    pub fn bounding_box(
        &self,
        document: &CapabilitiesDocument,
        feature_type: &XmlElement,
    ) -> OgcResult<BoundingBox> {
        match self.version {
            WfsVersion::V1_0_0 => {
                let ordinate = |attr: &str| -> OgcResult<f64> {
                    Ok(document
                        .value_from(feature_type, &format!("wfs:LatLongBoundingBox/@{}", attr))?
                        .as_deref()
                        .and_then(parse_ordinate)
                        .unwrap_or(0.0))
                };
                Ok(BoundingBox::new(
                    ordinate("minx")?,
                    ordinate("miny")?,
                    ordinate("maxx")?,
                    ordinate("maxy")?,
                ))
            }
            WfsVersion::V1_1_0 => {
                let corner = |name: &str| -> OgcResult<(f64, f64)> {
                    let text = document
                        .value_from(feature_type, &format!("ows:WGS84BoundingBox/ows:{}", name))?
                        .unwrap_or_default();
                    let mut parts = text.split_whitespace();
                    let first = parts.next().and_then(parse_ordinate).unwrap_or(0.0);
                    let second = parts.next().and_then(parse_ordinate).unwrap_or(0.0);
                    Ok((first, second))
                };
                let (min_x, min_y) = corner("LowerCorner")?;
                let (max_x, max_y) = corner("UpperCorner")?;
                Ok(BoundingBox::new(min_x, min_y, max_x, max_y))
            }
        }
    }

    /// CRS identifier sent with requests for an EPSG code.
    ///
    /// 1.1.0 servers honour EPSG axis order only for the URN form.
    pub fn srs_name(&self, srid: &str) -> String {
        match self.version {
            WfsVersion::V1_0_0 => format!("EPSG:{}", srid),
            WfsVersion::V1_1_0 => format!("urn:ogc:def:crs:EPSG::{}", srid),
        }
    }

    /// Value of the `OUTPUTFORMAT` parameter matching the decoders.
    pub fn output_format(&self) -> &'static str {
        match self.version {
            WfsVersion::V1_0_0 => "GML2",
            WfsVersion::V1_1_0 => "text/xml; subtype=gml/3.1.1",
        }
    }

    /// Name of the feature-limit parameter.
    pub fn max_features_parameter(&self) -> &'static str {
        "MAXFEATURES"
    }

    /// Name of the output CRS parameter, if the version supports one.
    pub fn srs_name_parameter(&self) -> Option<&'static str> {
        match self.version {
            WfsVersion::V1_0_0 => None,
            WfsVersion::V1_1_0 => Some("SRSNAME"),
        }
    }

    /// GML envelope element used in BBOX filters.
    pub fn envelope_element(&self) -> &'static str {
        match self.version {
            WfsVersion::V1_0_0 => "gml:Box",
            WfsVersion::V1_1_0 => "gml:Envelope",
        }
    }

    /// Whether the version defaults to GML3 coordinate encoding.
    pub fn uses_gml3(&self) -> bool {
        match self.version {
            WfsVersion::V1_0_0 => false,
            WfsVersion::V1_1_0 => true,
        }
    }
}

fn parse_ordinate(value: &str) -> Option<f64> {
    value.trim().parse().ok()
}
