//! Two-phase metadata resolution for one WFS feature type.
//!
//! Phase one reads the capabilities document: endpoints, SRID and the
//! geographic extent. Phase two reads the DescribeFeatureType schema in a
//! separate query context: target namespace, geometry element and the
//! remaining properties. The geometry element is looked up in three tiers:
//!
//! 1. an element of the feature's named complex type typed `gml:*`
//! 2. an element of that type declared by `ref="gml:*Property"`
//! 3. the same two lookups on an anonymous complex type nested in the
//!    feature element
//!
//! When nothing matches, the geometry is named `geom` with an empty type and
//! the decoder sniffs the geometry from the response.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use ogc_common::crs::{epsg_code, is_crs84, AxisOrderRegistry, EpsgAxisOrderRegistry};
use ogc_common::query::strip_trailing_question_mark;
use ogc_common::{AxisOrder, OgcError, OgcResult, WfsVersion};
use ogc_http::{fetch_xml, HttpFetcher};
use ogc_xml::{CapabilitiesDocument, XmlDocument, XmlElement, GML_NAMESPACE, XSD_NAMESPACE};

use crate::dialect::{Binding, VersionDialect, WfsOperation};
use crate::feature_type::{
    local_part, prefix_part, ElementDescriptor, FeatureTypeRequest, WfsFeatureTypeInfo,
    DEFAULT_GEOMETRY_NAME, DEFAULT_SRID,
};
use crate::request::{capabilities_url, describe_feature_type_url};

/// `gml:*Property` element references and the property type they carry.
const GML_PROPERTY_TYPES: &[(&str, &str)] = &[
    ("pointProperty", "PointPropertyType"),
    ("location", "PointPropertyType"),
    ("centerOf", "PointPropertyType"),
    ("position", "PointPropertyType"),
    ("lineStringProperty", "LineStringPropertyType"),
    ("centerLineOf", "LineStringPropertyType"),
    ("edgeOf", "LineStringPropertyType"),
    ("curveProperty", "CurvePropertyType"),
    ("polygonProperty", "PolygonPropertyType"),
    ("extentOf", "PolygonPropertyType"),
    ("coverage", "PolygonPropertyType"),
    ("surfaceProperty", "SurfacePropertyType"),
    ("multiPointProperty", "MultiPointPropertyType"),
    ("multiLocation", "MultiPointPropertyType"),
    ("multiCenterOf", "MultiPointPropertyType"),
    ("multiPosition", "MultiPointPropertyType"),
    ("multiLineStringProperty", "MultiLineStringPropertyType"),
    ("multiCenterLineOf", "MultiLineStringPropertyType"),
    ("multiEdgeOf", "MultiLineStringPropertyType"),
    ("multiCurveProperty", "MultiCurvePropertyType"),
    ("multiPolygonProperty", "MultiPolygonPropertyType"),
    ("multiExtentOf", "MultiPolygonPropertyType"),
    ("multiCoverage", "MultiPolygonPropertyType"),
    ("multiSurfaceProperty", "MultiSurfacePropertyType"),
    ("multiGeometryProperty", "MultiGeometryPropertyType"),
    ("geometryProperty", "GeometryPropertyType"),
];

/// Resolves [`WfsFeatureTypeInfo`] over an injected fetcher.
pub struct WfsMetadataResolver {
    fetcher: Arc<dyn HttpFetcher>,
    registry: Arc<dyn AxisOrderRegistry>,
}

impl WfsMetadataResolver {
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self::with_registry(fetcher, Arc::new(EpsgAxisOrderRegistry::new()))
    }

    pub fn with_registry(
        fetcher: Arc<dyn HttpFetcher>,
        registry: Arc<dyn AxisOrderRegistry>,
    ) -> Self {
        Self { fetcher, registry }
    }

    pub fn fetcher(&self) -> &Arc<dyn HttpFetcher> {
        &self.fetcher
    }

    /// Fetch the capabilities document for a request's service.
    ///
    /// The result can be passed to [`resolve`](Self::resolve) for every
    /// feature type of the same service.
    #[instrument(skip(self, cancel), fields(url = %request.service_url))]
    pub async fn fetch_capabilities(
        &self,
        request: &FeatureTypeRequest,
        cancel: &CancellationToken,
    ) -> OgcResult<CapabilitiesDocument> {
        let url = capabilities_url(&request.service_url, request.version)?;
        let document = fetch_xml(self.fetcher.as_ref(), &url, cancel).await?;
        Ok(CapabilitiesDocument::new(document))
    }

    /// Run both phases and the axis-order lookup.
    ///
    /// `shared` is a capabilities document fetched earlier for the same
    /// service; it is queried through its own context and never modified.
    #[instrument(skip(self, shared, cancel), fields(type_name = %request.type_name))]
    pub async fn resolve(
        &self,
        request: &FeatureTypeRequest,
        shared: Option<&CapabilitiesDocument>,
        cancel: &CancellationToken,
    ) -> OgcResult<WfsFeatureTypeInfo> {
        let capabilities = match shared {
            Some(document) => {
                debug!("Reusing shared capabilities document");
                document.clone()
            }
            None => self.fetch_capabilities(request, cancel).await?,
        };

        let (mut info, capabilities) = resolve_capabilities(request, &capabilities)?;

        let describe_url = describe_feature_type_url(&info)?;
        let schema = fetch_xml(self.fetcher.as_ref(), &describe_url, cancel).await?;
        resolve_schema(&mut info, request, &capabilities, schema)?;

        info.axis_order = resolve_axis_order(
            request.axis_order,
            info.version,
            &info.srid,
            self.registry.as_ref(),
        )?;

        info!(
            type_name = %info.type_name,
            srid = %info.srid,
            geometry = %info.geometry.name,
            geometry_type = %info.geometry.type_name,
            axis_order = %info.axis_order,
            "Resolved WFS feature type"
        );
        Ok(info)
    }
}

/// Phase one: endpoints, SRID and extent from the capabilities document.
///
/// Returns the info with an empty geometry descriptor, plus the query
/// context bound for the document's version.
pub fn resolve_capabilities(
    request: &FeatureTypeRequest,
    document: &CapabilitiesDocument,
) -> OgcResult<(WfsFeatureTypeInfo, CapabilitiesDocument)> {
    let version = document
        .root()
        .attribute("version")
        .map(WfsVersion::parse)
        .transpose()?
        .ok_or(OgcError::MissingVersion)?;
    if version != request.version {
        debug!(requested = %request.version, advertised = %version, "Server answered with another version");
    }

    let dialect = VersionDialect::new(version);
    let capabilities = dialect.bind(document.clone());
    let fallback = strip_trailing_question_mark(&request.service_url).to_string();

    let endpoint = |operation: WfsOperation, binding: Binding| -> OgcResult<Option<String>> {
        Ok(capabilities
            .value(&dialect.operation_url_path(operation, binding))?
            .map(|url| strip_trailing_question_mark(&url).to_string()))
    };
    let get_feature_url = endpoint(WfsOperation::GetFeature, Binding::Get)?
        .unwrap_or_else(|| fallback.clone());
    let get_feature_post_url = endpoint(WfsOperation::GetFeature, Binding::Post)?;
    let describe_url = endpoint(WfsOperation::DescribeFeatureType, Binding::Get)?
        .unwrap_or_else(|| fallback.clone());

    let feature_type = find_feature_type(&capabilities, &dialect, request)?;
    let type_name = match feature_type {
        Some(node) => capabilities
            .value_from(node, "wfs:Name")?
            .unwrap_or_else(|| request.type_name.clone()),
        None => {
            warn!(
                type_name = %request.type_name,
                "Feature type not advertised in capabilities, using defaults"
            );
            qualified_request_name(request)
        }
    };

    let advertised_srs = match feature_type {
        Some(node) => capabilities.value_from(node, dialect.srs_path())?,
        None => None,
    };
    let srid = resolve_srid(request.srid_override.as_deref(), advertised_srs.as_deref());

    let bounding_box = match feature_type {
        Some(node) => dialect.bounding_box(&capabilities, node)?,
        None => ogc_common::BoundingBox::new(0.0, 0.0, 0.0, 0.0),
    };
    let title = match feature_type {
        Some(node) => capabilities.value_from(node, "wfs:Title")?,
        None => None,
    };

    let namespace_prefix = request
        .namespace_prefix
        .clone()
        .or_else(|| prefix_part(&type_name).map(str::to_string));
    let namespace_uri = request.namespace_uri.clone().or_else(|| {
        namespace_prefix
            .as_deref()
            .and_then(|prefix| capabilities.document().resolve_prefix(prefix))
            .map(str::to_string)
    });

    let info = WfsFeatureTypeInfo {
        version,
        capabilities_url: fallback,
        get_feature_url,
        get_feature_post_url,
        describe_url,
        namespace_prefix,
        namespace_uri,
        type_name,
        title,
        srid,
        bounding_box,
        geometry: ElementDescriptor {
            name: DEFAULT_GEOMETRY_NAME.to_string(),
            type_name: String::new(),
        },
        properties: Vec::new(),
        label_fields: request.label_fields.clone(),
        axis_order: AxisOrder::XY,
    };
    Ok((info, capabilities))
}

fn find_feature_type<'a>(
    capabilities: &'a CapabilitiesDocument,
    dialect: &VersionDialect,
    request: &FeatureTypeRequest,
) -> OgcResult<Option<&'a XmlElement>> {
    let wanted = qualified_request_name(request);
    let by_local_name = prefix_part(&wanted).is_none();

    for node in capabilities.select(dialect.feature_types_path())? {
        let Some(name) = capabilities.value_from(node, "wfs:Name")? else {
            continue;
        };
        if name == wanted || (by_local_name && local_part(&name) == wanted) {
            return Ok(Some(node));
        }
    }
    Ok(None)
}

fn qualified_request_name(request: &FeatureTypeRequest) -> String {
    match (&request.namespace_prefix, prefix_part(&request.type_name)) {
        (Some(prefix), None) => format!("{}:{}", prefix, request.type_name),
        _ => request.type_name.clone(),
    }
}

/// The caller's SRID wins, then the advertised CRS, then `4326`.
pub fn resolve_srid(override_srid: Option<&str>, advertised: Option<&str>) -> String {
    if let Some(srid) = override_srid {
        return normalize_srid(srid);
    }
    match advertised.and_then(srid_code) {
        Some(code) => code.to_string(),
        None => {
            match advertised {
                Some(crs) => warn!(crs, "Unrecognized feature type CRS, defaulting to EPSG:4326"),
                None => debug!("No CRS advertised, defaulting to EPSG:4326"),
            }
            DEFAULT_SRID.to_string()
        }
    }
}

fn normalize_srid(srid: &str) -> String {
    srid_code(srid)
        .map(|code| code.to_string())
        .unwrap_or_else(|| srid.trim().to_string())
}

/// EPSG code to request. CRS84 is requested as EPSG:4326, so the axis order
/// follows that srsName rather than CRS84's longitude-first axes.
fn srid_code(crs: &str) -> Option<u32> {
    if is_crs84(crs) {
        return Some(4326);
    }
    epsg_code(crs)
}

/// Phase two: namespace, geometry element and properties from the schema.
pub fn resolve_schema(
    info: &mut WfsFeatureTypeInfo,
    request: &FeatureTypeRequest,
    capabilities: &CapabilitiesDocument,
    schema: XmlDocument,
) -> OgcResult<()> {
    let schema = capabilities
        .with_document(schema)
        .with_namespace("xs", XSD_NAMESPACE);

    if request.namespace_uri.is_none() {
        if let Some(target) = schema.root().attribute("targetNamespace") {
            info.namespace_uri = Some(target.to_string());
        }
    }

    let local = info.local_type_name().to_string();
    let element = schema.select_one(&format!("/xs:schema/xs:element[@name='{}']", local))?;

    let named_type = match element.and_then(|e| e.attribute("type")) {
        Some(type_name) => schema.select_one(&format!(
            "/xs:schema/xs:complexType[@name='{}']",
            local_part(type_name)
        ))?,
        None => schema.select_one(&format!("/xs:schema/xs:complexType[@name='{}Type']", local))?,
    };
    let anonymous_type = match element {
        Some(element) => schema.select_one_from(element, "xs:complexType")?,
        None => None,
    };

    let scanned = match named_type {
        Some(complex_type) => {
            let scan = scan_complex_type(&schema, complex_type)?;
            if scan.geometry.is_some() {
                Some(scan)
            } else {
                match anonymous_type {
                    Some(anonymous) => Some(scan_complex_type(&schema, anonymous)?),
                    None => Some(scan),
                }
            }
        }
        None => match anonymous_type {
            Some(anonymous) => Some(scan_complex_type(&schema, anonymous)?),
            None => None,
        },
    };

    let Some(scan) = scanned else {
        warn!(type_name = %info.type_name, "No schema declaration for feature type");
        return Ok(());
    };

    info.properties = scan.properties;
    match scan.geometry {
        Some((geometry, tier)) => {
            debug!(tier, name = %geometry.name, type_name = %geometry.type_name, "Found geometry element");
            info.geometry = geometry;
        }
        None => {
            warn!(
                type_name = %info.type_name,
                "No geometry element declared, will detect the geometry in responses"
            );
        }
    }
    Ok(())
}

struct ComplexTypeScan {
    /// Geometry element and the lookup tier that found it.
    geometry: Option<(ElementDescriptor, &'static str)>,
    properties: Vec<ElementDescriptor>,
}

fn scan_complex_type(
    schema: &CapabilitiesDocument,
    complex_type: &XmlElement,
) -> OgcResult<ComplexTypeScan> {
    let mut typed = None;
    let mut referenced = None;
    let mut properties = Vec::new();

    for element in schema.select_from(complex_type, ".//xs:element")? {
        if let Some(name) = element.attribute("name") {
            let declared = element.attribute("type").unwrap_or_default();
            if typed.is_none() && is_gml_qname(schema, declared) {
                typed = Some(ElementDescriptor {
                    name: name.to_string(),
                    type_name: local_part(declared).to_string(),
                });
            } else {
                properties.push(ElementDescriptor {
                    name: name.to_string(),
                    type_name: declared.to_string(),
                });
            }
        } else if let Some(reference) = element.attribute("ref") {
            if referenced.is_some() || !is_gml_qname(schema, reference) {
                continue;
            }
            let property = local_part(reference);
            match GML_PROPERTY_TYPES.iter().find(|(name, _)| *name == property) {
                Some((_, type_name)) => {
                    referenced = Some(ElementDescriptor {
                        name: property.to_string(),
                        type_name: type_name.to_string(),
                    })
                }
                None => debug!(reference, "Unmapped GML property reference"),
            }
        }
    }

    let geometry = typed
        .map(|g| (g, "typed"))
        .or_else(|| referenced.map(|g| (g, "ref")));
    Ok(ComplexTypeScan {
        geometry,
        properties,
    })
}

/// Whether a QName-valued attribute names something in the GML namespace.
fn is_gml_qname(schema: &CapabilitiesDocument, qname: &str) -> bool {
    let Some(prefix) = prefix_part(qname) else {
        return false;
    };
    match schema.document().resolve_prefix(prefix) {
        Some(uri) => uri.starts_with(GML_NAMESPACE),
        None => prefix == "gml",
    }
}

/// The caller's axis order wins; 1.0.0 is always x/y; otherwise the
/// registry decides for the resolved CRS.
pub fn resolve_axis_order(
    requested: Option<AxisOrder>,
    version: WfsVersion,
    srid: &str,
    registry: &dyn AxisOrderRegistry,
) -> OgcResult<AxisOrder> {
    if let Some(order) = requested {
        return Ok(order);
    }
    match version {
        WfsVersion::V1_0_0 => Ok(AxisOrder::XY),
        WfsVersion::V1_1_0 => {
            if srid.trim().is_empty() {
                return Err(OgcError::NoCrsConfigured);
            }
            let crs = format!("EPSG:{}", srid);
            registry.axis_order(&crs).ok_or_else(|| {
                OgcError::Configuration(format!("no axis order known for {}", crs))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::wfs;

    fn capabilities(xml: &str) -> CapabilitiesDocument {
        CapabilitiesDocument::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_phase_one_100() {
        let request = FeatureTypeRequest::new("http://features.example.com/geoserver/wfs?", "topp:states")
            .version(WfsVersion::V1_0_0);
        let (info, _) = resolve_capabilities(&request, &capabilities(wfs::CAPABILITIES_100)).unwrap();
        assert_eq!(info.get_feature_url, "http://features.example.com/geoserver/wfs/get");
        assert_eq!(
            info.get_feature_post_url.as_deref(),
            Some("http://features.example.com/geoserver/wfs/post")
        );
        assert_eq!(info.describe_url, "http://features.example.com/geoserver/wfs/describe");
        assert_eq!(info.capabilities_url, "http://features.example.com/geoserver/wfs");
        assert_eq!(info.srid, "4326");
        assert_eq!(info.title.as_deref(), Some("USA Population"));
        assert_eq!(info.namespace_prefix.as_deref(), Some("topp"));
        assert_eq!(info.namespace_uri.as_deref(), Some("http://www.openplans.org/topp"));
    }

    #[test]
    fn test_local_name_match() {
        let request = FeatureTypeRequest::new("http://census.example.org/wfs", "poi");
        let (info, _) = resolve_capabilities(&request, &capabilities(wfs::CAPABILITIES_110)).unwrap();
        assert_eq!(info.type_name, "tiger:poi");
        assert_eq!(info.namespace_uri.as_deref(), Some("http://www.census.gov"));
    }

    #[test]
    fn test_srid_precedence() {
        assert_eq!(resolve_srid(Some("EPSG:3857"), Some("EPSG:4326")), "3857");
        assert_eq!(resolve_srid(Some("900913"), None), "900913");
        assert_eq!(resolve_srid(None, Some("urn:x-ogc:def:crs:EPSG:26918")), "26918");
        assert_eq!(resolve_srid(None, None), DEFAULT_SRID);
        assert_eq!(resolve_srid(None, Some("garbage")), DEFAULT_SRID);
        assert_eq!(resolve_srid(Some("CRS:84"), Some("EPSG:26918")), "4326");
        assert_eq!(resolve_srid(None, Some("urn:ogc:def:crs:OGC:1.3:CRS84")), "4326");
    }

    #[test]
    fn test_missing_version_aborts() {
        let doc = capabilities(r#"<WFS_Capabilities xmlns="http://www.opengis.net/wfs"/>"#);
        let request = FeatureTypeRequest::new("http://h/wfs", "x");
        let err = resolve_capabilities(&request, &doc).unwrap_err();
        assert!(matches!(err, OgcError::MissingVersion));

        let doc = capabilities(r#"<WFS_Capabilities version="2.0.0" xmlns="http://www.opengis.net/wfs"/>"#);
        let err = resolve_capabilities(&request, &doc).unwrap_err();
        assert!(matches!(err, OgcError::UnsupportedVersion(ref v) if v == "2.0.0"));
    }

    #[test]
    fn test_gml_property_table_is_unique() {
        for (i, (name, _)) in GML_PROPERTY_TYPES.iter().enumerate() {
            assert!(GML_PROPERTY_TYPES[i + 1..].iter().all(|(other, _)| other != name));
        }
    }

    #[test]
    fn test_axis_order_rules() {
        let registry = EpsgAxisOrderRegistry::new();
        assert_eq!(
            resolve_axis_order(Some(AxisOrder::YX), WfsVersion::V1_0_0, "4326", &registry).unwrap(),
            AxisOrder::YX
        );
        assert_eq!(
            resolve_axis_order(None, WfsVersion::V1_0_0, "4326", &registry).unwrap(),
            AxisOrder::XY
        );
        assert_eq!(
            resolve_axis_order(None, WfsVersion::V1_1_0, "4326", &registry).unwrap(),
            AxisOrder::YX
        );
        assert_eq!(
            resolve_axis_order(None, WfsVersion::V1_1_0, "26918", &registry).unwrap(),
            AxisOrder::XY
        );
        assert!(matches!(
            resolve_axis_order(None, WfsVersion::V1_1_0, "", &registry),
            Err(OgcError::NoCrsConfigured)
        ));
        assert!(matches!(
            resolve_axis_order(None, WfsVersion::V1_1_0, "custom", &registry),
            Err(OgcError::Configuration(_))
        ));
    }
}
