//! GetFeature execution and decoder selection by declared geometry type.

use std::collections::HashMap;

use futures::stream::{self, Stream};
use geo_types::Geometry;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use ogc_common::query::parse_url;
use ogc_common::{OgcError, OgcResult};
use ogc_http::{fetch_xml, post_xml, HttpFetcher};
use ogc_xml::{XmlDocument, XmlElement, GML_NAMESPACE};

use crate::feature_type::{FeatureTypeRequest, WfsFeatureTypeInfo};
use crate::gml::{is_gml_geometry, members, GmlReader};
use crate::request::{get_feature_body, get_feature_url, GetFeatureQuery};

/// A decoding strategy for one geometry shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryDecoder {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    /// First member of an aggregate, as a single geometry.
    FirstPoint,
    FirstLineString,
    FirstPolygon,
    /// Decodes whatever GML geometry the response carries.
    Generic,
}

impl GeometryDecoder {
    /// The single-geometry decoder used when aggregates are disallowed.
    pub fn degraded(self) -> Self {
        match self {
            GeometryDecoder::MultiPoint => GeometryDecoder::FirstPoint,
            GeometryDecoder::MultiLineString => GeometryDecoder::FirstLineString,
            GeometryDecoder::MultiPolygon => GeometryDecoder::FirstPolygon,
            other => other,
        }
    }

    fn accepts(&self, element_name: &str) -> bool {
        match self {
            GeometryDecoder::Point => element_name == "Point",
            GeometryDecoder::LineString => matches!(element_name, "LineString" | "Curve"),
            GeometryDecoder::Polygon => matches!(element_name, "Polygon" | "Surface"),
            GeometryDecoder::MultiPoint | GeometryDecoder::FirstPoint => {
                matches!(element_name, "MultiPoint" | "Point")
            }
            GeometryDecoder::MultiLineString | GeometryDecoder::FirstLineString => matches!(
                element_name,
                "MultiLineString" | "MultiCurve" | "LineString" | "Curve"
            ),
            GeometryDecoder::MultiPolygon | GeometryDecoder::FirstPolygon => matches!(
                element_name,
                "MultiPolygon" | "MultiSurface" | "Polygon" | "Surface"
            ),
            GeometryDecoder::Generic => true,
        }
    }

    /// Decode one GML geometry element.
    ///
    /// An element that does not match this decoder's shape is decoded
    /// generically.
    pub fn decode(&self, reader: &GmlReader, element: &XmlElement) -> OgcResult<Geometry<f64>> {
        if !self.accepts(element.local_name()) {
            debug!(
                decoder = ?self,
                element = element.local_name(),
                "Geometry does not match declared type, decoding generically"
            );
            return reader.geometry(element);
        }

        let geometry = match self {
            GeometryDecoder::Point => reader.point(element)?.into(),
            GeometryDecoder::LineString => reader.line_string(element)?.into(),
            GeometryDecoder::Polygon => reader.polygon(element)?.into(),
            GeometryDecoder::MultiPoint => reader.multi_point(element)?.into(),
            GeometryDecoder::MultiLineString => reader.multi_line_string(element)?.into(),
            GeometryDecoder::MultiPolygon => reader.multi_polygon(element)?.into(),
            GeometryDecoder::FirstPoint => reader.point(first_member(element)?)?.into(),
            GeometryDecoder::FirstLineString => reader.line_string(first_member(element)?)?.into(),
            GeometryDecoder::FirstPolygon => reader.polygon(first_member(element)?)?.into(),
            GeometryDecoder::Generic => reader.geometry(element)?,
        };
        Ok(geometry)
    }
}

fn first_member(element: &XmlElement) -> OgcResult<&XmlElement> {
    if !element.local_name().starts_with("Multi") {
        return Ok(element);
    }
    members(element)
        .next()
        .ok_or_else(|| OgcError::missing(format!("gml:{} member", element.local_name())))
}

/// Registration table from geometry type name to decoder.
#[derive(Debug, Clone)]
pub struct GeometryDispatch {
    table: HashMap<String, GeometryDecoder>,
}

impl Default for GeometryDispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryDispatch {
    pub fn new() -> Self {
        let mut dispatch = Self {
            table: HashMap::new(),
        };
        dispatch
            .register("Point", GeometryDecoder::Point)
            .register("LineString", GeometryDecoder::LineString)
            .register("Curve", GeometryDecoder::LineString)
            .register("Polygon", GeometryDecoder::Polygon)
            .register("Surface", GeometryDecoder::Polygon)
            .register("MultiPoint", GeometryDecoder::MultiPoint)
            .register("MultiLineString", GeometryDecoder::MultiLineString)
            .register("MultiCurve", GeometryDecoder::MultiLineString)
            .register("MultiPolygon", GeometryDecoder::MultiPolygon)
            .register("MultiSurface", GeometryDecoder::MultiPolygon);
        dispatch
    }

    /// Add or replace the decoder for a type name.
    pub fn register(&mut self, type_name: &str, decoder: GeometryDecoder) -> &mut Self {
        self.table
            .insert(normalize_type_name(type_name).to_string(), decoder);
        self
    }

    /// Decoder for a declared GML type such as `gml:MultiPolygonPropertyType`.
    pub fn select(&self, type_name: &str, multi_geometries: bool) -> GeometryDecoder {
        let name = normalize_type_name(type_name);
        let decoder = match self.table.get(name) {
            Some(decoder) => *decoder,
            None => {
                debug!(type_name, "No decoder registered, sniffing geometries");
                GeometryDecoder::Generic
            }
        };
        if multi_geometries {
            return decoder;
        }
        let degraded = decoder.degraded();
        if degraded != decoder {
            warn!(
                type_name,
                "Multi-geometries disabled, keeping only the first member of each feature"
            );
        }
        degraded
    }

    /// Issue GetFeature for a resolved feature type and decode the response.
    ///
    /// The exchange runs under a child of `cancel` that is cancelled when
    /// this call returns, whichever way it returns.
    #[instrument(skip_all, fields(type_name = %info.type_name, post = request.use_post))]
    pub async fn fetch_features(
        &self,
        fetcher: &dyn HttpFetcher,
        info: &WfsFeatureTypeInfo,
        request: &FeatureTypeRequest,
        query: &GetFeatureQuery,
        cancel: &CancellationToken,
    ) -> OgcResult<FeatureStream> {
        let decoder = self.select(&info.geometry.type_name, request.multi_geometries);
        let quick = request.effective_quick_geometries();

        let scope = cancel.child_token();
        let _release = scope.clone().drop_guard();

        let document = if request.use_post {
            let endpoint = info
                .get_feature_post_url
                .as_deref()
                .unwrap_or(info.get_feature_url.as_str());
            let url = parse_url(endpoint)?;
            let body = get_feature_body(info, query);
            debug!(url = %url, "POST GetFeature");
            post_xml(fetcher, &url, body, &scope).await?
        } else {
            let url = get_feature_url(info, query)?;
            debug!(url = %url, "GET GetFeature");
            fetch_xml(fetcher, &url, &scope).await?
        };

        let reader = GmlReader::new(info.axis_order, quick);
        let stream = FeatureStream::new(document, decoder, reader, info, quick);
        info!(
            features = stream.remaining(),
            decoder = ?decoder,
            "Received GetFeature response"
        );
        Ok(stream)
    }
}

/// Type name without prefix or `Property`/`PropertyType` suffix.
pub fn normalize_type_name(type_name: &str) -> &str {
    let local = type_name
        .rsplit_once(':')
        .map(|(_, local)| local)
        .unwrap_or(type_name)
        .trim();
    local
        .strip_suffix("PropertyType")
        .or_else(|| local.strip_suffix("Property"))
        .unwrap_or(local)
}

/// One decoded feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    /// `fid` (GML 2) or `gml:id` (GML 3).
    pub id: Option<String>,
    pub type_name: String,
    #[serde(skip)]
    pub geometry: Option<Geometry<f64>>,
    /// Scalar properties in document order; empty in quick mode.
    pub attributes: Vec<(String, String)>,
    pub label: Option<String>,
}

impl Feature {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Features of one GetFeature response, decoded on demand.
pub struct FeatureStream {
    members: std::vec::IntoIter<XmlElement>,
    decoder: GeometryDecoder,
    reader: GmlReader,
    geometry_name: String,
    label_fields: Vec<String>,
    quick: bool,
}

impl FeatureStream {
    /// Collect the `gml:featureMember` / `gml:featureMembers` children of a
    /// feature collection.
    pub fn new(
        document: XmlDocument,
        decoder: GeometryDecoder,
        reader: GmlReader,
        info: &WfsFeatureTypeInfo,
        quick: bool,
    ) -> Self {
        let mut features = Vec::new();
        for child in document.into_root().into_children() {
            if child.is(GML_NAMESPACE, "featureMember") || child.is(GML_NAMESPACE, "featureMembers") {
                features.extend(child.into_children());
            }
        }
        Self {
            members: features.into_iter(),
            decoder,
            reader,
            geometry_name: info.geometry.name.clone(),
            label_fields: info.label_fields.clone(),
            quick,
        }
    }

    pub fn remaining(&self) -> usize {
        self.members.len()
    }

    pub fn decoder(&self) -> GeometryDecoder {
        self.decoder
    }

    /// Adapt to an async stream.
    pub fn into_stream(self) -> impl Stream<Item = OgcResult<Feature>> {
        stream::iter(self)
    }

    fn decode(&self, element: &XmlElement) -> OgcResult<Feature> {
        let id = element
            .attribute("fid")
            .or_else(|| element.attribute_ns(GML_NAMESPACE, "id"))
            .map(str::to_string);

        let property = self.geometry_property(element);
        let geometry = match property.and_then(geometry_child) {
            Some(geometry) => Some(self.decoder.decode(&self.reader, geometry)?),
            None => {
                debug!(id = ?id, "Feature has no geometry");
                None
            }
        };

        let attributes = if self.quick {
            Vec::new()
        } else {
            element
                .children()
                .iter()
                .filter(|child| {
                    child.namespace() != Some(GML_NAMESPACE)
                        && child.children().is_empty()
                        && !property.is_some_and(|p| std::ptr::eq(p, *child))
                })
                .map(|child| (child.local_name().to_string(), child.text().to_string()))
                .collect()
        };

        let label = if self.label_fields.is_empty() {
            None
        } else {
            let parts: Vec<&str> = self
                .label_fields
                .iter()
                .filter_map(|field| {
                    attributes
                        .iter()
                        .find(|(key, _)| key == field)
                        .map(|(_, value)| value.as_str())
                })
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        };

        Ok(Feature {
            id,
            type_name: element.qualified_name(),
            geometry,
            attributes,
            label,
        })
    }

    /// The declared geometry property, else the first property holding GML.
    fn geometry_property<'a>(&self, element: &'a XmlElement) -> Option<&'a XmlElement> {
        element
            .children()
            .iter()
            .find(|child| child.local_name() == self.geometry_name)
            .or_else(|| {
                element
                    .children()
                    .iter()
                    .filter(|child| !child.is(GML_NAMESPACE, "boundedBy"))
                    .find(|child| child.children().iter().any(is_gml_geometry))
            })
    }
}

fn geometry_child(property: &XmlElement) -> Option<&XmlElement> {
    property
        .children()
        .iter()
        .find(|child| is_gml_geometry(child))
        .or_else(|| property.children().first())
}

impl Iterator for FeatureStream {
    type Item = OgcResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.members.next()?;
        Some(self.decode(&element))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.members.size_hint()
    }
}

impl ExactSizeIterator for FeatureStream {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_type_name() {
        assert_eq!(normalize_type_name("gml:MultiPolygonPropertyType"), "MultiPolygon");
        assert_eq!(normalize_type_name("PointPropertyType"), "Point");
        assert_eq!(normalize_type_name("Point"), "Point");
        assert_eq!(normalize_type_name("multiLineStringProperty"), "multiLineString");
        assert_eq!(normalize_type_name(""), "");
    }

    #[test]
    fn test_select_table() {
        let dispatch = GeometryDispatch::new();
        assert_eq!(dispatch.select("gml:PointPropertyType", true), GeometryDecoder::Point);
        assert_eq!(dispatch.select("Point", true), GeometryDecoder::Point);
        assert_eq!(dispatch.select("CurvePropertyType", true), GeometryDecoder::LineString);
        assert_eq!(dispatch.select("SurfacePropertyType", true), GeometryDecoder::Polygon);
        assert_eq!(
            dispatch.select("MultiSurfacePropertyType", true),
            GeometryDecoder::MultiPolygon
        );
        assert_eq!(dispatch.select("GeometryPropertyType", true), GeometryDecoder::Generic);
        assert_eq!(dispatch.select("", true), GeometryDecoder::Generic);
    }

    #[test]
    fn test_multi_degrades_when_disallowed() {
        let dispatch = GeometryDispatch::new();
        assert_eq!(
            dispatch.select("MultiCurvePropertyType", false),
            GeometryDecoder::FirstLineString
        );
        assert_eq!(dispatch.select("PolygonPropertyType", false), GeometryDecoder::Polygon);
        assert_eq!(dispatch.select("Unknown", false), GeometryDecoder::Generic);
    }

    #[test]
    fn test_register_extends_table() {
        let mut dispatch = GeometryDispatch::new();
        dispatch.register("gml:GeometryPropertyType", GeometryDecoder::Polygon);
        assert_eq!(dispatch.select("GeometryPropertyType", true), GeometryDecoder::Polygon);
    }
}
