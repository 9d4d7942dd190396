//! Serializable summaries printed by the CLI.

use geo_types::Geometry;
use serde::Serialize;

use ogc_common::{BoundingBox, WmsVersion};
use wfs_client::{Feature, GeometryDecoder};
use wms_client::{Layer, ServiceDescription, WmsCapabilities};

#[derive(Debug, Clone, Serialize)]
pub struct CapabilitiesReport {
    pub version: WmsVersion,
    pub service: ServiceDescription,
    pub layer_count: usize,
    pub layers: Vec<LayerSummary>,
    pub map_formats: Vec<String>,
    pub feature_info_formats: Vec<String>,
    pub get_map_endpoint: Option<String>,
}

/// One row of the flattened layer tree.
#[derive(Debug, Clone, Serialize)]
pub struct LayerSummary {
    pub name: Option<String>,
    pub title: Option<String>,
    /// Nesting level below the root, starting at 0.
    pub level: usize,
    pub queryable: bool,
    pub crs: Vec<String>,
    pub styles: Vec<String>,
    pub lat_lon_bounding_box: Option<BoundingBox>,
}

impl CapabilitiesReport {
    pub fn from_capabilities(capabilities: &WmsCapabilities) -> Self {
        let mut layers = Vec::new();
        flatten(&capabilities.root_layer, 0, &mut layers);

        Self {
            version: capabilities.version,
            service: capabilities.service.clone(),
            layer_count: capabilities.root_layer.named_layers().len(),
            layers,
            map_formats: capabilities.map_formats().to_vec(),
            feature_info_formats: capabilities.feature_info_formats().to_vec(),
            get_map_endpoint: capabilities
                .get_map
                .preferred_binding()
                .map(|binding| binding.url.clone()),
        }
    }
}

fn flatten(layer: &Layer, level: usize, out: &mut Vec<LayerSummary>) {
    // The synthesized root is an artifact of parsing; its children sit at level 0.
    let child_level = if layer.is_synthesized_root() {
        level
    } else {
        out.push(LayerSummary {
            name: layer.name.clone(),
            title: layer.title.clone(),
            level,
            queryable: layer.queryable,
            crs: layer.crs.clone(),
            styles: layer.styles.iter().filter_map(|s| s.name.clone()).collect(),
            lat_lon_bounding_box: layer.lat_lon_bounding_box,
        });
        level + 1
    };

    for child in &layer.children {
        flatten(child, child_level, out);
    }
}

/// Shape and size of a decoded geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeometrySummary {
    pub kind: &'static str,
    pub vertices: usize,
}

impl GeometrySummary {
    pub fn of(geometry: &Geometry<f64>) -> Self {
        Self {
            kind: geometry_kind(geometry),
            vertices: vertex_count(geometry),
        }
    }
}

pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

fn vertex_count(geometry: &Geometry<f64>) -> usize {
    fn polygon(p: &geo_types::Polygon<f64>) -> usize {
        p.exterior().0.len() + p.interiors().iter().map(|r| r.0.len()).sum::<usize>()
    }

    match geometry {
        Geometry::Point(_) => 1,
        Geometry::Line(_) => 2,
        Geometry::LineString(ls) => ls.0.len(),
        Geometry::Polygon(p) => polygon(p),
        Geometry::MultiPoint(mp) => mp.0.len(),
        Geometry::MultiLineString(mls) => mls.0.iter().map(|ls| ls.0.len()).sum(),
        Geometry::MultiPolygon(mp) => mp.0.iter().map(polygon).sum(),
        Geometry::GeometryCollection(gc) => gc.0.iter().map(vertex_count).sum(),
        Geometry::Rect(_) => 4,
        Geometry::Triangle(_) => 3,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureSummary {
    #[serde(flatten)]
    pub feature: Feature,
    pub geometry: Option<GeometrySummary>,
}

impl From<Feature> for FeatureSummary {
    fn from(feature: Feature) -> Self {
        let geometry = feature.geometry.as_ref().map(GeometrySummary::of);
        Self { feature, geometry }
    }
}

/// Outcome of one GetFeature exchange. Per-feature decode failures are kept
/// alongside the features that did decode.
#[derive(Debug, Clone, Serialize)]
pub struct FeaturesReport {
    pub type_name: String,
    pub decoder: String,
    pub count: usize,
    pub features: Vec<FeatureSummary>,
    pub failures: Vec<String>,
}

impl FeaturesReport {
    pub fn new(type_name: impl Into<String>, decoder: GeometryDecoder) -> Self {
        Self {
            type_name: type_name.into(),
            decoder: format!("{:?}", decoder),
            count: 0,
            features: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature.into());
        self.count = self.features.len();
    }

    pub fn push_failure(&mut self, message: impl Into<String>) {
        self.failures.push(message.into());
    }
}
