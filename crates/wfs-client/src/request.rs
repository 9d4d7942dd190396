//! WFS request encoding: KVP URLs and XML POST bodies.

use quick_xml::escape::escape;
use tracing::debug;
use url::Url;

use ogc_common::query::{append_missing_params, parse_url, set_params};
use ogc_common::{BoundingBox, OgcResult, WfsVersion};
use ogc_xml::{GML_NAMESPACE, OGC_NAMESPACE, WFS_NAMESPACE};

use crate::feature_type::{prefix_part, FeatureTypeRequest, WfsFeatureTypeInfo};
use crate::filter::Filter;

/// Spatial and count restrictions for one GetFeature call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetFeatureQuery {
    /// Extent in the feature type CRS, x/y order.
    pub bbox: Option<BoundingBox>,
    /// Takes precedence over `bbox` when both are set.
    pub filter: Option<Filter>,
    pub max_features: Option<u32>,
}

impl GetFeatureQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
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

    /// The filter to send, deriving a BBOX filter when none is given.
    pub fn effective_filter(&self, info: &WfsFeatureTypeInfo) -> Option<Filter> {
        match (&self.filter, &self.bbox) {
            (Some(filter), bbox) => {
                if bbox.is_some() {
                    debug!("Explicit filter given, ignoring bbox");
                }
                Some(filter.clone())
            }
            (None, Some(bbox)) => Some(Filter::bbox(
                info.dialect(),
                &info.geometry.name,
                bbox,
                &info.srs_name(),
                info.axis_order,
            )),
            (None, None) => None,
        }
    }
}

impl From<&FeatureTypeRequest> for GetFeatureQuery {
    fn from(request: &FeatureTypeRequest) -> Self {
        Self {
            bbox: None,
            filter: request.filter.clone(),
            max_features: request.max_features,
        }
    }
}

/// GetCapabilities URL; parameters already present in `base` are kept.
pub fn capabilities_url(base: &str, version: WfsVersion) -> OgcResult<Url> {
    let mut url = parse_url(base)?;
    append_missing_params(
        &mut url,
        &[
            ("SERVICE", "WFS"),
            ("REQUEST", "GetCapabilities"),
            ("VERSION", version.as_str()),
        ],
    );
    Ok(url)
}

pub fn describe_feature_type_url(info: &WfsFeatureTypeInfo) -> OgcResult<Url> {
    let mut url = parse_url(&info.describe_url)?;
    set_params(
        &mut url,
        &[
            ("SERVICE", "WFS"),
            ("VERSION", info.version.as_str()),
            ("REQUEST", "DescribeFeatureType"),
            ("TYPENAME", info.type_name.as_str()),
        ],
    );
    Ok(url)
}

/// GetFeature as a KVP GET request.
pub fn get_feature_url(info: &WfsFeatureTypeInfo, query: &GetFeatureQuery) -> OgcResult<Url> {
    let dialect = info.dialect();
    let mut params: Vec<(String, String)> = vec![
        ("SERVICE".into(), "WFS".into()),
        ("VERSION".into(), info.version.as_str().into()),
        ("REQUEST".into(), "GetFeature".into()),
        ("TYPENAME".into(), info.type_name.clone()),
        ("OUTPUTFORMAT".into(), dialect.output_format().into()),
    ];

    if let Some(parameter) = dialect.srs_name_parameter() {
        params.push((parameter.into(), info.srs_name()));
    }
    if let (WfsVersion::V1_1_0, Some(prefix), Some(uri)) = (
        info.version,
        prefix_part(&info.type_name),
        info.namespace_uri.as_deref(),
    ) {
        params.push(("NAMESPACE".into(), format!("xmlns({}={})", prefix, uri)));
    }
    if let Some(count) = query.max_features {
        params.push((dialect.max_features_parameter().into(), count.to_string()));
    }

    match (&query.filter, &query.bbox) {
        (Some(filter), _) => params.push(("FILTER".into(), filter.as_str().into())),
        (None, Some(bbox)) => params.push(("BBOX".into(), kvp_bbox(info, bbox))),
        (None, None) => {}
    }

    let mut url = parse_url(&info.get_feature_url)?;
    set_params(&mut url, &params);
    Ok(url)
}

/// `BBOX` value; 1.1.0 writes the service axis order and names the CRS.
fn kvp_bbox(info: &WfsFeatureTypeInfo, bbox: &BoundingBox) -> String {
    match info.version {
        WfsVersion::V1_0_0 => bbox.to_kvp(),
        WfsVersion::V1_1_0 => format!(
            "{},{}",
            bbox.to_kvp_ordered(info.axis_order),
            info.srs_name()
        ),
    }
}

/// GetFeature as an XML document for POST.
pub fn get_feature_body(info: &WfsFeatureTypeInfo, query: &GetFeatureQuery) -> String {
    let mut xml = format!(
        r#"<wfs:GetFeature service="WFS" version="{}" outputFormat="{}" xmlns:wfs="{}" xmlns:ogc="{}" xmlns:gml="{}""#,
        info.version,
        escape(info.dialect().output_format()),
        WFS_NAMESPACE,
        OGC_NAMESPACE,
        GML_NAMESPACE
    );
    if let (Some(prefix), Some(uri)) = (prefix_part(&info.type_name), info.namespace_uri.as_deref()) {
        xml.push_str(&format!(r#" xmlns:{}="{}""#, prefix, escape(uri)));
    }
    if let Some(count) = query.max_features {
        xml.push_str(&format!(r#" maxFeatures="{}""#, count));
    }
    xml.push('>');

    xml.push_str(&format!(r#"<wfs:Query typeName="{}""#, escape(info.type_name.as_str())));
    if info.dialect().srs_name_parameter().is_some() {
        xml.push_str(&format!(r#" srsName="{}""#, escape(info.srs_name().as_str())));
    }
    xml.push('>');
    if let Some(filter) = query.effective_filter(info) {
        xml.push_str(filter.as_str());
    }
    xml.push_str("</wfs:Query></wfs:GetFeature>");
    xml
}
