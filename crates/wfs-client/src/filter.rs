//! OGC filter fragments embedded in GetFeature requests.

use std::fmt;

use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

use ogc_common::{AxisOrder, BoundingBox};
use ogc_xml::{GML_NAMESPACE, OGC_NAMESPACE};

use crate::dialect::VersionDialect;

/// A complete `ogc:Filter` element, passed through uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(String);

impl Filter {
    pub fn new(xml: impl Into<String>) -> Self {
        Self(xml.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A `BBOX` filter on `property`, written in the service axis order.
    pub fn bbox(
        dialect: VersionDialect,
        property: &str,
        bbox: &BoundingBox,
        srs_name: &str,
        axis_order: AxisOrder,
    ) -> Self {
        let (lower, upper) = (
            ordered(axis_order, bbox.min_x, bbox.min_y),
            ordered(axis_order, bbox.max_x, bbox.max_y),
        );

        let envelope = if dialect.uses_gml3() {
            format!(
                r#"<gml:Envelope srsName="{srs}"><gml:lowerCorner>{} {}</gml:lowerCorner><gml:upperCorner>{} {}</gml:upperCorner></gml:Envelope>"#,
                lower.0,
                lower.1,
                upper.0,
                upper.1,
                srs = escape(srs_name)
            )
        } else {
            format!(
                r#"<gml:Box srsName="{srs}"><gml:coordinates>{},{} {},{}</gml:coordinates></gml:Box>"#,
                lower.0,
                lower.1,
                upper.0,
                upper.1,
                srs = escape(srs_name)
            )
        };

        Self(format!(
            r#"<ogc:Filter xmlns:ogc="{ogc}" xmlns:gml="{gml}"><ogc:BBOX><ogc:PropertyName>{property}</ogc:PropertyName>{envelope}</ogc:BBOX></ogc:Filter>"#,
            ogc = OGC_NAMESPACE,
            gml = GML_NAMESPACE,
            property = escape(property),
            envelope = envelope
        ))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialize an `(x, y)` pair in `order`.
fn ordered(order: AxisOrder, x: f64, y: f64) -> (f64, f64) {
    if order.is_swapped() {
        (y, x)
    } else {
        (x, y)
    }
}
