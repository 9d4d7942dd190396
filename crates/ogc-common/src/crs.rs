//! Coordinate Reference System identifiers and axis order.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OgcError, OgcResult};

/// Serialization order of the two horizontal coordinates.
///
/// Holds a permutation of `{0, 1}`: `indices()[0]` is the position in the
/// serialized tuple that carries X, `indices()[1]` the one that carries Y.
/// Only the two valid permutations can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct AxisOrder([usize; 2]);

impl AxisOrder {
    /// X (longitude/easting) first.
    pub const XY: AxisOrder = AxisOrder([0, 1]);

    /// Y (latitude/northing) first.
    pub const YX: AxisOrder = AxisOrder([1, 0]);

    /// Validate an axis-order array.
    pub fn from_slice(order: &[usize]) -> OgcResult<Self> {
        match order {
            [0, 1] => Ok(AxisOrder::XY),
            [1, 0] => Ok(AxisOrder::YX),
            _ => Err(OgcError::InvalidAxisOrder(order.to_vec())),
        }
    }

    pub fn indices(&self) -> [usize; 2] {
        self.0
    }

    pub fn is_swapped(&self) -> bool {
        *self == AxisOrder::YX
    }

    /// Map a serialized `(first, second)` pair to `(x, y)`.
    pub fn to_xy(&self, first: f64, second: f64) -> (f64, f64) {
        let pair = [first, second];
        (pair[self.0[0]], pair[self.0[1]])
    }
}

impl Default for AxisOrder {
    fn default() -> Self {
        AxisOrder::XY
    }
}

impl TryFrom<Vec<usize>> for AxisOrder {
    type Error = OgcError;

    fn try_from(value: Vec<usize>) -> Result<Self, Self::Error> {
        AxisOrder::from_slice(&value)
    }
}

impl From<AxisOrder> for Vec<usize> {
    fn from(value: AxisOrder) -> Self {
        value.0.to_vec()
    }
}

impl fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{}}}", self.0[0], self.0[1])
    }
}

/// Extract the numeric code from an SRID/CRS identifier.
///
/// Accepts formats like:
/// - "4326"
/// - "EPSG:4326"
/// - "urn:ogc:def:crs:EPSG::4326" / "urn:x-ogc:def:crs:EPSG:6.9:4326"
/// - "http://www.opengis.net/gml/srs/epsg.xml#4326"
///
/// `CRS:84` has no EPSG code and yields `None`.
pub fn epsg_code(crs: &str) -> Option<u32> {
    if is_crs84(crs) {
        return None;
    }
    let trimmed = crs.trim();
    let tail = trimmed
        .rsplit(|c: char| c == ':' || c == '#' || c == '/')
        .next()
        .unwrap_or(trimmed);
    tail.parse().ok()
}

/// OGC CRS84 (WGS 84, longitude first) in its WMS, URN or URI spelling.
pub fn is_crs84(crs: &str) -> bool {
    let trimmed = crs.trim();
    trimmed.eq_ignore_ascii_case("CRS:84")
        || trimmed
            .rsplit(|c: char| c == ':' || c == '/')
            .next()
            .is_some_and(|tail| tail.eq_ignore_ascii_case("CRS84"))
}

/// Format a code or identifier as `EPSG:<code>`; other identifiers pass through.
pub fn to_epsg_identifier(crs: &str) -> String {
    if crs.to_ascii_uppercase().starts_with("CRS:") {
        return crs.to_string();
    }
    match epsg_code(crs) {
        Some(code) => format!("EPSG:{}", code),
        None => crs.to_string(),
    }
}

/// External CRS → axis-order lookup.
pub trait AxisOrderRegistry: Send + Sync {
    /// Axis order for a CRS identifier, or `None` when the CRS is unknown.
    fn axis_order(&self, crs: &str) -> Option<AxisOrder>;
}

/// EPSG-based registry.
///
/// Geographic CRSes defined by EPSG with latitude first report `YX`;
/// everything else defaults to `XY`. `CRS:84` is explicitly `XY`.
#[derive(Debug, Clone)]
pub struct EpsgAxisOrderRegistry {
    overrides: HashMap<u32, AxisOrder>,
}

/// EPSG geographic 2D CRSes with (lat, lon) axis order.
const LAT_LON_CODES: &[u32] = &[
    4326, 4258, 4269, 4267, 4230, 4283, 4314, 4617, 4674, 4612, 4148, 4152, 4167, 4171, 4490,
];

impl EpsgAxisOrderRegistry {
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }

    /// Force the axis order for an EPSG code.
    pub fn with_override(mut self, code: u32, order: AxisOrder) -> Self {
        self.overrides.insert(code, order);
        self
    }
}

impl Default for EpsgAxisOrderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AxisOrderRegistry for EpsgAxisOrderRegistry {
    fn axis_order(&self, crs: &str) -> Option<AxisOrder> {
        if is_crs84(crs) {
            return Some(AxisOrder::XY);
        }
        let code = epsg_code(crs)?;
        if let Some(order) = self.overrides.get(&code) {
            return Some(*order);
        }
        if LAT_LON_CODES.contains(&code) {
            Some(AxisOrder::YX)
        } else {
            Some(AxisOrder::XY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_order_validation() {
        assert_eq!(AxisOrder::from_slice(&[0, 1]).unwrap(), AxisOrder::XY);
        assert_eq!(AxisOrder::from_slice(&[1, 0]).unwrap(), AxisOrder::YX);

        let rejected: [&[usize]; 5] = [&[1, 1], &[0, 0], &[0], &[0, 1, 2], &[]];
        for bad in rejected {
            let err = AxisOrder::from_slice(bad).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::Configuration);
        }
    }

    #[test]
    fn test_axis_order_to_xy() {
        assert_eq!(AxisOrder::XY.to_xy(10.0, 50.0), (10.0, 50.0));
        assert_eq!(AxisOrder::YX.to_xy(50.0, 10.0), (10.0, 50.0));
    }

    #[test]
    fn test_axis_order_serde() {
        let order: AxisOrder = serde_json::from_str("[1, 0]").unwrap();
        assert_eq!(order, AxisOrder::YX);
        assert!(serde_json::from_str::<AxisOrder>("[1, 1]").is_err());
        assert_eq!(serde_json::to_string(&AxisOrder::XY).unwrap(), "[0,1]");
    }

    #[test]
    fn test_epsg_code() {
        assert_eq!(epsg_code("4326"), Some(4326));
        assert_eq!(epsg_code("EPSG:28992"), Some(28992));
        assert_eq!(epsg_code("urn:ogc:def:crs:EPSG::4326"), Some(4326));
        assert_eq!(epsg_code("urn:x-ogc:def:crs:EPSG:6.9:4326"), Some(4326));
        assert_eq!(
            epsg_code("http://www.opengis.net/gml/srs/epsg.xml#3857"),
            Some(3857)
        );
        assert_eq!(epsg_code("CRS:84"), None);
        assert_eq!(epsg_code("urn:ogc:def:crs:OGC:1.3:CRS84"), None);
        assert_eq!(epsg_code("AUTO:foo"), None);
    }

    #[test]
    fn test_registry() {
        let registry = EpsgAxisOrderRegistry::default();
        assert_eq!(registry.axis_order("EPSG:4326"), Some(AxisOrder::YX));
        assert_eq!(registry.axis_order("EPSG:3857"), Some(AxisOrder::XY));
        assert_eq!(registry.axis_order("CRS:84"), Some(AxisOrder::XY));
        assert_eq!(
            registry.axis_order("http://www.opengis.net/def/crs/OGC/1.3/CRS84"),
            Some(AxisOrder::XY)
        );
        assert_eq!(registry.axis_order("nonsense"), None);

        let registry = registry.with_override(3857, AxisOrder::YX);
        assert_eq!(registry.axis_order("3857"), Some(AxisOrder::YX));
    }

    #[test]
    fn test_is_crs84() {
        assert!(is_crs84("CRS:84"));
        assert!(is_crs84(" crs:84 "));
        assert!(is_crs84("urn:ogc:def:crs:OGC:1.3:CRS84"));
        assert!(is_crs84("urn:ogc:def:crs:OGC::CRS84"));
        assert!(!is_crs84("EPSG:84"));
        assert!(!is_crs84("4326"));
    }

    #[test]
    fn test_to_epsg_identifier() {
        assert_eq!(to_epsg_identifier("4326"), "EPSG:4326");
        assert_eq!(to_epsg_identifier("EPSG:3857"), "EPSG:3857");
        assert_eq!(to_epsg_identifier("CRS:84"), "CRS:84");
    }
}
