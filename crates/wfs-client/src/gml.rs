//! GML 2 and GML 3 geometry decoding into `geo-types`.
//!
//! Coordinates are read from `gml:coordinates`, `gml:coord`, `gml:pos` and
//! `gml:posList` and remapped to x/y through the feature type's
//! [`AxisOrder`]. Extra ordinates (`srsDimension="3"`) are dropped.

use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon, Rect,
};
use tracing::trace;

use ogc_common::{AxisOrder, OgcError, OgcResult};
use ogc_xml::{XmlElement, GML_NAMESPACE};

/// Local names of the GML geometry elements this module decodes.
const GEOMETRY_ELEMENTS: &[&str] = &[
    "Point",
    "LineString",
    "LinearRing",
    "Curve",
    "Polygon",
    "Surface",
    "MultiPoint",
    "MultiLineString",
    "MultiCurve",
    "MultiPolygon",
    "MultiSurface",
    "MultiGeometry",
    "Box",
    "Envelope",
];

/// True when `element` is a GML geometry element.
pub fn is_gml_geometry(element: &XmlElement) -> bool {
    element.namespace() == Some(GML_NAMESPACE) && GEOMETRY_ELEMENTS.contains(&element.local_name())
}

/// Decoder settings shared by every geometry of one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GmlReader {
    axis_order: AxisOrder,
    /// Validate vertex counts and ring closure.
    strict: bool,
}

impl GmlReader {
    pub fn new(axis_order: AxisOrder, quick: bool) -> Self {
        Self {
            axis_order,
            strict: !quick,
        }
    }

    pub fn axis_order(&self) -> AxisOrder {
        self.axis_order
    }

    /// Decode any supported geometry by its element name.
    pub fn geometry(&self, element: &XmlElement) -> OgcResult<Geometry<f64>> {
        let geometry = match element.local_name() {
            "Point" => Geometry::Point(self.point(element)?),
            "LineString" | "LinearRing" | "Curve" => Geometry::LineString(self.line_string(element)?),
            "Polygon" => Geometry::Polygon(self.polygon(element)?),
            "Surface" => {
                let mut patches = self.multi_polygon(element)?;
                if patches.0.len() == 1 {
                    Geometry::Polygon(patches.0.remove(0))
                } else {
                    Geometry::MultiPolygon(patches)
                }
            }
            "MultiPoint" => Geometry::MultiPoint(self.multi_point(element)?),
            "MultiLineString" | "MultiCurve" => {
                Geometry::MultiLineString(self.multi_line_string(element)?)
            }
            "MultiPolygon" | "MultiSurface" => Geometry::MultiPolygon(self.multi_polygon(element)?),
            "MultiGeometry" => Geometry::GeometryCollection(self.collection(element)?),
            "Box" | "Envelope" => Geometry::Rect(self.rect(element)?),
            other => return Err(OgcError::malformed("GML geometry", other)),
        };
        Ok(geometry)
    }

    pub fn point(&self, element: &XmlElement) -> OgcResult<Point<f64>> {
        let coords = self.coordinates(element)?;
        match coords.as_slice() {
            [coord] => Ok(Point::from(*coord)),
            [coord, ..] if !self.strict => Ok(Point::from(*coord)),
            _ => Err(OgcError::malformed(
                "point",
                format!("{} coordinates", coords.len()),
            )),
        }
    }

    /// `LineString`, `LinearRing` or a `Curve` whose segments are joined.
    pub fn line_string(&self, element: &XmlElement) -> OgcResult<LineString<f64>> {
        let coords = if element.local_name() == "Curve" {
            self.curve_coordinates(element)?
        } else {
            self.coordinates(element)?
        };
        if self.strict && coords.len() < 2 {
            return Err(OgcError::malformed(
                "line string",
                format!("{} coordinates", coords.len()),
            ));
        }
        Ok(LineString::new(coords))
    }

    fn curve_coordinates(&self, curve: &XmlElement) -> OgcResult<Vec<Coord<f64>>> {
        let mut coords: Vec<Coord<f64>> = Vec::new();
        for segment in gml_children(curve, "segments").flat_map(|s| s.children()) {
            let mut points = self.coordinates(segment)?;
            if coords.last().is_some() && coords.last() == points.first() {
                points.remove(0);
            }
            coords.extend(points);
        }
        Ok(coords)
    }

    /// A ring closed if needed; strict mode requires four vertices.
    fn ring(&self, element: &XmlElement) -> OgcResult<LineString<f64>> {
        let mut coords = match element.local_name() {
            "Ring" => {
                let mut coords: Vec<Coord<f64>> = Vec::new();
                for curve in gml_children(element, "curveMember").flat_map(|m| m.children()) {
                    let mut points = self.line_string(curve)?.0;
                    if coords.last().is_some() && coords.last() == points.first() {
                        points.remove(0);
                    }
                    coords.extend(points);
                }
                coords
            }
            _ => self.coordinates(element)?,
        };
        if self.strict {
            if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
                if first != last {
                    trace!("Closing open linear ring");
                    coords.push(first);
                }
            }
            if coords.len() < 4 {
                return Err(OgcError::malformed(
                    "linear ring",
                    format!("{} coordinates", coords.len()),
                ));
            }
        }
        Ok(LineString::new(coords))
    }

    pub fn polygon(&self, element: &XmlElement) -> OgcResult<Polygon<f64>> {
        if element.local_name() == "Surface" {
            return self
                .multi_polygon(element)?
                .0
                .into_iter()
                .next()
                .ok_or_else(|| OgcError::missing("gml:PolygonPatch"));
        }

        let exterior = gml_children(element, "outerBoundaryIs")
            .chain(gml_children(element, "exterior"))
            .flat_map(|boundary| boundary.children())
            .next()
            .ok_or_else(|| OgcError::missing("gml:exterior"))?;
        let exterior = self.ring(exterior)?;

        let mut interiors = Vec::new();
        for ring in gml_children(element, "innerBoundaryIs")
            .chain(gml_children(element, "interior"))
            .flat_map(|boundary| boundary.children())
        {
            interiors.push(self.ring(ring)?);
        }
        Ok(Polygon::new(exterior, interiors))
    }

    pub fn multi_point(&self, element: &XmlElement) -> OgcResult<MultiPoint<f64>> {
        if element.local_name() == "Point" {
            return Ok(MultiPoint(vec![self.point(element)?]));
        }
        members(element)
            .map(|member| self.point(member))
            .collect::<OgcResult<Vec<_>>>()
            .map(MultiPoint)
    }

    pub fn multi_line_string(&self, element: &XmlElement) -> OgcResult<MultiLineString<f64>> {
        if matches!(element.local_name(), "LineString" | "Curve") {
            return Ok(MultiLineString(vec![self.line_string(element)?]));
        }
        members(element)
            .map(|member| self.line_string(member))
            .collect::<OgcResult<Vec<_>>>()
            .map(MultiLineString)
    }

    pub fn multi_polygon(&self, element: &XmlElement) -> OgcResult<MultiPolygon<f64>> {
        match element.local_name() {
            "Polygon" => Ok(MultiPolygon(vec![self.polygon(element)?])),
            "Surface" => gml_children(element, "patches")
                .flat_map(|patches| patches.children())
                .map(|patch| self.polygon(patch))
                .collect::<OgcResult<Vec<_>>>()
                .map(MultiPolygon),
            _ => members(element)
                .map(|member| self.polygon(member))
                .collect::<OgcResult<Vec<_>>>()
                .map(MultiPolygon),
        }
    }

    fn collection(&self, element: &XmlElement) -> OgcResult<GeometryCollection<f64>> {
        members(element)
            .map(|member| self.geometry(member))
            .collect::<OgcResult<Vec<_>>>()
            .map(GeometryCollection)
    }

    fn rect(&self, element: &XmlElement) -> OgcResult<Rect<f64>> {
        let mut coords = self.coordinates(element)?;
        if coords.is_empty() {
            for corner in ["lowerCorner", "upperCorner"] {
                if let Some(node) = gml_children(element, corner).next() {
                    coords.extend(self.ordinates(node.text(), 2)?);
                }
            }
        }
        match coords.as_slice() {
            [min, max, ..] => Ok(Rect::new(*min, *max)),
            _ => Err(OgcError::malformed("envelope", element.text())),
        }
    }

    /// Direct coordinates of a geometry element, in document order.
    pub fn coordinates(&self, element: &XmlElement) -> OgcResult<Vec<Coord<f64>>> {
        let mut coords = Vec::new();
        for child in element.children() {
            if child.namespace() != Some(GML_NAMESPACE) {
                continue;
            }
            match child.local_name() {
                "coordinates" => coords.extend(self.coordinate_tuples(child)?),
                "coord" => coords.push(self.coord(child)?),
                "pos" => coords.extend(self.ordinates(child.text(), dimension(child, 2))?),
                "posList" => coords.extend(self.ordinates(child.text(), dimension(child, 2))?),
                "pointProperty" | "pointRep" => {
                    for point in child.children() {
                        coords.push(self.point(point)?.0);
                    }
                }
                _ => {}
            }
        }
        Ok(coords)
    }

    /// `gml:coordinates` honouring its `cs`, `ts` and `decimal` separators.
    fn coordinate_tuples(&self, element: &XmlElement) -> OgcResult<Vec<Coord<f64>>> {
        let cs = element.attribute("cs").unwrap_or(",");
        let ts = element.attribute("ts").unwrap_or(" ");
        let decimal = element.attribute("decimal").unwrap_or(".");
        let text = element.text();

        let tuples: Vec<&str> = if ts.trim().is_empty() {
            text.split_whitespace().collect()
        } else {
            text.split(ts).map(str::trim).filter(|t| !t.is_empty()).collect()
        };

        tuples
            .into_iter()
            .map(|tuple| {
                let mut parts = tuple.split(cs).map(|part| {
                    let part = part.trim();
                    if decimal == "." {
                        parse_ordinate(part)
                    } else {
                        parse_ordinate(&part.replace(decimal, "."))
                    }
                });
                match (parts.next(), parts.next()) {
                    (Some(first), Some(second)) => Ok(self.to_coord(first?, second?)),
                    _ => Err(OgcError::malformed("coordinate tuple", tuple)),
                }
            })
            .collect()
    }

    fn coord(&self, element: &XmlElement) -> OgcResult<Coord<f64>> {
        let axis = |name: &str| -> OgcResult<f64> {
            let node = gml_children(element, name)
                .next()
                .ok_or_else(|| OgcError::missing(format!("gml:{}", name)))?;
            parse_ordinate(node.text())
        };
        Ok(self.to_coord(axis("X")?, axis("Y")?))
    }

    /// Whitespace-separated ordinates grouped by `dimension`.
    fn ordinates(&self, text: &str, dimension: usize) -> OgcResult<Vec<Coord<f64>>> {
        let values = text
            .split_whitespace()
            .map(parse_ordinate)
            .collect::<OgcResult<Vec<f64>>>()?;
        if dimension < 2 || values.len() % dimension != 0 {
            return Err(OgcError::malformed(
                "coordinate list",
                format!("{} ordinates with dimension {}", values.len(), dimension),
            ));
        }
        Ok(values
            .chunks(dimension)
            .map(|chunk| self.to_coord(chunk[0], chunk[1]))
            .collect())
    }

    fn to_coord(&self, first: f64, second: f64) -> Coord<f64> {
        let (x, y) = self.axis_order.to_xy(first, second);
        Coord { x, y }
    }
}

/// Geometries wrapped in `*Member` / `*Members` children.
pub fn members(element: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    element
        .children()
        .iter()
        .filter(|child| {
            child.namespace() == Some(GML_NAMESPACE)
                && (child.local_name().ends_with("Member") || child.local_name().ends_with("Members"))
        })
        .flat_map(|member| member.children())
}

fn gml_children<'a>(element: &'a XmlElement, local_name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
    element
        .children()
        .iter()
        .filter(move |child| child.is(GML_NAMESPACE, local_name))
}

fn dimension(element: &XmlElement, default: usize) -> usize {
    element
        .attribute("srsDimension")
        .or_else(|| element.attribute("dimension"))
        .and_then(|d| d.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_ordinate(value: &str) -> OgcResult<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| OgcError::malformed("ordinate", value))
}
