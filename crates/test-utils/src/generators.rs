//! Generators for synthetic capabilities and GML documents.
//!
//! These produce predictable, verifiable documents of arbitrary size for
//! recursion and streaming tests.

use std::fmt::Write;

/// Name of the generated layer at a tree position.
///
/// The root is `layer`; its children are `layer_0`, `layer_1`, ...; their
/// children `layer_0_0`, and so on.
pub fn generated_layer_name(path: &[usize]) -> String {
    let mut name = String::from("layer");
    for index in path {
        let _ = write!(name, "_{}", index);
    }
    name
}

/// Creates a WMS capabilities document with a balanced layer tree.
///
/// Every layer is named via [`generated_layer_name`] and declares `EPSG:4326`
/// under the version-appropriate element (`CRS` for 1.3.0, `SRS` otherwise).
///
/// # Example
///
/// ```
/// use test_utils::create_nested_layer_capabilities;
///
/// let xml = create_nested_layer_capabilities("1.1.1", 2, 2);
/// assert!(xml.contains("<Name>layer_1_1</Name>"));
/// ```
pub fn create_nested_layer_capabilities(version: &str, depth: usize, fanout: usize) -> String {
    let modern = version == "1.3.0";
    let crs_element = if modern { "CRS" } else { "SRS" };

    let mut xml = String::new();
    if modern {
        let _ = write!(
            xml,
            r#"<WMS_Capabilities version="{}" xmlns="http://www.opengis.net/wms" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
            version
        );
    } else {
        let _ = write!(
            xml,
            r#"<WMT_MS_Capabilities version="{}" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
            version
        );
    }
    xml.push_str("<Service><Title>Generated</Title></Service><Capability>");
    xml.push_str(
        r#"<Request><GetMap><Format>image/png</Format><DCPType><HTTP><Get><OnlineResource xlink:href="http://generated.example.com/wms"/></Get></HTTP></DCPType></GetMap></Request>"#,
    );

    let mut path = Vec::new();
    write_layer(&mut xml, &mut path, depth, fanout, crs_element);

    xml.push_str("</Capability>");
    xml.push_str(if modern {
        "</WMS_Capabilities>"
    } else {
        "</WMT_MS_Capabilities>"
    });
    xml
}

fn write_layer(
    xml: &mut String,
    path: &mut Vec<usize>,
    depth: usize,
    fanout: usize,
    crs_element: &str,
) {
    let name = generated_layer_name(path);
    let _ = write!(
        xml,
        "<Layer><Name>{name}</Name><Title>Title {name}</Title><{crs}>EPSG:4326</{crs}>",
        name = name,
        crs = crs_element
    );
    if path.len() < depth {
        for i in 0..fanout {
            path.push(i);
            write_layer(xml, path, depth, fanout, crs_element);
            path.pop();
        }
    }
    xml.push_str("</Layer>");
}

/// Number of layers in a tree produced by [`create_nested_layer_capabilities`].
pub fn nested_layer_count(depth: usize, fanout: usize) -> usize {
    (0..=depth).map(|level| fanout.pow(level as u32)).sum()
}

/// Creates a GML2 feature collection of `ns:site` point features.
///
/// Feature `i` has fid `site.{i}`, the point `points[i]` written as
/// `x,y` and a `NAME` property of `site {i}`.
pub fn create_gml2_point_collection(points: &[(f64, f64)]) -> String {
    let mut xml = String::from(
        r#"<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs" xmlns:gml="http://www.opengis.net/gml" xmlns:ns="http://example.com/ns">"#,
    );
    for (i, (x, y)) in points.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<gml:featureMember><ns:site fid="site.{i}"><ns:geom><gml:Point><gml:coordinates>{x},{y}</gml:coordinates></gml:Point></ns:geom><ns:NAME>site {i}</ns:NAME></ns:site></gml:featureMember>"#,
            i = i,
            x = x,
            y = y
        );
    }
    xml.push_str("</wfs:FeatureCollection>");
    xml
}

/// Creates a GML3 feature collection of `ns:site` point features.
///
/// Coordinates are written through `gml:pos` exactly as given, so callers
/// control the serialized axis order.
pub fn create_gml3_point_collection(positions: &[(f64, f64)], srs_name: &str) -> String {
    let mut xml = String::from(
        r#"<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs" xmlns:gml="http://www.opengis.net/gml" xmlns:ns="http://example.com/ns"><gml:featureMembers>"#,
    );
    for (i, (first, second)) in positions.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<ns:site gml:id="site.{i}"><ns:geom><gml:Point srsName="{srs}"><gml:pos>{a} {b}</gml:pos></gml:Point></ns:geom><ns:NAME>site {i}</ns:NAME></ns:site>"#,
            i = i,
            srs = srs_name,
            a = first,
            b = second
        );
    }
    xml.push_str("</gml:featureMembers></wfs:FeatureCollection>");
    xml
}
