//! Path queries over captured service documents.

use ogc_common::OgcError;
use ogc_xml::{exception_report, CapabilitiesDocument, XmlDocument, OWS_NAMESPACE, WFS_NAMESPACE};
use test_utils::{wfs, wms};

const XLINK: &str = "http://www.w3.org/1999/xlink";

#[test]
fn test_unnamespaced_document_with_empty_prefix() {
    let doc = CapabilitiesDocument::parse(wms::CAPABILITIES_111.as_bytes())
        .unwrap()
        .with_namespace("wms", "")
        .with_namespace("xlink", XLINK);

    assert_eq!(
        doc.value("/wms:WMT_MS_Capabilities/wms:Service/wms:Title")
            .unwrap()
            .as_deref(),
        Some("Legacy Topography")
    );
    assert_eq!(
        doc.values("//wms:GetMap/wms:Format").unwrap(),
        ["image/gif", "image/png"]
    );
    assert_eq!(
        doc.value("//wms:GetMap//wms:Get/wms:OnlineResource/@xlink:href")
            .unwrap()
            .as_deref(),
        Some("http://legacy.example.org/cgi-bin/wms?")
    );

    // Vendor elements share names with layer elements; anchored paths keep them apart.
    let layer_srs = doc
        .values("/wms:WMT_MS_Capabilities/wms:Capability/wms:Layer/wms:SRS")
        .unwrap();
    assert_eq!(layer_srs, ["EPSG:4326", "EPSG:900913"]);
    assert_eq!(doc.values("//wms:SRS").unwrap().len(), 4);
}

#[test]
fn test_predicates_and_sub_contexts() {
    let doc = CapabilitiesDocument::parse(wms::CAPABILITIES_111.as_bytes())
        .unwrap()
        .with_namespace("wms", "");

    let boxes = doc
        .select("//wms:Layer[wms:Title='Topography']/wms:BoundingBox[@SRS='EPSG:4326']")
        .unwrap();
    assert_eq!(boxes.len(), 2);
    assert_eq!(boxes[1].attribute("maxy"), Some("45"));

    let queryable = doc.select("//wms:Layer[@queryable]").unwrap();
    assert_eq!(queryable.len(), 1);
    assert_eq!(
        doc.value_from(queryable[0], "wms:Style/wms:LegendURL/@width")
            .unwrap()
            .as_deref(),
        Some("64")
    );
}

#[test]
fn test_wfs_110_operations() {
    let doc = CapabilitiesDocument::parse(wfs::CAPABILITIES_110.as_bytes())
        .unwrap()
        .with_namespace("wfs", WFS_NAMESPACE)
        .with_namespace("ows", OWS_NAMESPACE)
        .with_namespace("xlink", XLINK);

    let post = doc
        .value("//ows:Operation[@name='GetFeature']//ows:Post/@xlink:href")
        .unwrap();
    assert_eq!(post.as_deref(), Some("http://census.example.org/wfs/features"));

    let names = doc.values("//wfs:FeatureType/wfs:Name").unwrap();
    assert!(names.iter().any(|n| n == "tiger:poi"));

    let root = doc.root();
    assert_eq!(root.prefix(), Some("wfs"));
    assert_eq!(root.attribute("version"), Some("1.1.0"));
}

#[test]
fn test_exception_report_fixture() {
    let document = XmlDocument::parse_str(wfs::EXCEPTION_REPORT).unwrap();
    match exception_report(&document) {
        Some(OgcError::ServiceException { code, message }) => {
            assert_eq!(code.as_deref(), Some("InvalidParameterValue"));
            assert!(message.contains("tiger:nope"));
        }
        other => panic!("expected a service exception, got {:?}", other),
    }

    let capabilities = XmlDocument::parse_str(wms::CAPABILITIES_130).unwrap();
    assert!(exception_report(&capabilities).is_none());
}
