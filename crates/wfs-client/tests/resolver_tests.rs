//! Feature type resolution against canned capabilities and schemas.

use std::sync::Arc;

use ogc_common::query::query_param;
use ogc_common::{AxisOrder, BoundingBox, OgcError, WfsVersion};
use ogc_http::{CancellationToken, StaticFetcher};
use ogc_xml::CapabilitiesDocument;
use test_utils::{require_test_file, wfs};
use wfs_client::{FeatureTypeRequest, WfsClient, DEFAULT_GEOMETRY_NAME};

const GEOSERVER: &str = "http://features.example.com/geoserver/wfs";
const CENSUS: &str = "http://census.example.org/wfs";

fn stub(capabilities: &str, schema: &str) -> Arc<StaticFetcher> {
    Arc::new(
        StaticFetcher::new()
            .on_get("GetCapabilities", capabilities)
            .on_get("DescribeFeatureType", schema),
    )
}

fn names(descriptors: &[wfs_client::ElementDescriptor]) -> Vec<&str> {
    descriptors.iter().map(|d| d.name.as_str()).collect()
}

#[tokio::test]
async fn test_typed_geometry_100() {
    let fetcher = stub(wfs::CAPABILITIES_100, wfs::DESCRIBE_TYPED);
    let client = WfsClient::new(fetcher.clone());
    let request = FeatureTypeRequest::new(GEOSERVER, "topp:states").version(WfsVersion::V1_0_0);

    let info = client
        .describe(&request, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(info.version, WfsVersion::V1_0_0);
    assert_eq!(info.geometry.name, "the_geom");
    assert_eq!(info.geometry.type_name, "MultiPolygonPropertyType");
    assert_eq!(names(&info.properties), ["STATE_NAME", "STATE_ABBR", "PERSONS"]);
    assert_eq!(info.properties[2].type_name, "xsd:double");
    assert_eq!(info.namespace_uri.as_deref(), Some("http://www.openplans.org/topp"));
    assert_eq!(info.srid, "4326");
    assert_eq!(info.axis_order, AxisOrder::XY);
    assert_eq!(
        info.bounding_box,
        BoundingBox::new(-124.731422, 24.955967, -66.969849, 49.371735)
    );

    let requests = fetcher.requests();
    assert_eq!(requests.len(), 2);
    let describe = &requests[1].url;
    assert!(describe
        .as_str()
        .starts_with("http://features.example.com/geoserver/wfs/describe?"));
    assert_eq!(query_param(describe, "TYPENAME").as_deref(), Some("topp:states"));
    assert_eq!(query_param(describe, "VERSION").as_deref(), Some("1.0.0"));
}

#[tokio::test]
async fn test_referenced_geometry_110() {
    let client = WfsClient::new(stub(wfs::CAPABILITIES_110, wfs::DESCRIBE_REF));
    let request = FeatureTypeRequest::new(CENSUS, "tiger:tiger_roads");

    let info = client
        .describe(&request, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(info.geometry.name, "multiLineStringProperty");
    assert_eq!(info.geometry.type_name, "MultiLineStringPropertyType");
    assert_eq!(names(&info.properties), ["CFCC", "NAME"]);
    assert_eq!(info.srid, "26918");
    // Projected CRS: easting first even under 1.1.0.
    assert_eq!(info.axis_order, AxisOrder::XY);
    assert_eq!(info.get_feature_url, "http://census.example.org/wfs/features");
}

#[tokio::test]
async fn test_anonymous_type_geometry() {
    let client = WfsClient::new(stub(wfs::CAPABILITIES_110, wfs::DESCRIBE_ANONYMOUS));
    let request = FeatureTypeRequest::new(CENSUS, "poi");

    let info = client
        .describe(&request, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(info.type_name, "tiger:poi");
    assert_eq!(info.geometry.name, "the_geom");
    assert_eq!(info.geometry.type_name, "PointPropertyType");
    assert_eq!(names(&info.properties), ["NAME", "THUMBNAIL"]);
    assert_eq!(info.axis_order, AxisOrder::YX);
    assert_eq!(info.srs_name(), "urn:ogc:def:crs:EPSG::4326");
}

#[tokio::test]
async fn test_no_geometry_uses_defaults() {
    let client = WfsClient::new(stub(wfs::CAPABILITIES_100, wfs::DESCRIBE_NO_GEOMETRY));
    let request = FeatureTypeRequest::new(GEOSERVER, "topp:unbounded").version(WfsVersion::V1_0_0);

    let info = client
        .describe(&request, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(info.geometry.name, DEFAULT_GEOMETRY_NAME);
    assert!(info.geometry.type_name.is_empty());
    assert!(!info.has_declared_geometry());
    assert_eq!(names(&info.properties), ["LABEL"]);
    assert_eq!(info.srid, "4326");
    assert_eq!(info.bounding_box, BoundingBox::new(0.0, 0.0, 0.0, 0.0));
}

#[tokio::test]
async fn test_caller_overrides_win() {
    let client = WfsClient::new(stub(wfs::CAPABILITIES_110, wfs::DESCRIBE_ANONYMOUS));
    let request = FeatureTypeRequest::new(CENSUS, "tiger:poi")
        .srid("EPSG:3857")
        .axis_order(&[1, 0])
        .unwrap()
        .label_field("NAME");

    let info = client
        .describe(&request, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(info.srid, "3857");
    assert_eq!(info.axis_order, AxisOrder::YX);
    assert_eq!(info.label_fields, ["NAME"]);
}

#[tokio::test]
async fn test_crs84_override_requests_epsg_4326() {
    let client = WfsClient::new(stub(wfs::CAPABILITIES_110, wfs::DESCRIBE_ANONYMOUS));
    let request = FeatureTypeRequest::new(CENSUS, "tiger:poi").srid("CRS:84");

    let info = client
        .describe(&request, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(info.srid, "4326");
    assert_eq!(info.srs_name(), "urn:ogc:def:crs:EPSG::4326");
    assert_eq!(info.axis_order, AxisOrder::YX);
}

#[tokio::test]
async fn test_shared_capabilities_are_not_refetched() {
    let fetcher = Arc::new(
        StaticFetcher::new()
            .on_get("GetCapabilities", wfs::CAPABILITIES_100)
            .route(
                |r| query_param(&r.url, "TYPENAME").as_deref() == Some("topp:states"),
                200,
                "text/xml",
                wfs::DESCRIBE_TYPED,
            )
            .route(
                |r| query_param(&r.url, "TYPENAME").as_deref() == Some("topp:unbounded"),
                200,
                "text/xml",
                wfs::DESCRIBE_NO_GEOMETRY,
            ),
    );
    let client = WfsClient::new(fetcher.clone());
    let cancel = CancellationToken::new();

    let states = FeatureTypeRequest::new(GEOSERVER, "topp:states").version(WfsVersion::V1_0_0);
    let unbounded = FeatureTypeRequest::new(GEOSERVER, "topp:unbounded").version(WfsVersion::V1_0_0);

    let shared: CapabilitiesDocument = client.fetch_capabilities(&states, &cancel).await.unwrap();
    let first = client.describe(&states, Some(&shared), &cancel).await.unwrap();
    let second = client.describe(&unbounded, Some(&shared), &cancel).await.unwrap();

    assert_eq!(first.geometry.name, "the_geom");
    assert_eq!(second.geometry.name, DEFAULT_GEOMETRY_NAME);
    assert_eq!(fetcher.requests().len(), 3);
    assert!(shared.namespaces().is_empty());
}

#[tokio::test]
async fn test_schema_exception_aborts_resolution() {
    let client = WfsClient::new(stub(wfs::CAPABILITIES_110, wfs::EXCEPTION_REPORT));
    let request = FeatureTypeRequest::new(CENSUS, "tiger:poi");

    let err = client
        .describe(&request, None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OgcError::ServiceException { ref code, .. } if code.as_deref() == Some("InvalidParameterValue")
    ));
}

#[tokio::test]
async fn test_unadvertised_type_falls_back_to_service_url() {
    let capabilities = r#"<wfs:WFS_Capabilities version="1.1.0" xmlns:wfs="http://www.opengis.net/wfs"/>"#;
    let fetcher = stub(capabilities, wfs::DESCRIBE_ANONYMOUS);
    let client = WfsClient::new(fetcher.clone());
    let request = FeatureTypeRequest::new("http://census.example.org/ows?", "poi")
        .namespace("tiger", "http://www.census.gov");

    let info = client
        .describe(&request, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(info.type_name, "tiger:poi");
    assert_eq!(info.get_feature_url, "http://census.example.org/ows");
    assert_eq!(info.describe_url, "http://census.example.org/ows");
    assert_eq!(info.srid, "4326");
    assert_eq!(info.geometry.name, "the_geom");

    let describe = &fetcher.requests()[1].url;
    assert_eq!(describe.path(), "/ows");
}

#[tokio::test]
async fn test_cancelled_resolution() {
    let client = WfsClient::new(stub(wfs::CAPABILITIES_110, wfs::DESCRIBE_ANONYMOUS));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = client
        .describe(&FeatureTypeRequest::new(CENSUS, "tiger:poi"), None, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, OgcError::Cancelled));
}

#[test]
fn test_captured_geoserver_capabilities() {
    let path = require_test_file!("geoserver_wfs_110_capabilities.xml");
    let bytes = std::fs::read(path).unwrap();
    let document = CapabilitiesDocument::parse(&bytes).unwrap();
    let request = FeatureTypeRequest::new("http://localhost:8080/geoserver/wfs", "topp:states");
    let (info, _) = wfs_client::resolve_capabilities(&request, &document).unwrap();
    assert!(!info.get_feature_url.ends_with('?'));
}
