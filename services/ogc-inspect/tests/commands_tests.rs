//! Inspector commands against canned service responses.

use std::sync::Arc;

use ogc_common::query::query_param;
use ogc_common::{BoundingBox, WfsVersion, WmsVersion};
use ogc_http::{CancellationToken, StaticFetcher};
use ogc_inspect::commands;
use test_utils::{create_gml2_point_collection, wfs, wms};
use wfs_client::FeatureTypeRequest;
use wms_client::{MapRequest, WmsMapConfig};

const WMS: &str = "http://maps.example.com/wms";
const GEOSERVER: &str = "http://features.example.com/geoserver/wfs";

fn wms_stub(capabilities: &str) -> Arc<StaticFetcher> {
    Arc::new(StaticFetcher::new().on_get("GetCapabilities", capabilities))
}

fn wfs_stub(features: &str) -> Arc<StaticFetcher> {
    Arc::new(
        StaticFetcher::new()
            .on_get("GetCapabilities", wfs::CAPABILITIES_100)
            .on_get("DescribeFeatureType", wfs::DESCRIBE_TYPED)
            .on_get("GetFeature", features),
    )
}

#[tokio::test]
async fn test_wms_capabilities_report() {
    let fetcher = wms_stub(wms::CAPABILITIES_130);
    let report = commands::wms_capabilities(fetcher, WMS, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.version, WmsVersion::V1_3_0);
    assert_eq!(report.service.title.as_deref(), Some("Demo Basemap Service"));
    assert_eq!(report.layer_count, 3);
    assert_eq!(report.map_formats, ["image/png", "image/jpeg"]);
    assert_eq!(
        report.get_map_endpoint.as_deref(),
        Some("http://maps.example.com/wms?map=basemap&")
    );

    let rows: Vec<(Option<&str>, usize)> = report
        .layers
        .iter()
        .map(|l| (l.name.as_deref(), l.level))
        .collect();
    assert_eq!(
        rows,
        [(None, 0), (Some("countries"), 1), (Some("cities"), 2), (Some("rivers"), 1)]
    );
    assert_eq!(report.layers[1].styles, ["default", "filled"]);
    assert!(report.layers[1].queryable);
    assert!(!report.layers[3].queryable);
}

#[tokio::test]
async fn test_wms_capabilities_report_serializes() {
    let fetcher = wms_stub(wms::CAPABILITIES_111);
    let report = commands::wms_capabilities(fetcher, WMS, None, &CancellationToken::new())
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["version"], "1.1.1");
    assert!(json["layers"].as_array().is_some_and(|layers| !layers.is_empty()));
}

#[tokio::test]
async fn test_wms_exception_is_reported_with_context() {
    let fetcher = wms_stub(wms::EXCEPTION_REPORT);
    let err = commands::wms_capabilities(fetcher, WMS, None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Failed to load WMS capabilities"));
}

#[tokio::test]
async fn test_get_map_url() {
    let fetcher = wms_stub(wms::CAPABILITIES_130);
    let config = WmsMapConfig::new()
        .layer("countries")
        .crs("EPSG:4326")
        .param("DPI", "96");
    let request = MapRequest::new(BoundingBox::new(-10.0, 40.0, 5.0, 55.0), 300, 300);

    let cancel = CancellationToken::new();
    let url = commands::get_map_url(fetcher.clone(), WMS, &config, &request, &cancel)
        .await
        .unwrap();

    assert!(url.as_str().starts_with("http://maps.example.com/wms?map=basemap"));
    assert_eq!(query_param(&url, "REQUEST").as_deref(), Some("GetMap"));
    assert_eq!(query_param(&url, "LAYERS").as_deref(), Some("countries"));
    assert_eq!(query_param(&url, "WIDTH").as_deref(), Some("300"));
    assert_eq!(query_param(&url, "DPI").as_deref(), Some("96"));
    assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn test_get_map_url_rejects_unknown_layer() {
    let config = WmsMapConfig::new().layer("glaciers");
    let request = MapRequest::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 10, 10);

    let fetcher = wms_stub(wms::CAPABILITIES_130);
    let cancel = CancellationToken::new();
    let err = commands::get_map_url(fetcher, WMS, &config, &request, &cancel)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Layer 'glaciers' is not advertised"));
}

#[tokio::test]
async fn test_wfs_describe() {
    let request = FeatureTypeRequest::new(GEOSERVER, "topp:states").version(WfsVersion::V1_0_0);
    let fetcher = wfs_stub(wfs::FEATURES_GML2);
    let info = commands::wfs_describe(fetcher, &request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(info.geometry.name, "the_geom");
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["type_name"], "topp:states");
    assert_eq!(json["srid"], "4326");
}

#[tokio::test]
async fn test_wfs_features_report() {
    let fetcher = wfs_stub(wfs::FEATURES_GML2);
    let request = FeatureTypeRequest::new(GEOSERVER, "topp:states")
        .version(WfsVersion::V1_0_0)
        .label_field("STATE_NAME")
        .max_features(10);

    let report = commands::wfs_features(
        fetcher.clone(),
        &request,
        Some(BoundingBox::new(-110.0, 35.0, -100.0, 45.0)),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.type_name, "topp:states");
    assert_eq!(report.decoder, "MultiPolygon");
    assert_eq!(report.count, 2);
    assert!(report.failures.is_empty());

    let first = &report.features[0];
    assert_eq!(first.feature.label.as_deref(), Some("Colorado"));
    let geometry = first.geometry.as_ref().unwrap();
    assert_eq!(geometry.kind, "MultiPolygon");
    assert!(geometry.vertices > 0);

    let get_feature = &fetcher.requests()[2].url;
    assert_eq!(query_param(get_feature, "MAXFEATURES").as_deref(), Some("10"));
}

#[tokio::test]
async fn test_wfs_features_collects_failures() {
    let features =
        create_gml2_point_collection(&[(1.0, 2.0), (3.0, 4.0), (5.0, 6.0)]).replace("3,4", "3;4");
    let request = FeatureTypeRequest::new(GEOSERVER, "topp:states").version(WfsVersion::V1_0_0);

    let fetcher = wfs_stub(&features);
    let report = commands::wfs_features(fetcher, &request, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.count, 2);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].starts_with("feature 1:"));
}

#[tokio::test]
async fn test_cancelled_command() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let request = FeatureTypeRequest::new(GEOSERVER, "topp:states");
    assert!(commands::wfs_describe(wfs_stub(wfs::FEATURES_GML2), &request, &cancel)
        .await
        .is_err());
}
